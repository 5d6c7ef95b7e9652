//! Bonus rule CRUD.

use super::DeskStore;
use crate::{
    error::{EngineError, EngineResult},
    rules::Rule,
};
use rusqlite::{params, OptionalExtension};

impl DeskStore {
    pub fn upsert_rule(&self, rule: &Rule) -> EngineResult<()> {
        for (name, value) in [
            ("commission_percent", rule.commission_percent),
            ("surcharge_percent", rule.surcharge_percent),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(EngineError::Validation {
                    message: format!(
                        "rule '{}': percentage '{name}' out of range [0, 100]: {value}",
                        rule.name
                    ),
                });
            }
        }
        self.conn.execute(
            "INSERT INTO rule (
                id, development, name, period_type, period_value, operator,
                unit_threshold, commission_percent, surcharge_percent, active, priority
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(id) DO UPDATE SET
                development        = excluded.development,
                name               = excluded.name,
                period_type        = excluded.period_type,
                period_value       = excluded.period_value,
                operator           = excluded.operator,
                unit_threshold     = excluded.unit_threshold,
                commission_percent = excluded.commission_percent,
                surcharge_percent  = excluded.surcharge_percent,
                active             = excluded.active,
                priority           = excluded.priority",
            params![
                rule.id,
                rule.development,
                rule.name,
                rule.period_type,
                rule.period_value,
                rule.operator,
                rule.unit_threshold,
                rule.commission_percent,
                rule.surcharge_percent,
                rule.active as i64,
                rule.priority,
            ],
        )?;
        Ok(())
    }

    pub fn get_rule(&self, rule_id: &str) -> EngineResult<Rule> {
        let rule = self
            .conn
            .query_row(
                "SELECT id, development, name, period_type, period_value, operator,
                        unit_threshold, commission_percent, surcharge_percent, active, priority
                 FROM rule WHERE id = ?1",
                params![rule_id],
                row_to_rule,
            )
            .optional()?;
        rule.ok_or_else(|| EngineError::NotFound {
            entity: "rule",
            id: rule_id.to_string(),
        })
    }

    /// All rules for a development, display order. The evaluator filters
    /// on the active flag and period match itself.
    pub fn rules_for_development(&self, development: &str) -> EngineResult<Vec<Rule>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, development, name, period_type, period_value, operator,
                    unit_threshold, commission_percent, surcharge_percent, active, priority
             FROM rule WHERE development = ?1
             ORDER BY priority ASC, name ASC",
        )?;
        let rules = stmt
            .query_map(params![development], row_to_rule)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    pub fn delete_rule(&self, rule_id: &str) -> EngineResult<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM rule WHERE id = ?1", params![rule_id])?;
        if deleted == 0 {
            return Err(EngineError::NotFound {
                entity: "rule",
                id: rule_id.to_string(),
            });
        }
        Ok(())
    }
}

fn row_to_rule(row: &rusqlite::Row<'_>) -> rusqlite::Result<Rule> {
    Ok(Rule {
        id: row.get(0)?,
        development: row.get(1)?,
        name: row.get(2)?,
        period_type: row.get(3)?,
        period_value: row.get(4)?,
        operator: row.get(5)?,
        unit_threshold: row.get(6)?,
        commission_percent: row.get(7)?,
        surcharge_percent: row.get(8)?,
        active: row.get::<_, i64>(9)? != 0,
        priority: row.get(10)?,
    })
}
