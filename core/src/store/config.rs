//! Configuration store: per-development percentages and global roles.

use super::DeskStore;
use crate::{
    config::{DevelopmentConfig, GlobalRoleConfig, OptionalRole},
    error::{EngineError, EngineResult},
    types::RoleKind,
};
use rusqlite::{params, OptionalExtension};

impl DeskStore {
    /// Validates before any write: out-of-range percentages and enabled
    /// roles without a percentage are rejected.
    pub fn upsert_development_config(&self, cfg: &DevelopmentConfig) -> EngineResult<()> {
        cfg.validate()?;
        self.conn.execute(
            "INSERT INTO development_config (
                development, sale_percent, post_sale_percent,
                sales_manager_percent, deal_owner_percent, external_advisor_percent,
                pool_enabled, pool_percent,
                customer_service_enabled, customer_service_percent,
                deliveries_enabled, deliveries_percent,
                bonds_enabled, bonds_percent
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(development) DO UPDATE SET
                sale_percent             = excluded.sale_percent,
                post_sale_percent        = excluded.post_sale_percent,
                sales_manager_percent    = excluded.sales_manager_percent,
                deal_owner_percent       = excluded.deal_owner_percent,
                external_advisor_percent = excluded.external_advisor_percent,
                pool_enabled             = excluded.pool_enabled,
                pool_percent             = excluded.pool_percent,
                customer_service_enabled = excluded.customer_service_enabled,
                customer_service_percent = excluded.customer_service_percent,
                deliveries_enabled       = excluded.deliveries_enabled,
                deliveries_percent       = excluded.deliveries_percent,
                bonds_enabled            = excluded.bonds_enabled,
                bonds_percent            = excluded.bonds_percent",
            params![
                cfg.development,
                cfg.sale_percent,
                cfg.post_sale_percent,
                cfg.sales_manager_percent,
                cfg.deal_owner_percent,
                cfg.external_advisor_percent,
                cfg.pool_enabled as i64,
                cfg.pool_percent,
                cfg.customer_service.enabled as i64,
                cfg.customer_service.percent,
                cfg.deliveries.enabled as i64,
                cfg.deliveries.percent,
                cfg.bonds.enabled as i64,
                cfg.bonds.percent,
            ],
        )?;
        Ok(())
    }

    /// Absent is legal: a development without configuration calculates
    /// with all per-development percentages at zero.
    pub fn development_config(&self, development: &str) -> EngineResult<Option<DevelopmentConfig>> {
        let cfg = self
            .conn
            .query_row(
                "SELECT development, sale_percent, post_sale_percent,
                        sales_manager_percent, deal_owner_percent, external_advisor_percent,
                        pool_enabled, pool_percent,
                        customer_service_enabled, customer_service_percent,
                        deliveries_enabled, deliveries_percent,
                        bonds_enabled, bonds_percent
                 FROM development_config WHERE development = ?1",
                params![development],
                |row| {
                    Ok(DevelopmentConfig {
                        development: row.get(0)?,
                        sale_percent: row.get(1)?,
                        post_sale_percent: row.get(2)?,
                        sales_manager_percent: row.get(3)?,
                        deal_owner_percent: row.get(4)?,
                        external_advisor_percent: row.get(5)?,
                        pool_enabled: row.get::<_, i64>(6)? != 0,
                        pool_percent: row.get(7)?,
                        customer_service: OptionalRole {
                            enabled: row.get::<_, i64>(8)? != 0,
                            percent: row.get(9)?,
                        },
                        deliveries: OptionalRole {
                            enabled: row.get::<_, i64>(10)? != 0,
                            percent: row.get(11)?,
                        },
                        bonds: OptionalRole {
                            enabled: row.get::<_, i64>(12)? != 0,
                            percent: row.get(13)?,
                        },
                    })
                },
            )
            .optional()?;
        Ok(cfg)
    }

    pub fn set_global_percent(&self, role: RoleKind, percent: f64) -> EngineResult<()> {
        if !(0.0..=100.0).contains(&percent) {
            return Err(EngineError::Validation {
                message: format!(
                    "global percentage for '{}' out of range [0, 100]: {percent}",
                    role.as_str()
                ),
            });
        }
        self.conn.execute(
            "INSERT INTO global_role_config (role, percent) VALUES (?1, ?2)
             ON CONFLICT(role) DO UPDATE SET percent = excluded.percent",
            params![role, percent],
        )?;
        Ok(())
    }

    /// The full global map. Missing roles read as 0.
    pub fn global_config(&self) -> EngineResult<GlobalRoleConfig> {
        let mut stmt = self
            .conn
            .prepare("SELECT role, percent FROM global_role_config")?;
        let mut config = GlobalRoleConfig::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, RoleKind>(0)?, row.get::<_, f64>(1)?))
        })?;
        for row in rows {
            let (role, percent) = row?;
            config.set(role, percent)?;
        }
        Ok(config)
    }
}
