//! Partner commission persistence: collection lifecycle and reporting.

use super::DeskStore;
use crate::{
    error::{EngineError, EngineResult},
    partner::PartnerCommissionRecord,
    types::{CollectionStatus, Phase},
};
use rusqlite::{params, OptionalExtension};

impl DeskStore {
    pub fn partner_records(&self, sale_id: &str) -> EngineResult<Vec<PartnerCommissionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sale_id, partner_name, participation_percent,
                    sale_phase_amount, post_sale_phase_amount, total_amount,
                    sale_status, post_sale_status, post_sale_reference_date,
                    cash_variant, invoice_ref
             FROM partner_commission WHERE sale_id = ?1
             ORDER BY partner_name ASC",
        )?;
        let records = stmt
            .query_map(params![sale_id], row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn get_partner_record(&self, record_id: &str) -> EngineResult<PartnerCommissionRecord> {
        let record = self
            .conn
            .query_row(
                "SELECT id, sale_id, partner_name, participation_percent,
                        sale_phase_amount, post_sale_phase_amount, total_amount,
                        sale_status, post_sale_status, post_sale_reference_date,
                        cash_variant, invoice_ref
                 FROM partner_commission WHERE id = ?1",
                params![record_id],
                row_to_record,
            )
            .optional()?;
        record.ok_or_else(|| EngineError::NotFound {
            entity: "partner_commission",
            id: record_id.to_string(),
        })
    }

    /// Advance one phase's collection status. Forward-only: moving back
    /// down the pending_invoice → invoiced → collected lifecycle is a
    /// validation error. The other phase's status is untouched.
    pub fn set_collection_status(
        &self,
        record_id: &str,
        phase: Phase,
        status: CollectionStatus,
        actor: &str,
    ) -> EngineResult<()> {
        let column = match phase {
            Phase::Sale => "sale_status",
            Phase::PostSale => "post_sale_status",
            Phase::Utility => {
                return Err(EngineError::validation(
                    "collection status only exists for the sale and post-sale phases",
                ))
            }
        };
        let record = self.get_partner_record(record_id)?;
        let current = match phase {
            Phase::Sale => record.sale_status,
            _ => record.post_sale_status,
        };
        if status == current {
            return Ok(());
        }
        if status.rank() < current.rank() {
            return Err(EngineError::Validation {
                message: format!(
                    "collection status cannot move backward: {} -> {}",
                    current.as_str(),
                    status.as_str()
                ),
            });
        }
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            &format!("UPDATE partner_commission SET {column} = ?2 WHERE id = ?1"),
            params![record_id, status],
        )?;
        self.append_audit(
            "partner_commission",
            record_id,
            column,
            Some(current.as_str()),
            status.as_str(),
            actor,
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn attach_partner_invoice(&self, record_id: &str, invoice_ref: &str) -> EngineResult<()> {
        let updated = self.conn.execute(
            "UPDATE partner_commission SET invoice_ref = ?2 WHERE id = ?1",
            params![record_id, invoice_ref],
        )?;
        if updated == 0 {
            return Err(EngineError::NotFound {
                entity: "partner_commission",
                id: record_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn has_partner_invoice(&self, record_id: &str) -> EngineResult<bool> {
        Ok(self.get_partner_record(record_id)?.invoice_ref.is_some())
    }

    /// Post-sale amounts grouped by month for reporting.
    ///
    /// Groups on the derived post-sale reference date, not the raw
    /// signing date — a financed March sale with a 24-month term lands
    /// in the month the commission becomes due.
    pub fn post_sale_totals_by_month(
        &self,
        development: Option<&str>,
    ) -> EngineResult<Vec<(String, f64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT substr(pc.post_sale_reference_date, 1, 7) AS month,
                    SUM(pc.post_sale_phase_amount)
             FROM partner_commission pc
             JOIN sale s ON s.id = pc.sale_id
             WHERE ?1 IS NULL OR s.development = ?1
             GROUP BY month
             ORDER BY month ASC",
        )?;
        let totals = stmt
            .query_map(params![development], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(totals)
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<PartnerCommissionRecord> {
    Ok(PartnerCommissionRecord {
        id: row.get(0)?,
        sale_id: row.get(1)?,
        partner_name: row.get(2)?,
        participation_percent: row.get(3)?,
        sale_phase_amount: row.get(4)?,
        post_sale_phase_amount: row.get(5)?,
        total_amount: row.get(6)?,
        sale_status: row.get(7)?,
        post_sale_status: row.get(8)?,
        post_sale_reference_date: row.get(9)?,
        cash_variant: row.get::<_, i64>(10)? != 0,
        invoice_ref: row.get(11)?,
    })
}
