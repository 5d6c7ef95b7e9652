//! Distribution row persistence and the calculation transaction.

use super::DeskStore;
use crate::{
    calculator::{DistributionBuild, DistributionRow},
    error::{EngineError, EngineResult},
    partner::PartnerCommissionRecord,
    types::PaymentStatus,
};
use rusqlite::{params, OptionalExtension};

impl DeskStore {
    /// Persist one calculation as a single all-or-nothing unit.
    ///
    /// Inside one transaction: optionally clear the previous row set
    /// (recalculation), flip the calculated flag via a guarded UPDATE,
    /// then insert every row and partner record. The guard closes the
    /// check-then-act race — of two concurrent calculations exactly one
    /// sees `commission_calculated = 0` and wins; the loser gets
    /// `AlreadyCalculated` with the winner's rows.
    pub fn persist_calculation(
        &self,
        sale_id: &str,
        recalculate: bool,
        build: &DistributionBuild,
        partners: &[PartnerCommissionRecord],
    ) -> EngineResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        if recalculate {
            tx.execute(
                "DELETE FROM distribution_row WHERE sale_id = ?1",
                params![sale_id],
            )?;
            tx.execute(
                "DELETE FROM partner_commission WHERE sale_id = ?1",
                params![sale_id],
            )?;
            tx.execute(
                "UPDATE sale SET commission_calculated = 0,
                        calculated_sale_percent = NULL,
                        calculated_post_sale_percent = NULL
                 WHERE id = ?1",
                params![sale_id],
            )?;
        }

        let claimed = tx.execute(
            "UPDATE sale SET commission_calculated = 1,
                    calculated_sale_percent = ?2,
                    calculated_post_sale_percent = ?3
             WHERE id = ?1 AND commission_calculated = 0",
            params![sale_id, build.sale_percent, build.post_sale_percent],
        )?;
        if claimed == 0 {
            drop(tx); // rollback
            return Err(EngineError::AlreadyCalculated {
                sale_id: sale_id.to_string(),
                rows: self.distribution_rows(sale_id)?,
            });
        }

        for row in &build.rows {
            tx.execute(
                "INSERT INTO distribution_row (
                    id, sale_id, phase, role, payee, percent, amount,
                    amount_with_surcharge, payment_status, rule_name,
                    rule_fulfilled, display_order, invoice_ref
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    row.id,
                    row.sale_id,
                    row.phase,
                    row.role,
                    row.payee,
                    row.percent,
                    row.amount,
                    row.amount_with_surcharge,
                    row.payment_status,
                    row.rule_name,
                    row.rule_fulfilled.map(|f| f as i64),
                    row.display_order,
                    row.invoice_ref,
                ],
            )?;
        }
        for record in partners {
            tx.execute(
                "INSERT INTO partner_commission (
                    id, sale_id, partner_name, participation_percent,
                    sale_phase_amount, post_sale_phase_amount, total_amount,
                    sale_status, post_sale_status, post_sale_reference_date,
                    cash_variant, invoice_ref
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    record.id,
                    record.sale_id,
                    record.partner_name,
                    record.participation_percent,
                    record.sale_phase_amount,
                    record.post_sale_phase_amount,
                    record.total_amount,
                    record.sale_status,
                    record.post_sale_status,
                    record.post_sale_reference_date,
                    record.cash_variant as i64,
                    record.invoice_ref,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Clear a sale's calculated output and reset its flag. One
    /// transaction; leaves the safely recoverable zero-row state.
    pub fn delete_calculation(&self, sale_id: &str) -> EngineResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM distribution_row WHERE sale_id = ?1",
            params![sale_id],
        )?;
        tx.execute(
            "DELETE FROM partner_commission WHERE sale_id = ?1",
            params![sale_id],
        )?;
        tx.execute(
            "UPDATE sale SET commission_calculated = 0,
                    calculated_sale_percent = NULL,
                    calculated_post_sale_percent = NULL
             WHERE id = ?1",
            params![sale_id],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn distribution_rows(&self, sale_id: &str) -> EngineResult<Vec<DistributionRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sale_id, phase, role, payee, percent, amount,
                    amount_with_surcharge, payment_status, rule_name,
                    rule_fulfilled, display_order, invoice_ref
             FROM distribution_row WHERE sale_id = ?1
             ORDER BY display_order ASC",
        )?;
        let rows = stmt
            .query_map(params![sale_id], row_to_distribution)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_distribution_row(&self, row_id: &str) -> EngineResult<DistributionRow> {
        let row = self
            .conn
            .query_row(
                "SELECT id, sale_id, phase, role, payee, percent, amount,
                        amount_with_surcharge, payment_status, rule_name,
                        rule_fulfilled, display_order, invoice_ref
                 FROM distribution_row WHERE id = ?1",
                params![row_id],
                row_to_distribution,
            )
            .optional()?;
        row.ok_or_else(|| EngineError::NotFound {
            entity: "distribution_row",
            id: row_id.to_string(),
        })
    }

    /// Flip a row between pending and paid. Unconditional in both
    /// directions; the transition lands in the audit log.
    pub fn set_payment_status(
        &self,
        row_id: &str,
        status: PaymentStatus,
        actor: &str,
    ) -> EngineResult<()> {
        let current = self.get_distribution_row(row_id)?.payment_status;
        if current == status {
            return Ok(());
        }
        // Status change and its audit entry land together or not at all.
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE distribution_row SET payment_status = ?2 WHERE id = ?1",
            params![row_id, status],
        )?;
        self.append_audit(
            "distribution_row",
            row_id,
            "payment_status",
            Some(current.as_str()),
            status.as_str(),
            actor,
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn attach_row_invoice(&self, row_id: &str, invoice_ref: &str) -> EngineResult<()> {
        let updated = self.conn.execute(
            "UPDATE distribution_row SET invoice_ref = ?2 WHERE id = ?1",
            params![row_id, invoice_ref],
        )?;
        if updated == 0 {
            return Err(EngineError::NotFound {
                entity: "distribution_row",
                id: row_id.to_string(),
            });
        }
        Ok(())
    }

    /// Presence only — the engine never reads invoice content.
    pub fn has_row_invoice(&self, row_id: &str) -> EngineResult<bool> {
        Ok(self.get_distribution_row(row_id)?.invoice_ref.is_some())
    }
}

fn row_to_distribution(row: &rusqlite::Row<'_>) -> rusqlite::Result<DistributionRow> {
    Ok(DistributionRow {
        id: row.get(0)?,
        sale_id: row.get(1)?,
        phase: row.get(2)?,
        role: row.get(3)?,
        payee: row.get(4)?,
        percent: row.get(5)?,
        amount: row.get(6)?,
        amount_with_surcharge: row.get(7)?,
        payment_status: row.get(8)?,
        rule_name: row.get(9)?,
        rule_fulfilled: row.get::<_, Option<i64>>(10)?.map(|f| f != 0),
        display_order: row.get(11)?,
        invoice_ref: row.get(12)?,
    })
}
