//! Sale persistence: ingestion upserts and the period unit counts.

use super::DeskStore;
use crate::{
    error::{EngineError, EngineResult},
    sale::Sale,
    types::PeriodType,
};
use chrono::{Datelike, NaiveDate};
use rusqlite::{params, OptionalExtension};

impl DeskStore {
    /// Insert or update a sale from CRM ingestion.
    ///
    /// Business fields only: an existing sale keeps its calculated flag
    /// and percentage snapshot untouched. Those columns belong to the
    /// calculator.
    pub fn upsert_sale(&self, sale: &Sale) -> EngineResult<()> {
        if !sale.value.is_finite() || sale.value < 0.0 {
            return Err(EngineError::Validation {
                message: format!(
                    "sale '{}' value must be finite and non-negative, got {}",
                    sale.id, sale.value
                ),
            });
        }
        self.conn.execute(
            "INSERT INTO sale (
                id, development, product_id, value, signing_date,
                financing_months, area_m2, price_per_m2, owner, external_deal_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                development      = excluded.development,
                product_id       = excluded.product_id,
                value            = excluded.value,
                signing_date     = excluded.signing_date,
                financing_months = excluded.financing_months,
                area_m2          = excluded.area_m2,
                price_per_m2     = excluded.price_per_m2,
                owner            = excluded.owner,
                external_deal_id = excluded.external_deal_id",
            params![
                sale.id,
                sale.development,
                sale.product_id,
                sale.value,
                sale.signing_date,
                sale.financing_months.map(|m| m as i64),
                sale.area_m2,
                sale.price_per_m2,
                sale.owner,
                sale.external_deal_id,
            ],
        )?;
        Ok(())
    }

    pub fn get_sale(&self, sale_id: &str) -> EngineResult<Sale> {
        let sale = self
            .conn
            .query_row(
                "SELECT id, development, product_id, value, signing_date,
                        financing_months, area_m2, price_per_m2, owner, external_deal_id,
                        commission_calculated, calculated_sale_percent, calculated_post_sale_percent
                 FROM sale WHERE id = ?1",
                params![sale_id],
                |row| {
                    Ok(Sale {
                        id: row.get(0)?,
                        development: row.get(1)?,
                        product_id: row.get(2)?,
                        value: row.get(3)?,
                        signing_date: row.get(4)?,
                        financing_months: row.get::<_, Option<i64>>(5)?.map(|m| m as u32),
                        area_m2: row.get(6)?,
                        price_per_m2: row.get(7)?,
                        owner: row.get(8)?,
                        external_deal_id: row.get(9)?,
                        commission_calculated: row.get::<_, i64>(10)? != 0,
                        calculated_sale_percent: row.get(11)?,
                        calculated_post_sale_percent: row.get(12)?,
                    })
                },
            )
            .optional()?;
        sale.ok_or_else(|| EngineError::NotFound {
            entity: "sale",
            id: sale_id.to_string(),
        })
    }

    /// Units sold in the development within the period containing `date`.
    ///
    /// Counts sibling sales by signing date. The calculator calls this
    /// once per period scope at the start of a calculation and never
    /// re-reads it mid-computation.
    pub fn units_sold(
        &self,
        development: &str,
        period_type: PeriodType,
        date: NaiveDate,
    ) -> EngineResult<i64> {
        let (start, end) = period_bounds(date, period_type);
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sale
             WHERE development = ?1 AND signing_date >= ?2 AND signing_date < ?3",
            params![development, start, end],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Half-open [start, end) date range of the period containing `date`.
fn period_bounds(date: NaiveDate, period_type: PeriodType) -> (NaiveDate, NaiveDate) {
    let ymd = |y: i32, m: u32| NaiveDate::from_ymd_opt(y, m, 1).expect("valid first-of-month");
    let year = date.year();
    match period_type {
        PeriodType::Monthly => {
            let start = ymd(year, date.month());
            let end = if date.month() == 12 {
                ymd(year + 1, 1)
            } else {
                ymd(year, date.month() + 1)
            };
            (start, end)
        }
        PeriodType::Quarterly => {
            let start_month = (date.month() - 1) / 3 * 3 + 1;
            let start = ymd(year, start_month);
            let end = if start_month == 10 {
                ymd(year + 1, 1)
            } else {
                ymd(year, start_month + 3)
            };
            (start, end)
        }
        PeriodType::Yearly => (ymd(year, 1), ymd(year + 1, 1)),
    }
}
