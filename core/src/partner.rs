//! Partner ("socio") commission tracking.
//!
//! External ownership partners of a sold product are owed a share of the
//! commission the sale distributed. Their share is computed against the
//! role-distributed phase totals, never against the gross sale value.

use crate::{
    calculator::DistributionBuild,
    error::EngineResult,
    sale::Sale,
    types::{CollectionStatus, SaleId, round2},
};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ownership participant as supplied by the external registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub participation_percent: f64,
}

/// The external product-ownership registry.
///
/// Injected into the calculator so tests run against fixtures. A failing
/// registry surfaces as `ExternalDependency` before anything is written.
pub trait ParticipantRegistry {
    fn participants(&self, product_id: &str) -> EngineResult<Vec<Participant>>;
}

/// One row per (sale, partner). Created only by a calculation, replaced
/// wholesale on recalculation. The two collection statuses move
/// independently of each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerCommissionRecord {
    pub id: String,
    pub sale_id: SaleId,
    pub partner_name: String,
    pub participation_percent: f64,
    pub sale_phase_amount: f64,
    pub post_sale_phase_amount: f64,
    pub total_amount: f64,
    pub sale_status: CollectionStatus,
    pub post_sale_status: CollectionStatus,
    /// Signing date + financing term; signing date itself for cash sales.
    pub post_sale_reference_date: NaiveDate,
    /// Cash sale with a standard post-sale commission and no term.
    pub cash_variant: bool,
    /// Opaque reference into the external file store. Presence only.
    pub invoice_ref: Option<String>,
}

/// Derive the post-sale reference date for a sale.
///
/// Returns the date and whether this is the cash variant (no financing
/// term while a post-sale amount exists). Monthly grouping of post-sale
/// commissions keys off this date, not the raw signing date.
pub fn reference_date(sale: &Sale, post_sale_amount: f64) -> (NaiveDate, bool) {
    match sale.financing_months {
        Some(months) => {
            let date = sale
                .signing_date
                .checked_add_months(Months::new(months))
                .unwrap_or(sale.signing_date);
            (date, false)
        }
        None => (sale.signing_date, post_sale_amount != 0.0),
    }
}

/// Month key ("YYYY-MM") used to group post-sale records for reporting.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Split the calculated phase totals across the ownership partners.
///
/// Participation percentages are taken at face value; summing to 100 is
/// the registry's concern, not enforced here.
pub fn build_records(
    sale: &Sale,
    build: &DistributionBuild,
    participants: &[Participant],
) -> Vec<PartnerCommissionRecord> {
    participants
        .iter()
        .map(|p| {
            let sale_phase_amount =
                round2(build.sale_phase_total * p.participation_percent / 100.0);
            let post_sale_phase_amount =
                round2(build.post_sale_phase_total * p.participation_percent / 100.0);
            let (post_sale_reference_date, cash_variant) =
                reference_date(sale, post_sale_phase_amount);
            PartnerCommissionRecord {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                partner_name: p.name.clone(),
                participation_percent: p.participation_percent,
                sale_phase_amount,
                post_sale_phase_amount,
                total_amount: round2(sale_phase_amount + post_sale_phase_amount),
                sale_status: CollectionStatus::PendingInvoice,
                post_sale_status: CollectionStatus::PendingInvoice,
                post_sale_reference_date,
                cash_variant,
                invoice_ref: None,
            }
        })
        .collect()
}
