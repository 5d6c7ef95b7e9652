//! Derived sale-level phase statuses.
//!
//! RULE: these are pure projections over the current row set. They are
//! never persisted — storing them separately would let them drift from
//! the rows they summarize.

use crate::{
    calculator::DistributionRow,
    types::{PaymentStatus, Phase},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalePhaseStatus {
    /// No sale-phase rows exist (sale not calculated, or nothing owed).
    Hidden,
    Pending,
    Paid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostSalePhaseStatus {
    Hidden,
    /// Owed, but the post-sale reference date is still in the future.
    Upcoming,
    Payable,
    Paid,
}

pub fn sale_phase_status(rows: &[DistributionRow]) -> SalePhaseStatus {
    let phase_rows: Vec<&DistributionRow> =
        rows.iter().filter(|r| r.phase == Phase::Sale).collect();
    if phase_rows.is_empty() {
        return SalePhaseStatus::Hidden;
    }
    if phase_rows
        .iter()
        .all(|r| r.payment_status == PaymentStatus::Paid)
    {
        SalePhaseStatus::Paid
    } else {
        SalePhaseStatus::Pending
    }
}

/// `reference_date` is the derived post-sale date (None when the sale has
/// no partner records to derive it from, in which case anything owed is
/// immediately payable).
pub fn post_sale_phase_status(
    rows: &[DistributionRow],
    reference_date: Option<NaiveDate>,
    today: NaiveDate,
) -> PostSalePhaseStatus {
    let phase_rows: Vec<&DistributionRow> =
        rows.iter().filter(|r| r.phase == Phase::PostSale).collect();
    if phase_rows.is_empty() {
        return PostSalePhaseStatus::Hidden;
    }
    if phase_rows
        .iter()
        .all(|r| r.payment_status == PaymentStatus::Paid)
    {
        return PostSalePhaseStatus::Paid;
    }
    match reference_date {
        Some(date) if today < date => PostSalePhaseStatus::Upcoming,
        _ => PostSalePhaseStatus::Payable,
    }
}
