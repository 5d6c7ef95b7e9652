//! The sale record supplied by CRM ingestion.
//!
//! Business fields are read-only to this engine. The engine owns exactly
//! three fields: `commission_calculated` and the two percentage snapshots,
//! written only by the calculator inside its persistence transaction.

use crate::types::{DevelopmentId, ProductId, SaleId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub development: DevelopmentId,
    pub product_id: ProductId,
    pub value: f64,
    pub signing_date: NaiveDate,
    /// Financing term in months. None means a cash sale.
    pub financing_months: Option<u32>,
    pub area_m2: Option<f64>,
    pub price_per_m2: Option<f64>,
    /// Name of the staff member who owns the deal.
    pub owner: Option<String>,
    pub external_deal_id: Option<String>,

    // Engine-owned fields below.
    pub commission_calculated: bool,
    /// Sale-phase guide percentage frozen at calculation time.
    pub calculated_sale_percent: Option<f64>,
    /// Post-sale-phase guide percentage frozen at calculation time.
    pub calculated_post_sale_percent: Option<f64>,
}

impl Sale {
    /// A fresh, not-yet-calculated sale with only the required fields set.
    pub fn new(
        id: impl Into<SaleId>,
        development: impl Into<DevelopmentId>,
        product_id: impl Into<ProductId>,
        value: f64,
        signing_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            development: development.into(),
            product_id: product_id.into(),
            value,
            signing_date,
            financing_months: None,
            area_m2: None,
            price_per_m2: None,
            owner: None,
            external_deal_id: None,
            commission_calculated: false,
            calculated_sale_percent: None,
            calculated_post_sale_percent: None,
        }
    }
}
