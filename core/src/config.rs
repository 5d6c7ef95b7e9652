//! Commission configuration: per-development percentages and the
//! organization-wide global role percentages.
//!
//! RULE: every percentage lives in [0, 100], and an enabled optional role
//! always carries a percentage. The store validates on upsert; the
//! calculator validates again before any write.

use crate::{
    error::{EngineError, EngineResult},
    types::{DevelopmentId, RoleKind},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An optional per-development role: a toggle plus its percentage.
/// Invariant: enabled ⇒ percent is present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionalRole {
    pub enabled: bool,
    pub percent: Option<f64>,
}

impl OptionalRole {
    pub fn on(percent: f64) -> Self {
        Self {
            enabled: true,
            percent: Some(percent),
        }
    }

    /// The effective percentage: 0 unless enabled and configured.
    pub fn effective_percent(&self) -> f64 {
        if self.enabled {
            self.percent.unwrap_or(0.0)
        } else {
            0.0
        }
    }
}

/// Per-development commission configuration.
///
/// All percentages are direct fractions of TOTAL sale value, not of the
/// phase sub-pool. The guide percentages (`sale_percent`,
/// `post_sale_percent`) are tracked independently of the role sums and
/// are what gets snapshotted onto the sale at calculation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevelopmentConfig {
    pub development: DevelopmentId,
    /// Sale-phase guide percentage.
    pub sale_percent: f64,
    /// Post-sale-phase guide percentage.
    pub post_sale_percent: f64,
    pub sales_manager_percent: f64,
    pub deal_owner_percent: f64,
    /// Only some developments use an external advisor.
    pub external_advisor_percent: Option<f64>,
    /// Pool mode: one aggregate percentage shared by manager and advisor
    /// instead of their individual percentages.
    pub pool_enabled: bool,
    pub pool_percent: Option<f64>,
    pub customer_service: OptionalRole,
    pub deliveries: OptionalRole,
    pub bonds: OptionalRole,
}

impl DevelopmentConfig {
    pub fn new(development: impl Into<DevelopmentId>) -> Self {
        Self {
            development: development.into(),
            sale_percent: 0.0,
            post_sale_percent: 0.0,
            sales_manager_percent: 0.0,
            deal_owner_percent: 0.0,
            external_advisor_percent: None,
            pool_enabled: false,
            pool_percent: None,
            customer_service: OptionalRole::default(),
            deliveries: OptionalRole::default(),
            bonds: OptionalRole::default(),
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        let named: [(&str, Option<f64>); 7] = [
            ("sale_percent", Some(self.sale_percent)),
            ("post_sale_percent", Some(self.post_sale_percent)),
            ("sales_manager_percent", Some(self.sales_manager_percent)),
            ("deal_owner_percent", Some(self.deal_owner_percent)),
            ("external_advisor_percent", self.external_advisor_percent),
            ("pool_percent", self.pool_percent),
            ("customer_service", self.customer_service.percent),
        ];
        for (name, value) in named {
            check_range(name, value)?;
        }
        check_range("deliveries", self.deliveries.percent)?;
        check_range("bonds", self.bonds.percent)?;

        if self.pool_enabled && self.pool_percent.is_none() {
            return Err(EngineError::validation(
                "pool is enabled but pool_percent is missing",
            ));
        }
        for (name, role) in [
            ("customer_service", &self.customer_service),
            ("deliveries", &self.deliveries),
            ("bonds", &self.bonds),
        ] {
            if role.enabled && role.percent.is_none() {
                return Err(EngineError::Validation {
                    message: format!("optional role '{name}' is enabled but has no percentage"),
                });
            }
        }
        Ok(())
    }
}

fn check_range(name: &str, value: Option<f64>) -> EngineResult<()> {
    if let Some(v) = value {
        if !(0.0..=100.0).contains(&v) {
            return Err(EngineError::Validation {
                message: format!("percentage '{name}' out of range [0, 100]: {v}"),
            });
        }
    }
    Ok(())
}

/// Organization-wide role percentages, applied identically to every
/// development regardless of its per-development configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalRoleConfig {
    percents: HashMap<RoleKind, f64>,
}

impl GlobalRoleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, role: RoleKind, percent: f64) -> EngineResult<()> {
        check_range(role.as_str(), Some(percent))?;
        self.percents.insert(role, percent);
        Ok(())
    }

    /// Missing keys read as 0 by contract.
    pub fn percent(&self, role: RoleKind) -> f64 {
        self.percents.get(&role).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoleKind, f64)> + '_ {
        self.percents.iter().map(|(k, v)| (*k, *v))
    }
}
