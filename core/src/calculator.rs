//! The distribution calculator — the heart of the commission desk.
//!
//! RULES:
//!   - All validation and all external lookups happen BEFORE any write.
//!   - One calculation persists its full row set in one transaction, or
//!     persists nothing.
//!   - At most one successful calculation transition per sale: the
//!     calculated flag flips via a guarded UPDATE inside the transaction,
//!     so two concurrent calls cannot both win.
//!   - Recalculation is delete + calculate collapsed into the same
//!     transaction.

use crate::{
    config::{DevelopmentConfig, GlobalRoleConfig},
    error::{EngineError, EngineResult},
    partner::{self, ParticipantRegistry, PartnerCommissionRecord},
    rules::{self, PeriodUnits, Rule},
    sale::Sale,
    store::DeskStore,
    types::{PaymentStatus, PeriodType, Phase, RoleKind, SaleId, round2},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One commission line: role × phase × sale.
///
/// Created only in batches by the calculator; deleted only in batches on
/// recalculation. The single individually mutable field is
/// `payment_status` (plus the opaque invoice reference).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionRow {
    pub id: String,
    pub sale_id: SaleId,
    pub phase: Phase,
    pub role: RoleKind,
    pub payee: String,
    /// Assigned percentage of TOTAL sale value. 0 for the residual row.
    pub percent: f64,
    pub amount: f64,
    /// Surcharge-inclusive display amount. Set only on rule rows.
    pub amount_with_surcharge: Option<f64>,
    pub payment_status: PaymentStatus,
    /// Set only on utility-phase rule rows.
    pub rule_name: Option<String>,
    /// Fulfilled marker, kept even when the rule was not satisfied.
    pub rule_fulfilled: Option<bool>,
    pub display_order: i64,
    /// Opaque reference into the external file store. Presence only.
    pub invoice_ref: Option<String>,
}

/// Everything one calculation produced, before or after persistence.
#[derive(Debug, Clone)]
pub struct CalculationOutcome {
    pub rows: Vec<DistributionRow>,
    pub partners: Vec<PartnerCommissionRecord>,
    /// Guide percentages snapshotted onto the sale.
    pub sale_percent: f64,
    pub post_sale_percent: f64,
}

/// The in-memory result of the pure build step.
#[derive(Debug, Clone)]
pub struct DistributionBuild {
    pub rows: Vec<DistributionRow>,
    pub sale_percent: f64,
    pub post_sale_percent: f64,
    /// Sum of sale-phase role amounts (partner math runs off this, not
    /// off the gross sale value).
    pub sale_phase_total: f64,
    pub post_sale_phase_total: f64,
}

pub struct Calculator<'a, R: ParticipantRegistry> {
    store: &'a DeskStore,
    registry: &'a R,
}

impl<'a, R: ParticipantRegistry> Calculator<'a, R> {
    pub fn new(store: &'a DeskStore, registry: &'a R) -> Self {
        Self { store, registry }
    }

    /// Calculate (or recalculate) the full distribution for one sale.
    ///
    /// Returns `AlreadyCalculated` carrying the persisted rows when the
    /// sale is calculated and `recalculate` is false.
    pub fn calculate(&self, sale_id: &str, recalculate: bool) -> EngineResult<CalculationOutcome> {
        let sale = self.store.get_sale(sale_id)?;

        if sale.commission_calculated && !recalculate {
            return Err(EngineError::AlreadyCalculated {
                sale_id: sale.id.clone(),
                rows: self.store.distribution_rows(sale_id)?,
            });
        }

        let cfg = self.store.development_config(&sale.development)?;
        if let Some(c) = &cfg {
            c.validate()?;
        }
        let global = self.store.global_config()?;
        let rules = self.store.rules_for_development(&sale.development)?;

        // Snapshot read: captured once, used for every rule this run.
        let units = PeriodUnits {
            monthly: self
                .store
                .units_sold(&sale.development, PeriodType::Monthly, sale.signing_date)?,
            quarterly: self
                .store
                .units_sold(&sale.development, PeriodType::Quarterly, sale.signing_date)?,
            yearly: self
                .store
                .units_sold(&sale.development, PeriodType::Yearly, sale.signing_date)?,
        };

        let participants = match self.registry.participants(&sale.product_id) {
            Ok(p) => p,
            Err(e) => {
                log::error!("participant registry failed for sale '{sale_id}': {e}");
                return Err(e);
            }
        };

        let build = build_distribution(&sale, cfg.as_ref(), &global, &rules, units);
        let partners = partner::build_records(&sale, &build, &participants);

        self.store
            .persist_calculation(&sale.id, recalculate, &build, &partners)?;

        log::info!(
            "sale '{}' calculated: {} rows, {} partner records, phase percents {:.2}/{:.2}",
            sale.id,
            build.rows.len(),
            partners.len(),
            build.sale_percent,
            build.post_sale_percent,
        );

        Ok(CalculationOutcome {
            rows: build.rows,
            partners,
            sale_percent: build.sale_percent,
            post_sale_percent: build.post_sale_percent,
        })
    }

    /// Clear all distribution rows and partner records for a sale and
    /// reset its calculated flag. One transaction.
    pub fn delete(&self, sale_id: &str) -> EngineResult<()> {
        // Existence check so an unknown id is NotFound, not a no-op.
        let _ = self.store.get_sale(sale_id)?;
        self.store.delete_calculation(sale_id)
    }
}

/// Pure build step: sale + configuration + rules + unit snapshot → rows.
///
/// No I/O. Determinism of recalculation falls out of this function being
/// a pure map over its inputs.
pub fn build_distribution(
    sale: &Sale,
    cfg: Option<&DevelopmentConfig>,
    global: &GlobalRoleConfig,
    rules: &[Rule],
    units: PeriodUnits,
) -> DistributionBuild {
    let mut rows: Vec<DistributionRow> = Vec::new();
    let mut order: i64 = 0;

    let mut push = |rows: &mut Vec<DistributionRow>,
                    phase: Phase,
                    role: RoleKind,
                    payee: String,
                    percent: f64| {
        let row = DistributionRow {
            id: Uuid::new_v4().to_string(),
            sale_id: sale.id.clone(),
            phase,
            role,
            payee,
            percent,
            amount: round2(sale.value * percent / 100.0),
            amount_with_surcharge: None,
            payment_status: PaymentStatus::Pending,
            rule_name: None,
            rule_fulfilled: None,
            display_order: order,
            invoice_ref: None,
        };
        order += 1;
        rows.push(row);
    };

    // ── Sale phase: per-development roles ──────────────────────
    if let Some(cfg) = cfg {
        if cfg.pool_enabled {
            // Pool mode: the pool total replaces the manager/advisor
            // allocation, split equally among the members present.
            // The deal owner stays outside the pool.
            let pool = cfg.pool_percent.unwrap_or(0.0);
            let members: Vec<RoleKind> = if cfg.external_advisor_percent.is_some() {
                vec![RoleKind::SalesManager, RoleKind::ExternalAdvisor]
            } else {
                vec![RoleKind::SalesManager]
            };
            let share = pool / members.len() as f64;
            for role in members {
                push(&mut rows, Phase::Sale, role, role.label().to_string(), share);
            }
        } else {
            push(
                &mut rows,
                Phase::Sale,
                RoleKind::SalesManager,
                RoleKind::SalesManager.label().to_string(),
                cfg.sales_manager_percent,
            );
            if let Some(advisor) = cfg.external_advisor_percent {
                push(
                    &mut rows,
                    Phase::Sale,
                    RoleKind::ExternalAdvisor,
                    RoleKind::ExternalAdvisor.label().to_string(),
                    advisor,
                );
            }
        }
        let owner = sale
            .owner
            .clone()
            .unwrap_or_else(|| RoleKind::DealOwner.label().to_string());
        push(
            &mut rows,
            Phase::Sale,
            RoleKind::DealOwner,
            owner,
            cfg.deal_owner_percent,
        );
    }

    // ── Sale phase: global roles, config or not ────────────────
    for role in [RoleKind::OperationsCoordinator, RoleKind::Marketing] {
        push(
            &mut rows,
            Phase::Sale,
            role,
            role.label().to_string(),
            global.percent(role),
        );
    }

    // ── Post-sale phase ────────────────────────────────────────
    for role in [RoleKind::LegalManager, RoleKind::PostSaleCoordinator] {
        push(
            &mut rows,
            Phase::PostSale,
            role,
            role.label().to_string(),
            global.percent(role),
        );
    }
    if let Some(cfg) = cfg {
        for (role, opt) in [
            (RoleKind::CustomerService, &cfg.customer_service),
            (RoleKind::Deliveries, &cfg.deliveries),
            (RoleKind::Bonds, &cfg.bonds),
        ] {
            if opt.enabled {
                push(
                    &mut rows,
                    Phase::PostSale,
                    role,
                    role.label().to_string(),
                    opt.effective_percent(),
                );
            }
        }
    }

    let sale_percent = cfg.map(|c| c.sale_percent).unwrap_or(0.0);
    let post_sale_percent = cfg.map(|c| c.post_sale_percent).unwrap_or(0.0);

    let sale_phase_total: f64 = rows
        .iter()
        .filter(|r| r.phase == Phase::Sale)
        .map(|r| r.amount)
        .sum();
    let post_sale_phase_total: f64 = rows
        .iter()
        .filter(|r| r.phase == Phase::PostSale)
        .map(|r| r.amount)
        .sum();

    // ── Utility phase: rule bonuses + residual ─────────────────
    // The utility pool is what the sale-phase guide amount leaves behind
    // after the role payouts.
    let utility_base = round2(sale.value * sale_percent / 100.0 - sale_phase_total);
    let breakdown = rules::evaluate(rules, sale.signing_date, units, utility_base);
    for outcome in &breakdown.outcomes {
        rows.push(DistributionRow {
            id: Uuid::new_v4().to_string(),
            sale_id: sale.id.clone(),
            phase: Phase::Utility,
            role: RoleKind::RuleBonus,
            payee: outcome.rule_name.clone(),
            percent: outcome.percent,
            amount: outcome.amount,
            amount_with_surcharge: Some(outcome.amount_with_surcharge),
            payment_status: PaymentStatus::Pending,
            rule_name: Some(outcome.rule_name.clone()),
            rule_fulfilled: Some(outcome.fulfilled),
            display_order: order,
            invoice_ref: None,
        });
        order += 1;
    }
    rows.push(DistributionRow {
        id: Uuid::new_v4().to_string(),
        sale_id: sale.id.clone(),
        phase: Phase::Utility,
        role: RoleKind::RemainingUtility,
        payee: RoleKind::RemainingUtility.label().to_string(),
        percent: 0.0,
        amount: breakdown.remaining,
        amount_with_surcharge: None,
        payment_status: PaymentStatus::Pending,
        rule_name: None,
        rule_fulfilled: None,
        display_order: order,
        invoice_ref: None,
    });

    DistributionBuild {
        rows,
        sale_percent,
        post_sale_percent,
        sale_phase_total: round2(sale_phase_total),
        post_sale_phase_total: round2(post_sale_phase_total),
    }
}
