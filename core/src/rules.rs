//! Volume-based bonus rules and their evaluator.
//!
//! RULES:
//!   - Every ACTIVE rule whose period matches is evaluated independently.
//!     There is no exclusivity and no first-match-wins.
//!   - An unsatisfied rule still yields a row (amount 0, marker kept) so
//!     the audit trail shows what was considered.
//!   - Priority orders rows for display only. It never affects
//!     eligibility or how bonuses are summed.

use crate::types::{DevelopmentId, PeriodType, RuleOperator, round2};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub development: DevelopmentId,
    pub name: String,
    pub period_type: PeriodType,
    /// Period descriptor the rule applies to: "2025-03", "2025-Q1", "2025".
    pub period_value: String,
    pub operator: RuleOperator,
    pub unit_threshold: i64,
    pub commission_percent: f64,
    pub surcharge_percent: f64,
    pub active: bool,
    pub priority: i64,
}

impl Rule {
    /// Whether this rule's period covers the given signing date.
    pub fn matches_period(&self, signing_date: NaiveDate) -> bool {
        period_descriptor(signing_date, self.period_type) == self.period_value
    }

    pub fn is_satisfied(&self, units_sold: i64) -> bool {
        match self.operator {
            RuleOperator::Equals => units_sold == self.unit_threshold,
            RuleOperator::AtLeast => units_sold >= self.unit_threshold,
            RuleOperator::AtMost => units_sold <= self.unit_threshold,
        }
    }
}

/// Canonical period descriptor for a date: "YYYY-MM", "YYYY-Qn" or "YYYY".
pub fn period_descriptor(date: NaiveDate, period_type: PeriodType) -> String {
    match period_type {
        PeriodType::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
        PeriodType::Quarterly => format!("{:04}-Q{}", date.year(), (date.month() - 1) / 3 + 1),
        PeriodType::Yearly => format!("{:04}", date.year()),
    }
}

/// Unit counts captured once per calculation, one per period scope.
///
/// Rule evaluation reads these snapshot values only. Re-reading the
/// aggregate mid-computation would let concurrent recalculations of
/// sibling sales skew the bonus math.
#[derive(Debug, Clone, Copy)]
pub struct PeriodUnits {
    pub monthly: i64,
    pub quarterly: i64,
    pub yearly: i64,
}

impl PeriodUnits {
    pub fn for_period(&self, period_type: PeriodType) -> i64 {
        match period_type {
            PeriodType::Monthly => self.monthly,
            PeriodType::Quarterly => self.quarterly,
            PeriodType::Yearly => self.yearly,
        }
    }
}

/// One evaluated rule: the row kept even when the rule is not fulfilled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub rule_name: String,
    pub priority: i64,
    pub percent: f64,
    /// 0.00 when not fulfilled, utility base × percent / 100 otherwise.
    pub amount: f64,
    /// Display amount with the rule's flat surcharge applied.
    pub amount_with_surcharge: f64,
    pub fulfilled: bool,
}

/// Evaluator output: all rule rows plus the residual utility.
#[derive(Debug, Clone)]
pub struct UtilityBreakdown {
    pub outcomes: Vec<RuleOutcome>,
    /// Utility pool minus fulfilled bonuses. Negative when bonuses exceed
    /// the pool. Surfaced as-is, never clamped.
    pub remaining: f64,
}

/// Evaluate every matching active rule for one calculation.
///
/// `utility_base` is the undistributed residue of the sale-phase
/// commission (guide amount minus role payouts), computed by the caller.
pub fn evaluate(
    rules: &[Rule],
    signing_date: NaiveDate,
    units: PeriodUnits,
    utility_base: f64,
) -> UtilityBreakdown {
    let mut outcomes: Vec<RuleOutcome> = rules
        .iter()
        .filter(|r| r.active && r.matches_period(signing_date))
        .map(|rule| {
            let fulfilled = rule.is_satisfied(units.for_period(rule.period_type));
            let amount = if fulfilled {
                round2(utility_base * rule.commission_percent / 100.0)
            } else {
                0.0
            };
            let amount_with_surcharge =
                round2(amount * (1.0 + rule.surcharge_percent / 100.0));
            log::debug!(
                "rule '{}' ({} {} units): fulfilled={fulfilled}, amount={amount:.2}",
                rule.name,
                rule.operator.as_str(),
                rule.unit_threshold,
            );
            RuleOutcome {
                rule_id: rule.id.clone(),
                rule_name: rule.name.clone(),
                priority: rule.priority,
                percent: rule.commission_percent,
                amount,
                amount_with_surcharge,
                fulfilled,
            }
        })
        .collect();

    // Display order only.
    outcomes.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.rule_name.cmp(&b.rule_name)));

    let bonus_total: f64 = outcomes
        .iter()
        .filter(|o| o.fulfilled)
        .map(|o| o.amount)
        .sum();
    let remaining = round2(utility_base - bonus_total);

    UtilityBreakdown {
        outcomes,
        remaining,
    }
}
