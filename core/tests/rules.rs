use chrono::NaiveDate;
use commission_core::{
    calculator::Calculator,
    config::DevelopmentConfig,
    error::EngineResult,
    partner::{Participant, ParticipantRegistry},
    rules::{self, PeriodUnits, Rule},
    sale::Sale,
    store::DeskStore,
    types::{PeriodType, Phase, RoleKind, RuleOperator},
};

struct NoPartners;

impl ParticipantRegistry for NoPartners {
    fn participants(&self, _product_id: &str) -> EngineResult<Vec<Participant>> {
        Ok(vec![])
    }
}

fn store() -> DeskStore {
    let store = DeskStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn rule(development: &str, id: &str) -> Rule {
    Rule {
        id: id.into(),
        development: development.into(),
        name: id.into(),
        period_type: PeriodType::Monthly,
        period_value: "2025-03".into(),
        operator: RuleOperator::AtLeast,
        unit_threshold: 5,
        commission_percent: 10.0,
        surcharge_percent: 0.0,
        active: true,
        priority: 0,
    }
}

/// Seed a development with `n` sales signed in March 2025 and return the
/// first sale's id.
fn seed_sales(store: &DeskStore, development: &str, n: u32) -> String {
    let mut first = String::new();
    for i in 0..n {
        let id = format!("{development}-s{i}");
        if i == 0 {
            first = id.clone();
        }
        let sale = Sale::new(&id, development, format!("u{i}"), 1_000_000.0, date(2025, 3, 10));
        store.upsert_sale(&sale).unwrap();
    }
    first
}

fn seed_config(store: &DeskStore, development: &str) {
    let mut cfg = DevelopmentConfig::new(development);
    cfg.sale_percent = 3.0;
    cfg.sales_manager_percent = 1.0;
    cfg.deal_owner_percent = 1.0;
    store.upsert_development_config(&cfg).unwrap();
}

#[test]
fn fulfilled_rule_emits_bonus_from_utility_base() {
    let store = store();
    seed_config(&store, "dev-a");
    let sale_id = seed_sales(&store, "dev-a", 10);
    store.upsert_rule(&rule("dev-a", "r1")).unwrap();

    let outcome = Calculator::new(&store, &NoPartners)
        .calculate(&sale_id, false)
        .unwrap();

    // Utility base: 3% guide of 1M minus 2% role payouts = 10,000.
    let bonus = outcome
        .rows
        .iter()
        .find(|r| r.role == RoleKind::RuleBonus)
        .unwrap();
    assert_eq!(bonus.rule_fulfilled, Some(true));
    assert_eq!(bonus.amount, 1_000.0);
    assert_eq!(bonus.phase, Phase::Utility);

    let remaining = outcome
        .rows
        .iter()
        .find(|r| r.role == RoleKind::RemainingUtility)
        .unwrap();
    assert_eq!(remaining.amount, 9_000.0);
}

#[test]
fn unfulfilled_rule_keeps_its_row_with_marker() {
    let store = store();
    seed_config(&store, "dev-b");
    let sale_id = seed_sales(&store, "dev-b", 3); // below the threshold of 5
    store.upsert_rule(&rule("dev-b", "r1")).unwrap();

    let outcome = Calculator::new(&store, &NoPartners)
        .calculate(&sale_id, false)
        .unwrap();

    let bonus = outcome
        .rows
        .iter()
        .find(|r| r.role == RoleKind::RuleBonus)
        .unwrap();
    assert_eq!(bonus.rule_fulfilled, Some(false));
    assert_eq!(bonus.amount, 0.0);
    assert_eq!(bonus.rule_name.as_deref(), Some("r1"));

    // Utility base survives intact.
    let remaining = outcome
        .rows
        .iter()
        .find(|r| r.role == RoleKind::RemainingUtility)
        .unwrap();
    assert_eq!(remaining.amount, 10_000.0);
}

#[test]
fn every_matching_rule_contributes_independently() {
    // Two active rules, both satisfied. No first-match-wins.
    let base_rules = vec![
        Rule {
            commission_percent: 60.0,
            ..rule("d", "alpha")
        },
        Rule {
            commission_percent: 60.0,
            priority: 1,
            ..rule("d", "beta")
        },
    ];
    let units = PeriodUnits {
        monthly: 8,
        quarterly: 8,
        yearly: 8,
    };
    let breakdown = rules::evaluate(&base_rules, date(2025, 3, 2), units, 10_000.0);

    assert_eq!(breakdown.outcomes.len(), 2);
    assert!(breakdown.outcomes.iter().all(|o| o.fulfilled));
    assert_eq!(breakdown.outcomes[0].amount, 6_000.0);
    assert_eq!(breakdown.outcomes[1].amount, 6_000.0);
    // Bonuses exceed the pool: surfaced negative, never clamped.
    assert_eq!(breakdown.remaining, -2_000.0);
}

#[test]
fn inactive_and_out_of_period_rules_are_ignored() {
    let inactive = Rule {
        active: false,
        ..rule("d", "inactive")
    };
    let wrong_month = Rule {
        period_value: "2025-04".into(),
        ..rule("d", "wrong-month")
    };
    let units = PeriodUnits {
        monthly: 9,
        quarterly: 9,
        yearly: 9,
    };
    let breakdown = rules::evaluate(
        &[inactive, wrong_month],
        date(2025, 3, 2),
        units,
        10_000.0,
    );
    assert!(breakdown.outcomes.is_empty());
    assert_eq!(breakdown.remaining, 10_000.0);
}

#[test]
fn quarterly_and_yearly_periods_match_their_descriptors() {
    let quarterly = Rule {
        period_type: PeriodType::Quarterly,
        period_value: "2025-Q1".into(),
        ..rule("d", "q")
    };
    let yearly = Rule {
        period_type: PeriodType::Yearly,
        period_value: "2025".into(),
        ..rule("d", "y")
    };
    assert!(quarterly.matches_period(date(2025, 3, 31)));
    assert!(!quarterly.matches_period(date(2025, 4, 1)));
    assert!(yearly.matches_period(date(2025, 12, 31)));
    assert!(!yearly.matches_period(date(2026, 1, 1)));
}

#[test]
fn operators_compare_unit_counts_exactly() {
    let eq = Rule {
        operator: RuleOperator::Equals,
        ..rule("d", "eq")
    };
    let at_most = Rule {
        operator: RuleOperator::AtMost,
        ..rule("d", "le")
    };
    assert!(eq.is_satisfied(5));
    assert!(!eq.is_satisfied(6));
    assert!(at_most.is_satisfied(5));
    assert!(at_most.is_satisfied(2));
    assert!(!at_most.is_satisfied(6));
}

#[test]
fn priority_orders_rows_without_affecting_amounts() {
    let rules_in = vec![
        Rule {
            priority: 2,
            ..rule("d", "last")
        },
        Rule {
            priority: 1,
            ..rule("d", "first")
        },
    ];
    let units = PeriodUnits {
        monthly: 7,
        quarterly: 7,
        yearly: 7,
    };
    let breakdown = rules::evaluate(&rules_in, date(2025, 3, 2), units, 10_000.0);
    assert_eq!(breakdown.outcomes[0].rule_name, "first");
    assert_eq!(breakdown.outcomes[1].rule_name, "last");
    assert_eq!(breakdown.outcomes[0].amount, breakdown.outcomes[1].amount);
}

#[test]
fn rounding_is_half_up_everywhere_including_surcharge() {
    // Utility base chosen so the bonus lands exactly on a half cent.
    let r = Rule {
        commission_percent: 50.0,
        surcharge_percent: 16.0,
        unit_threshold: 1,
        ..rule("d", "round")
    };
    let units = PeriodUnits {
        monthly: 1,
        quarterly: 1,
        yearly: 1,
    };
    let breakdown = rules::evaluate(&[r], date(2025, 3, 2), units, 66.67);
    // 66.67 × 50% = 33.335 → 33.34 under half-up.
    assert_eq!(breakdown.outcomes[0].amount, 33.34);
    // Surcharge applies to the rounded amount and rounds the same way:
    // 33.34 × 1.16 = 38.6744 → 38.67.
    assert_eq!(breakdown.outcomes[0].amount_with_surcharge, 38.67);
}

#[test]
fn surcharge_display_amount_survives_to_persisted_rows() {
    let store = store();
    seed_config(&store, "dev-s");
    let sale_id = seed_sales(&store, "dev-s", 10);
    store
        .upsert_rule(&Rule {
            surcharge_percent: 16.0,
            ..rule("dev-s", "r1")
        })
        .unwrap();

    Calculator::new(&store, &NoPartners)
        .calculate(&sale_id, false)
        .unwrap();

    let rows = store.distribution_rows(&sale_id).unwrap();
    let bonus = rows
        .iter()
        .find(|r| r.role == RoleKind::RuleBonus)
        .unwrap();
    // 1,000 bonus × 1.16, carried on the row for display without
    // re-running the evaluator.
    assert_eq!(bonus.amount, 1_000.0);
    assert_eq!(bonus.amount_with_surcharge, Some(1_160.0));

    // Non-rule rows carry no display amount.
    let remaining = rows
        .iter()
        .find(|r| r.role == RoleKind::RemainingUtility)
        .unwrap();
    assert_eq!(remaining.amount_with_surcharge, None);
}

#[test]
fn unit_count_is_scoped_to_development_and_period() {
    let store = store();
    seed_sales(&store, "dev-x", 4);
    // Sibling development and a different month must not count.
    seed_sales(&store, "dev-y", 3);
    let other = Sale::new("sx-apr", "dev-x", "u9", 500_000.0, date(2025, 4, 1));
    store.upsert_sale(&other).unwrap();

    let units = store
        .units_sold("dev-x", PeriodType::Monthly, date(2025, 3, 15))
        .unwrap();
    assert_eq!(units, 4);
    let units_q = store
        .units_sold("dev-x", PeriodType::Quarterly, date(2025, 3, 15))
        .unwrap();
    assert_eq!(units_q, 4);
    let units_y = store
        .units_sold("dev-x", PeriodType::Yearly, date(2025, 3, 15))
        .unwrap();
    assert_eq!(units_y, 5);
}
