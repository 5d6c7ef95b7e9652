//! desk-runner: headless demo/admin runner for the commission desk.
//!
//! Usage:
//!   desk-runner --db desk.db
//!   desk-runner --db desk.db --json

use anyhow::Result;
use chrono::NaiveDate;
use commission_core::{
    calculator::Calculator,
    config::{DevelopmentConfig, OptionalRole},
    error::{EngineError, EngineResult},
    partner::{Participant, ParticipantRegistry},
    rules::Rule,
    sale::Sale,
    store::DeskStore,
    types::{PeriodType, RoleKind, RuleOperator},
};
use std::env;

/// Fixture registry: a real deployment wires the ownership service here.
struct StaticRegistry;

impl ParticipantRegistry for StaticRegistry {
    fn participants(&self, _product_id: &str) -> EngineResult<Vec<Participant>> {
        Ok(vec![
            Participant {
                name: "Socio Norte".into(),
                participation_percent: 60.0,
            },
            Participant {
                name: "Socio Sur".into(),
                participation_percent: 40.0,
            },
        ])
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let as_json = args.iter().any(|a| a == "--json");

    let store = DeskStore::open(db)?;
    store.migrate()?;

    seed_demo(&store)?;

    let registry = StaticRegistry;
    let calculator = Calculator::new(&store, &registry);
    // A re-run against an existing db is a conflict carrying the rows;
    // recalculate instead so the demo stays repeatable.
    let outcome = match calculator.calculate("sale-001", false) {
        Err(EngineError::AlreadyCalculated { .. }) => {
            log::warn!("sale-001 already calculated, recalculating");
            calculator.calculate("sale-001", true)?
        }
        other => other?,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome.rows)?);
        return Ok(());
    }

    println!("Commission Desk — demo run");
    println!("  db:                {db}");
    println!("  sale:              sale-001 (Mirador Norte, $2,000,000.00)");
    println!(
        "  phase percents:    sale {:.2} / post-sale {:.2}",
        outcome.sale_percent, outcome.post_sale_percent
    );
    println!();
    println!("  {:<12} {:<24} {:>8} {:>14}", "phase", "payee", "pct", "amount");
    for row in &outcome.rows {
        println!(
            "  {:<12} {:<24} {:>8.2} {:>14.2}",
            row.phase.as_str(),
            row.payee,
            row.percent,
            row.amount
        );
    }
    println!();
    println!("  partner ledger:");
    for record in &outcome.partners {
        println!(
            "  {:<24} {:>6.1}%  sale {:>12.2}  post-sale {:>12.2}  due {}",
            record.partner_name,
            record.participation_percent,
            record.sale_phase_amount,
            record.post_sale_phase_amount,
            record.post_sale_reference_date
        );
    }

    Ok(())
}

fn seed_demo(store: &DeskStore) -> Result<()> {
    let mut cfg = DevelopmentConfig::new("mirador-norte");
    cfg.sale_percent = 3.0;
    cfg.post_sale_percent = 1.0;
    cfg.sales_manager_percent = 1.2;
    cfg.deal_owner_percent = 1.0;
    cfg.customer_service = OptionalRole::on(0.2);
    store.upsert_development_config(&cfg)?;

    store.set_global_percent(RoleKind::OperationsCoordinator, 0.15)?;
    store.set_global_percent(RoleKind::Marketing, 0.10)?;
    store.set_global_percent(RoleKind::LegalManager, 0.10)?;
    store.set_global_percent(RoleKind::PostSaleCoordinator, 0.15)?;

    store.upsert_rule(&Rule {
        id: "rule-volume-q".into(),
        development: "mirador-norte".into(),
        name: "Quarterly volume push".into(),
        period_type: PeriodType::Quarterly,
        period_value: "2025-Q1".into(),
        operator: RuleOperator::AtLeast,
        unit_threshold: 1,
        commission_percent: 10.0,
        surcharge_percent: 16.0,
        active: true,
        priority: 0,
    })?;

    let mut sale = Sale::new(
        "sale-001",
        "mirador-norte",
        "unit-12b",
        2_000_000.0,
        NaiveDate::from_ymd_opt(2025, 3, 14).expect("valid date"),
    );
    sale.financing_months = Some(24);
    sale.owner = Some("A. Ferreyra".into());
    store.upsert_sale(&sale)?;

    log::info!("demo data seeded");
    Ok(())
}
