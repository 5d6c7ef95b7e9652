use chrono::NaiveDate;
use commission_core::{
    calculator::Calculator,
    config::DevelopmentConfig,
    error::EngineResult,
    partner::{Participant, ParticipantRegistry},
    sale::Sale,
    status::{post_sale_phase_status, sale_phase_status, PostSalePhaseStatus, SalePhaseStatus},
    store::DeskStore,
    types::{PaymentStatus, Phase, RoleKind},
};

struct OnePartner;

impl ParticipantRegistry for OnePartner {
    fn participants(&self, _product_id: &str) -> EngineResult<Vec<Participant>> {
        Ok(vec![Participant {
            name: "Socio".into(),
            participation_percent: 100.0,
        }])
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

fn seed(store: &DeskStore, sale_id: &str) {
    let mut cfg = DevelopmentConfig::new("costa");
    cfg.sale_percent = 3.0;
    cfg.post_sale_percent = 1.0;
    cfg.sales_manager_percent = 1.0;
    cfg.deal_owner_percent = 1.0;
    store.upsert_development_config(&cfg).unwrap();
    store
        .set_global_percent(RoleKind::LegalManager, 0.1)
        .unwrap();

    let mut sale = Sale::new(sale_id, "costa", "u1", 1_000_000.0, date(2025, 3, 14));
    sale.financing_months = Some(24);
    store.upsert_sale(&sale).unwrap();
}

#[test]
fn payment_status_toggles_both_directions() {
    let store = store();
    seed(&store, "s1");
    Calculator::new(&store, &OnePartner)
        .calculate("s1", false)
        .unwrap();

    let rows = store.distribution_rows("s1").unwrap();
    let row_id = rows[0].id.clone();
    assert_eq!(rows[0].payment_status, PaymentStatus::Pending);

    store
        .set_payment_status(&row_id, PaymentStatus::Paid, "ana")
        .unwrap();
    assert_eq!(
        store.get_distribution_row(&row_id).unwrap().payment_status,
        PaymentStatus::Paid
    );

    // No workflow gating: reverting to pending is legal.
    store
        .set_payment_status(&row_id, PaymentStatus::Pending, "ana")
        .unwrap();
    assert_eq!(
        store.get_distribution_row(&row_id).unwrap().payment_status,
        PaymentStatus::Pending
    );
}

#[test]
fn every_payment_transition_is_audited_with_actor() {
    let store = store();
    seed(&store, "s2");
    Calculator::new(&store, &OnePartner)
        .calculate("s2", false)
        .unwrap();

    let row_id = store.distribution_rows("s2").unwrap()[0].id.clone();
    store
        .set_payment_status(&row_id, PaymentStatus::Paid, "ana")
        .unwrap();
    store
        .set_payment_status(&row_id, PaymentStatus::Pending, "luis")
        .unwrap();
    // Setting the current status again is a no-op and leaves no entry.
    store
        .set_payment_status(&row_id, PaymentStatus::Pending, "ana")
        .unwrap();

    let audit = store.audit_for_entity(&row_id).unwrap();
    assert_eq!(audit.len(), 2);
    assert_eq!(audit[0].actor, "ana");
    assert_eq!(audit[0].new_value, "paid");
    assert_eq!(audit[1].actor, "luis");
    assert_eq!(audit[1].new_value, "pending");
}

#[test]
fn sale_phase_projection_follows_the_rows() {
    let store = store();
    seed(&store, "s3");
    Calculator::new(&store, &OnePartner)
        .calculate("s3", false)
        .unwrap();

    let rows = store.distribution_rows("s3").unwrap();
    assert_eq!(sale_phase_status(&rows), SalePhaseStatus::Pending);

    for row in rows.iter().filter(|r| r.phase == Phase::Sale) {
        store
            .set_payment_status(&row.id, PaymentStatus::Paid, "ana")
            .unwrap();
    }
    let rows = store.distribution_rows("s3").unwrap();
    assert_eq!(sale_phase_status(&rows), SalePhaseStatus::Paid);

    assert_eq!(sale_phase_status(&[]), SalePhaseStatus::Hidden);
}

#[test]
fn post_sale_projection_tracks_the_reference_date() {
    let store = store();
    seed(&store, "s4");
    Calculator::new(&store, &OnePartner)
        .calculate("s4", false)
        .unwrap();

    let rows = store.distribution_rows("s4").unwrap();
    let reference = store.partner_records("s4").unwrap()[0].post_sale_reference_date;
    assert_eq!(reference, date(2027, 3, 14));

    assert_eq!(
        post_sale_phase_status(&rows, Some(reference), date(2026, 1, 1)),
        PostSalePhaseStatus::Upcoming
    );
    assert_eq!(
        post_sale_phase_status(&rows, Some(reference), date(2027, 3, 14)),
        PostSalePhaseStatus::Payable
    );

    for row in rows.iter().filter(|r| r.phase == Phase::PostSale) {
        store
            .set_payment_status(&row.id, PaymentStatus::Paid, "ana")
            .unwrap();
    }
    let rows = store.distribution_rows("s4").unwrap();
    assert_eq!(
        post_sale_phase_status(&rows, Some(reference), date(2026, 1, 1)),
        PostSalePhaseStatus::Paid
    );
    assert_eq!(
        post_sale_phase_status(&[], Some(reference), date(2026, 1, 1)),
        PostSalePhaseStatus::Hidden
    );
}

#[test]
fn row_invoice_reference_is_presence_only() {
    let store = store();
    seed(&store, "s5");
    Calculator::new(&store, &OnePartner)
        .calculate("s5", false)
        .unwrap();

    let row_id = store.distribution_rows("s5").unwrap()[0].id.clone();
    assert!(!store.has_row_invoice(&row_id).unwrap());
    store
        .attach_row_invoice(&row_id, "files/dist-0007.pdf")
        .unwrap();
    assert!(store.has_row_invoice(&row_id).unwrap());
}
