//! End-to-end scenarios over the full service stack against an
//! in-memory store: lifecycle, reconciliation, debt ledger and reports.

use cabina_core::billing::TenderSplit;
use cabina_core::{days, Money, PaymentMethod, MovementKind, SeatStatus, SessionStatus};
use cabina_db::Database;
use cabina_service::{
    AccountingService, CloseRequest, DebtOverride, DebtService, LedgerService, RegistryService,
    ServiceError, SessionService,
};
use chrono::{Datelike, Utc};

struct Harness {
    db: Database,
    sessions: SessionService,
    ledger: LedgerService,
    debts: DebtService,
    accounting: AccountingService,
    registry: RegistryService,
}

async fn harness() -> Harness {
    let db = Database::in_memory().await.expect("in-memory db");
    Harness {
        sessions: SessionService::new(db.clone()),
        ledger: LedgerService::new(db.clone()),
        debts: DebtService::new(db.clone()),
        accounting: AccountingService::new(db.clone()),
        registry: RegistryService::new(db.clone()),
        db,
    }
}

async fn seat(h: &Harness, number: &str) -> String {
    h.db.seats().insert(number, 1).await.unwrap().id
}

async fn client(h: &Harness, name: &str) -> String {
    h.db.clients().insert(name, None).await.unwrap().id
}

async fn product(h: &Harness, name: &str, price_cents: i64) -> String {
    h.db.products().insert(name, price_cents, 1).await.unwrap().id
}

fn cents(v: i64) -> Money {
    Money::from_cents(v)
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn open_session_occupies_the_seat() {
    let h = harness().await;
    let seat_id = seat(&h, "PC01").await;
    let client_id = client(&h, "María Quispe").await;

    let session = h.sessions.open_session(&seat_id, &client_id).await.unwrap();
    assert_eq!(session.client_id, client_id);
    assert_eq!(session.seat_id, seat_id);
    assert_eq!(session.seat_number, "PC01");
    assert!(session.is_active());
    assert!(session.end_time.is_none());

    let seat = h.db.seats().get_by_id(&seat_id).await.unwrap().unwrap();
    assert_eq!(seat.status, SeatStatus::Occupied);

    let active = h.sessions.active_session(&seat_id).await.unwrap().unwrap();
    assert_eq!(active.id, session.id);
}

#[tokio::test]
async fn rapid_double_open_admits_exactly_one() {
    let h = harness().await;
    let seat_id = seat(&h, "PC01").await;
    let c1 = client(&h, "María").await;
    let c2 = client(&h, "Luis").await;

    let (a, b) = tokio::join!(
        h.sessions.open_session(&seat_id, &c1),
        h.sessions.open_session(&seat_id, &c2),
    );

    let winners = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(winners, 1, "exactly one open must win");

    let loser = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
    assert!(matches!(loser, ServiceError::SeatUnavailable { .. }));

    // No duplicate active session exists.
    let active = h.db.sessions().active_for_seat(&seat_id).await.unwrap();
    assert!(active.is_some());
}

#[tokio::test]
async fn open_requires_a_known_client() {
    let h = harness().await;
    let seat_id = seat(&h, "PC01").await;

    let err = h
        .sessions
        .open_session(&seat_id, "no-such-client")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));

    // The seat was never touched.
    let seat = h.db.seats().get_by_id(&seat_id).await.unwrap().unwrap();
    assert_eq!(seat.status, SeatStatus::Available);
}

#[tokio::test]
async fn move_session_frees_origin_and_reserves_target() {
    let h = harness().await;
    let origin = seat(&h, "PC01").await;
    let target = seat(&h, "PC02").await;
    let client_id = client(&h, "María").await;

    let session = h.sessions.open_session(&origin, &client_id).await.unwrap();
    let moved = h.sessions.move_session(&session.id, &target).await.unwrap();

    assert_eq!(moved.seat_id, target);
    assert_eq!(moved.seat_number, "PC02");

    let origin_seat = h.db.seats().get_by_id(&origin).await.unwrap().unwrap();
    let target_seat = h.db.seats().get_by_id(&target).await.unwrap().unwrap();
    assert_eq!(origin_seat.status, SeatStatus::Available);
    assert_eq!(target_seat.status, SeatStatus::Occupied);
}

// =============================================================================
// Reconciliation
// =============================================================================

#[tokio::test]
async fn close_with_shortfall_creates_outstanding_debt() {
    let h = harness().await;
    let seat_id = seat(&h, "PC01").await;
    let client_id = client(&h, "María").await;
    let gaseosa = product(&h, "Gaseosa", 500).await;
    let hora = product(&h, "Hora estándar", 1000).await;

    let session = h.sessions.open_session(&seat_id, &client_id).await.unwrap();

    // qty 2 × 5.00 + qty 1 × 10.00 = 20.00
    let line = h.ledger.add_product(&session.id, &gaseosa).await.unwrap();
    h.ledger.set_quantity(&line.id, 2).await.unwrap();
    h.ledger.add_product(&session.id, &hora).await.unwrap();

    let totals = h.ledger.totals(&session.id).await.unwrap();
    assert_eq!(totals.total, cents(2000));

    let closed = h
        .sessions
        .close_session(
            &session.id,
            CloseRequest {
                tender: TenderSplit::cash_only(cents(1500)),
                ..CloseRequest::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(closed.session.status, SessionStatus::Inactive);
    assert_eq!(closed.session.total_cents, 2000);
    assert_eq!(closed.session.cash_cents, 1500);
    assert_eq!(closed.session.debt_cents, 500);
    assert_eq!(closed.session.change_cents, 0);
    assert!(closed.session.end_time.is_some());

    assert_eq!(closed.debt.remaining(), cents(500));
    assert!(!closed.debt.settled);

    // Seat is free for the next rental.
    let seat = h.db.seats().get_by_id(&seat_id).await.unwrap().unwrap();
    assert_eq!(seat.status, SeatStatus::Available);

    // Drawer equation on the frozen row.
    let s = &closed.session;
    assert_eq!(
        s.cash_cents + s.yape_cents + s.plin_cents + s.money_advance_cents
            + s.advance_payment_cents + s.debt_cents - s.change_cents,
        s.total_cents
    );
}

#[tokio::test]
async fn close_balances_with_prepaid_lines_and_change() {
    let h = harness().await;
    let seat_id = seat(&h, "PC01").await;
    let client_id = client(&h, "María").await;
    let gaseosa = product(&h, "Gaseosa", 500).await;
    let hora = product(&h, "Hora estándar", 1500).await;

    let session = h.sessions.open_session(&seat_id, &client_id).await.unwrap();
    let snack = h.ledger.add_product(&session.id, &gaseosa).await.unwrap();
    h.ledger.add_product(&session.id, &hora).await.unwrap();

    // The snack is collected as soon as it is served.
    let advance = h.ledger.toggle_paid(&snack.id, true).await.unwrap();
    assert_eq!(advance, cents(500));

    // Total 20.00, 5.00 prepaid; S/ 20.00 cash covers the 15.00 owed
    // and returns 5.00.
    let closed = h
        .sessions
        .close_session(
            &session.id,
            CloseRequest {
                tender: TenderSplit::cash_only(cents(2000)),
                ..CloseRequest::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(closed.session.total_cents, 2000);
    assert_eq!(closed.session.advance_payment_cents, 500);
    assert_eq!(closed.session.debt_cents, 0);
    assert_eq!(closed.session.change_cents, 500);

    // Zero debt still leaves an audit row, settled immediately.
    assert_eq!(closed.debt.remaining(), Money::zero());
    assert!(closed.debt.settled);
}

#[tokio::test]
async fn close_is_refused_twice() {
    let h = harness().await;
    let seat_id = seat(&h, "PC01").await;
    let client_id = client(&h, "María").await;

    let session = h.sessions.open_session(&seat_id, &client_id).await.unwrap();
    h.sessions
        .close_session(&session.id, CloseRequest::default())
        .await
        .unwrap();

    let err = h
        .sessions
        .close_session(&session.id, CloseRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::SessionNotActive { .. }));
}

#[tokio::test]
async fn debt_override_is_applied_and_audited() {
    let h = harness().await;
    let seat_id = seat(&h, "PC01").await;
    let client_id = client(&h, "María").await;
    let hora = product(&h, "Hora estándar", 1000).await;

    let session = h.sessions.open_session(&seat_id, &client_id).await.unwrap();
    h.ledger.add_product(&session.id, &hora).await.unwrap();

    // Nothing tendered; computed debt would be 10.00, cashier forgives it.
    let closed = h
        .sessions
        .close_session(
            &session.id,
            CloseRequest {
                debt_override: Some(DebtOverride {
                    amount: Money::zero(),
                    reason: "cortesía por corte de luz".to_string(),
                }),
                ..CloseRequest::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(closed.session.debt_cents, 0);
    assert!(closed.debt.settled);
    let observation = closed.session.observation.unwrap();
    assert!(observation.contains("Ajuste manual de deuda"));
    assert!(observation.contains("cortesía por corte de luz"));
}

#[tokio::test]
async fn override_without_reason_is_rejected() {
    let h = harness().await;
    let seat_id = seat(&h, "PC01").await;
    let client_id = client(&h, "María").await;

    let session = h.sessions.open_session(&seat_id, &client_id).await.unwrap();
    let err = h
        .sessions
        .close_session(
            &session.id,
            CloseRequest {
                debt_override: Some(DebtOverride {
                    amount: Money::zero(),
                    reason: "  ".to_string(),
                }),
                ..CloseRequest::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
    // The session is still open.
    let session = h.db.sessions().get_by_id(&session.id).await.unwrap().unwrap();
    assert!(session.is_active());
}

// =============================================================================
// Consumption ledger
// =============================================================================

#[tokio::test]
async fn add_then_remove_roundtrips_the_ledger() {
    let h = harness().await;
    let seat_id = seat(&h, "PC01").await;
    let client_id = client(&h, "María").await;
    let gaseosa = product(&h, "Gaseosa", 500).await;

    let session = h.sessions.open_session(&seat_id, &client_id).await.unwrap();

    let before = h.ledger.list(&session.id).await.unwrap();
    let totals_before = h.ledger.totals(&session.id).await.unwrap();

    let line = h.ledger.add_product(&session.id, &gaseosa).await.unwrap();
    h.ledger.remove(&line.id).await.unwrap();

    let after = h.ledger.list(&session.id).await.unwrap();
    let totals_after = h.ledger.totals(&session.id).await.unwrap();

    assert_eq!(before.len(), after.len());
    assert_eq!(totals_before.total, totals_after.total);
    assert_eq!(totals_before.advance_paid, totals_after.advance_paid);
}

#[tokio::test]
async fn toggle_paid_twice_is_idempotent() {
    let h = harness().await;
    let seat_id = seat(&h, "PC01").await;
    let client_id = client(&h, "María").await;
    let gaseosa = product(&h, "Gaseosa", 500).await;

    let session = h.sessions.open_session(&seat_id, &client_id).await.unwrap();
    let line = h.ledger.add_product(&session.id, &gaseosa).await.unwrap();

    let first = h.ledger.toggle_paid(&line.id, true).await.unwrap();
    let second = h.ledger.toggle_paid(&line.id, true).await.unwrap();
    assert_eq!(first, second);

    let fetched = h.db.consumptions().get_by_id(&line.id).await.unwrap().unwrap();
    assert!(fetched.paid);

    let session = h.db.sessions().get_by_id(&session.id).await.unwrap().unwrap();
    assert_eq!(session.advance_payment_cents, 500);
}

#[tokio::test]
async fn quantity_edits_are_validated_and_paid_lines_frozen() {
    let h = harness().await;
    let seat_id = seat(&h, "PC01").await;
    let client_id = client(&h, "María").await;
    let gaseosa = product(&h, "Gaseosa", 500).await;

    let session = h.sessions.open_session(&seat_id, &client_id).await.unwrap();
    let line = h.ledger.add_product(&session.id, &gaseosa).await.unwrap();

    assert!(matches!(
        h.ledger.set_quantity(&line.id, 0).await.unwrap_err(),
        ServiceError::Validation(_)
    ));
    assert!(matches!(
        h.ledger.set_quantity(&line.id, -3).await.unwrap_err(),
        ServiceError::Validation(_)
    ));

    let line = h.ledger.set_quantity(&line.id, 3).await.unwrap();
    assert_eq!(line.amount_cents, 1500);

    h.ledger.toggle_paid(&line.id, true).await.unwrap();
    assert!(matches!(
        h.ledger.set_quantity(&line.id, 5).await.unwrap_err(),
        ServiceError::LinePaid { .. }
    ));
}

// =============================================================================
// Debt ledger
// =============================================================================

/// Opens a session, accrues `debt_cents` of unpaid consumption and
/// closes with nothing tendered, returning the debt id.
async fn make_debt(h: &Harness, seat_number: &str, client_id: &str, debt_cents: i64) -> String {
    let seat_id = seat(h, seat_number).await;
    let product_id = product(h, "Hora estándar", debt_cents).await;
    let session = h.sessions.open_session(&seat_id, client_id).await.unwrap();
    h.ledger.add_product(&session.id, &product_id).await.unwrap();
    let closed = h
        .sessions
        .close_session(&session.id, CloseRequest::default())
        .await
        .unwrap();
    closed.debt.id
}

#[tokio::test]
async fn full_abono_settles_the_debt() {
    let h = harness().await;
    let client_id = client(&h, "María").await;
    let debt_id = make_debt(&h, "PC01", &client_id, 500).await;

    let posted = h
        .debts
        .post_abono(&debt_id, cents(500), PaymentMethod::Cash, None)
        .await
        .unwrap();

    assert_eq!(posted.debt.remaining(), Money::zero());
    assert!(posted.debt.settled);

    // Settled is terminal.
    let err = h
        .debts
        .post_abono(&debt_id, cents(100), PaymentMethod::Cash, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::DebtSettled { .. }));
}

#[tokio::test]
async fn abonos_respect_bounds_and_reconcile() {
    let h = harness().await;
    let client_id = client(&h, "María").await;
    let debt_id = make_debt(&h, "PC01", &client_id, 1000).await;

    // Outside bounds: zero, negative, above the balance.
    for bad in [0i64, -100, 1100] {
        let err = h
            .debts
            .post_abono(&debt_id, cents(bad), PaymentMethod::Yape, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)), "amount {bad}");
    }

    h.debts
        .post_abono(&debt_id, cents(400), PaymentMethod::Yape, Some("abono parcial"))
        .await
        .unwrap();
    h.debts
        .post_abono(&debt_id, cents(250), PaymentMethod::Plin, None)
        .await
        .unwrap();

    let balance = h.debts.reconciled_balance(&debt_id).await.unwrap();
    assert!(balance.consistent);
    assert_eq!(balance.stored, cents(350));
    assert_eq!(balance.from_ledger, cents(350));

    let payments = h.debts.payments(&debt_id).await.unwrap();
    assert_eq!(payments.len(), 2);
    assert_eq!(payments[0].method, PaymentMethod::Yape);
    assert_eq!(payments[0].detail.as_deref(), Some("abono parcial"));
}

#[tokio::test]
async fn client_debt_listing_filters_by_settled_state() {
    let h = harness().await;
    let client_id = client(&h, "María").await;
    let outstanding = make_debt(&h, "PC01", &client_id, 700).await;
    let settled = make_debt(&h, "PC02", &client_id, 300).await;
    h.debts
        .post_abono(&settled, cents(300), PaymentMethod::Cash, None)
        .await
        .unwrap();

    let today = days::business_day_of(Utc::now());

    let open = h
        .debts
        .debts_for_client(&client_id, today, today, Some(false))
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, outstanding);

    let all = h
        .debts
        .debts_for_client(&client_id, today, today, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

// =============================================================================
// Accounting & reports
// =============================================================================

#[tokio::test]
async fn cash_report_reflects_a_day_of_trade() {
    let h = harness().await;
    let client_id = client(&h, "María").await;
    let hora = product(&h, "Hora estándar", 1000).await;
    let gaseosa = product(&h, "Gaseosa", 500).await;

    // One closed session: 15.00 total, 10.00 cash + 5.00 yape.
    let s1_seat = seat(&h, "PC01").await;
    let s1 = h.sessions.open_session(&s1_seat, &client_id).await.unwrap();
    h.ledger.add_product(&s1.id, &hora).await.unwrap();
    h.ledger.add_product(&s1.id, &gaseosa).await.unwrap();
    h.sessions
        .close_session(
            &s1.id,
            CloseRequest {
                tender: TenderSplit {
                    cash: cents(1000),
                    yape: cents(500),
                    ..TenderSplit::default()
                },
                ..CloseRequest::default()
            },
        )
        .await
        .unwrap();

    // One still-open session with 5.00 accrued.
    let s2_seat = seat(&h, "PC02").await;
    let s2 = h.sessions.open_session(&s2_seat, &client_id).await.unwrap();
    h.ledger.add_product(&s2.id, &gaseosa).await.unwrap();

    // Manual drawer movements and a debt recovery.
    h.accounting
        .record_movement(MovementKind::Ingreso, cents(2000), "fondo inicial")
        .await
        .unwrap();
    h.accounting
        .record_movement(MovementKind::Egreso, cents(300), "compra de útiles")
        .await
        .unwrap();
    let debt_id = make_debt(&h, "PC03", &client_id, 800).await;
    h.debts
        .post_abono(&debt_id, cents(800), PaymentMethod::Cash, None)
        .await
        .unwrap();

    let today = days::business_day_of(Utc::now());
    let report = h.accounting.cash_report(today, today).await.unwrap();

    assert_eq!(report.sessions.cash, cents(1000));
    assert_eq!(report.sessions.yape, cents(500));
    assert_eq!(report.session_debt, cents(800));
    assert_eq!(report.outstanding, cents(500));
    assert_eq!(report.income, cents(2000));
    assert_eq!(report.expense, cents(300));
    assert_eq!(report.recovered.cash, cents(800));
    assert_eq!(report.cash_in_drawer(), cents(1000 + 800 + 2000));
}

#[tokio::test]
async fn monthly_report_groups_by_business_day() {
    let h = harness().await;
    let client_id = client(&h, "María").await;
    let hora = product(&h, "Hora estándar", 1000).await;

    let seat_id = seat(&h, "PC01").await;
    for _ in 0..2 {
        let session = h.sessions.open_session(&seat_id, &client_id).await.unwrap();
        h.ledger.add_product(&session.id, &hora).await.unwrap();
        h.sessions
            .close_session(
                &session.id,
                CloseRequest {
                    tender: TenderSplit::cash_only(cents(1000)),
                    ..CloseRequest::default()
                },
            )
            .await
            .unwrap();
    }

    let today = days::business_day_of(Utc::now());
    let report = h
        .accounting
        .monthly_sessions(today.year(), today.month())
        .await
        .unwrap();

    assert_eq!(report.days.len(), 1);
    assert_eq!(report.days[0].day, today);
    assert_eq!(report.days[0].sessions, 2);
    assert_eq!(report.totals.sessions, 2);
    assert_eq!(report.totals.cash, cents(2000));

    let err = h.accounting.monthly_sessions(2026, 13).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn history_lists_closed_sessions_and_observation_stays_editable() {
    let h = harness().await;
    let seat_id = seat(&h, "PC07").await;
    let client_id = client(&h, "María").await;
    let gaseosa = product(&h, "Gaseosa", 500).await;

    let session = h.sessions.open_session(&seat_id, &client_id).await.unwrap();
    h.ledger.add_product(&session.id, &gaseosa).await.unwrap();
    h.sessions
        .close_session(
            &session.id,
            CloseRequest {
                tender: TenderSplit::cash_only(cents(500)),
                ..CloseRequest::default()
            },
        )
        .await
        .unwrap();

    // The one post-close mutation: the observation text.
    h.sessions
        .update_observation(&session.id, "cliente frecuente")
        .await
        .unwrap();

    let today = days::business_day_of(Utc::now());
    let history = h.sessions.seat_history("PC07", today, today).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].session.status, SessionStatus::Inactive);
    assert_eq!(
        history[0].session.observation.as_deref(),
        Some("cliente frecuente")
    );
    assert_eq!(history[0].consumptions.len(), 1);
    assert_eq!(history[0].consumptions[0].product_name, "Gaseosa");
}

// =============================================================================
// Registry
// =============================================================================

#[tokio::test]
async fn maintenance_seats_cannot_host_sessions() {
    let h = harness().await;
    let seat_id = seat(&h, "PC01").await;
    let client_id = client(&h, "María").await;

    h.registry.set_maintenance(&seat_id, true).await.unwrap();

    let err = h
        .sessions
        .open_session(&seat_id, &client_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::SeatUnavailable { .. }));

    // Back in service, it opens normally.
    h.registry.set_maintenance(&seat_id, false).await.unwrap();
    assert!(h.sessions.open_session(&seat_id, &client_id).await.is_ok());
}

#[tokio::test]
async fn occupied_seats_cannot_be_flagged_for_maintenance() {
    let h = harness().await;
    let seat_id = seat(&h, "PC01").await;
    let client_id = client(&h, "María").await;

    h.sessions.open_session(&seat_id, &client_id).await.unwrap();

    let err = h.registry.set_maintenance(&seat_id, true).await.unwrap_err();
    assert!(matches!(err, ServiceError::SeatUnavailable { .. }));
}

#[tokio::test]
async fn client_registration_is_validated_and_searchable() {
    let h = harness().await;

    assert!(matches!(
        h.registry.add_client("   ", None).await.unwrap_err(),
        ServiceError::Validation(_)
    ));

    h.registry
        .add_client("María Quispe", Some("Mari"))
        .await
        .unwrap();

    let hits = h.registry.search_clients("Mar").await.unwrap();
    assert_eq!(hits.len(), 1);

    let available = h.registry.available_seats().await.unwrap();
    assert!(available.is_empty());
}

#[tokio::test]
async fn movement_validation_holds_the_line() {
    let h = harness().await;

    assert!(matches!(
        h.accounting
            .record_movement(MovementKind::Ingreso, Money::zero(), "nada")
            .await
            .unwrap_err(),
        ServiceError::Validation(_)
    ));

    assert!(matches!(
        h.accounting
            .record_movement(MovementKind::Egreso, cents(100), "   ")
            .await
            .unwrap_err(),
        ServiceError::Validation(_)
    ));
}
