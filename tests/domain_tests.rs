//! Escenarios de negocio de punta a punta sobre los servicios puros:
//! bloqueo de agenda, totales y estados de pedido, flujo OCR y series
//! del dashboard.

use axum::response::IntoResponse;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use taller_api::models::order::{ItemKind, OrderItem, OrderStatus, Payment};
use taller_api::models::visit::{Visit, VisitStatus};
use taller_api::services::dashboard::{compute_series, OrderFinancials};
use taller_api::services::order_status;
use taller_api::services::order_totals;
use taller_api::services::slot_allocator;
use taller_api::utils::errors::AppError;
use taller_api::utils::ocr::parse_amount_from_text;

fn visit_at(dt: DateTime<Utc>, status: VisitStatus) -> Visit {
    Visit {
        id: Uuid::new_v4(),
        user_id: Some(Uuid::new_v4()),
        guest_name: None,
        guest_email: None,
        guest_phone: None,
        visit_date: dt,
        visit_time: None,
        address: "Calle 1".to_string(),
        status,
        service_ids: Vec::new(),
        description: None,
        created_at: Utc::now(),
    }
}

fn order_item(value: i64) -> OrderItem {
    OrderItem {
        id: Uuid::new_v4(),
        order_id: Uuid::nil(),
        kind: ItemKind::Servicio,
        product_id: None,
        service_id: None,
        image_url: None,
        detail: None,
        quantity: 1,
        value: Some(Decimal::from(value)),
    }
}

fn payment(amount: i64, status: &str) -> Payment {
    Payment {
        id: Uuid::new_v4(),
        order_id: Uuid::nil(),
        amount: Decimal::from(amount),
        paid_at: Utc::now(),
        method: "comprobante".to_string(),
        status: status.to_string(),
        receipt_url: None,
        ocr_text: None,
    }
}

#[test]
fn visit_at_ten_blocks_eleven_and_twelve_but_not_thirteen() {
    let existing = vec![visit_at(
        Utc.with_ymd_and_hms(2026, 2, 10, 10, 0, 0).unwrap(),
        VisitStatus::Pendiente,
    )];

    let eleven = Utc.with_ymd_and_hms(2026, 2, 10, 11, 0, 0).unwrap();
    let twelve = Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap();
    let thirteen = Utc.with_ymd_and_hms(2026, 2, 10, 13, 0, 0).unwrap();

    assert!(slot_allocator::find_conflict(&existing, eleven).is_some());
    assert!(slot_allocator::find_conflict(&existing, twelve).is_some());
    assert!(slot_allocator::find_conflict(&existing, thirteen).is_none());
}

#[test]
fn slot_conflict_maps_to_409_with_context() {
    let conflict_id = Uuid::new_v4();
    let conflict_date = Utc.with_ymd_and_hms(2026, 2, 10, 10, 0, 0).unwrap();

    let response = AppError::SlotConflict {
        conflict_visit_id: conflict_id,
        conflict_visit_date: conflict_date,
    }
    .into_response();

    assert_eq!(response.status(), axum::http::StatusCode::CONFLICT);
}

#[test]
fn cancelled_visits_do_not_block() {
    let existing = vec![visit_at(
        Utc.with_ymd_and_hms(2026, 2, 10, 10, 0, 0).unwrap(),
        VisitStatus::Cancelada,
    )];

    let eleven = Utc.with_ymd_and_hms(2026, 2, 10, 11, 0, 0).unwrap();
    assert!(slot_allocator::find_conflict(&existing, eleven).is_none());
}

#[test]
fn pairwise_three_hour_distance_holds_after_booking_sequence() {
    let candidates: Vec<DateTime<Utc>> = (8..=20)
        .map(|h| Utc.with_ymd_and_hms(2026, 2, 10, h, 0, 0).unwrap())
        .collect();

    let mut booked: Vec<Visit> = Vec::new();
    for candidate in candidates {
        if slot_allocator::find_conflict(&booked, candidate).is_none() {
            booked.push(visit_at(candidate, VisitStatus::Pendiente));
        }
    }

    for (i, a) in booked.iter().enumerate() {
        for b in booked.iter().skip(i + 1) {
            let diff = (a.visit_date - b.visit_date).abs();
            assert!(diff >= chrono::Duration::hours(3));
        }
    }
}

#[test]
fn totals_identities_hold() {
    let items = vec![order_item(100), order_item(200)];
    let payments = vec![
        payment(80, "aprobado"),
        payment(40, "Confirmado"),
        payment(500, "pendiente"),
    ];

    let totals = order_totals::compute_totals(&items, &payments);
    assert_eq!(totals.total, Decimal::from(300));
    assert_eq!(totals.paid, Decimal::from(120));
    assert_eq!(totals.restante, totals.total - totals.paid);

    // El sobrepago deja restante negativo
    let overpaid = order_totals::compute_totals(&[order_item(100)], &[payment(150, "aprobado")]);
    assert_eq!(overpaid.restante, Decimal::from(-50));
}

#[test]
fn order_status_progresses_with_payments_and_keeps_production_seal() {
    let total = Decimal::from(300);
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let t1 = Utc.with_ymd_and_hms(2026, 3, 5, 9, 0, 0).unwrap();

    assert_eq!(order_status::derive_status(total, Decimal::ZERO), OrderStatus::Pendiente);
    assert_eq!(order_status::derive_status(total, Decimal::from(50)), OrderStatus::AbonoParcial);

    let at_threshold = order_status::recompute(
        &order_totals::Totals {
            total,
            paid: Decimal::from(90),
            restante: Decimal::from(210),
        },
        None,
        t0,
    );
    assert_eq!(at_threshold.status, OrderStatus::EnProceso);
    assert_eq!(at_threshold.production_started_at, Some(t0));

    let settled = order_status::recompute(
        &order_totals::Totals {
            total,
            paid: total,
            restante: Decimal::ZERO,
        },
        at_threshold.production_started_at,
        t1,
    );
    assert_eq!(settled.status, OrderStatus::Completado);
    assert_eq!(settled.production_started_at, Some(t0));
}

#[test]
fn ocr_preview_and_submit_flow_arithmetic() {
    // Pedido de 300 sin pagos aprobados
    let items = vec![order_item(300)];
    let mut payments: Vec<Payment> = Vec::new();

    let totals = order_totals::compute_totals(&items, &payments);
    assert_eq!(totals.total, Decimal::from(300));
    assert_eq!(totals.restante, Decimal::from(300));

    // El OCR detecta 150 en el comprobante
    let detected = parse_amount_from_text("Transferencia exitosa por $150 a Taller").unwrap();
    assert_eq!(detected, Decimal::from(150));

    // Proyección del preview: nada se persiste todavía
    let projected_after = totals.restante - detected;
    assert_eq!(projected_after, Decimal::from(150));

    // El submit crea el pago pendiente: no afecta el pagado aprobado
    payments.push(payment(150, "pendiente"));
    let after_submit = order_totals::compute_totals(&items, &payments);
    assert_eq!(after_submit.paid, Decimal::ZERO);
    assert_eq!(after_submit.restante, Decimal::from(300));

    // Al aprobarse, el pago cuenta y el estado cruza el umbral del 30%
    payments[0].status = "aprobado".to_string();
    let after_approval = order_totals::compute_totals(&items, &payments);
    assert_eq!(after_approval.paid, Decimal::from(150));
    assert_eq!(
        order_status::derive_status(after_approval.total, after_approval.paid),
        OrderStatus::EnProceso
    );
}

#[test]
fn ocr_undetected_amount_maps_to_422() {
    let response = AppError::Unprocessable {
        message: "No se pudo detectar un monto válido en el comprobante".to_string(),
        ocr_text: Some("texto sin montos".to_string()),
    }
    .into_response();

    assert_eq!(response.status(), axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn dashboard_full_year_with_one_settled_january_order() {
    let rows = vec![OrderFinancials {
        started_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
        total: Decimal::from(150),
        paid: Decimal::from(150),
    }];

    let from = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
    let (summary, series) = compute_series(from, to, &rows);

    assert_eq!(summary.total_sales, 1);
    assert_eq!(summary.total_revenue, Decimal::from(150));

    assert_eq!(series.monthly.len(), 12);
    assert_eq!(series.monthly[0].period, "2026-01");
    assert_eq!(series.monthly[0].revenue, Decimal::from(150));

    // Las series derivadas suman exactamente lo mismo que la mensual
    let monthly_total: Decimal = series.monthly.iter().map(|b| b.revenue).sum();
    let quarterly_total: Decimal = series.quarterly.iter().map(|b| b.revenue).sum();
    let semiannual_total: Decimal = series.semiannual.iter().map(|b| b.revenue).sum();
    assert_eq!(monthly_total, quarterly_total);
    assert_eq!(monthly_total, semiannual_total);
}

#[test]
fn dashboard_excludes_orders_with_outstanding_balance() {
    let rows = vec![
        OrderFinancials {
            started_at: Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap(),
            total: Decimal::from(150),
            paid: Decimal::from(150),
        },
        OrderFinancials {
            started_at: Utc.with_ymd_and_hms(2026, 1, 20, 10, 0, 0).unwrap(),
            total: Decimal::from(900),
            paid: Decimal::from(300),
        },
    ];

    let from = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
    let (summary, _) = compute_series(from, to, &rows);

    assert_eq!(summary.total_sales, 1);
    assert_eq!(summary.total_revenue, Decimal::from(150));
}
