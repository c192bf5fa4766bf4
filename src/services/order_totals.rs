//! Cálculo de totales de un pedido
//!
//! total = suma de valores de items; pagado = suma de pagos aprobados
//! (estado `aprobado` o `confirmado`, sin distinguir mayúsculas);
//! restante = total - pagado y puede quedar negativo si hay sobrepago.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::order::{OrderItem, Payment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total: Decimal,
    pub paid: Decimal,
    pub restante: Decimal,
}

/// Estados de pago que cuentan como aprobados
pub fn is_approved_status(status: &str) -> bool {
    let lowered = status.trim().to_lowercase();
    lowered == "aprobado" || lowered == "confirmado"
}

/// Calcular total, pagado y restante de un pedido
pub fn compute_totals(items: &[OrderItem], payments: &[Payment]) -> Totals {
    let total: Decimal = items.iter().filter_map(|i| i.value).sum();

    let paid: Decimal = payments
        .iter()
        .filter(|p| is_approved_status(&p.status))
        .map(|p| p.amount)
        .sum();

    Totals {
        total,
        paid,
        restante: total - paid,
    }
}

/// Pago anotado con el restante acumulado hasta ese pago
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentWithRemaining {
    #[serde(flatten)]
    pub payment: Payment,
    pub restante: Decimal,
}

/// Anotar cada pago con el saldo pendiente en ese momento. Solo los pagos
/// aprobados mueven el acumulado, igual que en el cálculo de totales.
pub fn payments_with_running_remaining(
    items: &[OrderItem],
    payments: &[Payment],
) -> Vec<PaymentWithRemaining> {
    let total: Decimal = items.iter().filter_map(|i| i.value).sum();
    let mut accumulated = Decimal::ZERO;

    payments
        .iter()
        .map(|p| {
            if is_approved_status(&p.status) {
                accumulated += p.amount;
            }
            PaymentWithRemaining {
                payment: p.clone(),
                restante: total - accumulated,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::ItemKind;
    use chrono::Utc;
    use uuid::Uuid;

    fn item(value: Option<i64>) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::nil(),
            kind: ItemKind::Servicio,
            product_id: None,
            service_id: None,
            image_url: None,
            detail: None,
            quantity: 1,
            value: value.map(Decimal::from),
        }
    }

    fn payment(amount: i64, status: &str) -> Payment {
        Payment {
            id: Uuid::new_v4(),
            order_id: Uuid::nil(),
            amount: Decimal::from(amount),
            paid_at: Utc::now(),
            method: "qr".to_string(),
            status: status.to_string(),
            receipt_url: None,
            ocr_text: None,
        }
    }

    #[test]
    fn test_totals_sum_items_and_approved_payments() {
        let items = vec![item(Some(100)), item(Some(200)), item(None)];
        let payments = vec![
            payment(50, "aprobado"),
            payment(30, "CONFIRMADO"),
            payment(999, "pendiente"),
            payment(10, "rechazado"),
        ];

        let totals = compute_totals(&items, &payments);
        assert_eq!(totals.total, Decimal::from(300));
        assert_eq!(totals.paid, Decimal::from(80));
        assert_eq!(totals.restante, Decimal::from(220));
    }

    #[test]
    fn test_remaining_can_go_negative() {
        let totals = compute_totals(&[item(Some(100))], &[payment(150, "aprobado")]);
        assert_eq!(totals.restante, Decimal::from(-50));
    }

    #[test]
    fn test_empty_order() {
        let totals = compute_totals(&[], &[]);
        assert_eq!(totals.total, Decimal::ZERO);
        assert_eq!(totals.paid, Decimal::ZERO);
        assert_eq!(totals.restante, Decimal::ZERO);
    }

    #[test]
    fn test_running_remaining_only_moves_on_approved() {
        let items = vec![item(Some(300))];
        let payments = vec![
            payment(100, "aprobado"),
            payment(50, "pendiente"),
            payment(100, "confirmado"),
        ];

        let annotated = payments_with_running_remaining(&items, &payments);
        let remaining: Vec<Decimal> = annotated.iter().map(|p| p.restante).collect();
        assert_eq!(
            remaining,
            vec![Decimal::from(200), Decimal::from(200), Decimal::from(100)]
        );
    }
}
