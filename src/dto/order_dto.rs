use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::order::{Attachment, ItemKind, InitialPayment, Order, OrderItem, Payment, Review};
use crate::models::user::UserSummary;
use crate::services::order_totals::Totals;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub kind: Option<ItemKind>,
    pub product_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub detail: Option<String>,
    pub quantity: Option<i32>,
    pub value: Option<Decimal>,
}

impl OrderItemRequest {
    /// El tipo explícito manda; si falta, lo decide la referencia presente
    pub fn resolved_kind(&self) -> ItemKind {
        self.kind.unwrap_or(if self.product_id.is_some() {
            ItemKind::Producto
        } else {
            ItemKind::Servicio
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialPaymentRequest {
    pub amount: Decimal,
    pub method: Option<String>,
}

/// Alta de pedido por el administrador
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub user: Option<Uuid>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    pub address: Option<String>,
    pub started_at: Option<String>,
    pub initial_payment: Option<InitialPaymentRequest>,
}

/// Alta de pedido por el propio cliente
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMyOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "rating must be a number between 1 and 5"))]
    pub rating: i32,
    pub comment: Option<String>,
}

/// Pedido con todo lo que el detalle necesita
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
    pub attachments: Vec<Attachment>,
    pub reviews: Vec<Review>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_payment: Option<InitialPayment>,
    pub total: Decimal,
    pub paid: Decimal,
    pub restante: Decimal,
    pub necesita_abono: bool,
    pub porcentaje_abono: f64,
    pub puede_iniciar_produccion: bool,
}

/// Resumen para el listado del cliente
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyOrderSummary {
    pub id: Uuid,
    pub nombre: String,
    pub estado: String,
    pub valor: Decimal,
    pub restante: Decimal,
    pub dias: String,
    pub requiere_abono: bool,
    pub porcentaje_abono: f64,
}

/// Fila del listado administrativo con totales anotados
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminOrderSummary {
    #[serde(flatten)]
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    pub total: Decimal,
    pub paid: Decimal,
    pub restante: Decimal,
    pub necesita_abono: bool,
    pub payment_status: String,
}

pub fn deposit_flags(totals: &Totals, initial_amount: Decimal) -> (bool, f64) {
    use num_traits::ToPrimitive;

    let needs_deposit = initial_amount < crate::services::order_status::production_threshold(totals.total);
    let percent = if totals.total > Decimal::ZERO {
        (initial_amount / totals.total * Decimal::from(100))
            .to_f64()
            .unwrap_or(0.0)
    } else {
        0.0
    };
    (needs_deposit, percent)
}

/// Días estimados de producción restantes (ciclo de 15 días desde el inicio)
pub fn dias_restantes(started_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match started_at {
        None => "–".to_string(),
        Some(start) => {
            let end = start + chrono::Duration::days(15);
            let diff = (end - now).num_days();
            if diff <= 0 {
                "0 Días".to_string()
            } else {
                format!("{} Días", diff)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_dias_restantes() {
        let now = Utc.with_ymd_and_hms(2026, 1, 20, 12, 0, 0).unwrap();
        assert_eq!(dias_restantes(None, now), "–");

        let start = Utc.with_ymd_and_hms(2026, 1, 10, 12, 0, 0).unwrap();
        assert_eq!(dias_restantes(Some(start), now), "5 Días");

        let old = Utc.with_ymd_and_hms(2025, 12, 1, 12, 0, 0).unwrap();
        assert_eq!(dias_restantes(Some(old), now), "0 Días");
    }

    #[test]
    fn test_deposit_flags() {
        let totals = Totals {
            total: Decimal::from(1000),
            paid: Decimal::ZERO,
            restante: Decimal::from(1000),
        };
        let (needs, percent) = deposit_flags(&totals, Decimal::from(200));
        assert!(needs);
        assert!((percent - 20.0).abs() < f64::EPSILON);

        let (needs, percent) = deposit_flags(&totals, Decimal::from(300));
        assert!(!needs);
        assert!((percent - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_resolved_kind_infers_from_reference() {
        let item = OrderItemRequest {
            kind: None,
            product_id: Some(Uuid::new_v4()),
            service_id: None,
            detail: None,
            quantity: None,
            value: None,
        };
        assert_eq!(item.resolved_kind(), ItemKind::Producto);
    }
}
