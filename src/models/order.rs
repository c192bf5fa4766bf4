//! Modelo de pedido
//!
//! Un pedido agrupa items, pagos, adjuntos y reseñas. El total sale de los
//! items y el pagado de los pagos aprobados; el estado se deriva de esos
//! dos valores (ver `services::order_status`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Estado del pedido según el avance de pagos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum OrderStatus {
    #[serde(rename = "Pendiente")]
    #[sqlx(rename = "Pendiente")]
    Pendiente,
    #[serde(rename = "Pendiente (abono parcial)")]
    #[sqlx(rename = "Pendiente (abono parcial)")]
    AbonoParcial,
    #[serde(rename = "En proceso")]
    #[sqlx(rename = "En proceso")]
    EnProceso,
    #[serde(rename = "Completado")]
    #[sqlx(rename = "Completado")]
    Completado,
    #[serde(rename = "Cancelado")]
    #[sqlx(rename = "Cancelado")]
    Cancelado,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendiente => "Pendiente",
            OrderStatus::AbonoParcial => "Pendiente (abono parcial)",
            OrderStatus::EnProceso => "En proceso",
            OrderStatus::Completado => "Completado",
            OrderStatus::Cancelado => "Cancelado",
        }
    }
}

/// Tipo de línea del pedido
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum ItemKind {
    #[serde(rename = "producto")]
    #[sqlx(rename = "producto")]
    Producto,
    #[serde(rename = "servicio")]
    #[sqlx(rename = "servicio")]
    Servicio,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub address: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub production_started_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub initial_payment_amount: Option<Decimal>,
    #[serde(skip)]
    pub initial_payment_method: Option<String>,
    #[serde(skip)]
    pub initial_payment_registered_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub initial_payment_registered_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Abono inicial registrado al crear el pedido
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialPayment {
    pub amount: Decimal,
    pub method: Option<String>,
    pub registered_at: Option<DateTime<Utc>>,
    pub registered_by: Option<Uuid>,
}

impl Order {
    pub fn initial_payment(&self) -> Option<InitialPayment> {
        self.initial_payment_amount.map(|amount| InitialPayment {
            amount,
            method: self.initial_payment_method.clone(),
            registered_at: self.initial_payment_registered_at,
            registered_by: self.initial_payment_registered_by,
        })
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub kind: ItemKind,
    pub product_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub detail: Option<String>,
    pub quantity: i32,
    pub value: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
    pub method: String,
    pub status: String,
    pub receipt_url: Option<String>,
    pub ocr_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub item_id: Option<Uuid>,
    pub url: String,
    pub kind: String,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
