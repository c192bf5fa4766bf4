//! Modelo de cotización
//!
//! Una cotización nace como carrito, se solicita, el administrador la
//! cotiza y el cliente la acepta o rechaza. Un item referencia un
//! producto del catálogo o describe una pieza a medida; nunca ambas.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum QuotationStatus {
    #[serde(rename = "Carrito")]
    #[sqlx(rename = "Carrito")]
    Carrito,
    #[serde(rename = "Solicitada")]
    #[sqlx(rename = "Solicitada")]
    Solicitada,
    #[serde(rename = "En proceso")]
    #[sqlx(rename = "En proceso")]
    EnProceso,
    #[serde(rename = "Cotizada")]
    #[sqlx(rename = "Cotizada")]
    Cotizada,
    #[serde(rename = "Cerrada")]
    #[sqlx(rename = "Cerrada")]
    Cerrada,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum QuotationItemStatus {
    Normal,
    PendingQuote,
    Quoted,
    Confirmed,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: QuotationStatus,
    pub total_estimate: Decimal,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Un item es de catálogo o a medida; la variante reemplaza al viejo
/// chequeo dinámico de `isCustom`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QuotationItemKind {
    #[serde(rename_all = "camelCase")]
    Catalog { product_id: Uuid },
    #[serde(rename_all = "camelCase")]
    Custom {
        name: String,
        description: String,
        wood_type: String,
        reference_image: Option<String>,
    },
}

impl QuotationItemKind {
    pub fn is_custom(&self) -> bool {
        matches!(self, QuotationItemKind::Custom { .. })
    }

    pub fn product_id(&self) -> Option<Uuid> {
        match self {
            QuotationItemKind::Catalog { product_id } => Some(*product_id),
            QuotationItemKind::Custom { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationItem {
    pub id: Uuid,
    pub quotation_id: Uuid,
    #[serde(flatten)]
    pub kind: QuotationItemKind,
    pub quantity: i32,
    pub color: String,
    pub size: String,
    pub price: Decimal,
    pub admin_notes: String,
    pub item_status: QuotationItemStatus,
}

/// Fila cruda de `quotation_items`; el repositorio la convierte a la
/// variante etiquetada.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuotationItemRow {
    pub id: Uuid,
    pub quotation_id: Uuid,
    pub is_custom: bool,
    pub product_id: Option<Uuid>,
    pub custom_name: Option<String>,
    pub custom_description: Option<String>,
    pub custom_wood_type: Option<String>,
    pub custom_reference_image: Option<String>,
    pub quantity: i32,
    pub color: String,
    pub size: String,
    pub price: Decimal,
    pub admin_notes: String,
    pub item_status: QuotationItemStatus,
}

impl QuotationItemRow {
    pub fn into_item(self) -> Option<QuotationItem> {
        let kind = if self.is_custom {
            QuotationItemKind::Custom {
                name: self.custom_name?,
                description: self.custom_description?,
                wood_type: self.custom_wood_type.unwrap_or_else(|| "Por definir".to_string()),
                reference_image: self.custom_reference_image,
            }
        } else {
            QuotationItemKind::Catalog {
                product_id: self.product_id?,
            }
        };

        Some(QuotationItem {
            id: self.id,
            quotation_id: self.quotation_id,
            kind,
            quantity: self.quantity,
            color: self.color,
            size: self.size,
            price: self.price,
            admin_notes: self.admin_notes,
            item_status: self.item_status,
        })
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub quotation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
