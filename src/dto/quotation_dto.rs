use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::catalog::Product;
use crate::models::quotation::{Quotation, QuotationItem};
use crate::models::user::UserSummary;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomDetailsRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub wood_type: Option<String>,
    pub reference_image: Option<String>,
}

/// Item agregado a una cotización existente (catálogo o a medida)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub is_custom: bool,
    pub custom_details: Option<CustomDetailsRequest>,
    pub quantity: Option<i32>,
    pub color: Option<String>,
    pub size: Option<String>,
}

/// Producto de catálogo al carrito
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCartItemRequest {
    pub product_id: Option<Uuid>,
    pub quantity: Option<i32>,
    pub color: Option<String>,
    pub size: Option<String>,
}

/// Pieza a medida al carrito
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCustomCartItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub wood_type: Option<String>,
    pub reference_image: Option<String>,
    pub quantity: Option<i32>,
    pub color: Option<String>,
    pub size: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub quantity: Option<i32>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub price: Option<Decimal>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartQuantityRequest {
    pub item_id: Option<Uuid>,
    pub quantity: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminQuoteItemUpdate {
    #[serde(alias = "_id")]
    pub item_id: Option<Uuid>,
    pub price: Option<Decimal>,
    pub admin_notes: Option<String>,
}

/// Precios y notas que fija el administrador al cotizar
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminQuoteRequest {
    pub items: Option<Vec<AdminQuoteItemUpdate>>,
    pub total_estimate: Option<Decimal>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickCreateRequest {
    #[serde(default)]
    pub items: Vec<AddItemRequest>,
    pub admin_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuotationsQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Item con el producto de catálogo resuelto
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationItemResponse {
    #[serde(flatten)]
    pub item: QuotationItem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationResponse {
    #[serde(flatten)]
    pub quotation: Quotation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    pub items: Vec<QuotationItemResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionResponse {
    pub ok: bool,
    pub deleted: bool,
    pub quotation_id: Uuid,
}
