use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::order_totals::{PaymentWithRemaining, Totals};

/// Registro directo de un pago sobre un pedido
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub order_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub paid_at: Option<DateTime<Utc>>,
    pub method: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentRequest {
    pub payment_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub paid_at: Option<DateTime<Utc>>,
    pub method: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovePaymentRequest {
    pub payment_id: Option<Uuid>,
}

/// Segundo paso del flujo OCR: crea el pago pendiente de aprobación
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReceiptRequest {
    pub amount: Option<serde_json::Value>,
    pub paid_at: Option<DateTime<Utc>>,
    pub method: Option<String>,
    pub receipt_url: Option<String>,
    pub ocr_text: Option<String>,
}

/// Estado de pagos de un pedido con el restante corriente
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPaymentsResponse {
    pub id: Uuid,
    pub total: Decimal,
    pub paid: Decimal,
    pub restante: Decimal,
    pub payments: Vec<PaymentWithRemaining>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentTotals {
    pub total: Decimal,
    pub paid: Decimal,
    pub restante: Decimal,
}

impl From<Totals> for CurrentTotals {
    fn from(totals: Totals) -> Self {
        Self {
            total: totals.total,
            paid: totals.paid,
            restante: totals.restante,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedTotals {
    pub amount_to_pay: Decimal,
    pub restante_after: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptInfo {
    pub receipt_url: Option<String>,
    pub ocr_text: String,
}

/// Respuesta del preview OCR: nada se persiste en este paso
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrPreviewResponse {
    pub ok: bool,
    pub order_id: Uuid,
    pub current: CurrentTotals,
    pub detected_amount: Decimal,
    pub projected: ProjectedTotals,
    pub receipt: ReceiptInfo,
}
