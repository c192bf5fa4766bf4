//! Pagos de pedidos
//!
//! Registro directo, edición y el flujo asistido por OCR: un preview que
//! no persiste nada y un submit que crea el pago pendiente de aprobación.
//! Cada mutación de pagos recalcula el estado del pedido.

use chrono::Utc;
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::dto::payment_dto::{
    CreatePaymentRequest, CurrentTotals, OcrPreviewResponse, OrderPaymentsResponse,
    ProjectedTotals, ReceiptInfo, RemovePaymentRequest, SubmitReceiptRequest,
    UpdatePaymentRequest,
};
use crate::models::order::Payment;
use crate::repositories::order_repository::{NewPayment, OrderRepository, UpdatePaymentFields};
use crate::services::order_totals;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::ocr::parse_amount_from_text;

pub struct PaymentController {
    state: AppState,
    orders: OrderRepository,
}

impl PaymentController {
    pub fn new(state: AppState) -> Self {
        let pool = state.pool.clone();
        Self {
            state,
            orders: OrderRepository::new(pool),
        }
    }

    /// Estado de pagos de todos los pedidos, cada pago con su restante
    pub async fn list(&self) -> Result<Vec<OrderPaymentsResponse>, AppError> {
        let orders = self.orders.list_all().await?;
        let mut result = Vec::with_capacity(orders.len());

        for order in orders {
            result.push(self.payments_of(order.id).await?);
        }

        Ok(result)
    }

    pub async fn get(&self, order_id: Uuid) -> Result<OrderPaymentsResponse, AppError> {
        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        self.payments_of(order_id).await
    }

    async fn payments_of(&self, order_id: Uuid) -> Result<OrderPaymentsResponse, AppError> {
        let items = self.orders.items(order_id).await?;
        let payments = self.orders.payments(order_id).await?;

        let totals = order_totals::compute_totals(&items, &payments);
        let annotated = order_totals::payments_with_running_remaining(&items, &payments);

        Ok(OrderPaymentsResponse {
            id: order_id,
            total: totals.total,
            paid: totals.paid,
            restante: totals.restante,
            payments: annotated,
        })
    }

    pub async fn create(&self, request: CreatePaymentRequest) -> Result<Payment, AppError> {
        let (order_id, amount, paid_at, method, status) = match (
            request.order_id,
            request.amount,
            request.paid_at,
            request.method,
            request.status,
        ) {
            (Some(order_id), Some(amount), Some(paid_at), Some(method), Some(status)) => {
                (order_id, amount, paid_at, method, status)
            }
            _ => {
                return Err(AppError::Validation(
                    "orderId, amount, paidAt, method, status are required".to_string(),
                ))
            }
        };

        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        let payment = self
            .orders
            .add_payment(
                order_id,
                NewPayment {
                    amount,
                    paid_at,
                    method,
                    status,
                    receipt_url: None,
                    ocr_text: None,
                },
                Utc::now(),
            )
            .await?;

        Ok(payment)
    }

    pub async fn update(
        &self,
        order_id: Uuid,
        request: UpdatePaymentRequest,
    ) -> Result<Payment, AppError> {
        let payment_id = request
            .payment_id
            .ok_or_else(|| AppError::Validation("paymentId is required".to_string()))?;

        let payment = self
            .orders
            .update_payment(
                order_id,
                payment_id,
                UpdatePaymentFields {
                    amount: request.amount,
                    paid_at: request.paid_at,
                    method: request.method,
                    status: request.status,
                },
                Utc::now(),
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Order or payment not found".to_string()))?;

        Ok(payment)
    }

    pub async fn remove(
        &self,
        order_id: Uuid,
        request: RemovePaymentRequest,
    ) -> Result<(), AppError> {
        let payment_id = request
            .payment_id
            .ok_or_else(|| AppError::Validation("paymentId is required".to_string()))?;

        let removed = self.orders.remove_payment(order_id, payment_id, Utc::now()).await?;
        if !removed {
            return Err(AppError::NotFound("Order not found".to_string()));
        }

        Ok(())
    }

    /// Preview de pago a partir de la imagen del comprobante. No persiste
    /// nada: extrae el texto, detecta el monto y proyecta el saldo.
    pub async fn preview_from_receipt(
        &self,
        order_id: Uuid,
        file_name: &str,
        image: &[u8],
    ) -> Result<OcrPreviewResponse, AppError> {
        if image.is_empty() {
            return Err(AppError::Validation("payment_image file is required".to_string()));
        }

        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        let items = self.orders.items(order.id).await?;
        let payments = self.orders.payments(order.id).await?;
        let totals = order_totals::compute_totals(&items, &payments);

        let text = self.state.ocr.extract_text(image).await?;
        let detected = parse_amount_from_text(&text).ok_or_else(|| AppError::Unprocessable {
            message: "No se pudo detectar un monto válido en el comprobante".to_string(),
            ocr_text: Some(text.clone()),
        })?;

        let receipt_url = self.store_receipt(order.id, file_name, image).await?;

        Ok(OcrPreviewResponse {
            ok: true,
            order_id: order.id,
            current: CurrentTotals::from(totals),
            detected_amount: detected,
            projected: ProjectedTotals {
                amount_to_pay: detected,
                restante_after: totals.restante - detected,
            },
            receipt: ReceiptInfo {
                receipt_url: Some(receipt_url),
                ocr_text: text,
            },
        })
    }

    /// Enviar solicitud de aprobación: crea el pago en estado `pendiente`
    pub async fn submit_receipt(
        &self,
        order_id: Uuid,
        request: SubmitReceiptRequest,
    ) -> Result<Payment, AppError> {
        let amount = parse_amount_value(request.amount.as_ref())
            .filter(|a| *a > Decimal::ZERO)
            .ok_or_else(|| AppError::Validation("amount must be a positive number".to_string()))?;

        self.orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        let payment = self
            .orders
            .add_payment(
                order_id,
                NewPayment {
                    amount,
                    paid_at: request.paid_at.unwrap_or_else(Utc::now),
                    method: request.method.unwrap_or_else(|| "comprobante".to_string()),
                    status: "pendiente".to_string(),
                    receipt_url: request.receipt_url,
                    ocr_text: request.ocr_text,
                },
                Utc::now(),
            )
            .await?;

        Ok(payment)
    }

    async fn store_receipt(
        &self,
        order_id: Uuid,
        file_name: &str,
        image: &[u8],
    ) -> Result<String, AppError> {
        let dir = Path::new(&self.state.config.uploads_dir).join("receipts");
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Error preparando uploads: {}", e)))?;

        let safe_name: String = file_name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
            .collect();
        let path = dir.join(format!("{}-{}-{}", order_id, Uuid::new_v4(), safe_name));

        tokio::fs::write(&path, image)
            .await
            .map_err(|e| AppError::Internal(format!("Error guardando comprobante: {}", e)))?;

        Ok(path.to_string_lossy().into_owned())
    }
}

/// El monto del submit llega como número o como string numérico
fn parse_amount_value(value: Option<&serde_json::Value>) -> Option<Decimal> {
    match value? {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_amount_value() {
        assert_eq!(parse_amount_value(Some(&json!(150))), Some(Decimal::from(150)));
        assert_eq!(parse_amount_value(Some(&json!("150"))), Some(Decimal::from(150)));
        assert_eq!(
            parse_amount_value(Some(&json!(150.5))),
            Decimal::from_str("150.5").ok()
        );
        assert_eq!(parse_amount_value(Some(&json!("abc"))), None);
        assert_eq!(parse_amount_value(None), None);
    }
}
