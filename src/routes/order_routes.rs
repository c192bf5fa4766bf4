use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::controllers::order_controller::OrderController;
use crate::controllers::payment_controller::PaymentController;
use crate::dto::order_dto::{CreateMyOrderRequest, CreateOrderRequest, CreateReviewRequest};
use crate::dto::payment_dto::SubmitReceiptRequest;
use crate::middleware::auth_middleware::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_order_router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(list_my_orders).post(create_my_order))
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order))
        .route("/:id/attachments", post(add_attachments))
        .route("/:id/reviews", get(list_reviews).post(create_review))
        .route("/:id/payments/ocr", post(ocr_preview))
        .route("/:id/payments/ocr-submit", post(ocr_submit))
}

async fn list_orders(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_permission("orders", "view")?;

    let controller = OrderController::new(state);
    let orders = controller.list().await?;

    Ok(Json(serde_json::to_value(orders).map_err(|e| {
        AppError::Internal(format!("Error serializando pedidos: {}", e))
    })?))
}

async fn create_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    auth.require_permission("orders", "create")?;

    let controller = OrderController::new(state);
    let order = controller.create(&auth, request).await?;

    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "order": order }))))
}

async fn list_my_orders(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = OrderController::new(state);
    let orders = controller.list_mine(&auth).await?;

    Ok(Json(json!({ "ok": true, "orders": orders })))
}

async fn create_my_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateMyOrderRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let controller = OrderController::new(state);
    let order = controller.create_for_me(&auth, request).await?;

    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "order": order }))))
}

async fn get_order(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_permission("orders", "view")?;

    let controller = OrderController::new(state);
    let order = controller.get(id).await?;

    Ok(Json(serde_json::to_value(order).map_err(|e| {
        AppError::Internal(format!("Error serializando pedido: {}", e))
    })?))
}

/// Subir imágenes al pedido (multipart: `product_images` + `item_id`)
async fn add_attachments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();
    let mut item_id: Option<Uuid> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("product_images") if files.len() < 10 => {
                let file_name = field.file_name().unwrap_or("image").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid file upload: {}", e)))?;
                files.push((file_name, bytes.to_vec()));
            }
            Some("item_id") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid item_id: {}", e)))?;
                item_id = value.trim().parse().ok();
            }
            _ => {}
        }
    }

    let controller = OrderController::new(state);
    let order = controller.add_attachments(&auth, id, item_id, files).await?;

    Ok(Json(json!({ "ok": true, "order": order })))
}

async fn create_review(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let controller = OrderController::new(state);
    let review = controller.create_review(&auth, id, request).await?;

    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "review": review }))))
}

async fn list_reviews(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = OrderController::new(state);
    let reviews = controller.list_reviews(&auth, id).await?;

    Ok(Json(json!({ "ok": true, "reviews": reviews })))
}

/// Preview de pago por OCR del comprobante (no persiste)
async fn ocr_preview(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        if name.as_deref() == Some("payment_image") {
            let file_name = field.file_name().unwrap_or("receipt").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Invalid file upload: {}", e)))?;
            file = Some((file_name, bytes.to_vec()));
        }
    }

    let (file_name, bytes) = file
        .ok_or_else(|| AppError::Validation("payment_image file is required".to_string()))?;

    let controller = PaymentController::new(state);
    let preview = controller.preview_from_receipt(id, &file_name, &bytes).await?;

    Ok(Json(serde_json::to_value(preview).map_err(|e| {
        AppError::Internal(format!("Error serializando preview: {}", e))
    })?))
}

/// Enviar solicitud de aprobación: crea el pago en estado pendiente
async fn ocr_submit(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitReceiptRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let controller = PaymentController::new(state);
    let payment = controller.submit_receipt(id, request).await?;

    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "payment": payment }))))
}
