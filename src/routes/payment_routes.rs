use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::payment_controller::PaymentController;
use crate::dto::payment_dto::{
    CreatePaymentRequest, RemovePaymentRequest, UpdatePaymentRequest,
};
use crate::middleware::auth_middleware::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_payment_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payments).post(create_payment))
        .route(
            "/:id",
            get(get_order_payments).put(update_payment).delete(remove_payment),
        )
}

async fn list_payments(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_permission("payments", "view")?;

    let controller = PaymentController::new(state);
    let payments = controller.list().await?;

    Ok(Json(serde_json::json!({ "ok": true, "payments": payments })))
}

async fn get_order_payments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_permission("payments", "view")?;

    let controller = PaymentController::new(state);
    let payments = controller.get(id).await?;

    Ok(Json(serde_json::to_value(payments).map_err(|e| {
        AppError::Internal(format!("Error serializando pagos: {}", e))
    })?))
}

async fn create_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    auth.require_permission("payments", "create")?;

    let controller = PaymentController::new(state);
    let payment = controller.create(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::to_value(payment).map_err(|e| {
            AppError::Internal(format!("Error serializando pago: {}", e))
        })?),
    ))
}

async fn update_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePaymentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_permission("payments", "update")?;

    let controller = PaymentController::new(state);
    let payment = controller.update(id, request).await?;

    Ok(Json(serde_json::to_value(payment).map_err(|e| {
        AppError::Internal(format!("Error serializando pago: {}", e))
    })?))
}

async fn remove_payment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RemovePaymentRequest>,
) -> Result<StatusCode, AppError> {
    auth.require_permission("payments", "delete")?;

    let controller = PaymentController::new(state);
    controller.remove(id, request).await?;

    Ok(StatusCode::NO_CONTENT)
}
