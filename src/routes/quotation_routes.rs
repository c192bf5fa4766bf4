use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::controllers::quotation_controller::QuotationController;
use crate::dto::quotation_dto::{
    AddCartItemRequest, AddCustomCartItemRequest, AddItemRequest, AdminQuoteRequest,
    DecisionRequest, ListQuotationsQuery, QuickCreateRequest, UpdateCartQuantityRequest,
    UpdateItemRequest,
};
use crate::middleware::auth_middleware::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_quotation_router() -> Router<AppState> {
    Router::new()
        .route("/mine", get(list_my_quotations))
        .route("/cart", get(get_cart).post(get_cart))
        .route("/cart/items", post(add_cart_item).put(update_cart_quantity))
        .route("/cart/items/:item_id", delete(remove_cart_item))
        .route("/cart/custom", post(add_custom_cart_item))
        .route("/cart/request", post(request_quotation))
        .route("/quick", post(quick_create))
        .route("/", get(list_all))
        .route("/:id", get(get_quotation))
        .route("/:id/items", post(add_item))
        .route("/:id/items/:item_id", put(update_item).delete(remove_item))
        .route("/:id/submit", post(submit))
        .route("/:id/quote", post(admin_quote))
        .route("/:id/decision", post(user_decision))
        .route("/:id/messages", get(chat_messages))
}

async fn list_my_quotations(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = QuotationController::new(state);
    let quotations = controller.list_mine(auth.id).await?;

    Ok(Json(json!({ "ok": true, "quotations": quotations })))
}

/// Crear u obtener el carrito activo del usuario
async fn get_cart(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = QuotationController::new(state);
    let cart = controller.get_or_create_cart(auth.id).await?;

    Ok(Json(json!({ "ok": true, "cart": cart })))
}

async fn add_cart_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<AddCartItemRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let controller = QuotationController::new(state);
    let cart = controller.add_item_to_cart(auth.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "cart": cart, "message": "Product added to cart" })),
    ))
}

async fn add_custom_cart_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<AddCustomCartItemRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let controller = QuotationController::new(state);
    let cart = controller.add_custom_item_to_cart(auth.id, request).await?;

    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "cart": cart }))))
}

async fn update_cart_quantity(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<UpdateCartQuantityRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = QuotationController::new(state);
    let cart = controller.update_cart_item_quantity(auth.id, request).await?;

    Ok(Json(json!({ "ok": true, "cart": cart })))
}

async fn remove_cart_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(item_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = QuotationController::new(state);
    let cart = controller.remove_cart_item(auth.id, item_id).await?;

    Ok(Json(json!({
        "ok": true,
        "cart": cart,
        "message": "Item removed successfully",
    })))
}

async fn request_quotation(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = QuotationController::new(state);
    let quotation = controller.request_quotation(auth.id).await?;

    Ok(Json(json!({
        "ok": true,
        "quotation": quotation,
        "message": "Quotation requested successfully",
    })))
}

async fn quick_create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<QuickCreateRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let controller = QuotationController::new(state);
    let quotation = controller.quick_create(auth.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "quotation": quotation })),
    ))
}

async fn list_all(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuotationsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_permission("quotations", "view")?;

    let controller = QuotationController::new(state);
    let (quotations, pagination) = controller
        .list_all(query.status, query.page, query.limit)
        .await?;

    Ok(Json(json!({
        "ok": true,
        "quotations": quotations,
        "pagination": pagination,
    })))
}

async fn get_quotation(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = QuotationController::new(state);
    let quotation = controller.get(id).await?;

    Ok(Json(json!({ "ok": true, "quotation": quotation })))
}

async fn add_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = QuotationController::new(state);
    let quotation = controller.add_item(auth.id, id, request).await?;

    Ok(Json(json!({ "ok": true, "quotation": quotation })))
}

async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = QuotationController::new(state);
    let quotation = controller.update_item(auth.id, id, item_id, request).await?;

    Ok(Json(json!({ "ok": true, "quotation": quotation })))
}

async fn remove_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = QuotationController::new(state);
    let quotation = controller.remove_item(auth.id, id, item_id).await?;

    Ok(Json(json!({
        "ok": true,
        "quotation": quotation,
        "message": "Item removed successfully",
    })))
}

async fn submit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = QuotationController::new(state);
    let quotation = controller.submit(auth.id, id).await?;

    Ok(Json(json!({
        "ok": true,
        "quotation": quotation,
        "message": "Quotation submitted successfully",
    })))
}

async fn admin_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<AdminQuoteRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_permission("quotations", "update")?;

    let controller = QuotationController::new(state);
    let quotation = controller.admin_set_quote(id, request).await?;

    Ok(Json(json!({ "ok": true, "quotation": quotation })))
}

/// Decisión del cliente: acepta (deriva pedido) o rechaza; la cotización
/// se elimina en ambos casos
async fn user_decision(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = QuotationController::new(state);
    let result = controller.user_decision(&auth, id, request).await?;

    Ok(Json(serde_json::to_value(result).map_err(|e| {
        AppError::Internal(format!("Error serializando decisión: {}", e))
    })?))
}

async fn chat_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = QuotationController::new(state);
    let messages = controller.chat_messages(&auth, id).await?;

    Ok(Json(json!({ "ok": true, "messages": messages })))
}
