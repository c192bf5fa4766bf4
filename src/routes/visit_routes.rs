use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use uuid::Uuid;

use crate::controllers::visit_controller::VisitController;
use crate::dto::visit_dto::{AvailableSlotsQuery, CreateVisitRequest, UpdateVisitRequest};
use crate::middleware::auth_middleware::{AuthUser, OptionalAuthUser};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_visit_router() -> Router<AppState> {
    Router::new()
        .route("/mine", post(create_visit_for_me).get(list_my_visits))
        .route("/available-slots", get(available_slots))
        .route("/", get(list_visits).post(create_visit))
        .route("/:id", get(get_visit).put(update_visit))
}

/// Reserva pública: acepta usuarios con sesión e invitados
async fn create_visit_for_me(
    State(state): State<AppState>,
    OptionalAuthUser(auth): OptionalAuthUser,
    Json(request): Json<CreateVisitRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let controller = VisitController::new(state);
    let (visit, message) = controller.create_for_me(auth, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "visit": visit, "message": message })),
    ))
}

async fn list_my_visits(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = VisitController::new(state);
    let visits = controller.list_mine(auth.id).await?;

    Ok(Json(json!({ "ok": true, "visits": visits })))
}

async fn available_slots(
    State(state): State<AppState>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = VisitController::new(state);
    let slots = controller.available_slots(query.date.as_deref()).await?;

    Ok(Json(json!({ "ok": true, "availableSlots": slots })))
}

async fn list_visits(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_permission("visits", "view")?;

    let controller = VisitController::new(state);
    let visits = controller.list().await?;

    Ok(Json(json!({ "ok": true, "visits": visits })))
}

async fn create_visit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateVisitRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    auth.require_permission("visits", "create")?;

    let controller = VisitController::new(state);
    let visit = controller.create(auth, request).await?;

    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "visit": visit }))))
}

async fn get_visit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_permission("visits", "view")?;

    let controller = VisitController::new(state);
    let visit = controller.get(id).await?;

    Ok(Json(serde_json::to_value(visit).map_err(|e| {
        AppError::Internal(format!("Error serializando visita: {}", e))
    })?))
}

async fn update_visit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVisitRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_permission("visits", "update")?;

    let controller = VisitController::new(state);
    let visit = controller.update(id, request).await?;

    Ok(Json(json!({ "ok": true, "visit": visit })))
}
