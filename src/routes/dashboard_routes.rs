use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::controllers::dashboard_controller::DashboardController;
use crate::dto::dashboard_dto::DashboardQuery;
use crate::middleware::auth_middleware::AuthUser;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_dashboard_router() -> Router<AppState> {
    Router::new().route("/", get(get_dashboard))
}

async fn get_dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    auth.require_permission("dashboard", "view")?;

    let controller = DashboardController::new(state);
    let report = controller.get(query).await?;

    Ok(Json(report))
}
