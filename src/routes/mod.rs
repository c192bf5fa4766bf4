//! Routers de la API

pub mod dashboard_routes;
pub mod order_routes;
pub mod payment_routes;
pub mod quotation_routes;
pub mod visit_routes;

use axum::Router;

use crate::state::AppState;

/// Router principal bajo /api
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/api/visits", visit_routes::create_visit_router())
        .nest("/api/orders", order_routes::create_order_router())
        .nest("/api/payments", payment_routes::create_payment_router())
        .nest("/api/quotations", quotation_routes::create_quotation_router())
        .nest("/api/dashboard", dashboard_routes::create_dashboard_router())
}
