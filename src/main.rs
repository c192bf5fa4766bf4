use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use dotenvy::dotenv;
use serde_json::json;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use taller_api::config::environment::EnvironmentConfig;
use taller_api::database;
use taller_api::middleware::cors::cors_middleware;
use taller_api::routes;
use taller_api::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🪵 Taller API - pedidos, cotizaciones y visitas");
    info!("===============================================");

    let config = EnvironmentConfig::from_env();

    // Inicializar base de datos
    let pool = match database::create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    if let Err(e) = database::run_migrations(&pool).await {
        error!("❌ Error ejecutando migraciones: {}", e);
        return Err(e);
    }

    let host = config.host.clone();
    let port = config.port;
    let app_state = AppState::new(pool, config);

    let app = Router::new()
        .route("/health", get(health_endpoint))
        .merge(routes::create_api_router())
        .layer(cors_middleware())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health - Health check");
    info!("📅 Visitas:");
    info!("   POST /api/visits/mine - Agendar visita (usuario o invitado)");
    info!("   GET  /api/visits/available-slots - Horas libres del día");
    info!("   GET  /api/visits/mine - Mis visitas");
    info!("   POST /api/visits - Agendar visita (admin)");
    info!("🛒 Cotizaciones:");
    info!("   POST /api/quotations/cart - Crear u obtener carrito");
    info!("   POST /api/quotations/cart/items - Agregar producto al carrito");
    info!("   POST /api/quotations/cart/custom - Agregar pieza a medida");
    info!("   POST /api/quotations/:id/quote - Cotizar (admin)");
    info!("   POST /api/quotations/:id/decision - Aceptar o rechazar");
    info!("📦 Pedidos:");
    info!("   POST /api/orders - Crear pedido (admin)");
    info!("   POST /api/orders/mine - Crear pedido (cliente)");
    info!("   POST /api/orders/:id/reviews - Reseñar pedido");
    info!("💳 Pagos:");
    info!("   POST /api/payments - Registrar pago");
    info!("   POST /api/orders/:id/payments/ocr - Preview OCR de comprobante");
    info!("   POST /api/orders/:id/payments/ocr-submit - Enviar pago pendiente");
    info!("📊 Dashboard:");
    info!("   GET  /api/dashboard - Reporte de ingresos (admin)");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            anyhow::anyhow!(e)
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Endpoint de salud simple
async fn health_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "taller-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
