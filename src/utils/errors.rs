//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Time slot not available")]
    SlotConflict {
        conflict_visit_id: Uuid,
        conflict_visit_date: DateTime<Utc>,
    },

    #[error("Unprocessable: {message}")]
    Unprocessable {
        message: String,
        ocr_text: Option<String>,
    },

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Internal Server Error",
                        "message": "An error occurred while accessing the database",
                    }),
                )
            }

            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Validation Error", "message": msg }),
            ),

            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Unauthorized", "message": msg }),
            ),

            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                json!({ "error": "Forbidden", "message": msg }),
            ),

            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "error": "Not Found", "message": msg }),
            ),

            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                json!({ "error": "Conflict", "message": msg }),
            ),

            // El conflicto de agenda devuelve la visita que bloquea el horario
            // para que el cliente pueda reintentar con otro slot.
            AppError::SlotConflict {
                conflict_visit_id,
                conflict_visit_date,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "message": "Time slot not available",
                    "conflictVisitId": conflict_visit_id,
                    "conflictVisitDate": conflict_visit_date,
                }),
            ),

            AppError::Unprocessable { message, ocr_text } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "message": message, "ocrText": ocr_text }),
            ),

            AppError::ExternalApi(msg) => {
                tracing::error!("External API error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    json!({
                        "error": "External API Error",
                        "message": "An error occurred while communicating with external service",
                    }),
                )
            }

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "Internal Server Error",
                        "message": "An unexpected error occurred",
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;
