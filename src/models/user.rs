//! Modelo de usuario
//!
//! La gestión de cuentas y la sesión viven en el servicio de
//! autenticación; aquí solo se lee lo necesario para correos y reportes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// Vista reducida para respuestas (name + email, como los populate originales)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}
