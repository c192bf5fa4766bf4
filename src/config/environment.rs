//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;
use uuid::Uuid;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    pub frontend_origin: String,
    pub templates_dir: String,
    pub uploads_dir: String,
    // Servicios externos
    pub ocr_service_url: String,
    pub mail_relay_url: String,
    pub mail_from: String,
    pub admin_notify_email: Option<String>,
    // Servicio de catálogo usado cuando un item de cotización no referencia producto
    pub default_service_id: Uuid,
}

impl EnvironmentConfig {
    pub fn from_env() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_default(),
            frontend_origin: env::var("FRONTEND_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            templates_dir: env::var("TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_string()),
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string()),
            ocr_service_url: env::var("OCR_SERVICE_URL").expect("OCR_SERVICE_URL must be set"),
            mail_relay_url: env::var("MAIL_RELAY_URL").expect("MAIL_RELAY_URL must be set"),
            mail_from: env::var("MAIL_FROM").expect("MAIL_FROM must be set"),
            admin_notify_email: env::var("ADMIN_NOTIFY_EMAIL").ok(),
            default_service_id: env::var("DEFAULT_SERVICE_ID")
                .expect("DEFAULT_SERVICE_ID must be set")
                .parse()
                .expect("DEFAULT_SERVICE_ID must be a valid UUID"),
        }
    }

    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
