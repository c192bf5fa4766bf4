//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Todos los componentes de vida global
//! (pool, plantillas, clientes externos) se construyen una vez en el
//! arranque y viajan aquí; no hay singletons escondidos.

use reqwest::Client;
use sqlx::PgPool;
use std::sync::Arc;

use crate::clients::mailer_client::MailerClient;
use crate::clients::ocr_client::{HttpOcrClient, OcrEngine};
use crate::config::environment::EnvironmentConfig;
use crate::services::template_service::TemplateService;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub templates: TemplateService,
    pub mailer: MailerClient,
    pub ocr: Arc<dyn OcrEngine>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig) -> Self {
        let http_client = Client::new();
        let templates = TemplateService::new(&config.templates_dir);
        let mailer = MailerClient::new(
            http_client.clone(),
            config.mail_relay_url.clone(),
            config.mail_from.clone(),
        );
        let ocr: Arc<dyn OcrEngine> = Arc::new(HttpOcrClient::new(
            http_client,
            config.ocr_service_url.clone(),
        ));

        Self {
            pool,
            config,
            templates,
            mailer,
            ocr,
        }
    }
}
