//! Cliente del relay de correo transaccional
//!
//! El envío real lo hace un servicio externo. Los correos de este backend
//! son confirmaciones y avisos: si el relay falla, el caller registra el
//! error y la operación principal continúa.

use serde::Serialize;

use crate::utils::errors::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Clone)]
pub struct MailerClient {
    http: reqwest::Client,
    base_url: String,
    from: String,
}

impl MailerClient {
    pub fn new(http: reqwest::Client, base_url: String, from: String) -> Self {
        Self { http, base_url, from }
    }

    pub async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        let response = self
            .http
            .post(format!("{}/send", self.base_url))
            .json(&serde_json::json!({
                "from": self.from,
                "to": message.to,
                "subject": message.subject,
                "html": message.html,
                "text": message.text,
            }))
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Mail relay unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "Mail relay answered {}",
                response.status()
            )));
        }

        tracing::info!(to = %message.to, subject = %message.subject, "Email enviado");
        Ok(())
    }
}
