//! Cliente del motor OCR externo
//!
//! El reconocimiento corre en un servicio aparte: se le envía la imagen
//! del comprobante en base64 y devuelve el texto detectado. El parseo del
//! monto sobre ese texto es nuestro (ver `utils::ocr`).

use async_trait::async_trait;
use base64::Engine as _;
use serde::Deserialize;

use crate::utils::errors::AppError;

#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn extract_text(&self, image: &[u8]) -> Result<String, AppError>;
}

#[derive(Clone)]
pub struct HttpOcrClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    text: Option<String>,
}

impl HttpOcrClient {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl OcrEngine for HttpOcrClient {
    async fn extract_text(&self, image: &[u8]) -> Result<String, AppError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);

        let response = self
            .http
            .post(format!("{}/extract", self.base_url))
            .json(&serde_json::json!({
                "image_base64": encoded,
                "languages": ["spa", "eng"],
            }))
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("OCR request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "OCR service answered {}",
                response.status()
            )));
        }

        let body: ExtractResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("OCR response malformed: {}", e)))?;

        Ok(body.text.unwrap_or_default())
    }
}
