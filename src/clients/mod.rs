//! Clientes de servicios externos (OCR y correo)

pub mod mailer_client;
pub mod ocr_client;
