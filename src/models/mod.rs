//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos que mapean exactamente
//! al schema PostgreSQL con las convenciones estándar.

pub mod catalog;
pub mod order;
pub mod quotation;
pub mod user;
pub mod visit;
