//! Catálogo de productos y servicios
//!
//! El CRUD del catálogo es de otro servicio; estos modelos existen para
//! resolver nombres e imágenes al armar pedidos y reportes.

use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ServiceOffering {
    pub id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
}
