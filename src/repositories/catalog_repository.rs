use sqlx::PgPool;
use uuid::Uuid;

use crate::models::catalog::Product;
use crate::utils::errors::AppError;

pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_products(&self, ids: &[Uuid]) -> Result<Vec<Product>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let products = sqlx::query_as::<_, Product>(
            "SELECT id, name, image_url FROM products WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Imágenes de productos para denormalizar en items de pedido
    pub async fn product_images(&self, ids: &[Uuid]) -> Result<Vec<(Uuid, Option<String>)>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(Uuid, Option<String>)> =
            sqlx::query_as("SELECT id, image_url FROM products WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows)
    }

    pub async fn service_images(&self, ids: &[Uuid]) -> Result<Vec<(Uuid, Option<String>)>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(Uuid, Option<String>)> =
            sqlx::query_as("SELECT id, image_url FROM service_offerings WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows)
    }

    /// Nombres de items para el resumen de pedidos del cliente
    pub async fn item_name(
        &self,
        product_id: Option<Uuid>,
        service_id: Option<Uuid>,
    ) -> Result<Option<String>, AppError> {
        if let Some(id) = product_id {
            let name: Option<(String,)> =
                sqlx::query_as("SELECT name FROM products WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
            return Ok(name.map(|(n,)| n));
        }

        if let Some(id) = service_id {
            let name: Option<(String,)> =
                sqlx::query_as("SELECT name FROM service_offerings WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?;
            return Ok(name.map(|(n,)| n));
        }

        Ok(None)
    }
}
