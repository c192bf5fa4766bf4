use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::UserSummary;
use crate::utils::errors::AppError;

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_summary(&self, id: Uuid) -> Result<Option<UserSummary>, AppError> {
        let user = sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, email FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, email FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Usuarios registrados dentro del rango (para el resumen del dashboard)
    pub async fn count_registered_between(
        &self,
        from: DateTime<Utc>,
        to_exclusive: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM users WHERE registered_at >= $1 AND registered_at < $2",
        )
        .bind(from)
        .bind(to_exclusive)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
