use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::dashboard_dto::TopItem;
use crate::services::dashboard::OrderFinancials;
use crate::utils::errors::AppError;

pub struct DashboardRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct FinancialsRow {
    started_at: DateTime<Utc>,
    total: Decimal,
    paid: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct TopItemRow {
    id: Uuid,
    name: Option<String>,
    quantity: i64,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Total y pagado aprobado de cada pedido iniciado dentro del rango.
    /// El filtro de liquidados y la serie mensual se arman en el servicio.
    pub async fn order_financials(
        &self,
        from: DateTime<Utc>,
        to_exclusive: DateTime<Utc>,
    ) -> Result<Vec<OrderFinancials>, AppError> {
        let rows = sqlx::query_as::<_, FinancialsRow>(
            r#"
            SELECT o.started_at,
                   COALESCE((SELECT SUM(i.value) FROM order_items i WHERE i.order_id = o.id), 0) AS total,
                   COALESCE((SELECT SUM(p.amount) FROM order_payments p
                             WHERE p.order_id = o.id
                               AND LOWER(p.status) IN ('aprobado', 'confirmado')), 0) AS paid
            FROM orders o
            WHERE o.started_at >= $1 AND o.started_at < $2
            "#,
        )
        .bind(from)
        .bind(to_exclusive)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| OrderFinancials {
                started_at: r.started_at,
                total: r.total,
                paid: r.paid,
            })
            .collect())
    }

    pub async fn top_products(
        &self,
        from: DateTime<Utc>,
        to_exclusive: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<TopItem>, AppError> {
        let rows = sqlx::query_as::<_, TopItemRow>(
            r#"
            SELECT i.product_id AS id, p.name, SUM(COALESCE(i.quantity, 1))::BIGINT AS quantity
            FROM order_items i
            JOIN orders o ON o.id = i.order_id
            LEFT JOIN products p ON p.id = i.product_id
            WHERE o.started_at >= $1 AND o.started_at < $2
              AND i.kind = 'producto' AND i.product_id IS NOT NULL
            GROUP BY i.product_id, p.name
            ORDER BY quantity DESC
            LIMIT $3
            "#,
        )
        .bind(from)
        .bind(to_exclusive)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TopItem {
                id: r.id,
                name: r.name,
                quantity: r.quantity,
            })
            .collect())
    }

    pub async fn top_services(
        &self,
        from: DateTime<Utc>,
        to_exclusive: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<TopItem>, AppError> {
        let rows = sqlx::query_as::<_, TopItemRow>(
            r#"
            SELECT i.service_id AS id, s.name, SUM(COALESCE(i.quantity, 1))::BIGINT AS quantity
            FROM order_items i
            JOIN orders o ON o.id = i.order_id
            LEFT JOIN service_offerings s ON s.id = i.service_id
            WHERE o.started_at >= $1 AND o.started_at < $2
              AND i.kind = 'servicio' AND i.service_id IS NOT NULL
            GROUP BY i.service_id, s.name
            ORDER BY quantity DESC
            LIMIT $3
            "#,
        )
        .bind(from)
        .bind(to_exclusive)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| TopItem {
                id: r.id,
                name: r.name,
                quantity: r.quantity,
            })
            .collect())
    }
}
