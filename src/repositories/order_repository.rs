use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::order::{
    Attachment, ItemKind, Order, OrderItem, OrderStatus, Payment, Review,
};
use crate::services::{order_status, order_totals};
use crate::utils::errors::AppError;

pub struct NewOrderItem {
    pub kind: ItemKind,
    pub product_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub image_url: Option<String>,
    pub detail: Option<String>,
    pub quantity: i32,
    pub value: Option<Decimal>,
}

pub struct NewPayment {
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
    pub method: String,
    pub status: String,
    pub receipt_url: Option<String>,
    pub ocr_text: Option<String>,
}

pub struct NewInitialPayment {
    pub amount: Decimal,
    pub method: String,
    pub registered_at: DateTime<Utc>,
    pub registered_by: Uuid,
}

pub struct NewOrder {
    pub user_id: Uuid,
    pub status: OrderStatus,
    pub address: Option<String>,
    pub started_at: DateTime<Utc>,
    pub production_started_at: Option<DateTime<Utc>>,
    pub initial_payment: Option<NewInitialPayment>,
    pub items: Vec<NewOrderItem>,
    pub payments: Vec<NewPayment>,
}

pub struct NewAttachment {
    pub item_id: Option<Uuid>,
    pub url: String,
    pub kind: String,
    pub uploaded_by: Uuid,
}

pub struct UpdatePaymentFields {
    pub amount: Option<Decimal>,
    pub paid_at: Option<DateTime<Utc>>,
    pub method: Option<String>,
    pub status: Option<String>,
}

pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, new_order: NewOrder) -> Result<Order, AppError> {
        let mut tx = self.pool.begin().await?;

        let (initial_amount, initial_method, initial_at, initial_by) = match &new_order.initial_payment {
            Some(ip) => (
                Some(ip.amount),
                Some(ip.method.clone()),
                Some(ip.registered_at),
                Some(ip.registered_by),
            ),
            None => (None, None, None, None),
        };

        let order = sqlx::query_as::<_, Order>(
            r#"
            INSERT INTO orders (id, user_id, status, address, started_at, production_started_at,
                                initial_payment_amount, initial_payment_method,
                                initial_payment_registered_at, initial_payment_registered_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_order.user_id)
        .bind(new_order.status)
        .bind(new_order.address)
        .bind(new_order.started_at)
        .bind(new_order.production_started_at)
        .bind(initial_amount)
        .bind(initial_method)
        .bind(initial_at)
        .bind(initial_by)
        .fetch_one(&mut *tx)
        .await?;

        for item in new_order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, kind, product_id, service_id, image_url, detail, quantity, value)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(order.id)
            .bind(item.kind)
            .bind(item.product_id)
            .bind(item.service_id)
            .bind(item.image_url)
            .bind(item.detail)
            .bind(item.quantity)
            .bind(item.value)
            .execute(&mut *tx)
            .await?;
        }

        for payment in new_order.payments {
            insert_payment(&mut tx, order.id, &payment).await?;
        }

        tx.commit().await?;

        Ok(order)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    pub async fn list_all(&self) -> Result<Vec<Order>, AppError> {
        let orders =
            sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;

        Ok(orders)
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Order>, AppError> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = $1 ORDER BY started_at DESC NULLS LAST",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    pub async fn items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, AppError> {
        let items =
            sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
                .bind(order_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(items)
    }

    pub async fn payments(&self, order_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM order_payments WHERE order_id = $1 ORDER BY paid_at",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    pub async fn attachments(&self, order_id: Uuid) -> Result<Vec<Attachment>, AppError> {
        let attachments = sqlx::query_as::<_, Attachment>(
            "SELECT * FROM order_attachments WHERE order_id = $1 ORDER BY uploaded_at",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attachments)
    }

    pub async fn reviews(&self, order_id: Uuid) -> Result<Vec<Review>, AppError> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM order_reviews WHERE order_id = $1 ORDER BY created_at",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reviews)
    }

    /// Registrar un pago y recalcular el estado del pedido en la misma
    /// transacción.
    pub async fn add_payment(
        &self,
        order_id: Uuid,
        payment: NewPayment,
        now: DateTime<Utc>,
    ) -> Result<Payment, AppError> {
        let mut tx = self.pool.begin().await?;
        let created = insert_payment(&mut tx, order_id, &payment).await?;
        recompute_status(&mut tx, order_id, now).await?;
        tx.commit().await?;

        Ok(created)
    }

    pub async fn update_payment(
        &self,
        order_id: Uuid,
        payment_id: Uuid,
        fields: UpdatePaymentFields,
        now: DateTime<Utc>,
    ) -> Result<Option<Payment>, AppError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<Payment> = sqlx::query_as::<_, Payment>(
            "SELECT * FROM order_payments WHERE id = $1 AND order_id = $2",
        )
        .bind(payment_id)
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?;

        let current = match current {
            Some(p) => p,
            None => return Ok(None),
        };

        let updated = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE order_payments
            SET amount = $3, paid_at = $4, method = $5, status = $6
            WHERE id = $1 AND order_id = $2
            RETURNING *
            "#,
        )
        .bind(payment_id)
        .bind(order_id)
        .bind(fields.amount.unwrap_or(current.amount))
        .bind(fields.paid_at.unwrap_or(current.paid_at))
        .bind(fields.method.unwrap_or(current.method))
        .bind(fields.status.unwrap_or(current.status))
        .fetch_one(&mut *tx)
        .await?;

        recompute_status(&mut tx, order_id, now).await?;
        tx.commit().await?;

        Ok(Some(updated))
    }

    pub async fn remove_payment(
        &self,
        order_id: Uuid,
        payment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM order_payments WHERE id = $1 AND order_id = $2")
            .bind(payment_id)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        recompute_status(&mut tx, order_id, now).await?;
        tx.commit().await?;

        Ok(true)
    }

    pub async fn add_attachments(
        &self,
        order_id: Uuid,
        attachments: Vec<NewAttachment>,
    ) -> Result<Vec<Attachment>, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(attachments.len());

        for attachment in attachments {
            let row = sqlx::query_as::<_, Attachment>(
                r#"
                INSERT INTO order_attachments (id, order_id, item_id, url, kind, uploaded_by)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(order_id)
            .bind(attachment.item_id)
            .bind(attachment.url)
            .bind(attachment.kind)
            .bind(attachment.uploaded_by)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }

        tx.commit().await?;

        Ok(created)
    }

    pub async fn has_review(&self, order_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM order_reviews WHERE order_id = $1 AND user_id = $2)",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Una reseña por usuario por pedido; la restricción única respalda el
    /// pre-chequeo ante inserciones simultáneas.
    pub async fn add_review(
        &self,
        order_id: Uuid,
        user_id: Uuid,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Review, AppError> {
        let review = sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO order_reviews (id, order_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(user_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.constraint() == Some("order_reviews_order_id_user_id_key") {
                    return AppError::Conflict("Review already exists for this order".to_string());
                }
            }
            AppError::Database(e)
        })?;

        Ok(review)
    }

    /// Guardia de idempotencia al aceptar cotizaciones: pedido derivado
    /// reciente del mismo usuario (ventana de 5 minutos).
    pub async fn find_recent_in_progress(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> Result<Option<Order>, AppError> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE user_id = $1 AND status = 'En proceso' AND started_at >= $2
            ORDER BY started_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }
}

async fn insert_payment(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    payment: &NewPayment,
) -> Result<Payment, AppError> {
    let created = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO order_payments (id, order_id, amount, paid_at, method, status, receipt_url, ocr_text)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(order_id)
    .bind(payment.amount)
    .bind(payment.paid_at)
    .bind(payment.method.clone())
    .bind(payment.status.clone())
    .bind(payment.receipt_url.clone())
    .bind(payment.ocr_text.clone())
    .fetch_one(&mut **tx)
    .await?;

    Ok(created)
}

/// Recalcular estado y sello de producción tras cualquier cambio de pagos.
/// Un pedido cancelado no se toca.
async fn recompute_status(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let order: Order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_one(&mut **tx)
        .await?;

    if order.status == OrderStatus::Cancelado {
        return Ok(());
    }

    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
        .bind(order_id)
        .fetch_all(&mut **tx)
        .await?;

    let payments = sqlx::query_as::<_, Payment>(
        "SELECT * FROM order_payments WHERE order_id = $1 ORDER BY paid_at",
    )
    .bind(order_id)
    .fetch_all(&mut **tx)
    .await?;

    let totals = order_totals::compute_totals(&items, &payments);
    let update = order_status::recompute(&totals, order.production_started_at, now);

    sqlx::query("UPDATE orders SET status = $2, production_started_at = $3 WHERE id = $1")
        .bind(order_id)
        .bind(update.status)
        .bind(update.production_started_at)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
