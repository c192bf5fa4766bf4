use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::quotation::{
    ChatMessage, Quotation, QuotationItem, QuotationItemKind, QuotationItemRow,
    QuotationItemStatus, QuotationStatus,
};
use crate::utils::errors::AppError;

pub struct NewQuotationItem {
    pub kind: QuotationItemKind,
    pub quantity: i32,
    pub color: String,
    pub size: String,
    pub price: Decimal,
    pub item_status: QuotationItemStatus,
}

pub struct UpdateQuotationItemFields {
    pub quantity: Option<i32>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub price: Option<Decimal>,
    pub admin_notes: Option<String>,
    pub item_status: Option<QuotationItemStatus>,
}

pub struct QuotationRepository {
    pool: PgPool,
}

impl QuotationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Quotation>, AppError> {
        let quotation = sqlx::query_as::<_, Quotation>("SELECT * FROM quotations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(quotation)
    }

    pub async fn find_cart_by_user(&self, user_id: Uuid) -> Result<Option<Quotation>, AppError> {
        let cart = sqlx::query_as::<_, Quotation>(
            "SELECT * FROM quotations WHERE user_id = $1 AND status = 'Carrito'",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(cart)
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        status: QuotationStatus,
        admin_notes: Option<String>,
    ) -> Result<Quotation, AppError> {
        let quotation = sqlx::query_as::<_, Quotation>(
            r#"
            INSERT INTO quotations (id, user_id, status, admin_notes)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(status)
        .bind(admin_notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(quotation)
    }

    /// Obtener el carrito del usuario o crearlo. El índice único parcial
    /// garantiza un solo carrito; si dos requests compiten, la que pierde
    /// el insert lee el carrito ganador.
    pub async fn find_or_create_cart(&self, user_id: Uuid) -> Result<Quotation, AppError> {
        if let Some(cart) = self.find_cart_by_user(user_id).await? {
            return Ok(cart);
        }

        match self.create(user_id, QuotationStatus::Carrito, None).await {
            Ok(cart) => Ok(cart),
            Err(AppError::Database(sqlx::Error::Database(db)))
                if db.constraint() == Some("idx_quotations_single_cart") =>
            {
                self.find_cart_by_user(user_id)
                    .await?
                    .ok_or_else(|| AppError::Conflict("Active cart already exists".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Quotation>, AppError> {
        let quotations = sqlx::query_as::<_, Quotation>(
            "SELECT * FROM quotations WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quotations)
    }

    pub async fn list_paginated(
        &self,
        status: Option<String>,
        page: i64,
        limit: i64,
    ) -> Result<(Vec<Quotation>, i64), AppError> {
        let offset = (page - 1).max(0) * limit;

        let quotations = match &status {
            Some(status) => {
                sqlx::query_as::<_, Quotation>(
                    r#"
                    SELECT * FROM quotations WHERE status = $1
                    ORDER BY created_at DESC LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(status.as_str())
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Quotation>(
                    "SELECT * FROM quotations ORDER BY created_at DESC LIMIT $1 OFFSET $2",
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let (total,): (i64,) = match &status {
            Some(status) => sqlx::query_as("SELECT COUNT(*) FROM quotations WHERE status = $1")
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await?,
            None => sqlx::query_as("SELECT COUNT(*) FROM quotations")
                .fetch_one(&self.pool)
                .await?,
        };

        Ok((quotations, total))
    }

    pub async fn items(&self, quotation_id: Uuid) -> Result<Vec<QuotationItem>, AppError> {
        let rows = sqlx::query_as::<_, QuotationItemRow>(
            "SELECT * FROM quotation_items WHERE quotation_id = $1 ORDER BY id",
        )
        .bind(quotation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().filter_map(QuotationItemRow::into_item).collect())
    }

    pub async fn count_items(&self, quotation_id: Uuid) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM quotation_items WHERE quotation_id = $1")
                .bind(quotation_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    pub async fn find_item_row(
        &self,
        quotation_id: Uuid,
        item_id: Uuid,
    ) -> Result<Option<QuotationItemRow>, AppError> {
        let row = sqlx::query_as::<_, QuotationItemRow>(
            "SELECT * FROM quotation_items WHERE id = $1 AND quotation_id = $2",
        )
        .bind(item_id)
        .bind(quotation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Item de catálogo equivalente ya presente en el carrito (mismo
    /// producto, color y talla)
    pub async fn find_matching_cart_item(
        &self,
        quotation_id: Uuid,
        product_id: Uuid,
        color: &str,
        size: &str,
    ) -> Result<Option<QuotationItemRow>, AppError> {
        let row = sqlx::query_as::<_, QuotationItemRow>(
            r#"
            SELECT * FROM quotation_items
            WHERE quotation_id = $1 AND product_id = $2 AND color = $3 AND size = $4
              AND is_custom = FALSE
            LIMIT 1
            "#,
        )
        .bind(quotation_id)
        .bind(product_id)
        .bind(color)
        .bind(size)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn add_item(
        &self,
        quotation_id: Uuid,
        item: NewQuotationItem,
    ) -> Result<(), AppError> {
        let (is_custom, product_id, name, description, wood_type, reference_image) =
            match item.kind {
                QuotationItemKind::Catalog { product_id } => {
                    (false, Some(product_id), None, None, None, None)
                }
                QuotationItemKind::Custom {
                    name,
                    description,
                    wood_type,
                    reference_image,
                } => (true, None, Some(name), Some(description), Some(wood_type), reference_image),
            };

        sqlx::query(
            r#"
            INSERT INTO quotation_items (id, quotation_id, is_custom, product_id, custom_name,
                                         custom_description, custom_wood_type, custom_reference_image,
                                         quantity, color, size, price, admin_notes, item_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, '', $13)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(quotation_id)
        .bind(is_custom)
        .bind(product_id)
        .bind(name)
        .bind(description)
        .bind(wood_type)
        .bind(reference_image)
        .bind(item.quantity)
        .bind(item.color)
        .bind(item.size)
        .bind(item.price)
        .bind(item.item_status)
        .execute(&self.pool)
        .await?;

        self.touch(quotation_id).await?;

        Ok(())
    }

    pub async fn update_item(
        &self,
        quotation_id: Uuid,
        item_id: Uuid,
        fields: UpdateQuotationItemFields,
    ) -> Result<Option<QuotationItem>, AppError> {
        let current = match self.find_item_row(quotation_id, item_id).await? {
            Some(row) => row,
            None => return Ok(None),
        };

        let row = sqlx::query_as::<_, QuotationItemRow>(
            r#"
            UPDATE quotation_items
            SET quantity = $3, color = $4, size = $5, price = $6, admin_notes = $7, item_status = $8
            WHERE id = $1 AND quotation_id = $2
            RETURNING *
            "#,
        )
        .bind(item_id)
        .bind(quotation_id)
        .bind(fields.quantity.unwrap_or(current.quantity))
        .bind(fields.color.unwrap_or(current.color))
        .bind(fields.size.unwrap_or(current.size))
        .bind(fields.price.unwrap_or(current.price))
        .bind(fields.admin_notes.unwrap_or(current.admin_notes))
        .bind(fields.item_status.unwrap_or(current.item_status))
        .fetch_one(&self.pool)
        .await?;

        self.touch(quotation_id).await?;

        Ok(row.into_item())
    }

    pub async fn remove_item(&self, quotation_id: Uuid, item_id: Uuid) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM quotation_items WHERE id = $1 AND quotation_id = $2")
                .bind(item_id)
                .bind(quotation_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() > 0 {
            self.touch(quotation_id).await?;
            return Ok(true);
        }

        Ok(false)
    }

    pub async fn set_status(&self, id: Uuid, status: QuotationStatus) -> Result<(), AppError> {
        sqlx::query("UPDATE quotations SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn apply_quote(
        &self,
        id: Uuid,
        total_estimate: Decimal,
        admin_notes: Option<String>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE quotations
            SET status = 'Cotizada', total_estimate = $2,
                admin_notes = COALESCE($3, admin_notes), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(total_estimate)
        .bind(admin_notes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Borrar la cotización y su historial de chat (tras la decisión del
    /// cliente, para permitir nuevas solicitudes)
    pub async fn delete_with_chat(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM chat_messages WHERE quotation_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM quotations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    pub async fn chat_messages(&self, quotation_id: Uuid) -> Result<Vec<ChatMessage>, AppError> {
        let messages = sqlx::query_as::<_, ChatMessage>(
            "SELECT * FROM chat_messages WHERE quotation_id = $1 ORDER BY created_at",
        )
        .bind(quotation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    async fn touch(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE quotations SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
