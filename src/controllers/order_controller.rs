//! Pedidos
//!
//! Alta administrativa y de autoservicio, detalle con totales, adjuntos
//! y reseñas. El estado inicial sale del abono registrado al crear.

use chrono::Utc;
use futures::try_join;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;
use validator::Validate;

use crate::dto::order_dto::{
    deposit_flags, dias_restantes, AdminOrderSummary, CreateMyOrderRequest, CreateOrderRequest,
    CreateReviewRequest, MyOrderSummary, OrderResponse,
};
use crate::middleware::auth_middleware::AuthUser;
use crate::models::order::{ItemKind, Order, OrderStatus, Review};
use crate::repositories::catalog_repository::CatalogRepository;
use crate::repositories::order_repository::{
    NewAttachment, NewInitialPayment, NewOrder, NewOrderItem, NewPayment, OrderRepository,
};
use crate::repositories::user_repository::UserRepository;
use crate::services::{order_status, order_totals};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct OrderController {
    state: AppState,
    orders: OrderRepository,
    users: UserRepository,
    catalog: CatalogRepository,
}

/// Método de pago offline del abono inicial
fn initial_payment_method(method: Option<&str>) -> String {
    if method == Some("cash") {
        "offline_cash".to_string()
    } else {
        "offline_transfer".to_string()
    }
}

impl OrderController {
    pub fn new(state: AppState) -> Self {
        let pool = state.pool.clone();
        Self {
            state,
            orders: OrderRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            catalog: CatalogRepository::new(pool),
        }
    }

    /// Alta de pedido por el administrador, con abono inicial opcional
    pub async fn create(
        &self,
        auth: &AuthUser,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse, AppError> {
        let user_id = request
            .user
            .ok_or_else(|| AppError::Validation("user and items are required".to_string()))?;
        if request.items.is_empty() {
            return Err(AppError::Validation("user and items are required".to_string()));
        }

        let items: Vec<NewOrderItem> = request
            .items
            .iter()
            .map(|it| NewOrderItem {
                kind: it.resolved_kind(),
                product_id: it.product_id,
                service_id: it.service_id,
                image_url: None,
                detail: it.detail.clone(),
                quantity: it.quantity.filter(|q| *q > 0).unwrap_or(1),
                value: it.value,
            })
            .collect();

        let total: Decimal = items.iter().filter_map(|i| i.value).sum();
        let now = Utc::now();

        let started_at = request
            .started_at
            .as_deref()
            .and_then(crate::utils::validation::parse_flexible_date)
            .unwrap_or(now);

        let mut status = OrderStatus::Pendiente;
        let mut production_started_at = None;
        let mut payments = Vec::new();
        let mut initial_payment = None;

        if let Some(ip) = &request.initial_payment {
            if ip.amount > Decimal::ZERO {
                let method = initial_payment_method(ip.method.as_deref());

                payments.push(NewPayment {
                    amount: ip.amount,
                    paid_at: now,
                    method: method.clone(),
                    status: "aprobado".to_string(),
                    receipt_url: None,
                    ocr_text: None,
                });

                status = order_status::derive_status(total, ip.amount);
                if status == OrderStatus::EnProceso {
                    production_started_at = Some(now);
                }

                initial_payment = Some(NewInitialPayment {
                    amount: ip.amount,
                    method,
                    registered_at: now,
                    registered_by: auth.id,
                });
            }
        }

        let order = self
            .orders
            .create(NewOrder {
                user_id,
                status,
                address: request.address,
                started_at,
                production_started_at,
                initial_payment,
                items,
                payments,
            })
            .await?;

        self.order_response(order).await
    }

    /// Alta de pedido por el propio cliente; las imágenes de catálogo se
    /// copian a los items para que el historial no dependa del catálogo.
    pub async fn create_for_me(
        &self,
        auth: &AuthUser,
        request: CreateMyOrderRequest,
    ) -> Result<OrderResponse, AppError> {
        if request.items.is_empty() {
            return Err(AppError::Validation(
                "items is required and must be a non-empty array".to_string(),
            ));
        }

        let product_ids: Vec<Uuid> = request.items.iter().filter_map(|i| i.product_id).collect();
        let service_ids: Vec<Uuid> = request.items.iter().filter_map(|i| i.service_id).collect();

        let (product_images, service_images) = try_join!(
            self.catalog.product_images(&product_ids),
            self.catalog.service_images(&service_ids),
        )?;
        let product_images: HashMap<Uuid, Option<String>> = product_images.into_iter().collect();
        let service_images: HashMap<Uuid, Option<String>> = service_images.into_iter().collect();

        let items: Vec<NewOrderItem> = request
            .items
            .iter()
            .map(|it| {
                let kind = it.resolved_kind();
                let image_url = match kind {
                    ItemKind::Producto => it
                        .product_id
                        .and_then(|id| product_images.get(&id).cloned())
                        .flatten(),
                    ItemKind::Servicio => it
                        .service_id
                        .and_then(|id| service_images.get(&id).cloned())
                        .flatten(),
                };

                NewOrderItem {
                    kind,
                    product_id: it.product_id,
                    service_id: it.service_id,
                    image_url,
                    detail: it.detail.clone(),
                    quantity: it.quantity.filter(|q| *q > 0).unwrap_or(1),
                    value: it.value,
                }
            })
            .collect();

        let order = self
            .orders
            .create(NewOrder {
                user_id: auth.id,
                status: OrderStatus::Pendiente,
                address: request.address,
                started_at: Utc::now(),
                production_started_at: None,
                initial_payment: None,
                items,
                payments: Vec::new(),
            })
            .await?;

        self.order_response(order).await
    }

    pub async fn get(&self, id: Uuid) -> Result<OrderResponse, AppError> {
        let order = self
            .orders
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

        self.order_response(order).await
    }

    /// Listado administrativo: solo pedidos con saldo pendiente
    pub async fn list(&self) -> Result<Vec<AdminOrderSummary>, AppError> {
        let orders = self.orders.list_all().await?;

        let user_ids: Vec<Uuid> = orders.iter().map(|o| o.user_id).collect();
        let users = self.users.find_summaries(&user_ids).await?;

        let mut result = Vec::new();
        for order in orders {
            let items = self.orders.items(order.id).await?;
            let payments = self.orders.payments(order.id).await?;
            let totals = order_totals::compute_totals(&items, &payments);

            if totals.restante <= Decimal::ZERO {
                continue;
            }

            let initial = order.initial_payment_amount.unwrap_or(Decimal::ZERO);
            let (necesita_abono, _) = deposit_flags(&totals, initial);
            let user = users.iter().find(|u| u.id == order.user_id).cloned();

            result.push(AdminOrderSummary {
                order,
                user,
                total: totals.total,
                paid: totals.paid,
                restante: totals.restante,
                necesita_abono,
                payment_status: "Pendiente".to_string(),
            });
        }

        Ok(result)
    }

    /// Resumen de pedidos del cliente para la vista móvil
    pub async fn list_mine(&self, auth: &AuthUser) -> Result<Vec<MyOrderSummary>, AppError> {
        let orders = self.orders.list_by_user(auth.id).await?;
        let now = Utc::now();

        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.orders.items(order.id).await?;
            let payments = self.orders.payments(order.id).await?;
            let totals = order_totals::compute_totals(&items, &payments);

            let nombre = match items.first() {
                Some(first) => self
                    .catalog
                    .item_name(first.product_id, first.service_id)
                    .await?
                    .unwrap_or_else(|| "Pedido".to_string()),
                None => "Pedido".to_string(),
            };

            let initial = order.initial_payment_amount.unwrap_or(Decimal::ZERO);
            let (requiere_abono, porcentaje_abono) = deposit_flags(&totals, initial);

            result.push(MyOrderSummary {
                id: order.id,
                nombre,
                estado: order.status.as_str().to_string(),
                valor: totals.total,
                restante: totals.restante,
                dias: dias_restantes(order.started_at, now),
                requiere_abono,
                porcentaje_abono,
            });
        }

        Ok(result)
    }

    /// Adjuntar imágenes a un pedido (dueño o permiso de edición)
    pub async fn add_attachments(
        &self,
        auth: &AuthUser,
        order_id: Uuid,
        item_id: Option<Uuid>,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<OrderResponse, AppError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        self.require_owner_or(auth, &order, "orders", "update")?;

        if files.is_empty() {
            return Err(AppError::Validation("No files uploaded".to_string()));
        }

        let dir = Path::new(&self.state.config.uploads_dir).join("orders");
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::Internal(format!("Error preparando uploads: {}", e)))?;

        let mut new_attachments = Vec::with_capacity(files.len());
        for (file_name, bytes) in files {
            let safe_name: String = file_name
                .chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
                .collect();
            let path = dir.join(format!("{}-{}-{}", order_id, Uuid::new_v4(), safe_name));
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(|e| AppError::Internal(format!("Error guardando adjunto: {}", e)))?;

            new_attachments.push(NewAttachment {
                item_id,
                url: path.to_string_lossy().into_owned(),
                kind: "product_image".to_string(),
                uploaded_by: auth.id,
            });
        }

        self.orders.add_attachments(order_id, new_attachments).await?;

        self.order_response(order).await
    }

    pub async fn create_review(
        &self,
        auth: &AuthUser,
        order_id: Uuid,
        request: CreateReviewRequest,
    ) -> Result<Review, AppError> {
        request.validate().map_err(|_| {
            AppError::Validation("rating must be a number between 1 and 5".to_string())
        })?;

        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        self.require_owner_or(auth, &order, "orders", "update")?;

        if self.orders.has_review(order_id, auth.id).await? {
            return Err(AppError::Conflict(
                "Review already exists for this order".to_string(),
            ));
        }

        let review = self
            .orders
            .add_review(order_id, auth.id, request.rating, request.comment)
            .await?;

        Ok(review)
    }

    pub async fn list_reviews(
        &self,
        auth: &AuthUser,
        order_id: Uuid,
    ) -> Result<Vec<Review>, AppError> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

        self.require_owner_or(auth, &order, "orders", "view")?;

        self.orders.reviews(order_id).await
    }

    fn require_owner_or(
        &self,
        auth: &AuthUser,
        order: &Order,
        module: &str,
        action: &str,
    ) -> Result<(), AppError> {
        if order.user_id == auth.id || auth.has_permission(module, action) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Forbidden".to_string()))
        }
    }

    async fn order_response(&self, order: Order) -> Result<OrderResponse, AppError> {
        let (items, payments, attachments, reviews) = try_join!(
            self.orders.items(order.id),
            self.orders.payments(order.id),
            self.orders.attachments(order.id),
            self.orders.reviews(order.id),
        )?;

        let user = self.users.find_summary(order.user_id).await?;

        let totals = order_totals::compute_totals(&items, &payments);
        let initial = order.initial_payment_amount.unwrap_or(Decimal::ZERO);
        let (necesita_abono, porcentaje_abono) = deposit_flags(&totals, initial);
        let puede_iniciar_produccion =
            totals.paid >= order_status::production_threshold(totals.total);

        let initial_payment = order.initial_payment();

        Ok(OrderResponse {
            order,
            user,
            items,
            payments,
            attachments,
            reviews,
            initial_payment,
            total: totals.total,
            paid: totals.paid,
            restante: totals.restante,
            necesita_abono,
            porcentaje_abono,
            puede_iniciar_produccion,
        })
    }
}
