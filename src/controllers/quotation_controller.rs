//! Cotizaciones y carrito
//!
//! El carrito es una cotización en estado Carrito (una sola activa por
//! usuario). El flujo: el cliente arma el carrito, solicita la
//! cotización, el administrador fija precios y el cliente decide; la
//! aceptación deriva un pedido y la cotización se elimina junto con su
//! chat.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::clients::mailer_client::EmailMessage;
use crate::dto::common::Pagination;
use crate::dto::quotation_dto::{
    AddCartItemRequest, AddCustomCartItemRequest, AddItemRequest, AdminQuoteRequest,
    DecisionRequest, DecisionResponse, QuickCreateRequest, QuotationItemResponse,
    QuotationResponse, UpdateCartQuantityRequest, UpdateItemRequest,
};
use crate::middleware::auth_middleware::AuthUser;
use crate::models::order::{ItemKind, OrderStatus};
use crate::models::quotation::{
    ChatMessage, Quotation, QuotationItemKind, QuotationItemStatus, QuotationStatus,
};
use crate::repositories::catalog_repository::CatalogRepository;
use crate::repositories::order_repository::{NewOrder, NewOrderItem, OrderRepository};
use crate::repositories::quotation_repository::{
    NewQuotationItem, QuotationRepository, UpdateQuotationItemFields,
};
use crate::repositories::user_repository::UserRepository;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub struct QuotationController {
    state: AppState,
    quotations: QuotationRepository,
    orders: OrderRepository,
    users: UserRepository,
    catalog: CatalogRepository,
}

impl QuotationController {
    pub fn new(state: AppState) -> Self {
        let pool = state.pool.clone();
        Self {
            state,
            quotations: QuotationRepository::new(pool.clone()),
            orders: OrderRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            catalog: CatalogRepository::new(pool),
        }
    }

    pub async fn list_mine(&self, user_id: Uuid) -> Result<Vec<QuotationResponse>, AppError> {
        let quotations = self.quotations.list_by_user(user_id).await?;

        let mut result = Vec::with_capacity(quotations.len());
        for quotation in quotations {
            result.push(self.respond(quotation).await?);
        }

        Ok(result)
    }

    pub async fn get_or_create_cart(&self, user_id: Uuid) -> Result<QuotationResponse, AppError> {
        let cart = self.quotations.find_or_create_cart(user_id).await?;
        self.respond(cart).await
    }

    /// Creación rápida de una cotización ya solicitada
    pub async fn quick_create(
        &self,
        user_id: Uuid,
        request: QuickCreateRequest,
    ) -> Result<QuotationResponse, AppError> {
        if request.items.is_empty() {
            return Err(AppError::Validation("Items array is required".to_string()));
        }

        let quotation = self
            .quotations
            .create(user_id, QuotationStatus::Solicitada, request.admin_notes)
            .await?;

        for item in &request.items {
            let new_item = build_new_item(item)?;
            self.quotations.add_item(quotation.id, new_item).await?;
        }

        self.refreshed(quotation.id).await
    }

    pub async fn add_item(
        &self,
        user_id: Uuid,
        quotation_id: Uuid,
        request: AddItemRequest,
    ) -> Result<QuotationResponse, AppError> {
        let quotation = self.find_owned(quotation_id, user_id).await?;

        let new_item = build_new_item(&request)?;
        self.quotations.add_item(quotation.id, new_item).await?;

        self.refreshed(quotation.id).await
    }

    pub async fn update_item(
        &self,
        user_id: Uuid,
        quotation_id: Uuid,
        item_id: Uuid,
        request: UpdateItemRequest,
    ) -> Result<QuotationResponse, AppError> {
        let quotation = self.find_owned(quotation_id, user_id).await?;

        let updated = self
            .quotations
            .update_item(
                quotation.id,
                item_id,
                UpdateQuotationItemFields {
                    quantity: request.quantity,
                    color: request.color,
                    size: request.size,
                    price: request.price,
                    admin_notes: request.admin_notes,
                    item_status: None,
                },
            )
            .await?;

        if updated.is_none() {
            return Err(AppError::NotFound("Item not found".to_string()));
        }

        self.refreshed(quotation.id).await
    }

    pub async fn remove_item(
        &self,
        user_id: Uuid,
        quotation_id: Uuid,
        item_id: Uuid,
    ) -> Result<QuotationResponse, AppError> {
        let quotation = self.find_owned(quotation_id, user_id).await?;

        if !self.quotations.remove_item(quotation.id, item_id).await? {
            return Err(AppError::NotFound("Item not found".to_string()));
        }

        self.refreshed(quotation.id).await
    }

    /// Enviar la cotización (Carrito -> Solicitada)
    pub async fn submit(
        &self,
        user_id: Uuid,
        quotation_id: Uuid,
    ) -> Result<QuotationResponse, AppError> {
        let quotation = self.find_owned(quotation_id, user_id).await?;

        if self.quotations.count_items(quotation.id).await? == 0 {
            return Err(AppError::Validation("Cannot submit empty quotation".to_string()));
        }

        self.quotations
            .set_status(quotation.id, QuotationStatus::Solicitada)
            .await?;

        self.refreshed(quotation.id).await
    }

    /// El administrador fija precios y notas; los items a medida pasan de
    /// pending_quote a quoted.
    pub async fn admin_set_quote(
        &self,
        quotation_id: Uuid,
        request: AdminQuoteRequest,
    ) -> Result<QuotationResponse, AppError> {
        let quotation = self
            .quotations
            .find_by_id(quotation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quotation not found".to_string()))?;

        if let Some(updates) = &request.items {
            for update in updates {
                let Some(item_id) = update.item_id else {
                    continue;
                };
                let Some(row) = self.quotations.find_item_row(quotation.id, item_id).await? else {
                    continue;
                };

                let item_status = if row.is_custom
                    && row.item_status == QuotationItemStatus::PendingQuote
                {
                    Some(QuotationItemStatus::Quoted)
                } else {
                    None
                };

                self.quotations
                    .update_item(
                        quotation.id,
                        item_id,
                        UpdateQuotationItemFields {
                            quantity: None,
                            color: None,
                            size: None,
                            price: update.price,
                            admin_notes: update.admin_notes.clone(),
                            item_status,
                        },
                    )
                    .await?;
            }
        }

        let total_estimate = match request.total_estimate {
            Some(total) => total,
            None => {
                let items = self.quotations.items(quotation.id).await?;
                items
                    .iter()
                    .map(|i| i.price * Decimal::from(i.quantity))
                    .sum()
            }
        };

        self.quotations
            .apply_quote(quotation.id, total_estimate, request.admin_notes)
            .await?;

        self.refreshed(quotation.id).await
    }

    /// Decisión del cliente sobre una cotización ya cotizada. Aceptar
    /// deriva un pedido; en ambos casos la cotización se elimina.
    pub async fn user_decision(
        &self,
        auth: &AuthUser,
        quotation_id: Uuid,
        request: DecisionRequest,
    ) -> Result<DecisionResponse, AppError> {
        let decision = match request.decision.as_deref() {
            Some("accepted") => "accepted",
            Some("rejected") => "rejected",
            _ => {
                return Err(AppError::Validation(
                    "decision must be accepted|rejected".to_string(),
                ))
            }
        };

        let quotation = self
            .quotations
            .find_by_id(quotation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quotation not found".to_string()))?;

        if quotation.user_id != auth.id {
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }

        if decision == "accepted" {
            self.quotations
                .set_status(quotation.id, QuotationStatus::EnProceso)
                .await?;
            self.derive_order(&quotation).await?;
        } else {
            self.quotations
                .set_status(quotation.id, QuotationStatus::Cerrada)
                .await?;
        }

        self.notify_admin_decision(&quotation, decision).await;

        // Se borra junto con el chat para permitir nuevas solicitudes
        self.quotations.delete_with_chat(quotation.id).await?;

        Ok(DecisionResponse {
            ok: true,
            deleted: true,
            quotation_id: quotation.id,
        })
    }

    pub async fn list_all(
        &self,
        status: Option<String>,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<(Vec<QuotationResponse>, Pagination), AppError> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(20).clamp(1, 100);

        let (quotations, total) = self.quotations.list_paginated(status, page, limit).await?;

        let mut result = Vec::with_capacity(quotations.len());
        for quotation in quotations {
            result.push(self.respond(quotation).await?);
        }

        Ok((result, Pagination::new(total, page, limit)))
    }

    pub async fn get(&self, quotation_id: Uuid) -> Result<QuotationResponse, AppError> {
        let quotation = self
            .quotations
            .find_by_id(quotation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quotation not found".to_string()))?;

        self.respond(quotation).await
    }

    /// Agregar producto de catálogo al carrito; items equivalentes se
    /// fusionan sumando cantidades.
    pub async fn add_item_to_cart(
        &self,
        user_id: Uuid,
        request: AddCartItemRequest,
    ) -> Result<QuotationResponse, AppError> {
        let product_id = request
            .product_id
            .ok_or_else(|| AppError::Validation("Valid productId is required".to_string()))?;
        let color = request
            .color
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::Validation("color is required".to_string()))?;
        let size = request.size.unwrap_or_default();
        let quantity = request.quantity.filter(|q| *q > 0).unwrap_or(1);

        let cart = self.quotations.find_or_create_cart(user_id).await?;

        match self
            .quotations
            .find_matching_cart_item(cart.id, product_id, &color, &size)
            .await?
        {
            Some(existing) => {
                self.quotations
                    .update_item(
                        cart.id,
                        existing.id,
                        UpdateQuotationItemFields {
                            quantity: Some(existing.quantity + quantity),
                            color: None,
                            size: None,
                            price: None,
                            admin_notes: None,
                            item_status: None,
                        },
                    )
                    .await?;
            }
            None => {
                self.quotations
                    .add_item(
                        cart.id,
                        NewQuotationItem {
                            kind: QuotationItemKind::Catalog { product_id },
                            quantity,
                            color,
                            size,
                            price: Decimal::ZERO,
                            item_status: QuotationItemStatus::Normal,
                        },
                    )
                    .await?;
            }
        }

        self.refreshed(cart.id).await
    }

    /// Agregar pieza a medida al carrito
    pub async fn add_custom_item_to_cart(
        &self,
        user_id: Uuid,
        request: AddCustomCartItemRequest,
    ) -> Result<QuotationResponse, AppError> {
        let name = request
            .name
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::Validation("name and description required".to_string()))?;
        let description = request
            .description
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::Validation("name and description required".to_string()))?;
        let color = request
            .color
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::Validation("color is required".to_string()))?;

        let cart = self.quotations.find_or_create_cart(user_id).await?;

        self.quotations
            .add_item(
                cart.id,
                NewQuotationItem {
                    kind: QuotationItemKind::Custom {
                        name,
                        description,
                        wood_type: request
                            .wood_type
                            .filter(|v| !v.trim().is_empty())
                            .unwrap_or_else(|| "Por definir".to_string()),
                        reference_image: request.reference_image,
                    },
                    quantity: request.quantity.filter(|q| *q > 0).unwrap_or(1),
                    color,
                    size: request.size.unwrap_or_default(),
                    price: Decimal::ZERO,
                    item_status: QuotationItemStatus::PendingQuote,
                },
            )
            .await?;

        self.refreshed(cart.id).await
    }

    pub async fn update_cart_item_quantity(
        &self,
        user_id: Uuid,
        request: UpdateCartQuantityRequest,
    ) -> Result<QuotationResponse, AppError> {
        let (item_id, quantity) = match (request.item_id, request.quantity) {
            (Some(item_id), Some(quantity)) if quantity >= 1 => (item_id, quantity),
            _ => {
                return Err(AppError::Validation(
                    "Valid itemId and quantity are required".to_string(),
                ))
            }
        };

        let cart = self
            .quotations
            .find_cart_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

        let updated = self
            .quotations
            .update_item(
                cart.id,
                item_id,
                UpdateQuotationItemFields {
                    quantity: Some(quantity),
                    color: None,
                    size: None,
                    price: None,
                    admin_notes: None,
                    item_status: None,
                },
            )
            .await?;

        if updated.is_none() {
            return Err(AppError::NotFound("Item not found in cart".to_string()));
        }

        self.refreshed(cart.id).await
    }

    pub async fn remove_cart_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
    ) -> Result<QuotationResponse, AppError> {
        let cart = self
            .quotations
            .find_cart_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;

        if !self.quotations.remove_item(cart.id, item_id).await? {
            return Err(AppError::NotFound("Item not found in cart".to_string()));
        }

        self.refreshed(cart.id).await
    }

    /// Convertir el carrito en solicitud de cotización
    pub async fn request_quotation(&self, user_id: Uuid) -> Result<QuotationResponse, AppError> {
        let cart = self.quotations.find_cart_by_user(user_id).await?;

        let cart = match cart {
            Some(cart) if self.quotations.count_items(cart.id).await? > 0 => cart,
            _ => return Err(AppError::Validation("Cart is empty".to_string())),
        };

        self.quotations
            .set_status(cart.id, QuotationStatus::Solicitada)
            .await?;

        self.refreshed(cart.id).await
    }

    pub async fn chat_messages(
        &self,
        auth: &AuthUser,
        quotation_id: Uuid,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let quotation = self
            .quotations
            .find_by_id(quotation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quotation not found".to_string()))?;

        if quotation.user_id != auth.id && !auth.has_permission("quotations", "view") {
            return Err(AppError::Forbidden("Forbidden".to_string()));
        }

        self.quotations.chat_messages(quotation_id).await
    }

    /// Pedido derivado de la cotización aceptada. El guard de 5 minutos
    /// evita duplicados por reintentos; es una heurística, no un lock.
    async fn derive_order(&self, quotation: &Quotation) -> Result<(), AppError> {
        let now = Utc::now();
        let window_start = now - Duration::minutes(5);

        if self
            .orders
            .find_recent_in_progress(quotation.user_id, window_start)
            .await?
            .is_some()
        {
            return Ok(());
        }

        let items = self.quotations.items(quotation.id).await?;
        let order_items: Vec<NewOrderItem> = items
            .iter()
            .map(|item| {
                let detail = if item.admin_notes.trim().is_empty() {
                    "Sin notas del administrador".to_string()
                } else {
                    item.admin_notes.clone()
                };

                NewOrderItem {
                    kind: ItemKind::Servicio,
                    product_id: None,
                    service_id: Some(self.state.config.default_service_id),
                    image_url: None,
                    detail: Some(detail),
                    quantity: item.quantity,
                    value: Some(item.price * Decimal::from(item.quantity)),
                }
            })
            .collect();

        self.orders
            .create(NewOrder {
                user_id: quotation.user_id,
                status: OrderStatus::EnProceso,
                address: None,
                started_at: now,
                production_started_at: None,
                initial_payment: None,
                items: order_items,
                payments: Vec::new(),
            })
            .await?;

        Ok(())
    }

    async fn notify_admin_decision(&self, quotation: &Quotation, decision: &str) {
        let to = self
            .state
            .config
            .admin_notify_email
            .clone()
            .unwrap_or_else(|| self.state.config.mail_from.clone());

        let verb = if decision == "accepted" { "ACEPTÓ" } else { "RECHAZÓ" };
        let verb_lower = if decision == "accepted" { "aceptado" } else { "rechazado" };
        let link = format!(
            "{}/cotizaciones/{}",
            self.state.config.frontend_origin, quotation.id
        );

        let message = EmailMessage {
            to,
            subject: format!("Decisión del cliente: {} la cotización", verb),
            html: Some(format!(
                "<p>El cliente ha <strong>{}</strong> la cotización.</p><p><a href=\"{}\">Ver cotización</a></p>",
                verb_lower, link
            )),
            text: Some(format!("El cliente ha {} la cotización. {}", verb_lower, link)),
        };

        if let Err(e) = self.state.mailer.send(&message).await {
            tracing::warn!("No se pudo notificar la decisión al administrador: {}", e);
        }
    }

    /// Cotización del usuario o 404 (no se filtra ajena como prohibida
    /// para no revelar existencia)
    async fn find_owned(&self, quotation_id: Uuid, user_id: Uuid) -> Result<Quotation, AppError> {
        let quotation = self
            .quotations
            .find_by_id(quotation_id)
            .await?
            .filter(|q| q.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("Quotation not found".to_string()))?;

        Ok(quotation)
    }

    async fn refreshed(&self, quotation_id: Uuid) -> Result<QuotationResponse, AppError> {
        let quotation = self
            .quotations
            .find_by_id(quotation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quotation not found".to_string()))?;

        self.respond(quotation).await
    }

    async fn respond(&self, quotation: Quotation) -> Result<QuotationResponse, AppError> {
        let items = self.quotations.items(quotation.id).await?;

        let product_ids: Vec<Uuid> = items.iter().filter_map(|i| i.kind.product_id()).collect();
        let products = self.catalog.find_products(&product_ids).await?;

        let items = items
            .into_iter()
            .map(|item| {
                let product = item
                    .kind
                    .product_id()
                    .and_then(|id| products.iter().find(|p| p.id == id).cloned());
                QuotationItemResponse { item, product }
            })
            .collect();

        let user = self.users.find_summary(quotation.user_id).await?;

        Ok(QuotationResponse {
            quotation,
            user,
            items,
        })
    }
}

/// Armar un item nuevo desde la request, validando la variante
fn build_new_item(request: &AddItemRequest) -> Result<NewQuotationItem, AppError> {
    let quantity = request.quantity.filter(|q| *q > 0).unwrap_or(1);
    let color = request.color.clone().unwrap_or_default();
    let size = request.size.clone().unwrap_or_default();

    if request.is_custom {
        let details = request.custom_details.as_ref();
        let name = details
            .and_then(|d| d.name.clone())
            .filter(|v| !v.trim().is_empty());
        let description = details
            .and_then(|d| d.description.clone())
            .filter(|v| !v.trim().is_empty());

        let (Some(name), Some(description)) = (name, description) else {
            return Err(AppError::Validation(
                "customDetails.name and description are required for custom products".to_string(),
            ));
        };

        return Ok(NewQuotationItem {
            kind: QuotationItemKind::Custom {
                name,
                description,
                wood_type: details
                    .and_then(|d| d.wood_type.clone())
                    .filter(|v| !v.trim().is_empty())
                    .unwrap_or_else(|| "Por definir".to_string()),
                reference_image: details.and_then(|d| d.reference_image.clone()),
            },
            quantity,
            color,
            size,
            price: Decimal::ZERO,
            item_status: QuotationItemStatus::PendingQuote,
        });
    }

    let product_id = request
        .product_id
        .ok_or_else(|| AppError::Validation("Valid productId is required".to_string()))?;

    Ok(NewQuotationItem {
        kind: QuotationItemKind::Catalog { product_id },
        quantity,
        color,
        size,
        price: Decimal::ZERO,
        item_status: QuotationItemStatus::Normal,
    })
}
