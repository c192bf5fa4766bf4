//! Agenda de visitas domiciliarias
//!
//! La reserva valida los datos del solicitante (usuario o invitado),
//! aplica la regla de exclusión de 3 horas y manda el correo de
//! confirmación sin bloquear la creación si el envío falla.

use chrono::{Datelike, NaiveDate, Utc};
use uuid::Uuid;

use crate::clients::mailer_client::EmailMessage;
use crate::dto::visit_dto::{CreateVisitRequest, UpdateVisitRequest, VisitResponse};
use crate::middleware::auth_middleware::AuthUser;
use crate::models::visit::{Visit, VisitStatus};
use crate::repositories::user_repository::UserRepository;
use crate::repositories::visit_repository::{NewVisit, VisitRepository};
use crate::services::slot_allocator;
use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::validation::{is_valid_email, parse_visit_datetime};

pub struct VisitController {
    state: AppState,
    repository: VisitRepository,
    users: UserRepository,
}

impl VisitController {
    pub fn new(state: AppState) -> Self {
        let pool = state.pool.clone();
        Self {
            state,
            repository: VisitRepository::new(pool.clone()),
            users: UserRepository::new(pool),
        }
    }

    /// Reserva pública: con sesión usa los datos del usuario, sin sesión
    /// exige los datos del invitado.
    pub async fn create_for_me(
        &self,
        auth: Option<AuthUser>,
        request: CreateVisitRequest,
    ) -> Result<(VisitResponse, String), AppError> {
        let visit_date_raw = request
            .visit_date
            .as_deref()
            .ok_or_else(|| AppError::Validation("visitDate is required".to_string()))?;

        let visit_date = parse_visit_datetime(visit_date_raw, request.visit_time.as_deref())
            .ok_or_else(|| AppError::Validation("visitDate is invalid".to_string()))?;

        let address = request
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| AppError::Validation("address is required".to_string()))?
            .to_string();

        let (guest_name, guest_email, guest_phone) = match &auth {
            Some(_) => (None, None, None),
            None => {
                let name = request
                    .user_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| {
                        AppError::Validation("userName is required for guest visits".to_string())
                    })?;
                let email = request
                    .user_email
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| {
                        AppError::Validation("userEmail is required for guest visits".to_string())
                    })?;
                if !is_valid_email(email) {
                    return Err(AppError::Validation("Invalid email format".to_string()));
                }
                let phone = request
                    .user_phone
                    .as_deref()
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| {
                        AppError::Validation("userPhone is required for guest visits".to_string())
                    })?;
                (
                    Some(name.to_string()),
                    Some(email.to_string()),
                    Some(phone.to_string()),
                )
            }
        };

        let visit = self
            .repository
            .create_checked(NewVisit {
                user_id: auth.as_ref().map(|u| u.id),
                guest_name,
                guest_email,
                guest_phone,
                visit_date,
                visit_time: request.visit_time.clone(),
                address,
                status: request.status.unwrap_or(VisitStatus::Pendiente),
                service_ids: request.services,
                description: request
                    .description
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
            })
            .await?;

        let (email_to, name_for_email) = match &auth {
            Some(user) => (user.email.clone(), user.name.clone()),
            None => (
                visit.guest_email.clone().unwrap_or_default(),
                visit.guest_name.clone().unwrap_or_default(),
            ),
        };

        self.send_confirmation_email(&visit, &email_to, &name_for_email).await;

        let response = self.respond(visit).await?;
        let message = if auth.is_some() {
            "Visit created successfully".to_string()
        } else {
            "Visit created successfully. We will contact you soon.".to_string()
        };

        Ok((response, message))
    }

    /// Alta de visita por un administrador, a su propio nombre
    pub async fn create(
        &self,
        auth: AuthUser,
        request: CreateVisitRequest,
    ) -> Result<VisitResponse, AppError> {
        let visit_date_raw = request
            .visit_date
            .as_deref()
            .ok_or_else(|| AppError::Validation("visitDate is required".to_string()))?;

        let visit_date = parse_visit_datetime(visit_date_raw, request.visit_time.as_deref())
            .ok_or_else(|| AppError::Validation("visitDate is invalid".to_string()))?;

        let address = request
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| AppError::Validation("address is required".to_string()))?
            .to_string();

        let visit = self
            .repository
            .create_checked(NewVisit {
                user_id: Some(auth.id),
                guest_name: None,
                guest_email: None,
                guest_phone: None,
                visit_date,
                visit_time: request.visit_time.clone(),
                address,
                status: request.status.unwrap_or(VisitStatus::Pendiente),
                service_ids: request.services,
                description: request
                    .description
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
            })
            .await?;

        self.send_confirmation_email(&visit, &auth.email, &auth.name).await;

        self.respond(visit).await
    }

    pub async fn list(&self) -> Result<Vec<VisitResponse>, AppError> {
        let visits = self.repository.list_all().await?;
        self.respond_many(visits).await
    }

    pub async fn get(&self, id: Uuid) -> Result<VisitResponse, AppError> {
        let visit = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

        self.respond(visit).await
    }

    pub async fn list_mine(&self, user_id: Uuid) -> Result<Vec<VisitResponse>, AppError> {
        let visits = self.repository.list_by_user(user_id).await?;
        self.respond_many(visits).await
    }

    /// Horas del día que siguen libres según la regla de exclusión
    pub async fn available_slots(&self, date: Option<&str>) -> Result<Vec<String>, AppError> {
        let date = date
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
            .ok_or_else(|| AppError::Validation("date query parameter is required".to_string()))?;

        let visits = self.repository.list_for_day(date).await?;

        Ok(slot_allocator::filter_available_slots(date, &visits))
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateVisitRequest,
    ) -> Result<VisitResponse, AppError> {
        let visit = self
            .repository
            .update(id, request.status, request.address, request.description)
            .await?
            .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

        self.respond(visit).await
    }

    async fn respond(&self, visit: Visit) -> Result<VisitResponse, AppError> {
        let user = match visit.user_id {
            Some(user_id) => self.users.find_summary(user_id).await?,
            None => None,
        };

        Ok(VisitResponse::new(visit, user))
    }

    async fn respond_many(&self, visits: Vec<Visit>) -> Result<Vec<VisitResponse>, AppError> {
        let user_ids: Vec<Uuid> = visits.iter().filter_map(|v| v.user_id).collect();
        let users = self.users.find_summaries(&user_ids).await?;

        Ok(visits
            .into_iter()
            .map(|visit| {
                let user = visit
                    .user_id
                    .and_then(|id| users.iter().find(|u| u.id == id).cloned());
                VisitResponse::new(visit, user)
            })
            .collect())
    }

    async fn send_confirmation_email(&self, visit: &Visit, to: &str, user_name: &str) {
        if to.is_empty() {
            return;
        }

        let name = if user_name.is_empty() { "Usuario" } else { user_name };
        let variables = [
            ("USER_NAME", name.to_string()),
            ("VISIT_DATE", visit.visit_date.format("%d/%m/%Y").to_string()),
            (
                "VISIT_TIME",
                visit
                    .visit_time
                    .clone()
                    .unwrap_or_else(|| "No especificada".to_string()),
            ),
            ("ADDRESS", visit.address.clone()),
            (
                "DESCRIPTION_BLOCK",
                visit
                    .description
                    .clone()
                    .unwrap_or_else(|| "Sin descripción".to_string()),
            ),
            ("STATUS", visit.status.as_str().to_string()),
            ("YEAR", Utc::now().year().to_string()),
        ];

        let html = match self.state.templates.render("visit-confirmation", &variables).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("No se pudo renderizar la plantilla de confirmación: {}", e);
                return;
            }
        };

        let message = EmailMessage {
            to: to.to_string(),
            subject: "Confirmación de visita agendada".to_string(),
            html: Some(html),
            text: None,
        };

        if let Err(e) = self.state.mailer.send(&message).await {
            tracing::warn!("Email failed but visit was created: {}", e);
        }
    }
}
