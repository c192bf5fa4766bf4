//! Modelo de visita domiciliaria
//!
//! Una visita pertenece a un usuario registrado o trae los datos del
//! invitado; la validación garantiza exactamente uno de los dos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum VisitStatus {
    Pendiente,
    Confirmada,
    EnProgreso,
    Completada,
    Cancelada,
}

impl VisitStatus {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, VisitStatus::Cancelada)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::Pendiente => "pendiente",
            VisitStatus::Confirmada => "confirmada",
            VisitStatus::EnProgreso => "en_progreso",
            VisitStatus::Completada => "completada",
            VisitStatus::Cancelada => "cancelada",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    #[serde(skip)]
    pub guest_name: Option<String>,
    #[serde(skip)]
    pub guest_email: Option<String>,
    #[serde(skip)]
    pub guest_phone: Option<String>,
    pub visit_date: DateTime<Utc>,
    pub visit_time: Option<String>,
    pub address: String,
    pub status: VisitStatus,
    #[serde(rename = "services")]
    pub service_ids: Vec<Uuid>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Visit {
    pub fn is_guest(&self) -> bool {
        self.user_id.is_none()
    }

    pub fn guest_info(&self) -> Option<GuestInfo> {
        match (&self.guest_name, &self.guest_email, &self.guest_phone) {
            (Some(name), Some(email), Some(phone)) => Some(GuestInfo {
                name: name.clone(),
                email: email.clone(),
                phone: phone.clone(),
            }),
            _ => None,
        }
    }
}
