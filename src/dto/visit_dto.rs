use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserSummary;
use crate::models::visit::{GuestInfo, Visit, VisitStatus};

/// Reserva de visita (usuario autenticado o invitado)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVisitRequest {
    pub visit_date: Option<String>,
    pub visit_time: Option<String>,
    pub address: Option<String>,
    pub status: Option<VisitStatus>,
    pub description: Option<String>,
    #[serde(default)]
    pub services: Vec<Uuid>,
    // Datos del invitado cuando no hay sesión
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVisitRequest {
    pub status: Option<VisitStatus>,
    pub address: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvailableSlotsQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitResponse {
    #[serde(flatten)]
    pub visit: Visit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_info: Option<GuestInfo>,
    pub is_guest: bool,
}

impl VisitResponse {
    pub fn new(visit: Visit, user: Option<UserSummary>) -> Self {
        let guest_info = visit.guest_info();
        let is_guest = visit.is_guest();
        Self {
            visit,
            user,
            guest_info,
            is_guest,
        }
    }
}
