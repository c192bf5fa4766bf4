//! Extractores de autenticación
//!
//! La sesión la emite un servicio externo; aquí solo se verifica el token
//! (header Authorization o cookie `token`) y se exponen los claims como
//! extractores de Axum. `OptionalAuthUser` permite flujos de invitado.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::{extract_bearer_token, verify_token};

/// Usuario autenticado en la request
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub permissions: Vec<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "Administrador"
    }

    pub fn has_permission(&self, module: &str, action: &str) -> bool {
        self.is_admin() || self.permissions.iter().any(|p| p == &format!("{}:{}", module, action))
    }

    pub fn require_permission(&self, module: &str, action: &str) -> Result<(), AppError> {
        if self.has_permission(module, action) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Forbidden".to_string()))
        }
    }
}

fn token_from_parts(parts: &Parts) -> Option<String> {
    if let Some(auth_header) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    {
        if let Ok(token) = extract_bearer_token(auth_header) {
            return Some(token.to_string());
        }
    }

    // Cookie de sesión `token=` como alternativa al header
    parts
        .headers
        .get(header::COOKIE)
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .map(str::trim)
                .find_map(|c| c.strip_prefix("token="))
                .map(str::to_string)
        })
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<AuthUser, AppError> {
    let token = token_from_parts(parts)
        .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))?;

    let claims = verify_token(&token, &state.config.jwt_secret)?;

    Ok(AuthUser {
        id: claims.user_id()?,
        name: claims.name.clone(),
        email: claims.email.clone(),
        role: claims.role.clone(),
        permissions: claims.permissions,
    })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)
    }
}

/// Usuario opcional: las rutas públicas aceptan invitados, y un token
/// inválido degrada a invitado en lugar de rechazar la request.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuthUser(authenticate(parts, state).ok()))
    }
}
