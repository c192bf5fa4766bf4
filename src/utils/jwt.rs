//! Utilidades JWT
//!
//! Verificación de tokens de sesión emitidos por el servicio de
//! autenticación externo. Aquí solo se validan y decodifican.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::errors::AppError;

/// Claims del token de sesión
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl JwtClaims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::Unauthorized("Token subject is not a valid user id".to_string()))
    }
}

/// Verificar y decodificar un token de sesión
pub fn verify_token(token: &str, secret: &str) -> Result<JwtClaims, AppError> {
    let decoding_key = DecodingKey::from_secret(secret.as_ref());

    let token_data = decode::<JwtClaims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AppError::Unauthorized(format!("Token inválido: {}", e)))?;

    Ok(token_data.claims)
}

/// Generar un token de sesión (usado por los tests y herramientas internas;
/// la emisión real vive en el servicio de autenticación)
pub fn generate_token(claims: &JwtClaims, secret: &str) -> Result<String, AppError> {
    let encoding_key = EncodingKey::from_secret(secret.as_ref());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AppError::Internal(format!("Error generando token: {}", e)))
}

/// Extraer el token del header Authorization
pub fn extract_bearer_token(auth_header: &str) -> Result<&str, AppError> {
    if !auth_header.starts_with("Bearer ") {
        return Err(AppError::Unauthorized(
            "Header Authorization debe comenzar con 'Bearer '".to_string(),
        ));
    }

    let token = &auth_header[7..];
    if token.is_empty() {
        return Err(AppError::Unauthorized("Token no puede estar vacío".to_string()));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> JwtClaims {
        let now = chrono::Utc::now().timestamp();
        JwtClaims {
            sub: Uuid::new_v4().to_string(),
            name: "Cliente".to_string(),
            email: "cliente@test.com".to_string(),
            role: "Usuario".to_string(),
            permissions: vec!["orders:view".to_string()],
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn test_round_trip() {
        let claims = sample_claims();
        let token = generate_token(&claims, "secret").unwrap();
        let decoded = verify_token(&token, "secret").unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.permissions, claims.permissions);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = generate_token(&sample_claims(), "secret").unwrap();
        assert!(verify_token(&token, "otro").is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(extract_bearer_token("Basic abc").is_err());
        assert!(extract_bearer_token("Bearer ").is_err());
    }
}
