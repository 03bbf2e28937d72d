//! Utilidades JWT
//!
//! Tokens de sesión del dashboard. El token sólo identifica la sesión; el
//! estado vivo (revocación, vistas montadas) está en `SessionContext`.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::environment::EnvironmentConfig, utils::errors::AppError};

/// Claims del token de sesión
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String, // user_id
    pub sid: Uuid,   // session_id
    pub email: String,
    pub exp: usize,
    pub iat: usize,
}

/// Configuración de JWT
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration: u64,
}

impl From<&EnvironmentConfig> for JwtConfig {
    fn from(config: &EnvironmentConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration: config.jwt_expiration,
        }
    }
}

impl JwtConfig {
    /// Instante de expiración para una sesión que empieza en `now`
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + chrono::Duration::seconds(self.expiration as i64)
    }
}

/// Generar token para una sesión
pub fn generate_token(
    session_id: Uuid,
    user_id: i64,
    email: &str,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    config: &JwtConfig,
) -> Result<String, AppError> {
    let claims = SessionClaims {
        sub: user_id.to_string(),
        sid: session_id,
        email: email.to_string(),
        exp: expires_at.timestamp() as usize,
        iat: issued_at.timestamp() as usize,
    };

    let encoding_key = EncodingKey::from_secret(config.secret.as_ref());

    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| AppError::Jwt(format!("Failed to sign session token: {}", e)))
}

/// Verificar y decodificar token
pub fn verify_token(token: &str, config: &JwtConfig) -> Result<SessionClaims, AppError> {
    let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

    let token_data = decode::<SessionClaims>(token, &decoding_key, &Validation::default())
        .map_err(|e| AppError::Jwt(format!("Invalid session token: {}", e)))?;

    Ok(token_data.claims)
}

/// Extraer token del header Authorization
pub fn extract_token_from_header(auth_header: &str) -> Result<&str, AppError> {
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Authorization header must start with 'Bearer '".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AppError::Unauthorized("Session token is empty".to_string()));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret".to_string(),
            expiration: 3600,
        }
    }

    #[test]
    fn test_token_round_trip_keeps_session_id() {
        let config = config();
        let now = Utc::now();
        let sid = Uuid::new_v4();
        let token = generate_token(sid, 42, "admin@fleet.test", now, config.expires_at(now), &config).unwrap();

        let claims = verify_token(&token, &config).unwrap();
        assert_eq!(claims.sid, sid);
        assert_eq!(claims.sub, "42");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = config();
        let now = Utc::now();
        let token = generate_token(Uuid::new_v4(), 1, "a@b.c", now, config.expires_at(now), &config).unwrap();

        let other = JwtConfig {
            secret: "other".to_string(),
            expiration: 3600,
        };
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header("Bearer abc").unwrap(), "abc");
        assert!(extract_token_from_header("Basic abc").is_err());
        assert!(extract_token_from_header("Bearer ").is_err());
    }
}
