use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::auth::AdminSession;
use crate::utils::validation::validate_not_blank;

pub const ALL_FIELDS_REQUIRED: &str = "All fields are required.";

// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(custom(function = "validate_not_blank", message = "Email is required."))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

/// Datos públicos de la sesión de administrador
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: Uuid,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&AdminSession> for SessionInfo {
    fn from(session: &AdminSession) -> Self {
        Self {
            session_id: session.session_id,
            user_id: session.user_id,
            name: session.name.clone(),
            email: session.email.clone(),
            expires_at: session.expires_at,
        }
    }
}

// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub admin: SessionInfo,
}

// Alta pública de administradores
#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreationRequest {
    #[validate(custom(function = "validate_not_blank", message = "All fields are required."))]
    pub name: String,
    #[validate(custom(function = "validate_not_blank", message = "All fields are required."))]
    pub username: String,
    #[validate(custom(function = "validate_not_blank", message = "All fields are required."))]
    pub email: String,
    #[validate(length(min = 1, message = "All fields are required."))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AdminCreatedResponse {
    pub user_id: i64,
    pub auth_user_id: Uuid,
    pub email: String,
}
