//! Modelos de autenticación
//!
//! Identidades del servicio de auth externo y sesiones de administrador
//! emitidas por este backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identidad devuelta por el servicio de autenticación
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Tokens emitidos por el servicio de autenticación tras un sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

/// Sesión de administrador establecida tras un login válido
#[derive(Debug, Clone, Serialize)]
pub struct AdminSession {
    pub session_id: Uuid,
    pub user_id: i64,
    pub auth_user_id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub provider_token: String,
    pub established_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Evento de cambio de estado de autenticación
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStateChange {
    SignedIn { session_id: Uuid },
    SignedOut { session_id: Uuid },
}
