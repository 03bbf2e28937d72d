//! Clients - frontera con el servicio de autenticación
//!
//! `AuthProvider` cubre las cinco operaciones que el dashboard necesita del
//! servicio de auth alojado. Hay un cliente REST para GoTrue y un proveedor
//! en memoria para tests y modo demo.

pub mod memory_auth;
pub mod supabase_auth;

pub use memory_auth::MemoryAuthProvider;
pub use supabase_auth::SupabaseAuthClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::{AuthTokens, AuthUser};

/// Error estructurado del servicio de autenticación
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthProviderError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("User already registered")]
    AlreadyRegistered,

    #[error("Auth session missing or expired")]
    SessionMissing,

    #[error("Auth request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Auth service unreachable: {0}")]
    Transport(String),

    #[error("Malformed auth response: {0}")]
    Decode(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

pub type AuthProviderResult<T> = Result<T, AuthProviderError>;

/// Operaciones del servicio de auth alojado
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> AuthProviderResult<AuthTokens>;
    async fn sign_up(&self, email: &str, password: &str) -> AuthProviderResult<AuthUser>;
    async fn sign_out(&self, access_token: &str) -> AuthProviderResult<()>;
    async fn get_user(&self, access_token: &str) -> AuthProviderResult<AuthUser>;
    async fn update_password(&self, access_token: &str, new_password: &str) -> AuthProviderResult<()>;
}
