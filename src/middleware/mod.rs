//! Middleware del sistema
//!
//! Guard de sesión y CORS.

pub mod auth;
pub mod cors;

pub use auth::require_session;
pub use cors::cors_middleware;
