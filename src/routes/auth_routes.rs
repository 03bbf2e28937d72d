use axum::{
    routing::{get, post},
    Router,
};

use crate::controllers::auth_controller::{create_admin, current_session, login, logout};
use crate::state::AppState;

/// Rutas públicas de autenticación
pub fn public_auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Rutas de autenticación que requieren sesión
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/session", get(current_session))
}

/// Alta pública de administradores
pub fn admin_creation_routes() -> Router<AppState> {
    Router::new().route("/", post(create_admin))
}
