//! Middleware de autenticación de sesión
//!
//! Valida el token de sesión del header Authorization contra el
//! `SessionContext` e inyecta la `AdminSession` en las extensions.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    state::AppState,
    utils::errors::AppError,
    utils::jwt::extract_token_from_header,
};

/// Guard de rutas del dashboard: sin sesión viva no hay acceso
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Authorization header required".to_string()))?;

    let token = extract_token_from_header(auth_header)?;
    let session = state.auth.authenticate(token).await?;

    tracing::debug!("🔐 Sesión {} autorizada para {}", session.session_id, request.uri().path());
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
