use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::dto::auth_dto::{AdminCreatedResponse, AdminCreationRequest, LoginRequest, LoginResponse, SessionInfo};
use crate::dto::ApiResponse;
use crate::models::auth::AdminSession;
use crate::state::AppState;
use crate::utils::errors::{internal_error, AppResult};

/// Endpoint de login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    payload.validate()?;
    let response = state.auth.login(&payload).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// Endpoint de logout: revoca la sesión y desmonta sus vistas
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> AppResult<Json<ApiResponse<()>>> {
    state.auth.logout(&session).await?;
    Ok(Json(ApiResponse::message("Logout successful")))
}

/// Sesión actual
pub async fn current_session(
    Extension(session): Extension<AdminSession>,
) -> Json<ApiResponse<SessionInfo>> {
    Json(ApiResponse::success(SessionInfo::from(&session)))
}

/// Alta pública de administradores
pub async fn create_admin(
    State(state): State<AppState>,
    Json(payload): Json<AdminCreationRequest>,
) -> AppResult<Json<ApiResponse<AdminCreatedResponse>>> {
    payload.validate()?;
    let user = state.auth.create_admin(&payload).await?;
    let auth_user_id = user
        .auth_user_id
        .ok_or_else(|| internal_error("Created admin has no auth identity"))?;

    Ok(Json(ApiResponse::success_with_message(
        AdminCreatedResponse {
            user_id: user.user_id,
            auth_user_id,
            email: user.email,
        },
        "Admin user created successfully!",
    )))
}
