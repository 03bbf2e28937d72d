use axum::{
    extract::State,
    routing::{get, put},
    Extension, Json, Router,
};

use crate::controllers::account_controller::AccountController;
use crate::dto::account_dto::{AccountResponse, ChangePasswordRequest, UpdateAccountRequest};
use crate::dto::ApiResponse;
use crate::models::auth::AdminSession;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_account_router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_account).put(update_account))
        .route("/password", put(change_password))
}

fn controller(state: &AppState) -> AccountController {
    AccountController::new(state.store.clone(), state.auth_provider.clone())
}

async fn get_account(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> Result<Json<ApiResponse<AccountResponse>>, AppError> {
    let account = controller(&state).get(&session).await?;
    Ok(Json(ApiResponse::success(account)))
}

async fn update_account(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<AccountResponse>>, AppError> {
    let response = controller(&state).update(&session, request).await?;
    Ok(Json(response))
}

async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    controller(&state).change_password(&session, request).await?;
    Ok(Json(ApiResponse::message("Password updated successfully")))
}
