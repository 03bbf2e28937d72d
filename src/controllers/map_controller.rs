use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::dto::ApiResponse;
use crate::map::{MapConfig, MarkerHandle, Popup};
use crate::models::auth::AdminSession;
use crate::services::live_view::{LiveView, LiveViewSnapshot};
use crate::state::AppState;
use crate::utils::errors::{not_found_error, AppResult};
use std::sync::Arc;

/// Configuración pública del mapa
pub async fn map_config(State(state): State<AppState>) -> Json<MapConfig> {
    Json(state.map_config.clone())
}

async fn owned_view(state: &AppState, session: &AdminSession, view_id: Uuid) -> AppResult<Arc<LiveView>> {
    state
        .live_views
        .get(view_id, session.session_id)
        .await
        .ok_or_else(|| not_found_error("Live view", &view_id.to_string()))
}

/// Monta una vista en vivo y arranca su sondeo
pub async fn mount_view(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
) -> Json<ApiResponse<LiveViewSnapshot>> {
    let view = state.live_views.mount(session.session_id).await;
    Json(ApiResponse::success(view.snapshot().await))
}

pub async fn get_view(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(view_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<LiveViewSnapshot>>> {
    let view = owned_view(&state, &session, view_id).await?;
    Ok(Json(ApiResponse::success(view.snapshot().await)))
}

/// Click en un marcador: devuelve el popup del vehículo
pub async fn click_marker(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path((view_id, marker)): Path<(Uuid, u64)>,
) -> AppResult<Json<ApiResponse<Option<Popup>>>> {
    let view = owned_view(&state, &session, view_id).await?;
    let popup = view.click(MarkerHandle(marker)).await?;
    Ok(Json(ApiResponse::success(popup)))
}

pub async fn unmount_view(
    State(state): State<AppState>,
    Extension(session): Extension<AdminSession>,
    Path(view_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    if !state.live_views.unmount(view_id, session.session_id).await {
        return Err(not_found_error("Live view", &view_id.to_string()));
    }
    Ok(Json(ApiResponse::message("Live view unmounted")))
}
