use axum::{
    routing::{get, post},
    Router,
};

use crate::controllers::analytics_controller::{heatmap, pickup_dropoff};
use crate::controllers::map_controller::{click_marker, get_view, map_config, mount_view, unmount_view};
use crate::state::AppState;

/// Configuración del mapa, sin sesión
pub fn public_map_routes() -> Router<AppState> {
    Router::new().route("/config", get(map_config))
}

/// Vistas en vivo del mapa de flota
pub fn live_view_routes() -> Router<AppState> {
    Router::new()
        .route("/views", post(mount_view))
        .route("/views/:id", get(get_view).delete(unmount_view))
        .route("/views/:id/markers/:marker/click", post(click_marker))
}

/// Mapas estáticos: heatmap y recogidas/destinos
pub fn static_map_routes() -> Router<AppState> {
    Router::new()
        .route("/api/heatmap", get(heatmap))
        .route("/api/pickup-dropoff", get(pickup_dropoff))
}
