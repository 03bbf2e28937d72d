//! Router HTTP del dashboard
//!
//! Agrupa las rutas públicas (login, alta de administradores, configuración
//! del mapa) y las protegidas por sesión detrás de `require_session`.

pub mod account_routes;
pub mod analytics_routes;
pub mod auth_routes;
pub mod map_routes;
pub mod vehicle_routes;

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use serde::Serialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::controllers::analytics_controller::ratings;
use crate::middleware::{cors_middleware, require_session};
use crate::state::AppState;

/// Pantallas del dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DashboardRoute {
    Login,
    Maps,
    Drivers,
    Account,
    Heatmap,
    DataAnalytics,
    PickupDropoff,
    Ratings,
    AdminCreation,
}

impl DashboardRoute {
    pub const ALL: [DashboardRoute; 9] = [
        DashboardRoute::Login,
        DashboardRoute::Maps,
        DashboardRoute::Drivers,
        DashboardRoute::Account,
        DashboardRoute::Heatmap,
        DashboardRoute::DataAnalytics,
        DashboardRoute::PickupDropoff,
        DashboardRoute::Ratings,
        DashboardRoute::AdminCreation,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            DashboardRoute::Login => "/",
            DashboardRoute::Maps => "/maps",
            DashboardRoute::Drivers => "/drivers",
            DashboardRoute::Account => "/account",
            DashboardRoute::Heatmap => "/heatmap",
            DashboardRoute::DataAnalytics => "/data-analytics",
            DashboardRoute::PickupDropoff => "/pickup-dropoff",
            DashboardRoute::Ratings => "/ratings",
            DashboardRoute::AdminCreation => "/admin-creation",
        }
    }

    /// Sólo el login y el alta de administradores son públicos
    pub fn requires_session(&self) -> bool {
        !matches!(self, DashboardRoute::Login | DashboardRoute::AdminCreation)
    }

    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|route| route.path() == path)
    }
}

#[derive(Debug, Serialize)]
struct RouteEntry {
    route: DashboardRoute,
    path: &'static str,
    requires_session: bool,
}

async fn list_routes() -> Json<Vec<RouteEntry>> {
    Json(
        DashboardRoute::ALL
            .into_iter()
            .map(|route| RouteEntry {
                route,
                path: route.path(),
                requires_session: route.requires_session(),
            })
            .collect(),
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "fleet-dashboard",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Construye el router completo con estado, trazas y CORS
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth_routes::public_auth_routes())
        .nest("/api/admin-creation", auth_routes::admin_creation_routes())
        .nest("/api/maps", map_routes::public_map_routes());

    let protected = Router::new()
        .route("/api/routes", get(list_routes))
        .nest("/api/auth", auth_routes::session_routes())
        .nest("/api/maps", map_routes::live_view_routes())
        .nest("/api/drivers", vehicle_routes::create_vehicle_router())
        .nest("/api/account", account_routes::create_account_router())
        .nest("/api/data-analytics", analytics_routes::create_analytics_router())
        .merge(map_routes::static_map_routes())
        .route("/api/ratings", get(ratings))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let cors = cors_middleware(&state.config);

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_login_and_admin_creation_are_public() {
        let public: Vec<_> = DashboardRoute::ALL
            .into_iter()
            .filter(|route| !route.requires_session())
            .collect();
        assert_eq!(public, vec![DashboardRoute::Login, DashboardRoute::AdminCreation]);
    }

    #[test]
    fn test_paths_resolve() {
        assert_eq!(DashboardRoute::from_path("/data-analytics"), Some(DashboardRoute::DataAnalytics));
        assert_eq!(DashboardRoute::from_path("/nope"), None);
    }
}
