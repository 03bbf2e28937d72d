//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::clients::AuthProvider;
use crate::config::environment::EnvironmentConfig;
use crate::map::MapConfig;
use crate::repositories::FleetStore;
use crate::services::analytics_service::AnalyticsService;
use crate::services::auth_service::AuthService;
use crate::services::geocoding_service::ReverseGeocoder;
use crate::services::live_view::LiveViewRegistry;
use crate::services::realtime::RealtimeHub;
use crate::services::session::SessionContext;
use crate::utils::jwt::JwtConfig;

/// Periodo del barrido de sesiones vencidas
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub store: Arc<dyn FleetStore>,
    pub auth_provider: Arc<dyn AuthProvider>,
    pub sessions: Arc<SessionContext>,
    pub realtime: Arc<RealtimeHub>,
    pub auth: Arc<AuthService>,
    pub analytics: Arc<AnalyticsService>,
    pub live_views: Arc<LiveViewRegistry>,
    pub map_config: MapConfig,
}

impl AppState {
    pub fn new(
        config: EnvironmentConfig,
        store: Arc<dyn FleetStore>,
        auth_provider: Arc<dyn AuthProvider>,
        geocoder: Arc<dyn ReverseGeocoder>,
        realtime: Arc<RealtimeHub>,
    ) -> Self {
        let map_config = MapConfig::new(config.mapbox_token.clone());
        let sessions = Arc::new(SessionContext::new());

        let auth = AuthService::new(
            store.clone(),
            auth_provider.clone(),
            sessions.clone(),
            JwtConfig::from(&config),
        );
        let analytics = AnalyticsService::new(
            store.clone(),
            geocoder,
            map_config.clone(),
            config.utc_offset_hours,
        );
        let live_views = LiveViewRegistry::new(
            store.clone(),
            map_config.clone(),
            config.live_poll_interval,
            config.live_debounce,
        );

        Self {
            config: Arc::new(config),
            store,
            auth_provider,
            sessions,
            realtime,
            auth: Arc::new(auth),
            analytics: Arc::new(analytics),
            live_views: Arc::new(live_views),
            map_config,
        }
    }

    /// Tareas de fondo: desmontaje de vistas al cerrar o vencer la sesión y
    /// refresco de flota
    pub fn spawn_background_tasks(&self) -> Vec<JoinHandle<()>> {
        vec![
            self.live_views
                .clone()
                .watch_sign_outs(self.sessions.subscribe()),
            self.sessions
                .clone()
                .spawn_expiry_sweeper(SESSION_SWEEP_INTERVAL),
            self.analytics
                .clone()
                .spawn_fleet_status_refresher(&self.realtime),
        ]
    }
}
