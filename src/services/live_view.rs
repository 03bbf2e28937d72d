//! Vistas de mapa en vivo
//!
//! Cada vista montada posee su reconciliador, sus marcadores y su tarea de
//! sondeo. El estado de la vista vive detrás de un mutex propio; ninguna
//! vista comparte estado con otra. Desmontar una vista para su sondeo y
//! descarta cualquier respuesta tardía.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use uuid::Uuid;

use crate::map::{
    live_markers::LiveMarkers, BoardView, MapConfig, MapError, MapSurface, MarkerBoard,
    MarkerHandle, Popup,
};
use crate::models::auth::AuthStateChange;
use crate::models::location::VehicleLocationRecord;
use crate::repositories::{FleetStore, StoreResult};
use crate::services::live_location::LocationReconciler;
use crate::services::polling::{spawn_polling, PollHandle, PollTarget};
use crate::services::session::AuthSubscription;

struct LiveViewState {
    reconciler: LocationReconciler,
    markers: LiveMarkers,
    board: MarkerBoard,
    revision: u64,
}

/// Estado de una vista tal como lo consume el cliente
#[derive(Debug, Clone, Serialize)]
pub struct LiveViewSnapshot {
    pub view_id: Uuid,
    pub revision: u64,
    pub vehicles: usize,
    pub board: BoardView,
}

pub struct LiveView {
    id: Uuid,
    session_id: Uuid,
    store: Arc<dyn FleetStore>,
    state: Mutex<LiveViewState>,
}

impl LiveView {
    fn new(session_id: Uuid, store: Arc<dyn FleetStore>, config: MapConfig, debounce: Duration) -> Self {
        let mut board = MarkerBoard::new(config);
        board.load();

        Self {
            id: Uuid::new_v4(),
            session_id,
            store,
            state: Mutex::new(LiveViewState {
                reconciler: LocationReconciler::new(debounce),
                markers: LiveMarkers::new(),
                board,
                revision: 0,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub async fn snapshot(&self) -> LiveViewSnapshot {
        let state = self.state.lock().await;
        LiveViewSnapshot {
            view_id: self.id,
            revision: state.revision,
            vehicles: state.markers.len(),
            board: state.board.view(),
        }
    }

    /// Click en un marcador de vehículo
    pub async fn click(&self, handle: MarkerHandle) -> Result<Option<Popup>, MapError> {
        self.state.lock().await.board.click(handle)
    }

    /// Retira los marcadores de la superficie; el sondeo ya debe estar parado
    async fn teardown(&self) {
        let mut state = self.state.lock().await;
        let LiveViewState { markers, board, .. } = &mut *state;
        markers.clear(board);
    }
}

impl MountedView {
    async fn unmount(self) {
        self.poller.stop().await;
        self.view.teardown().await;
    }
}

#[async_trait]
impl PollTarget for LiveView {
    type Output = StoreResult<Vec<VehicleLocationRecord>>;

    async fn fetch(&self) -> Self::Output {
        self.store.vehicle_locations().await
    }

    async fn complete(&self, seq: u64, output: Self::Output, now: Instant) -> Option<Instant> {
        let mut state = self.state.lock().await;
        state.reconciler.accept(seq, output, now);
        state.reconciler.next_deadline()
    }

    async fn flush(&self, now: Instant) -> Option<Instant> {
        let mut state = self.state.lock().await;
        let LiveViewState {
            reconciler,
            markers,
            board,
            revision,
        } = &mut *state;

        if let Some(diff) = reconciler.flush_due(now) {
            match markers.apply(&diff, board) {
                Ok(()) => {
                    *revision += 1;
                    tracing::debug!(
                        "🚌 Vista {}: +{} -{} ~{} marcadores",
                        self.id,
                        diff.added.len(),
                        diff.removed.len(),
                        diff.moved.len()
                    );
                }
                Err(e) => tracing::error!("❌ Vista {}: no se pudo aplicar diff: {}", self.id, e),
            }
        }
        reconciler.next_deadline()
    }
}

struct MountedView {
    view: Arc<LiveView>,
    poller: PollHandle,
}

/// Registro de vistas montadas
pub struct LiveViewRegistry {
    store: Arc<dyn FleetStore>,
    map_config: MapConfig,
    poll_interval: Duration,
    debounce: Duration,
    views: Mutex<HashMap<Uuid, MountedView>>,
}

impl LiveViewRegistry {
    pub fn new(
        store: Arc<dyn FleetStore>,
        map_config: MapConfig,
        poll_interval: Duration,
        debounce: Duration,
    ) -> Self {
        Self {
            store,
            map_config,
            poll_interval,
            debounce,
            views: Mutex::new(HashMap::new()),
        }
    }

    /// Monta una vista y arranca su sondeo
    pub async fn mount(&self, session_id: Uuid) -> Arc<LiveView> {
        let view = Arc::new(LiveView::new(
            session_id,
            self.store.clone(),
            self.map_config.clone(),
            self.debounce,
        ));
        let poller = spawn_polling(view.clone(), self.poll_interval);

        self.views.lock().await.insert(
            view.id,
            MountedView {
                view: view.clone(),
                poller,
            },
        );
        tracing::info!("🗺️ Vista {} montada para sesión {}", view.id, session_id);
        view
    }

    /// Vista montada, sólo si pertenece a la sesión
    pub async fn get(&self, view_id: Uuid, session_id: Uuid) -> Option<Arc<LiveView>> {
        self.views
            .lock()
            .await
            .get(&view_id)
            .filter(|mounted| mounted.view.session_id == session_id)
            .map(|mounted| mounted.view.clone())
    }

    pub async fn unmount(&self, view_id: Uuid, session_id: Uuid) -> bool {
        let mounted = {
            let mut views = self.views.lock().await;
            match views.get(&view_id) {
                Some(m) if m.view.session_id == session_id => views.remove(&view_id),
                _ => None,
            }
        };

        match mounted {
            Some(mounted) => {
                mounted.unmount().await;
                tracing::info!("🧹 Vista {} desmontada", view_id);
                true
            }
            None => false,
        }
    }

    /// Desmonta todas las vistas de una sesión
    pub async fn unmount_session(&self, session_id: Uuid) -> usize {
        let removed: Vec<MountedView> = {
            let mut views = self.views.lock().await;
            let ids: Vec<Uuid> = views
                .iter()
                .filter(|(_, m)| m.view.session_id == session_id)
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| views.remove(id)).collect()
        };

        let count = removed.len();
        for mounted in removed {
            mounted.unmount().await;
        }
        if count > 0 {
            tracing::info!("🧹 {} vistas desmontadas al cerrar sesión {}", count, session_id);
        }
        count
    }

    pub async fn mounted_count(&self) -> usize {
        self.views.lock().await.len()
    }

    /// Desmonta las vistas de cada sesión que se cierra
    pub fn watch_sign_outs(self: Arc<Self>, mut subscription: AuthSubscription) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(change) = subscription.next().await {
                if let AuthStateChange::SignedOut { session_id } = change {
                    self.unmount_session(session_id).await;
                }
            }
            subscription.unsubscribe();
        })
    }

    /// Para todos los sondeos (apagado del servidor)
    pub async fn shutdown(&self) {
        let drained: Vec<MountedView> = self.views.lock().await.drain().map(|(_, m)| m).collect();
        for mounted in drained {
            mounted.unmount().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::location::LngLat;
    use crate::models::vehicle::Vehicle;
    use crate::repositories::MemoryFleetStore;
    use crate::services::session::SessionContext;
    use crate::models::auth::AdminSession;

    fn jeep(id: i64, status: bool, position: Option<LngLat>) -> Vehicle {
        Vehicle {
            mjeep_id: id,
            mjeep_code: format!("MJ-{:02}", id),
            plate_number: format!("PLT-{}", id),
            seats: 22,
            status,
            driver_id: None,
            driver_name: None,
            position,
        }
    }

    fn registry(store: Arc<MemoryFleetStore>) -> LiveViewRegistry {
        LiveViewRegistry::new(
            store,
            MapConfig::new(None),
            Duration::from_millis(1000),
            Duration::from_millis(300),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_active_located_vehicles_render() {
        let store = Arc::new(
            MemoryFleetStore::new()
                .with_vehicle(jeep(1, true, Some(LngLat::new(123.2, 13.6))))
                .with_vehicle(jeep(2, false, Some(LngLat::new(123.21, 13.6))))
                .with_vehicle(jeep(3, true, None)),
        );
        let registry = registry(store);
        let view = registry.mount(Uuid::new_v4()).await;

        tokio::time::sleep(Duration::from_millis(500)).await;
        let snapshot = view.snapshot().await;
        assert_eq!(snapshot.vehicles, 1);
        assert_eq!(snapshot.board.markers.len(), 1);
        assert_eq!(snapshot.board.markers[0].position, LngLat::new(123.2, 13.6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_positions_keep_markers() {
        let store = Arc::new(
            MemoryFleetStore::new().with_vehicle(jeep(1, true, Some(LngLat::new(123.2, 13.6)))),
        );
        let registry = registry(store);
        let view = registry.mount(Uuid::new_v4()).await;

        tokio::time::sleep(Duration::from_millis(500)).await;
        let first = view.snapshot().await;
        tokio::time::sleep(Duration::from_millis(3000)).await;
        let later = view.snapshot().await;

        assert_eq!(first.revision, 1);
        assert_eq!(later.revision, 1);
        assert_eq!(first.board.markers[0].handle, later.board.markers[0].handle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivation_removes_marker() {
        let store = Arc::new(
            MemoryFleetStore::new().with_vehicle(jeep(1, true, Some(LngLat::new(123.2, 13.6)))),
        );
        let registry = registry(store.clone());
        let view = registry.mount(Uuid::new_v4()).await;

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(view.snapshot().await.vehicles, 1);

        store.set_vehicle_status(1, false).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(view.snapshot().await.vehicles, 0);
        assert!(view.snapshot().await.board.markers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_moved_vehicle_updates_marker() {
        let store = Arc::new(
            MemoryFleetStore::new().with_vehicle(jeep(1, true, Some(LngLat::new(123.2, 13.6)))),
        );
        let registry = registry(store.clone());
        let view = registry.mount(Uuid::new_v4()).await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        store
            .set_vehicle_position(1, Some(LngLat::new(123.25, 13.62)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let snapshot = view.snapshot().await;
        assert_eq!(snapshot.revision, 2);
        assert_eq!(snapshot.board.markers[0].position, LngLat::new(123.25, 13.62));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_outage_keeps_markers() {
        let store = Arc::new(
            MemoryFleetStore::new().with_vehicle(jeep(1, true, Some(LngLat::new(123.2, 13.6)))),
        );
        let registry = registry(store.clone());
        let view = registry.mount(Uuid::new_v4()).await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        store.set_unavailable(true);
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(view.snapshot().await.vehicles, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_clears_markers() {
        let store = Arc::new(
            MemoryFleetStore::new().with_vehicle(jeep(1, true, Some(LngLat::new(123.2, 13.6)))),
        );
        let registry = registry(store);
        let owner = Uuid::new_v4();
        let view = registry.mount(owner).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(view.snapshot().await.board.markers.len(), 1);

        assert!(registry.unmount(view.id(), owner).await);
        let snapshot = view.snapshot().await;
        assert_eq!(snapshot.vehicles, 0);
        assert!(snapshot.board.markers.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_views_are_scoped_to_their_session() {
        let registry = registry(Arc::new(MemoryFleetStore::new()));
        let owner = Uuid::new_v4();
        let view = registry.mount(owner).await;

        assert!(registry.get(view.id(), owner).await.is_some());
        assert!(registry.get(view.id(), Uuid::new_v4()).await.is_none());
        assert!(!registry.unmount(view.id(), Uuid::new_v4()).await);
        assert!(registry.unmount(view.id(), owner).await);
        assert_eq!(registry.mounted_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sign_out_unmounts_session_views() {
        let registry = Arc::new(registry(Arc::new(MemoryFleetStore::new())));
        let sessions = SessionContext::new();
        let watcher = registry.clone().watch_sign_outs(sessions.subscribe());

        let now = chrono::Utc::now();
        let session = AdminSession {
            session_id: Uuid::new_v4(),
            user_id: 1,
            auth_user_id: Uuid::new_v4(),
            email: "admin@fleet.test".to_string(),
            name: "Admin".to_string(),
            provider_token: "t".to_string(),
            established_at: now,
            expires_at: now + chrono::Duration::hours(1),
        };
        let session_id = session.session_id;
        sessions.establish(session).await;

        registry.mount(session_id).await;
        registry.mount(session_id).await;
        registry.mount(Uuid::new_v4()).await;

        sessions.revoke(session_id).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(registry.mounted_count().await, 1);

        drop(sessions);
        let _ = watcher.await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_session_views_are_unmounted() {
        let registry = Arc::new(registry(Arc::new(MemoryFleetStore::new())));
        let sessions = Arc::new(SessionContext::new());
        let watcher = registry.clone().watch_sign_outs(sessions.subscribe());
        let sweeper = sessions.clone().spawn_expiry_sweeper(Duration::from_millis(100));

        let now = chrono::Utc::now();
        let session = AdminSession {
            session_id: Uuid::new_v4(),
            user_id: 1,
            auth_user_id: Uuid::new_v4(),
            email: "admin@fleet.test".to_string(),
            name: "Admin".to_string(),
            provider_token: "t".to_string(),
            established_at: now - chrono::Duration::hours(2),
            expires_at: now - chrono::Duration::hours(1),
        };
        let session_id = session.session_id;
        sessions.establish(session).await;
        registry.mount(session_id).await;
        assert_eq!(registry.mounted_count().await, 1);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(sessions.active_count().await, 0);
        assert_eq!(registry.mounted_count().await, 0);

        sweeper.abort();
        watcher.abort();
    }
}
