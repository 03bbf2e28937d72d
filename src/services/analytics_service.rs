//! Lectores agregados de analytics
//!
//! Cada lector ejecuta una consulta y la convierte en la estructura que
//! espera su widget. Un fallo del store o un resultado vacío producen un
//! placeholder, nunca un error HTTP.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use rust_decimal::RoundingStrategy;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::map::{heatmap, pickup_dropoff::PickupDropoffLayer, BoardView, MapConfig, MapSurface, MarkerBoard};
use crate::models::analytics::{
    CategoryChart, ChartState, FleetStatusCounts, LeaderboardRow, PlaceCount, TimeSeriesChart,
    TimeSeriesPoint, TripStatusSplit,
};
use crate::models::trip::{DateRange, LeaderboardEntry, TimeUnit};
use crate::models::user::Role;
use crate::repositories::{FleetStore, StoreResult};
use crate::services::geocoding_service::{resolve_place_labels, ReverseGeocoder};
use crate::services::realtime::{ChangeEvent, RealtimeHub};

pub const TOTAL_TRIPS_LABEL: &str = "Total Trips";
pub const NO_FEEDBACK_LABEL: &str = "No Feedback";
const FIRST_SERVICE_HOUR: u32 = 7;
const LAST_SERVICE_HOUR: u32 = 19;
const TOP_PLACES: usize = 5;
const WEEKS_IN_MONTH: usize = 5;

/// Servicio de analytics del dashboard
pub struct AnalyticsService {
    store: Arc<dyn FleetStore>,
    geocoder: Arc<dyn ReverseGeocoder>,
    map_config: MapConfig,
    local_offset: FixedOffset,
    fleet_status: RwLock<Option<FleetStatusCounts>>,
}

impl AnalyticsService {
    pub fn new(
        store: Arc<dyn FleetStore>,
        geocoder: Arc<dyn ReverseGeocoder>,
        map_config: MapConfig,
        utc_offset_hours: i32,
    ) -> Self {
        let local_offset =
            FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());

        Self {
            store,
            geocoder,
            map_config,
            local_offset,
            fleet_status: RwLock::new(None),
        }
    }

    /// Zona horaria del dashboard
    pub fn local_offset(&self) -> FixedOffset {
        self.local_offset
    }

    fn local_date(&self, instant: &DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.local_offset).date_naive()
    }

    /// Viajes totales por semana (domingo a sábado)
    pub async fn weekly_trips(&self) -> ChartState<CategoryChart> {
        let starts = match self.store.trip_start_times(None).await {
            Ok(starts) => starts,
            Err(e) => {
                log::error!("❌ Error obteniendo viajes por semana: {}", e);
                return ChartState::placeholder();
            }
        };
        if starts.is_empty() {
            return ChartState::placeholder();
        }

        let mut weeks: BTreeMap<NaiveDate, i64> = BTreeMap::new();
        for start in &starts {
            let date = self.local_date(start);
            let week_start = date - Duration::days(date.weekday().num_days_from_sunday() as i64);
            *weeks.entry(week_start).or_default() += 1;
        }

        let buckets = weeks
            .into_iter()
            .map(|(week, total)| (format!("Week {}", week.format("%b %-d")), total))
            .collect();
        ChartState::ready(CategoryChart::single(TOTAL_TRIPS_LABEL, buckets))
    }

    /// Volumen de pasajeros dentro del horario de servicio (07:00 - 19:59 local)
    pub async fn passenger_trend(&self, unit: TimeUnit) -> ChartState<TimeSeriesChart> {
        let rows = match self.store.passenger_counts(unit).await {
            Ok(rows) => rows,
            Err(e) => {
                log::error!("❌ Error obteniendo pasajeros ({}): {}", unit.as_str(), e);
                return ChartState::placeholder();
            }
        };

        let points: Vec<TimeSeriesPoint> = rows
            .into_iter()
            .filter(|row| {
                let hour = row.time_interval.with_timezone(&self.local_offset).hour();
                (FIRST_SERVICE_HOUR..=LAST_SERVICE_HOUR).contains(&hour)
            })
            .map(|row| TimeSeriesPoint {
                timestamp: row.time_interval,
                passengers: row.passengers,
            })
            .collect();

        if points.is_empty() {
            return ChartState::placeholder();
        }
        ChartState::ready(TimeSeriesChart { unit, points })
    }

    /// Recalcula activos e inactivos entre los vehículos con conductor
    pub async fn refresh_fleet_status(&self) -> StoreResult<FleetStatusCounts> {
        let driver_ids: Vec<i64> = self
            .store
            .list_users_by_role(Role::Driver)
            .await?
            .into_iter()
            .map(|driver| driver.user_id)
            .collect();

        let active = self.store.count_vehicles(&driver_ids, Some(true)).await?;
        let total = self.store.count_vehicles(&driver_ids, None).await?;
        let counts = FleetStatusCounts {
            active,
            inactive: total - active,
        };

        *self.fleet_status.write().await = Some(counts);
        log::info!("🚌 Estado de flota: {} activos, {} inactivos", counts.active, counts.inactive);
        Ok(counts)
    }

    /// Estado de flota consultado en cada lectura; si el store falla se
    /// muestran los últimos conteos conocidos
    pub async fn fleet_status(&self) -> ChartState<FleetStatusCounts> {
        match self.refresh_fleet_status().await {
            Ok(counts) => ChartState::ready(counts),
            Err(e) => {
                log::error!("❌ Error obteniendo estado de flota: {}", e);
                match *self.fleet_status.read().await {
                    Some(counts) => ChartState::ready(counts),
                    None => ChartState::placeholder(),
                }
            }
        }
    }

    /// Re-agrega el estado de flota ante altas, bajas y cambios de
    /// `status` o `driver_id` en `modern_jeeps`
    pub fn spawn_fleet_status_refresher(self: Arc<Self>, hub: &RealtimeHub) -> JoinHandle<()> {
        let mut changes = hub.subscribe("modern_jeeps", None);

        tokio::spawn(async move {
            while let Some(change) = changes.next().await {
                let relevant = match change.event {
                    ChangeEvent::Insert | ChangeEvent::Delete => true,
                    ChangeEvent::Update => {
                        change.column_changed("status") || change.column_changed("driver_id")
                    }
                };
                if !relevant {
                    continue;
                }
                if let Err(e) = self.refresh_fleet_status().await {
                    log::warn!("⚠️ No se pudo refrescar el estado de flota: {}", e);
                }
            }
            log::info!("🔌 Hub de realtime cerrado; refresco de flota detenido");
        })
    }

    /// Viajes completados frente a cancelados
    pub async fn trip_status(&self) -> ChartState<TripStatusSplit> {
        let counts = async {
            let successful = self.store.count_trips(true).await?;
            let cancelled = self.store.count_trips(false).await?;
            StoreResult::Ok((successful, cancelled))
        };

        match counts.await {
            Ok((0, 0)) => ChartState::placeholder(),
            Ok((successful, cancelled)) => ChartState::ready(TripStatusSplit {
                successful,
                cancelled,
                total: successful + cancelled,
            }),
            Err(e) => {
                log::error!("❌ Error obteniendo estado de viajes: {}", e);
                ChartState::placeholder()
            }
        }
    }

    pub async fn leaderboard(&self) -> ChartState<Vec<LeaderboardRow>> {
        match self.store.ratings_leaderboard().await {
            Ok(entries) if entries.is_empty() => ChartState::placeholder(),
            Ok(entries) => ChartState::ready(entries.into_iter().map(leaderboard_row).collect()),
            Err(e) => {
                log::error!("❌ Error obteniendo leaderboard: {}", e);
                ChartState::placeholder()
            }
        }
    }

    /// Los cinco lugares con más recogidas
    pub async fn top_pickup_places(&self) -> ChartState<Vec<PlaceCount>> {
        let endpoints = match self.store.trip_endpoints().await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                log::error!("❌ Error obteniendo ubicaciones de viajes: {}", e);
                return ChartState::placeholder();
            }
        };
        if endpoints.is_empty() {
            return ChartState::placeholder();
        }

        let starts: Vec<_> = endpoints.iter().map(|trip| trip.start_location).collect();
        let labels = resolve_place_labels(self.geocoder.as_ref(), &starts).await;
        ChartState::ready(count_places(labels))
    }

    /// Viajes por semana del mes dentro de un rango
    pub async fn trips_by_week(&self, range: DateRange) -> ChartState<CategoryChart> {
        let starts = match self.store.trip_start_times(Some(range)).await {
            Ok(starts) => starts,
            Err(e) => {
                log::error!("❌ Error obteniendo viajes del rango: {}", e);
                return ChartState::placeholder();
            }
        };
        if starts.is_empty() {
            return ChartState::placeholder();
        }

        let mut counts = [0i64; WEEKS_IN_MONTH];
        for start in &starts {
            let index = (self.local_date(start).day() / 7) as usize;
            counts[index.min(WEEKS_IN_MONTH - 1)] += 1;
        }

        let buckets = counts
            .iter()
            .enumerate()
            .map(|(i, count)| (format!("Week {}", i + 1), *count))
            .collect();
        ChartState::ready(CategoryChart::single(TOTAL_TRIPS_LABEL, buckets))
    }

    pub async fn heatmap(&self) -> ChartState<BoardView> {
        let endpoints = match self.store.trip_endpoints().await {
            Ok(endpoints) if !endpoints.is_empty() => endpoints,
            Ok(_) => return ChartState::placeholder(),
            Err(e) => {
                log::error!("❌ Error obteniendo datos del heatmap: {}", e);
                return ChartState::placeholder();
            }
        };

        let mut board = MarkerBoard::new(self.map_config.clone());
        board.load();
        match heatmap::render(&mut board, &endpoints) {
            Ok(dots) => {
                log::debug!("🔥 Heatmap con {} puntos", dots);
                ChartState::ready(board.view())
            }
            Err(e) => {
                log::error!("❌ Error dibujando heatmap: {}", e);
                ChartState::placeholder()
            }
        }
    }

    /// Puntos de recogida y destino dimensionados para `zoom`
    pub async fn pickup_dropoff(&self, zoom: Option<f64>) -> ChartState<BoardView> {
        let endpoints = match self.store.trip_endpoints().await {
            Ok(endpoints) if !endpoints.is_empty() => endpoints,
            Ok(_) => return ChartState::placeholder(),
            Err(e) => {
                log::error!("❌ Error obteniendo recogidas y destinos: {}", e);
                return ChartState::placeholder();
            }
        };

        let mut board = MarkerBoard::new(self.map_config.clone());
        board.load();
        let layer = PickupDropoffLayer::render(&mut board, &endpoints);

        if let Some(zoom) = zoom {
            if let Err(e) = layer.on_zoom(&mut board, zoom) {
                log::error!("❌ Error redimensionando puntos: {}", e);
                return ChartState::placeholder();
            }
        }
        ChartState::ready(board.view())
    }
}

fn leaderboard_row(entry: LeaderboardEntry) -> LeaderboardRow {
    let rating = entry
        .average_rating
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    LeaderboardRow {
        rank: entry.rank,
        driver_name: entry.driver_name,
        mjeep_code: entry.mjeep_code,
        average_rating: format!("{:.2}", rating),
        feedback_note: entry
            .feedbacks
            .is_empty()
            .then(|| NO_FEEDBACK_LABEL.to_string()),
        feedbacks: entry.feedbacks,
    }
}

/// Cuenta etiquetas y devuelve las más frecuentes; los empates conservan el orden de aparición
fn count_places(labels: Vec<String>) -> Vec<PlaceCount> {
    let mut counts: Vec<PlaceCount> = Vec::new();
    for label in labels {
        match counts.iter_mut().find(|c| c.place == label) {
            Some(existing) => existing.trips += 1,
            None => counts.push(PlaceCount { place: label, trips: 1 }),
        }
    }

    counts.sort_by(|a, b| b.trips.cmp(&a.trips));
    counts.truncate(TOP_PLACES);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::location::LngLat;
    use crate::models::trip::{PassengerCount, Trip, TripEndpoints};
    use crate::models::user::User;
    use crate::models::vehicle::Vehicle;
    use crate::repositories::MemoryFleetStore;
    use crate::services::geocoding_service::{NO_ADDRESS_LABEL, PLACE_NOT_FOUND_LABEL};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    struct GridGeocoder;

    #[async_trait]
    impl ReverseGeocoder for GridGeocoder {
        async fn reverse(&self, position: LngLat) -> anyhow::Result<Option<String>> {
            if position.lng < 0.0 {
                anyhow::bail!("geocoder down");
            }
            if position.lng > 200.0 {
                return Ok(None);
            }
            Ok(Some(format!("Place {:.0}", position.lng)))
        }
    }

    fn service(store: MemoryFleetStore) -> AnalyticsService {
        AnalyticsService::new(Arc::new(store), Arc::new(GridGeocoder), MapConfig::new(None), 8)
    }

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn trip(id: i64, start: DateTime<Utc>, completed: bool, pickup: Option<LngLat>) -> Trip {
        Trip {
            id,
            mjeep_id: Some(1),
            driver_id: Some(10),
            start_timestamp: start,
            end_timestamp: completed.then(|| start + Duration::minutes(30)),
            start_location: pickup,
            end_location: Some(LngLat::new(123.2, 13.6)),
        }
    }

    #[tokio::test]
    async fn test_zero_trips_yield_placeholder() {
        let analytics = service(MemoryFleetStore::new());
        assert!(analytics.weekly_trips().await.is_placeholder());
        assert!(analytics.trip_status().await.is_placeholder());
        assert!(analytics.heatmap().await.is_placeholder());
        assert!(analytics.top_pickup_places().await.is_placeholder());
    }

    #[tokio::test]
    async fn test_store_failure_yields_placeholder() {
        let store = MemoryFleetStore::new().with_trip(trip(1, utc(2024, 10, 7, 2), true, None));
        store.set_unavailable(true);
        let analytics = service(store);

        assert!(analytics.weekly_trips().await.is_placeholder());
        assert!(analytics.fleet_status().await.is_placeholder());
        assert!(analytics.leaderboard().await.is_placeholder());
    }

    #[tokio::test]
    async fn test_weekly_trips_group_by_sunday() {
        // 2024-10-06 es domingo; 2024-10-05 23:00 UTC ya es domingo en UTC+8
        let store = MemoryFleetStore::new()
            .with_trip(trip(1, utc(2024, 10, 5, 23), true, None))
            .with_trip(trip(2, utc(2024, 10, 9, 3), true, None))
            .with_trip(trip(3, utc(2024, 10, 14, 3), false, None));
        let analytics = service(store);

        let chart = analytics.weekly_trips().await;
        let chart = chart.chart().unwrap();
        assert_eq!(chart.labels, vec!["Week Oct 6", "Week Oct 13"]);
        assert_eq!(chart.datasets[0].label, "Total Trips");
        assert_eq!(chart.datasets[0].data, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_passenger_trend_keeps_service_hours() {
        let rows = vec![
            // 06:00, 07:00, 19:00 y 20:00 hora local
            PassengerCount { time_interval: utc(2024, 10, 6, 22), passengers: 3 },
            PassengerCount { time_interval: utc(2024, 10, 6, 23), passengers: 5 },
            PassengerCount { time_interval: utc(2024, 10, 7, 11), passengers: 8 },
            PassengerCount { time_interval: utc(2024, 10, 7, 12), passengers: 2 },
        ];
        let analytics = service(MemoryFleetStore::new().with_passenger_counts(TimeUnit::Day, rows));

        let state = analytics.passenger_trend(TimeUnit::Day).await;
        let chart = state.chart().unwrap();
        let kept: Vec<i64> = chart.points.iter().map(|p| p.passengers).collect();
        assert_eq!(kept, vec![5, 8]);

        assert!(analytics.passenger_trend(TimeUnit::Week).await.is_placeholder());
    }

    #[tokio::test]
    async fn test_fleet_status_counts_driver_vehicles() {
        let driver = |id: i64| User {
            user_id: id,
            auth_user_id: None,
            name: format!("Driver {}", id),
            username: format!("driver{}", id),
            email: format!("driver{}@fleet.test", id),
            role: Role::Driver,
        };
        let jeep = |id: i64, driver_id: Option<i64>, status: bool| Vehicle {
            mjeep_id: id,
            mjeep_code: format!("MJ-{:02}", id),
            plate_number: format!("PLT {}", id),
            seats: 20,
            status,
            driver_id,
            driver_name: None,
            position: None,
        };

        let store = MemoryFleetStore::new()
            .with_user(driver(10))
            .with_user(driver(11))
            .with_vehicle(jeep(1, Some(10), true))
            .with_vehicle(jeep(2, Some(11), false))
            .with_vehicle(jeep(3, None, true));
        let analytics = service(store);

        let state = analytics.fleet_status().await;
        assert_eq!(
            state.chart(),
            Some(&FleetStatusCounts { active: 1, inactive: 1 })
        );
    }

    #[tokio::test]
    async fn test_status_update_triggers_refresh() {
        let hub = Arc::new(RealtimeHub::default());
        let store = Arc::new(
            MemoryFleetStore::new()
                .with_realtime(hub.clone())
                .with_user(User {
                    user_id: 10,
                    auth_user_id: None,
                    name: "Juan".into(),
                    username: "juan".into(),
                    email: "juan@fleet.test".into(),
                    role: Role::Driver,
                })
                .with_vehicle(Vehicle {
                    mjeep_id: 1,
                    mjeep_code: "MJ-01".into(),
                    plate_number: "PLT 1".into(),
                    seats: 20,
                    status: true,
                    driver_id: Some(10),
                    driver_name: None,
                    position: None,
                }),
        );
        let analytics = Arc::new(AnalyticsService::new(
            store.clone(),
            Arc::new(GridGeocoder),
            MapConfig::new(None),
            8,
        ));

        assert_eq!(analytics.fleet_status().await.chart().map(|c| c.active), Some(1));
        let refresher = analytics.clone().spawn_fleet_status_refresher(&hub);

        store.set_vehicle_status(1, false).await.unwrap();
        let mut refreshed = false;
        for _ in 0..50 {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            // sólo el refresco en segundo plano escribe la cache aquí
            if *analytics.fleet_status.read().await == Some(FleetStatusCounts { active: 0, inactive: 1 }) {
                refreshed = true;
                break;
            }
        }
        assert!(refreshed);
        refresher.abort();
    }

    fn driver_with_jeep() -> MemoryFleetStore {
        MemoryFleetStore::new()
            .with_user(User {
                user_id: 10,
                auth_user_id: None,
                name: "Juan".into(),
                username: "juan".into(),
                email: "juan@fleet.test".into(),
                role: Role::Driver,
            })
            .with_vehicle(Vehicle {
                mjeep_id: 1,
                mjeep_code: "MJ-01".into(),
                plate_number: "PLT 1".into(),
                seats: 20,
                status: true,
                driver_id: Some(10),
                driver_name: None,
                position: None,
            })
    }

    #[tokio::test]
    async fn test_fleet_status_follows_deleted_vehicle() {
        let store = Arc::new(driver_with_jeep());
        let analytics = AnalyticsService::new(
            store.clone(),
            Arc::new(GridGeocoder),
            MapConfig::new(None),
            8,
        );

        assert_eq!(
            analytics.fleet_status().await.chart(),
            Some(&FleetStatusCounts { active: 1, inactive: 0 })
        );

        store.delete_vehicle("MJ-01").await.unwrap();
        assert_eq!(
            analytics.fleet_status().await.chart(),
            Some(&FleetStatusCounts { active: 0, inactive: 0 })
        );
    }

    #[tokio::test]
    async fn test_fleet_status_outage_keeps_last_counts() {
        let store = Arc::new(driver_with_jeep());
        let analytics = AnalyticsService::new(
            store.clone(),
            Arc::new(GridGeocoder),
            MapConfig::new(None),
            8,
        );
        analytics.fleet_status().await;

        store.set_unavailable(true);
        assert_eq!(
            analytics.fleet_status().await.chart(),
            Some(&FleetStatusCounts { active: 1, inactive: 0 })
        );
    }

    #[tokio::test]
    async fn test_trip_status_split() {
        let store = MemoryFleetStore::new()
            .with_trip(trip(1, utc(2024, 10, 7, 2), true, None))
            .with_trip(trip(2, utc(2024, 10, 7, 3), true, None))
            .with_trip(trip(3, utc(2024, 10, 7, 4), false, None));
        let state = service(store).trip_status().await;
        assert_eq!(
            state.chart(),
            Some(&TripStatusSplit { successful: 2, cancelled: 1, total: 3 })
        );
    }

    #[tokio::test]
    async fn test_leaderboard_formatting() {
        let entries = vec![
            LeaderboardEntry {
                rank: 1,
                driver_name: "Juan".into(),
                mjeep_code: "MJ-01".into(),
                average_rating: Decimal::from_str("4.666").unwrap(),
                feedbacks: vec!["Smooth ride".into()],
            },
            LeaderboardEntry {
                rank: 2,
                driver_name: "Pedro".into(),
                mjeep_code: "MJ-02".into(),
                average_rating: Decimal::from(4),
                feedbacks: vec![],
            },
        ];
        let state = service(MemoryFleetStore::new().with_leaderboard(entries))
            .leaderboard()
            .await;
        let rows = state.chart().unwrap();

        assert_eq!(rows[0].average_rating, "4.67");
        assert_eq!(rows[0].feedback_note, None);
        assert_eq!(rows[1].average_rating, "4.00");
        assert_eq!(rows[1].feedback_note.as_deref(), Some("No Feedback"));
    }

    #[tokio::test]
    async fn test_top_pickup_places() {
        let mut store = MemoryFleetStore::new();
        let pickups = [
            Some(LngLat::new(123.0, 13.6)),
            Some(LngLat::new(123.0, 13.6)),
            Some(LngLat::new(124.0, 13.6)),
            Some(LngLat::new(250.0, 13.6)),
            Some(LngLat::new(-1.0, 13.6)),
            None,
            Some(LngLat::new(125.0, 13.6)),
            Some(LngLat::new(126.0, 13.6)),
        ];
        for (i, pickup) in pickups.into_iter().enumerate() {
            store = store.with_trip(trip(i as i64, utc(2024, 10, 7, 2), true, pickup));
        }

        let state = service(store).top_pickup_places().await;
        let places = state.chart().unwrap();
        assert_eq!(places.len(), 5);
        assert_eq!(places[0], PlaceCount { place: "Place 123".into(), trips: 2 });
        assert_eq!(places[1].place, NO_ADDRESS_LABEL);
        assert_eq!(places[1].trips, 2);
        assert_eq!(places[2].place, "Place 124");
        assert_eq!(places[3].place, PLACE_NOT_FOUND_LABEL);
        assert_eq!(places[4].place, "Place 125");
    }

    #[tokio::test]
    async fn test_trips_by_week_of_month() {
        let store = MemoryFleetStore::new()
            .with_trip(trip(1, utc(2024, 10, 3, 2), true, None))
            .with_trip(trip(2, utc(2024, 10, 7, 2), true, None))
            .with_trip(trip(3, utc(2024, 10, 30, 2), true, None))
            .with_trip(trip(4, utc(2025, 1, 2, 2), true, None));
        let range = DateRange {
            from: utc(2024, 1, 1, 0),
            to: utc(2024, 12, 31, 23),
        };

        let state = service(store).trips_by_week(range).await;
        let chart = state.chart().unwrap();
        assert_eq!(chart.labels, vec!["Week 1", "Week 2", "Week 3", "Week 4", "Week 5"]);
        assert_eq!(chart.datasets[0].data, vec![1, 1, 0, 0, 1]);
    }

    #[tokio::test]
    async fn test_pickup_dropoff_sized_for_zoom() {
        let store = MemoryFleetStore::new().with_trip(trip(
            1,
            utc(2024, 10, 7, 2),
            true,
            Some(LngLat::new(123.19, 13.62)),
        ));
        let analytics = service(store);

        let state = analytics.pickup_dropoff(Some(15.0)).await;
        let view = state.chart().unwrap();
        assert_eq!(view.zoom, 15.0);
        assert_eq!(view.markers.len(), 2);
        assert!(view.markers.iter().all(|m| (m.style.size_px() - 28.0).abs() < 1e-9));

        let heatmap = analytics.heatmap().await;
        assert_eq!(heatmap.chart().unwrap().layers[0].id, "heatmap");
    }

    #[test]
    fn test_count_places_ties_keep_first_seen() {
        let labels = vec!["B", "A", "A", "B", "C"].into_iter().map(String::from).collect();
        let places = count_places(labels);
        assert_eq!(places[0].place, "B");
        assert_eq!(places[1].place, "A");
        assert_eq!(places[2].place, "C");
    }
}
