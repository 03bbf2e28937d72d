//! Store en memoria
//!
//! Implementación de `FleetStore` para tests y modo demo
//! (`STORE_BACKEND=memory`). Reproduce las reglas visibles del store alojado:
//! `mjeep_code` y `email` únicos, filas ausentes como `NotFound` y cambios
//! de `modern_jeeps` publicados en el feed realtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{FleetStore, StoreError, StoreResult};
use crate::models::{
    location::{GeoPoint, LngLat, VehicleLocationRecord},
    trip::{DateRange, LeaderboardEntry, PassengerCount, TimeUnit, Trip, TripEndpoints},
    user::{Driver, NewUser, ProfileChanges, Role, User},
    vehicle::{NewVehicle, Vehicle, VehicleChanges},
};
use crate::services::realtime::{RealtimeHub, TableChange};

const VEHICLES_TABLE: &str = "modern_jeeps";

struct StoredUser {
    user: User,
    password_hash: Option<String>,
}

#[derive(Default)]
struct Tables {
    users: Vec<StoredUser>,
    vehicles: Vec<Vehicle>,
    trips: Vec<Trip>,
    passengers: HashMap<TimeUnit, Vec<PassengerCount>>,
    leaderboard: Vec<LeaderboardEntry>,
}

impl Tables {
    fn next_user_id(&self) -> i64 {
        self.users.iter().map(|u| u.user.user_id).max().unwrap_or(0) + 1
    }

    fn next_vehicle_id(&self) -> i64 {
        self.vehicles.iter().map(|v| v.mjeep_id).max().unwrap_or(0) + 1
    }

    fn user_name(&self, user_id: i64) -> Option<String> {
        self.users
            .iter()
            .find(|u| u.user.user_id == user_id)
            .map(|u| u.user.name.clone())
    }

    // el nombre del conductor se resuelve al leer, como el join del store
    fn resolve_driver(&self, vehicle: &Vehicle) -> Vehicle {
        let mut resolved = vehicle.clone();
        resolved.driver_name = vehicle.driver_id.and_then(|id| self.user_name(id));
        resolved
    }
}

fn vehicle_row(vehicle: &Vehicle) -> serde_json::Value {
    json!({
        "mjeep_id": vehicle.mjeep_id,
        "mjeep_code": vehicle.mjeep_code,
        "plate_number": vehicle.plate_number,
        "seats": vehicle.seats,
        "status": vehicle.status,
        "driver_id": vehicle.driver_id,
    })
}

/// `FleetStore` respaldado por tablas en memoria
pub struct MemoryFleetStore {
    tables: RwLock<Tables>,
    realtime: Option<Arc<RealtimeHub>>,
    unavailable: AtomicBool,
}

impl Default for MemoryFleetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFleetStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            realtime: None,
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn with_realtime(mut self, hub: Arc<RealtimeHub>) -> Self {
        self.realtime = Some(hub);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.tables.get_mut().users.push(StoredUser {
            user,
            password_hash: None,
        });
        self
    }

    pub fn with_vehicle(mut self, vehicle: Vehicle) -> Self {
        self.tables.get_mut().vehicles.push(vehicle);
        self
    }

    pub fn with_trip(mut self, trip: Trip) -> Self {
        self.tables.get_mut().trips.push(trip);
        self
    }

    pub fn with_passenger_counts(mut self, unit: TimeUnit, rows: Vec<PassengerCount>) -> Self {
        self.tables.get_mut().passengers.insert(unit, rows);
        self
    }

    pub fn with_leaderboard(mut self, rows: Vec<LeaderboardEntry>) -> Self {
        self.tables.get_mut().leaderboard = rows;
        self
    }

    /// Simula una caída del store: toda operación devuelve `Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Telemetría externa: mueve un vehículo o le quita la posición
    pub async fn set_vehicle_position(&self, mjeep_id: i64, position: Option<LngLat>) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let vehicle = tables
            .vehicles
            .iter_mut()
            .find(|v| v.mjeep_id == mjeep_id)
            .ok_or_else(|| StoreError::NotFound(format!("modern_jeeps {}", mjeep_id)))?;
        vehicle.position = position;
        Ok(())
    }

    /// Cambia el estado de un vehículo fuera de los formularios
    pub async fn set_vehicle_status(&self, mjeep_id: i64, status: bool) -> StoreResult<()> {
        let change = {
            let mut tables = self.tables.write().await;
            let vehicle = tables
                .vehicles
                .iter_mut()
                .find(|v| v.mjeep_id == mjeep_id)
                .ok_or_else(|| StoreError::NotFound(format!("modern_jeeps {}", mjeep_id)))?;
            let old = vehicle_row(vehicle);
            vehicle.status = status;
            TableChange::update(VEHICLES_TABLE, vehicle_row(vehicle), old)
        };
        self.publish(change);
        Ok(())
    }

    /// Hash de contraseña guardado para un email, si existe
    pub async fn password_hash_of(&self, email: &str) -> Option<String> {
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|u| u.user.email == email)
            .and_then(|u| u.password_hash.clone())
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }

    fn publish(&self, change: TableChange) {
        if let Some(hub) = &self.realtime {
            hub.publish(change);
        }
    }
}

#[async_trait]
impl FleetStore for MemoryFleetStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<User> {
        self.check_available()?;
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|u| u.user.email == email)
            .map(|u| u.user.clone())
            .ok_or_else(|| StoreError::NotFound(format!("users with email '{}'", email)))
    }

    async fn find_user_by_auth_id(&self, auth_user_id: Uuid) -> StoreResult<User> {
        self.check_available()?;
        let tables = self.tables.read().await;
        tables
            .users
            .iter()
            .find(|u| u.user.auth_user_id == Some(auth_user_id))
            .map(|u| u.user.clone())
            .ok_or_else(|| StoreError::NotFound(format!("users with auth id '{}'", auth_user_id)))
    }

    async fn list_users_by_role(&self, role: Role) -> StoreResult<Vec<Driver>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let mut drivers: Vec<Driver> = tables
            .users
            .iter()
            .filter(|u| u.user.role == role)
            .map(|u| Driver {
                user_id: u.user.user_id,
                name: u.user.name.clone(),
            })
            .collect();
        drivers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(drivers)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.user.email == user.email) {
            return Err(StoreError::Conflict(format!("users_email_key ({})", user.email)));
        }

        let stored = User {
            user_id: tables.next_user_id(),
            auth_user_id: Some(user.auth_user_id),
            name: user.name,
            username: user.username,
            email: user.email,
            role: user.role,
        };
        tables.users.push(StoredUser {
            user: stored.clone(),
            password_hash: Some(user.password_hash),
        });
        Ok(stored)
    }

    async fn update_user_profile(&self, auth_user_id: Uuid, changes: ProfileChanges) -> StoreResult<User> {
        self.check_available()?;
        let mut tables = self.tables.write().await;
        let taken = tables
            .users
            .iter()
            .any(|u| u.user.email == changes.email && u.user.auth_user_id != Some(auth_user_id));
        if taken {
            return Err(StoreError::Conflict(format!("users_email_key ({})", changes.email)));
        }

        let stored = tables
            .users
            .iter_mut()
            .find(|u| u.user.auth_user_id == Some(auth_user_id))
            .ok_or_else(|| StoreError::NotFound(format!("users with auth id '{}'", auth_user_id)))?;
        stored.user.name = changes.name;
        stored.user.username = changes.username;
        stored.user.email = changes.email;
        Ok(stored.user.clone())
    }

    async fn list_vehicles(&self) -> StoreResult<Vec<Vehicle>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let mut vehicles: Vec<Vehicle> = tables.vehicles.iter().map(|v| tables.resolve_driver(v)).collect();
        vehicles.sort_by_key(|v| v.mjeep_id);
        Ok(vehicles)
    }

    async fn find_vehicle_by_code(&self, mjeep_code: &str) -> StoreResult<Vehicle> {
        self.check_available()?;
        let tables = self.tables.read().await;
        tables
            .vehicles
            .iter()
            .find(|v| v.mjeep_code == mjeep_code)
            .map(|v| tables.resolve_driver(v))
            .ok_or_else(|| StoreError::NotFound(format!("modern_jeeps '{}'", mjeep_code)))
    }

    async fn insert_vehicle(&self, vehicle: NewVehicle) -> StoreResult<Vehicle> {
        self.check_available()?;
        let (created, change) = {
            let mut tables = self.tables.write().await;
            if tables.vehicles.iter().any(|v| v.mjeep_code == vehicle.mjeep_code) {
                return Err(StoreError::Conflict(format!(
                    "modern_jeeps_mjeep_code_key ({})",
                    vehicle.mjeep_code
                )));
            }

            let stored = Vehicle {
                mjeep_id: tables.next_vehicle_id(),
                mjeep_code: vehicle.mjeep_code,
                plate_number: vehicle.plate_number,
                seats: vehicle.seats,
                status: vehicle.status,
                driver_id: vehicle.driver_id,
                driver_name: None,
                position: None,
            };
            let change = TableChange::insert(VEHICLES_TABLE, vehicle_row(&stored));
            tables.vehicles.push(stored.clone());
            (tables.resolve_driver(&stored), change)
        };
        self.publish(change);
        Ok(created)
    }

    async fn update_vehicle(&self, mjeep_code: &str, changes: VehicleChanges) -> StoreResult<Vehicle> {
        self.check_available()?;
        let (updated, change) = {
            let mut tables = self.tables.write().await;
            let vehicle = tables
                .vehicles
                .iter_mut()
                .find(|v| v.mjeep_code == mjeep_code)
                .ok_or_else(|| StoreError::NotFound(format!("modern_jeeps '{}'", mjeep_code)))?;

            let old = vehicle_row(vehicle);
            vehicle.plate_number = changes.plate_number;
            vehicle.seats = changes.seats;
            vehicle.driver_id = changes.driver_id;
            if let Some(status) = changes.status {
                vehicle.status = status;
            }
            let change = TableChange::update(VEHICLES_TABLE, vehicle_row(vehicle), old);
            let snapshot = vehicle.clone();
            (tables.resolve_driver(&snapshot), change)
        };
        self.publish(change);
        Ok(updated)
    }

    async fn delete_vehicle(&self, mjeep_code: &str) -> StoreResult<()> {
        self.check_available()?;
        let change = {
            let mut tables = self.tables.write().await;
            let idx = tables
                .vehicles
                .iter()
                .position(|v| v.mjeep_code == mjeep_code)
                .ok_or_else(|| StoreError::NotFound(format!("modern_jeeps '{}'", mjeep_code)))?;
            let removed = tables.vehicles.remove(idx);
            TableChange::delete(VEHICLES_TABLE, vehicle_row(&removed))
        };
        self.publish(change);
        Ok(())
    }

    async fn assigned_driver_ids(&self, excluding: Option<i64>) -> StoreResult<Vec<i64>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .vehicles
            .iter()
            .filter_map(|v| v.driver_id)
            .filter(|id| Some(*id) != excluding)
            .collect())
    }

    async fn count_vehicles(&self, driver_ids: &[i64], status: Option<bool>) -> StoreResult<i64> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let count = tables
            .vehicles
            .iter()
            .filter(|v| v.driver_id.map_or(false, |id| driver_ids.contains(&id)))
            .filter(|v| status.map_or(true, |s| v.status == s))
            .count();
        Ok(count as i64)
    }

    async fn trip_start_times(&self, range: Option<DateRange>) -> StoreResult<Vec<DateTime<Utc>>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        let mut times: Vec<DateTime<Utc>> = tables
            .trips
            .iter()
            .map(|t| t.start_timestamp)
            .filter(|ts| range.map_or(true, |r| r.contains(ts)))
            .collect();
        times.sort();
        Ok(times)
    }

    async fn count_trips(&self, completed: bool) -> StoreResult<i64> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.trips.iter().filter(|t| t.is_completed() == completed).count() as i64)
    }

    async fn vehicle_locations(&self) -> StoreResult<Vec<VehicleLocationRecord>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .vehicles
            .iter()
            .map(|v| VehicleLocationRecord {
                mjeep_id: v.mjeep_id,
                driver_id: v.driver_id,
                mjeep_code: Some(v.mjeep_code.clone()),
                plate_number: v.plate_number.clone(),
                seats: v.seats,
                status: v.status,
                driver_name: v.driver_id.and_then(|id| tables.user_name(id)),
                location: v.position.map(GeoPoint::point),
            })
            .collect())
    }

    async fn passenger_counts(&self, unit: TimeUnit) -> StoreResult<Vec<PassengerCount>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.passengers.get(&unit).cloned().unwrap_or_default())
    }

    async fn trip_endpoints(&self) -> StoreResult<Vec<TripEndpoints>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables
            .trips
            .iter()
            .map(|t| TripEndpoints {
                start_location: t.start_location,
                end_location: t.end_location,
            })
            .collect())
    }

    async fn ratings_leaderboard(&self) -> StoreResult<Vec<LeaderboardEntry>> {
        self.check_available()?;
        let tables = self.tables.read().await;
        Ok(tables.leaderboard.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::realtime::ChangeEvent;

    fn driver(user_id: i64, name: &str) -> User {
        User {
            user_id,
            auth_user_id: Some(Uuid::new_v4()),
            name: name.to_string(),
            username: name.to_lowercase(),
            email: format!("{}@fleet.test", name.to_lowercase()),
            role: Role::Driver,
        }
    }

    fn new_vehicle(code: &str, driver_id: Option<i64>) -> NewVehicle {
        NewVehicle {
            mjeep_code: code.to_string(),
            plate_number: "ABC-123".to_string(),
            seats: 22,
            status: true,
            driver_id,
        }
    }

    #[tokio::test]
    async fn test_insert_then_find_resolves_driver_name() {
        let store = MemoryFleetStore::new().with_user(driver(7, "Juan"));
        store.insert_vehicle(new_vehicle("MJ-01", Some(7))).await.unwrap();

        let vehicle = store.find_vehicle_by_code("MJ-01").await.unwrap();
        assert_eq!(vehicle.driver_name.as_deref(), Some("Juan"));
        assert_eq!(vehicle.seats, 22);
        assert!(vehicle.status);
    }

    #[tokio::test]
    async fn test_duplicate_code_is_conflict() {
        let store = MemoryFleetStore::new();
        store.insert_vehicle(new_vehicle("MJ-01", None)).await.unwrap();
        let err = store.insert_vehicle(new_vehicle("MJ-01", None)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_missing_rows_report_no_rows_code() {
        let store = MemoryFleetStore::new();
        let err = store.find_user_by_email("nobody@fleet.test").await.unwrap_err();
        assert_eq!(err.code(), crate::repositories::NO_ROWS_CODE);
    }

    #[tokio::test]
    async fn test_status_change_is_published() {
        let hub = Arc::new(RealtimeHub::default());
        let store = MemoryFleetStore::new().with_realtime(hub.clone());
        let created = store.insert_vehicle(new_vehicle("MJ-01", None)).await.unwrap();

        let mut updates = hub.subscribe(VEHICLES_TABLE, Some(ChangeEvent::Update));
        store.set_vehicle_status(created.mjeep_id, false).await.unwrap();

        let change = updates.next().await.unwrap();
        assert!(change.column_changed("status"));
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = MemoryFleetStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.list_vehicles().await,
            Err(StoreError::Unavailable(_))
        ));
        store.set_unavailable(false);
        assert!(store.list_vehicles().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assigned_driver_ids_honours_exclusion() {
        let store = MemoryFleetStore::new();
        store.insert_vehicle(new_vehicle("MJ-01", Some(1))).await.unwrap();
        store.insert_vehicle(new_vehicle("MJ-02", Some(2))).await.unwrap();

        let mut ids = store.assigned_driver_ids(Some(1)).await.unwrap();
        ids.sort();
        assert_eq!(ids, vec![2]);
    }
}
