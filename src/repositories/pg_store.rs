use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    trip_repository::TripRepository, user_repository::UserRepository,
    vehicle_repository::VehicleRepository, FleetStore, StoreResult,
};
use crate::models::{
    location::VehicleLocationRecord,
    trip::{DateRange, LeaderboardEntry, PassengerCount, TimeUnit, TripEndpoints},
    user::{Driver, NewUser, ProfileChanges, Role, User},
    vehicle::{NewVehicle, Vehicle, VehicleChanges},
};

/// `FleetStore` sobre el Postgres del store alojado
#[derive(Clone)]
pub struct PgFleetStore {
    users: UserRepository,
    vehicles: VehicleRepository,
    trips: TripRepository,
}

impl PgFleetStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            vehicles: VehicleRepository::new(pool.clone()),
            trips: TripRepository::new(pool),
        }
    }
}

#[async_trait]
impl FleetStore for PgFleetStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<User> {
        self.users.find_by_email(email).await
    }

    async fn find_user_by_auth_id(&self, auth_user_id: Uuid) -> StoreResult<User> {
        self.users.find_by_auth_id(auth_user_id).await
    }

    async fn list_users_by_role(&self, role: Role) -> StoreResult<Vec<Driver>> {
        self.users.list_by_role(role).await
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        self.users.create(user).await
    }

    async fn update_user_profile(&self, auth_user_id: Uuid, changes: ProfileChanges) -> StoreResult<User> {
        self.users.update_profile(auth_user_id, changes).await
    }

    async fn list_vehicles(&self) -> StoreResult<Vec<Vehicle>> {
        self.vehicles.list().await
    }

    async fn find_vehicle_by_code(&self, mjeep_code: &str) -> StoreResult<Vehicle> {
        self.vehicles.find_by_code(mjeep_code).await
    }

    async fn insert_vehicle(&self, vehicle: NewVehicle) -> StoreResult<Vehicle> {
        self.vehicles.create(vehicle).await
    }

    async fn update_vehicle(&self, mjeep_code: &str, changes: VehicleChanges) -> StoreResult<Vehicle> {
        self.vehicles.update(mjeep_code, changes).await
    }

    async fn delete_vehicle(&self, mjeep_code: &str) -> StoreResult<()> {
        self.vehicles.delete(mjeep_code).await
    }

    async fn assigned_driver_ids(&self, excluding: Option<i64>) -> StoreResult<Vec<i64>> {
        self.vehicles.assigned_driver_ids(excluding).await
    }

    async fn count_vehicles(&self, driver_ids: &[i64], status: Option<bool>) -> StoreResult<i64> {
        self.vehicles.count(driver_ids, status).await
    }

    async fn trip_start_times(&self, range: Option<DateRange>) -> StoreResult<Vec<DateTime<Utc>>> {
        self.trips.start_times(range).await
    }

    async fn count_trips(&self, completed: bool) -> StoreResult<i64> {
        self.trips.count(completed).await
    }

    async fn vehicle_locations(&self) -> StoreResult<Vec<VehicleLocationRecord>> {
        self.vehicles.locations().await
    }

    async fn passenger_counts(&self, unit: TimeUnit) -> StoreResult<Vec<PassengerCount>> {
        self.trips.passenger_counts(unit).await
    }

    async fn trip_endpoints(&self) -> StoreResult<Vec<TripEndpoints>> {
        self.trips.endpoints().await
    }

    async fn ratings_leaderboard(&self) -> StoreResult<Vec<LeaderboardEntry>> {
        self.trips.leaderboard().await
    }
}
