//! Frontera con el store de datos
//!
//! `FleetStore` es la única puerta hacia las colecciones `users`,
//! `modern_jeeps` y `trips` y hacia los procedimientos de agregación del
//! store alojado. Las implementaciones decodifican filas crudas a los modelos
//! de dominio y devuelven los fallos como valores `StoreError`.

pub mod memory_store;
pub mod pg_store;
pub mod trip_repository;
pub mod user_repository;
pub mod vehicle_repository;

pub use memory_store::MemoryFleetStore;
pub use pg_store::PgFleetStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    location::VehicleLocationRecord,
    trip::{DateRange, LeaderboardEntry, PassengerCount, TimeUnit, TripEndpoints},
    user::{Driver, NewUser, ProfileChanges, Role, User},
    vehicle::{NewVehicle, Vehicle, VehicleChanges},
};

/// Código PostgREST para "ninguna fila" en consultas `.single()`
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Error estructurado devuelto por el store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("No rows found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Malformed row: {0}")]
    Decode(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => NO_ROWS_CODE,
            StoreError::Conflict(_) => "23505",
            StoreError::Decode(_) => "DECODE",
            StoreError::Unavailable(_) => "UNAVAILABLE",
            StoreError::Query(_) => "QUERY",
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        let message = error.to_string();
        match &error {
            sqlx::Error::RowNotFound => StoreError::NotFound(message),
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                StoreError::Conflict(db.message().to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
                StoreError::Decode(message)
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(message)
            }
            _ => StoreError::Query(message),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Operaciones del store alojado usadas por el dashboard
#[async_trait]
pub trait FleetStore: Send + Sync {
    // users
    async fn find_user_by_email(&self, email: &str) -> StoreResult<User>;
    async fn find_user_by_auth_id(&self, auth_user_id: Uuid) -> StoreResult<User>;
    async fn list_users_by_role(&self, role: Role) -> StoreResult<Vec<Driver>>;
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn update_user_profile(&self, auth_user_id: Uuid, changes: ProfileChanges) -> StoreResult<User>;

    // modern_jeeps
    async fn list_vehicles(&self) -> StoreResult<Vec<Vehicle>>;
    async fn find_vehicle_by_code(&self, mjeep_code: &str) -> StoreResult<Vehicle>;
    async fn insert_vehicle(&self, vehicle: NewVehicle) -> StoreResult<Vehicle>;
    async fn update_vehicle(&self, mjeep_code: &str, changes: VehicleChanges) -> StoreResult<Vehicle>;
    async fn delete_vehicle(&self, mjeep_code: &str) -> StoreResult<()>;
    /// Conductores ligados a algún vehículo, opcionalmente excluyendo uno
    async fn assigned_driver_ids(&self, excluding: Option<i64>) -> StoreResult<Vec<i64>>;
    /// Vehículos cuyo conductor está en `driver_ids`, filtrando por estado si se indica
    async fn count_vehicles(&self, driver_ids: &[i64], status: Option<bool>) -> StoreResult<i64>;

    // trips
    async fn trip_start_times(&self, range: Option<DateRange>) -> StoreResult<Vec<DateTime<Utc>>>;
    async fn count_trips(&self, completed: bool) -> StoreResult<i64>;

    // procedimientos de agregación
    async fn vehicle_locations(&self) -> StoreResult<Vec<VehicleLocationRecord>>;
    async fn passenger_counts(&self, unit: TimeUnit) -> StoreResult<Vec<PassengerCount>>;
    async fn trip_endpoints(&self) -> StoreResult<Vec<TripEndpoints>>;
    async fn ratings_leaderboard(&self) -> StoreResult<Vec<LeaderboardEntry>>;
}
