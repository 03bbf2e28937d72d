use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::location::{GeoPoint, VehicleLocationRecord};
use crate::models::vehicle::{NewVehicle, Vehicle, VehicleChanges};
use crate::repositories::{StoreError, StoreResult};

// Fila cruda de modern_jeeps + nombre del conductor
#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    mjeep_id: i64,
    mjeep_code: Option<String>,
    plate_number: Option<String>,
    seats: Option<i32>,
    status: Option<bool>,
    driver_id: Option<i64>,
    driver_name: Option<String>,
    location: Option<Json<serde_json::Value>>,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = StoreError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        let mjeep_code = row.mjeep_code.ok_or_else(|| {
            StoreError::Decode(format!("modern_jeeps {} has no mjeep_code", row.mjeep_id))
        })?;

        Ok(Vehicle {
            mjeep_id: row.mjeep_id,
            mjeep_code,
            plate_number: row.plate_number.unwrap_or_default(),
            seats: row.seats.unwrap_or(0),
            status: row.status.unwrap_or(false),
            driver_id: row.driver_id,
            driver_name: row.driver_name,
            position: row
                .location
                .as_ref()
                .and_then(|json| GeoPoint::from_json(&json.0))
                .and_then(|point| point.lng_lat()),
        })
    }
}

// Fila cruda de get_modern_jeep_locations_geojson()
#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    mjeep_id: i64,
    driver_id: Option<i64>,
    mjeep_code: Option<String>,
    plate_number: Option<String>,
    seats: Option<i32>,
    status: Option<bool>,
    driver_name: Option<String>,
    location: Option<Json<serde_json::Value>>,
}

impl From<LocationRow> for VehicleLocationRecord {
    fn from(row: LocationRow) -> Self {
        VehicleLocationRecord {
            mjeep_id: row.mjeep_id,
            driver_id: row.driver_id,
            mjeep_code: row.mjeep_code,
            plate_number: row.plate_number.unwrap_or_default(),
            seats: row.seats.unwrap_or(0),
            status: row.status.unwrap_or(false),
            driver_name: row.driver_name,
            location: row.location.as_ref().and_then(|json| GeoPoint::from_json(&json.0)),
        }
    }
}

const VEHICLE_COLUMNS: &str = r#"
    j.mjeep_id::bigint AS mjeep_id,
    j.mjeep_code,
    j.plate_number,
    j.seats::int AS seats,
    j.status,
    j.driver_id::bigint AS driver_id,
    u.name AS driver_name,
    ST_AsGeoJSON(j.location)::jsonb AS location
"#;

#[derive(Clone)]
pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> StoreResult<Vec<Vehicle>> {
        let sql = format!(
            "SELECT {VEHICLE_COLUMNS} FROM modern_jeeps j \
             LEFT JOIN users u ON u.user_id = j.driver_id \
             ORDER BY j.mjeep_id"
        );

        let rows = sqlx::query_as::<_, VehicleRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Vehicle::try_from).collect()
    }

    pub async fn find_by_code(&self, mjeep_code: &str) -> StoreResult<Vehicle> {
        let sql = format!(
            "SELECT {VEHICLE_COLUMNS} FROM modern_jeeps j \
             LEFT JOIN users u ON u.user_id = j.driver_id \
             WHERE j.mjeep_code = $1"
        );

        let row = sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(mjeep_code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("modern_jeeps '{}'", mjeep_code)))?;

        Vehicle::try_from(row)
    }

    pub async fn create(&self, vehicle: NewVehicle) -> StoreResult<Vehicle> {
        let sql = format!(
            r#"
            WITH j AS (
                INSERT INTO modern_jeeps (mjeep_code, plate_number, seats, status, driver_id)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            )
            SELECT {VEHICLE_COLUMNS} FROM j
            LEFT JOIN users u ON u.user_id = j.driver_id
            "#
        );

        let row = sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(&vehicle.mjeep_code)
            .bind(&vehicle.plate_number)
            .bind(vehicle.seats)
            .bind(vehicle.status)
            .bind(vehicle.driver_id)
            .fetch_one(&self.pool)
            .await?;

        Vehicle::try_from(row)
    }

    pub async fn update(&self, mjeep_code: &str, changes: VehicleChanges) -> StoreResult<Vehicle> {
        let sql = format!(
            r#"
            WITH j AS (
                UPDATE modern_jeeps
                SET plate_number = $2, seats = $3, driver_id = $4, status = COALESCE($5, status)
                WHERE mjeep_code = $1
                RETURNING *
            )
            SELECT {VEHICLE_COLUMNS} FROM j
            LEFT JOIN users u ON u.user_id = j.driver_id
            "#
        );

        let row = sqlx::query_as::<_, VehicleRow>(&sql)
            .bind(mjeep_code)
            .bind(&changes.plate_number)
            .bind(changes.seats)
            .bind(changes.driver_id)
            .bind(changes.status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("modern_jeeps '{}'", mjeep_code)))?;

        Vehicle::try_from(row)
    }

    pub async fn delete(&self, mjeep_code: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM modern_jeeps WHERE mjeep_code = $1")
            .bind(mjeep_code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("modern_jeeps '{}'", mjeep_code)));
        }

        Ok(())
    }

    pub async fn assigned_driver_ids(&self, excluding: Option<i64>) -> StoreResult<Vec<i64>> {
        let ids: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT driver_id::bigint FROM modern_jeeps
            WHERE driver_id IS NOT NULL
            AND ($1::bigint IS NULL OR driver_id <> $1)
            "#,
        )
        .bind(excluding)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    pub async fn count(&self, driver_ids: &[i64], status: Option<bool>) -> StoreResult<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM modern_jeeps
            WHERE driver_id = ANY($1::bigint[])
            AND ($2::boolean IS NULL OR status = $2)
            "#,
        )
        .bind(driver_ids)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    pub async fn locations(&self) -> StoreResult<Vec<VehicleLocationRecord>> {
        let rows = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT
                mjeep_id::bigint AS mjeep_id,
                driver_id::bigint AS driver_id,
                mjeep_code,
                plate_number,
                seats::int AS seats,
                status,
                driver_name,
                location::jsonb AS location
            FROM get_modern_jeep_locations_geojson()
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(VehicleLocationRecord::from).collect())
    }
}
