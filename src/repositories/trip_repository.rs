use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::location::GeoPoint;
use crate::models::trip::{DateRange, LeaderboardEntry, PassengerCount, TimeUnit, TripEndpoints};
use crate::repositories::StoreResult;

// Fila cruda de get_trip_locations_as_geojson()
#[derive(Debug, sqlx::FromRow)]
struct EndpointsRow {
    start_location: Option<Json<serde_json::Value>>,
    end_location: Option<Json<serde_json::Value>>,
}

impl From<EndpointsRow> for TripEndpoints {
    fn from(row: EndpointsRow) -> Self {
        let decode = |value: Option<Json<serde_json::Value>>| {
            value
                .and_then(|json| GeoPoint::from_json(&json.0))
                .and_then(|point| point.lng_lat())
        };

        TripEndpoints {
            start_location: decode(row.start_location),
            end_location: decode(row.end_location),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LeaderboardRow {
    rank: i64,
    driver_name: Option<String>,
    mjeep_code: Option<String>,
    average_rating: Option<Decimal>,
    feedbacks: Option<Vec<String>>,
}

impl From<LeaderboardRow> for LeaderboardEntry {
    fn from(row: LeaderboardRow) -> Self {
        LeaderboardEntry {
            rank: row.rank,
            driver_name: row.driver_name.unwrap_or_default(),
            mjeep_code: row.mjeep_code.unwrap_or_default(),
            average_rating: row.average_rating.unwrap_or_default(),
            feedbacks: row
                .feedbacks
                .unwrap_or_default()
                .into_iter()
                .filter(|f| !f.trim().is_empty())
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct TripRepository {
    pool: PgPool,
}

impl TripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn start_times(&self, range: Option<DateRange>) -> StoreResult<Vec<DateTime<Utc>>> {
        let (from, to) = match range {
            Some(range) => (Some(range.from), Some(range.to)),
            None => (None, None),
        };

        let rows: Vec<(DateTime<Utc>,)> = sqlx::query_as(
            r#"
            SELECT start_timestamp FROM trips
            WHERE start_timestamp IS NOT NULL
            AND ($1::timestamptz IS NULL OR start_timestamp >= $1)
            AND ($2::timestamptz IS NULL OR start_timestamp <= $2)
            ORDER BY start_timestamp ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(ts,)| ts).collect())
    }

    pub async fn count(&self, completed: bool) -> StoreResult<i64> {
        let result: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM trips WHERE (end_timestamp IS NOT NULL) = $1",
        )
        .bind(completed)
        .fetch_one(&self.pool)
        .await?;

        Ok(result.0)
    }

    pub async fn passenger_counts(&self, unit: TimeUnit) -> StoreResult<Vec<PassengerCount>> {
        let rows: Vec<(DateTime<Utc>, Option<i64>)> = sqlx::query_as(
            r#"
            SELECT time_interval::timestamptz, passengers::bigint
            FROM get_passenger_data($1)
            ORDER BY time_interval
            "#,
        )
        .bind(unit.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(time_interval, passengers)| PassengerCount {
                time_interval,
                passengers: passengers.unwrap_or(0),
            })
            .collect())
    }

    pub async fn endpoints(&self) -> StoreResult<Vec<TripEndpoints>> {
        let rows = sqlx::query_as::<_, EndpointsRow>(
            r#"
            SELECT start_location::jsonb AS start_location, end_location::jsonb AS end_location
            FROM get_trip_locations_as_geojson()
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(TripEndpoints::from).collect())
    }

    pub async fn leaderboard(&self) -> StoreResult<Vec<LeaderboardEntry>> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT
                rank::bigint AS rank,
                driver_name,
                mjeep_code,
                average_rating::numeric AS average_rating,
                feedbacks::text[] AS feedbacks
            FROM get_ratings_leaderboard()
            ORDER BY rank
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LeaderboardEntry::from).collect())
    }
}
