//! Modelos de viajes y filas agregadas
//!
//! Los viajes son de solo lectura para este servicio; aquí viven también las
//! filas que devuelven los procedimientos de agregación del store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::location::LngLat;

/// Unidad de agrupación de la serie temporal de pasajeros
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Day,
    Week,
}

impl TimeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Day => "day",
            TimeUnit::Week => "week",
        }
    }
}

/// Rango cerrado `[from, to]` sobre `start_timestamp`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.from && *instant <= self.to
    }
}

/// Viaje tal como se guarda en `trips`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: i64,
    pub mjeep_id: Option<i64>,
    pub driver_id: Option<i64>,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: Option<DateTime<Utc>>,
    pub start_location: Option<LngLat>,
    pub end_location: Option<LngLat>,
}

impl Trip {
    /// Un viaje sin `end_timestamp` está en curso o fue cancelado
    pub fn is_completed(&self) -> bool {
        self.end_timestamp.is_some()
    }
}

/// Fila de `get_trip_locations_as_geojson`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripEndpoints {
    pub start_location: Option<LngLat>,
    pub end_location: Option<LngLat>,
}

/// Fila de `get_passenger_data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassengerCount {
    pub time_interval: DateTime<Utc>,
    pub passengers: i64,
}

/// Fila de `get_ratings_leaderboard`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub driver_name: String,
    pub mjeep_code: String,
    pub average_rating: Decimal,
    pub feedbacks: Vec<String>,
}
