//! Modelos de Analytics
//!
//! Estructuras de datos listas para los widgets de gráficos del dashboard.
//! Cada lector agregado produce un `ChartState`: o bien un placeholder
//! (cargando / sin datos) o bien el gráfico ya formateado.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::trip::TimeUnit;

/// Mensaje mostrado en lugar de un gráfico sin datos
pub const PLACEHOLDER_MESSAGE: &str = "Loading data...";

/// Estado de un widget de gráfico
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ChartState<T> {
    Placeholder { message: String },
    Ready { chart: T },
}

impl<T> ChartState<T> {
    pub fn placeholder() -> Self {
        ChartState::Placeholder {
            message: PLACEHOLDER_MESSAGE.to_string(),
        }
    }

    pub fn ready(chart: T) -> Self {
        ChartState::Ready { chart }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ChartState::Placeholder { .. })
    }

    pub fn chart(&self) -> Option<&T> {
        match self {
            ChartState::Ready { chart } => Some(chart),
            ChartState::Placeholder { .. } => None,
        }
    }
}

/// Serie de datos de un gráfico categórico
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<i64>,
}

/// Gráfico de barras o líneas con etiquetas categóricas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryChart {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl CategoryChart {
    pub fn single(label: &str, buckets: Vec<(String, i64)>) -> Self {
        let (labels, data) = buckets.into_iter().unzip();
        Self {
            labels,
            datasets: vec![Dataset {
                label: label.to_string(),
                data,
            }],
        }
    }
}

/// Punto de la serie temporal de pasajeros
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub passengers: i64,
}

/// Serie temporal de volumen de pasajeros
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesChart {
    pub unit: TimeUnit,
    pub points: Vec<TimeSeriesPoint>,
}

/// Conteo de vehículos activos e inactivos
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetStatusCounts {
    pub active: i64,
    pub inactive: i64,
}

/// Reparto de viajes completados frente a cancelados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripStatusSplit {
    pub successful: i64,
    pub cancelled: i64,
    pub total: i64,
}

/// Fila del leaderboard de calificaciones ya formateada
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub rank: i64,
    pub driver_name: String,
    pub mjeep_code: String,
    pub average_rating: String,
    pub feedbacks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback_note: Option<String>,
}

/// Lugar de recogida y número de viajes que empiezan allí
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceCount {
    pub place: String,
    pub trips: usize,
}
