use serde::Deserialize;
use validator::Validate;

use crate::models::trip::TimeUnit;
use crate::utils::validation::validate_zoom;

#[derive(Debug, Default, Deserialize)]
pub struct PassengerTrendQuery {
    #[serde(default)]
    pub unit: TimeUnit,
}

/// Rango `YYYY-MM-DD`; sin límites se usa el año en curso
#[derive(Debug, Default, Deserialize)]
pub struct TripsByWeekQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct PickupDropoffQuery {
    #[validate(custom(function = "validate_zoom", message = "Zoom must be between 0 and 22."))]
    pub zoom: Option<f64>,
}
