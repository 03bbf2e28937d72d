use axum::{routing::get, Router};

use crate::controllers::analytics_controller::{
    fleet_status, passenger_trend, top_pickup_places, trip_status, trips_by_week, weekly_trips,
};
use crate::state::AppState;

/// Pantalla de analítica: un endpoint por gráfico
pub fn create_analytics_router() -> Router<AppState> {
    Router::new()
        .route("/fleet-status", get(fleet_status))
        .route("/weekly-trips", get(weekly_trips))
        .route("/passenger-trend", get(passenger_trend))
        .route("/trip-status", get(trip_status))
        .route("/top-pickup-places", get(top_pickup_places))
        .route("/trips-by-week", get(trips_by_week))
}
