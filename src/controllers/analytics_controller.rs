use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, FixedOffset, NaiveDate, Utc};
use validator::Validate;

use crate::dto::analytics_dto::{PassengerTrendQuery, PickupDropoffQuery, TripsByWeekQuery};
use crate::map::BoardView;
use crate::models::analytics::{
    CategoryChart, ChartState, FleetStatusCounts, LeaderboardRow, PlaceCount, TimeSeriesChart,
    TripStatusSplit,
};
use crate::models::trip::DateRange;
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::{end_of_day, start_of_day, validate_date};

pub async fn fleet_status(State(state): State<AppState>) -> Json<ChartState<FleetStatusCounts>> {
    Json(state.analytics.fleet_status().await)
}

pub async fn weekly_trips(State(state): State<AppState>) -> Json<ChartState<CategoryChart>> {
    Json(state.analytics.weekly_trips().await)
}

pub async fn passenger_trend(
    State(state): State<AppState>,
    Query(query): Query<PassengerTrendQuery>,
) -> Json<ChartState<TimeSeriesChart>> {
    Json(state.analytics.passenger_trend(query.unit).await)
}

pub async fn trip_status(State(state): State<AppState>) -> Json<ChartState<TripStatusSplit>> {
    Json(state.analytics.trip_status().await)
}

pub async fn top_pickup_places(State(state): State<AppState>) -> Json<ChartState<Vec<PlaceCount>>> {
    Json(state.analytics.top_pickup_places().await)
}

pub async fn trips_by_week(
    State(state): State<AppState>,
    Query(query): Query<TripsByWeekQuery>,
) -> AppResult<Json<ChartState<CategoryChart>>> {
    let range = parse_range(&query, state.analytics.local_offset())?;
    Ok(Json(state.analytics.trips_by_week(range).await))
}

pub async fn ratings(State(state): State<AppState>) -> Json<ChartState<Vec<LeaderboardRow>>> {
    Json(state.analytics.leaderboard().await)
}

pub async fn heatmap(State(state): State<AppState>) -> Json<ChartState<BoardView>> {
    Json(state.analytics.heatmap().await)
}

pub async fn pickup_dropoff(
    State(state): State<AppState>,
    Query(query): Query<PickupDropoffQuery>,
) -> AppResult<Json<ChartState<BoardView>>> {
    query.validate()?;
    Ok(Json(state.analytics.pickup_dropoff(query.zoom).await))
}

fn parse_day(value: Option<&str>, fallback: NaiveDate) -> AppResult<NaiveDate> {
    match value {
        Some(raw) => validate_date(raw)
            .map_err(|_| AppError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", raw))),
        None => Ok(fallback),
    }
}

/// Rango del filtro en días locales; por defecto el año en curso
fn parse_range(query: &TripsByWeekQuery, offset: FixedOffset) -> AppResult<DateRange> {
    let year = Utc::now().with_timezone(&offset).year();
    let jan_first = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default();
    let dec_last = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or_default();

    let from = parse_day(query.from.as_deref(), jan_first)?;
    let to = parse_day(query.to.as_deref(), dec_last)?;
    if from > to {
        return Err(AppError::BadRequest("'from' must not be after 'to'".to_string()));
    }

    Ok(DateRange {
        from: start_of_day(from, offset),
        to: end_of_day(to, offset),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_explicit_range() {
        let query = TripsByWeekQuery {
            from: Some("2024-01-01".into()),
            to: Some("2024-12-31".into()),
        };
        let range = parse_range(&query, utc()).unwrap();
        assert_eq!(range.from.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(range.to.date_naive().to_string(), "2024-12-31");
    }

    #[test]
    fn test_range_uses_local_day_boundaries() {
        let manila = FixedOffset::east_opt(8 * 3600).unwrap();
        let query = TripsByWeekQuery {
            from: Some("2024-03-01".into()),
            to: Some("2024-03-31".into()),
        };
        let range = parse_range(&query, manila).unwrap();
        assert_eq!(range.from.to_rfc3339(), "2024-02-29T16:00:00+00:00");

        // 02:00 del 1 de marzo en Manila
        let early_local = Utc.with_ymd_and_hms(2024, 2, 29, 18, 0, 0).unwrap();
        assert!(range.contains(&early_local));
        // 00:30 del 1 de abril en Manila
        let next_month = Utc.with_ymd_and_hms(2024, 3, 31, 16, 30, 0).unwrap();
        assert!(!range.contains(&next_month));
    }

    #[test]
    fn test_inverted_or_malformed_range() {
        let inverted = TripsByWeekQuery {
            from: Some("2024-12-31".into()),
            to: Some("2024-01-01".into()),
        };
        assert!(matches!(parse_range(&inverted, utc()), Err(AppError::BadRequest(_))));

        let malformed = TripsByWeekQuery {
            from: Some("31/12/2024".into()),
            to: None,
        };
        assert!(matches!(parse_range(&malformed, utc()), Err(AppError::BadRequest(_))));
    }
}
