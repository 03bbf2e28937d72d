//! Utilidades de validación
//!
//! Validadores custom usados por los DTOs y conversión de parámetros de query.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use validator::ValidationError;

/// Rechaza valores vacíos o formados sólo por espacios
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Validar y convertir string a fecha
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        let mut error = ValidationError::new("date");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"YYYY-MM-DD".to_string());
        error
    })
}

/// Zoom de mapa dentro del rango de Mapbox
pub fn validate_zoom(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || !(0.0..=22.0).contains(&value) {
        let mut error = ValidationError::new("zoom");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Inicio del día local `date` expresado en UTC
pub fn start_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    Utc.from_utc_datetime(&(date.and_time(NaiveTime::MIN) - offset))
}

/// Último instante del día local `date` expresado en UTC
pub fn end_of_day(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let last = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| date.and_time(NaiveTime::MIN));
    Utc.from_utc_datetime(&(last - offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("MJ-01").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_date_parsing() {
        let date = validate_date("2024-03-09").unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        assert_eq!(start_of_day(date, utc).to_rfc3339(), "2024-03-09T00:00:00+00:00");
        assert!(end_of_day(date, utc) > start_of_day(date, utc));
        assert!(validate_date("09/03/2024").is_err());
    }

    #[test]
    fn test_day_bounds_follow_local_offset() {
        let date = validate_date("2024-03-09").unwrap();
        let manila = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(start_of_day(date, manila).to_rfc3339(), "2024-03-08T16:00:00+00:00");
        assert_eq!(
            end_of_day(date, manila).to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "2024-03-09T15:59:59.999Z"
        );
    }

    #[test]
    fn test_zoom_range() {
        assert!(validate_zoom(13.0).is_ok());
        assert!(validate_zoom(-1.0).is_err());
        assert!(validate_zoom(f64::NAN).is_err());
    }
}
