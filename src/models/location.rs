//! Modelos de ubicación
//!
//! Coordenadas, geometrías GeoJSON tal como las devuelve el store y el
//! snapshot de vehículos activos que alimenta el mapa en vivo.

use serde::{Deserialize, Serialize};

/// Par longitud/latitud en grados WGS84
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Construye a partir de un array GeoJSON `[lng, lat, ...]`.
    ///
    /// Devuelve `None` si faltan componentes o alguno no es finito.
    pub fn from_pair(coordinates: &[f64]) -> Option<Self> {
        match coordinates {
            [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Some(Self::new(*lng, *lat)),
            _ => None,
        }
    }

    pub fn as_pair(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// Geometría de tipo punto en formato GeoJSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl GeoPoint {
    pub fn point(position: LngLat) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: position.as_pair().to_vec(),
        }
    }

    pub fn lng_lat(&self) -> Option<LngLat> {
        LngLat::from_pair(&self.coordinates)
    }

    /// Interpreta un valor JSON arbitrario del store como punto GeoJSON.
    ///
    /// Cualquier forma inesperada se trata como ausencia de coordenadas.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let point: GeoPoint = serde_json::from_value(value.clone()).ok()?;
        point.lng_lat().map(|_| point)
    }
}

/// Fila cruda del procedimiento `get_modern_jeep_locations_geojson`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleLocationRecord {
    pub mjeep_id: i64,
    pub driver_id: Option<i64>,
    pub mjeep_code: Option<String>,
    pub plate_number: String,
    pub seats: i32,
    pub status: bool,
    pub driver_name: Option<String>,
    pub location: Option<GeoPoint>,
}

/// Vehículo activo y posicionado dentro de un snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveVehicle {
    pub mjeep_id: i64,
    pub driver_id: Option<i64>,
    pub mjeep_code: Option<String>,
    pub plate_number: String,
    pub seats: i32,
    pub driver_name: Option<String>,
    pub position: LngLat,
}

impl LiveVehicle {
    /// Igualdad de atributos visibles en el popup, ignorando la posición
    pub fn same_details(&self, other: &LiveVehicle) -> bool {
        self.driver_id == other.driver_id
            && self.mjeep_code == other.mjeep_code
            && self.plate_number == other.plate_number
            && self.seats == other.seats
            && self.driver_name == other.driver_name
    }
}

/// Conjunto de vehículos activos con posición en un instante de sondeo.
///
/// Los vehículos se mantienen ordenados por `mjeep_id` y sin duplicados, de
/// modo que dos snapshots con el mismo contenido son iguales por valor sin
/// importar el orden de las filas del store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocationSnapshot {
    vehicles: Vec<LiveVehicle>,
}

impl LocationSnapshot {
    pub fn from_vehicles(mut vehicles: Vec<LiveVehicle>) -> Self {
        vehicles.sort_by_key(|v| v.mjeep_id);
        // la última fila de un id repetido es la vigente
        let mut deduped: Vec<LiveVehicle> = Vec::with_capacity(vehicles.len());
        for vehicle in vehicles {
            match deduped.last_mut() {
                Some(last) if last.mjeep_id == vehicle.mjeep_id => *last = vehicle,
                _ => deduped.push(vehicle),
            }
        }
        Self { vehicles: deduped }
    }

    pub fn vehicles(&self) -> &[LiveVehicle] {
        &self.vehicles
    }

    pub fn get(&self, mjeep_id: i64) -> Option<&LiveVehicle> {
        self.vehicles
            .binary_search_by_key(&mjeep_id, |v| v.mjeep_id)
            .ok()
            .map(|idx| &self.vehicles[idx])
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn live(id: i64, lng: f64) -> LiveVehicle {
        LiveVehicle {
            mjeep_id: id,
            driver_id: Some(id * 10),
            mjeep_code: Some(format!("MJ-{id:02}")),
            plate_number: format!("ABC {id}"),
            seats: 22,
            driver_name: None,
            position: LngLat::new(lng, 13.6),
        }
    }

    #[test]
    fn test_from_pair_rejects_short_and_non_finite() {
        assert_eq!(LngLat::from_pair(&[123.2, 13.6]), Some(LngLat::new(123.2, 13.6)));
        assert_eq!(LngLat::from_pair(&[123.2]), None);
        assert_eq!(LngLat::from_pair(&[f64::NAN, 13.6]), None);
        assert_eq!(LngLat::from_pair(&[]), None);
    }

    #[test]
    fn test_geo_point_from_json() {
        let value = json!({ "type": "Point", "coordinates": [123.2, 13.6] });
        assert!(GeoPoint::from_json(&value).is_some());

        let value = json!({ "type": "Point", "coordinates": [] });
        assert!(GeoPoint::from_json(&value).is_none());

        assert!(GeoPoint::from_json(&json!(null)).is_none());
        assert!(GeoPoint::from_json(&json!("POINT(1 2)")).is_none());
    }

    #[test]
    fn test_snapshot_equality_ignores_row_order() {
        let a = LocationSnapshot::from_vehicles(vec![live(2, 123.1), live(1, 123.2)]);
        let b = LocationSnapshot::from_vehicles(vec![live(1, 123.2), live(2, 123.1)]);
        assert_eq!(a, b);
        assert_eq!(a.vehicles()[0].mjeep_id, 1);
    }

    #[test]
    fn test_snapshot_keeps_last_duplicate() {
        let snapshot = LocationSnapshot::from_vehicles(vec![live(1, 123.2), live(1, 123.3)]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(1).map(|v| v.position.lng), Some(123.3));
        assert!(snapshot.get(7).is_none());
    }
}
