//! Heatmap de recogidas
//!
//! Un punto GeoJSON por viaje (propiedades con el destino), una capa
//! `heatmap` con rampa azul, una leyenda y un punto de reserva de 10 px
//! sobre cada recogida.

use serde_json::{json, Value};

use super::surface::{LayerSpec, Legend, LegendItem, MapError, MapSurface, MarkerSpec, MarkerStyle};
use crate::models::trip::TripEndpoints;

pub const TRIPS_SOURCE: &str = "trips";
pub const HEATMAP_LAYER: &str = "heatmap";
pub const BOOKING_DOT_COLOR: &str = "#231a75";
pub const BOOKING_DOT_SIZE_PX: f64 = 10.0;

/// FeatureCollection con un punto por viaje con recogida conocida
pub fn trips_feature_collection(endpoints: &[TripEndpoints]) -> Value {
    let features: Vec<Value> = endpoints
        .iter()
        .filter_map(|trip| {
            let start = trip.start_location?;
            Some(json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": start.as_pair() },
                "properties": {
                    "end_location": trip.end_location.map(|end| json!({
                        "type": "Point",
                        "coordinates": end.as_pair(),
                    })),
                },
            }))
        })
        .collect();

    json!({ "type": "FeatureCollection", "features": features })
}

pub fn heatmap_layer() -> LayerSpec {
    LayerSpec {
        id: HEATMAP_LAYER.to_string(),
        kind: "heatmap".to_string(),
        source: TRIPS_SOURCE.to_string(),
        paint: json!({
            "heatmap-weight": ["interpolate", ["linear"], ["get", "count"], 0, 0, 50, 0.3, 75, 0.6, 100, 1],
            "heatmap-intensity": ["interpolate", ["linear"], ["zoom"], 0, 1, 15, 3],
            "heatmap-color": [
                "interpolate", ["linear"], ["heatmap-density"],
                0, "rgba(173,216,230,0)",
                0.2, "rgb(135,206,250)",
                0.4, "rgb(100,149,237)",
                0.6, "rgb(30,144,255)",
                0.8, "rgb(0,0,255)",
                1, "rgb(39,62,176)"
            ],
            "heatmap-radius": ["interpolate", ["linear"], ["zoom"], 0, 2, 15, 20],
            "heatmap-opacity": 0.8,
        }),
    }
}

pub fn heatmap_legend() -> Legend {
    let swatch = |color: &str, label: &str| LegendItem {
        color: color.to_string(),
        label: label.to_string(),
        border: None,
        round: false,
    };

    Legend {
        title: "Heatmap Legend".to_string(),
        items: vec![
            swatch("rgb(135,206,250)", "50 trips"),
            swatch("rgb(100,149,237)", "65 trips"),
            swatch("rgb(30,144,255)", "80 trips"),
            swatch("rgb(0,0,255)", "90 trips"),
            swatch("rgb(39,62,176)", "100+ trips"),
            LegendItem {
                color: BOOKING_DOT_COLOR.to_string(),
                label: "Booking".to_string(),
                border: None,
                round: true,
            },
        ],
    }
}

/// Dibuja el heatmap completo sobre una superficie ya cargada
pub fn render(surface: &mut dyn MapSurface, endpoints: &[TripEndpoints]) -> Result<usize, MapError> {
    surface.add_source(TRIPS_SOURCE, trips_feature_collection(endpoints))?;
    surface.add_layer(heatmap_layer())?;

    let mut dots = 0;
    for start in endpoints.iter().filter_map(|trip| trip.start_location) {
        surface.create_marker(MarkerSpec {
            position: start,
            style: MarkerStyle::Dot {
                size_px: BOOKING_DOT_SIZE_PX,
                fill: BOOKING_DOT_COLOR.to_string(),
                border: None,
            },
        });
        dots += 1;
    }

    surface.set_legend(heatmap_legend());
    Ok(dots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{board::MarkerBoard, viewport::MapConfig};
    use crate::models::location::LngLat;

    fn endpoints() -> Vec<TripEndpoints> {
        vec![
            TripEndpoints {
                start_location: Some(LngLat::new(123.19, 13.62)),
                end_location: Some(LngLat::new(123.20, 13.63)),
            },
            TripEndpoints {
                start_location: None,
                end_location: Some(LngLat::new(123.21, 13.60)),
            },
            TripEndpoints {
                start_location: Some(LngLat::new(123.18, 13.61)),
                end_location: None,
            },
        ]
    }

    #[test]
    fn test_features_carry_end_location() {
        let collection = trips_feature_collection(&endpoints());
        let features = collection["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["geometry"]["coordinates"], json!([123.19, 13.62]));
        assert_eq!(
            features[0]["properties"]["end_location"]["coordinates"],
            json!([123.20, 13.63])
        );
        assert!(features[1]["properties"]["end_location"].is_null());
    }

    #[test]
    fn test_render_needs_loaded_surface() {
        let mut board = MarkerBoard::new(MapConfig::new(None));
        assert_eq!(render(&mut board, &endpoints()), Err(MapError::NotLoaded));

        board.load();
        assert_eq!(render(&mut board, &endpoints()), Ok(2));

        let view = board.view();
        assert_eq!(view.layers[0].paint["heatmap-opacity"], 0.8);
        assert_eq!(view.legend.unwrap().items.len(), 6);
        assert_eq!(view.markers[0].style.size_px(), 10.0);
    }
}
