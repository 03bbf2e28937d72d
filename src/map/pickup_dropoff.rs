//! Puntos de recogida y destino
//!
//! Un punto por extremo de viaje. El tamaño depende del zoom:
//! `20 * (1 + (zoom - 13) * 0.2)` px, recalculado en cada cambio de zoom.

use super::surface::{Legend, LegendItem, MapError, MapSurface, MarkerHandle, MarkerSpec, MarkerStyle};
use crate::models::trip::TripEndpoints;

const BASE_SIZE_PX: f64 = 20.0;
const BASE_ZOOM: f64 = 13.0;

pub const PICKUP_FILL: &str = "rgba(63, 177, 206, 0.5)";
pub const PICKUP_BORDER: &str = "2px solid #2a99c2";
pub const DROPOFF_FILL: &str = "rgba(80, 200, 120, 0.5)";
pub const DROPOFF_BORDER: &str = "2px solid #3da665";

pub fn marker_size(zoom: f64) -> f64 {
    (BASE_SIZE_PX * (1.0 + (zoom - BASE_ZOOM) * 0.2)).max(0.0)
}

fn dot(size_px: f64, fill: &str, border: &str) -> MarkerStyle {
    MarkerStyle::Dot {
        size_px,
        fill: fill.to_string(),
        border: Some(border.to_string()),
    }
}

pub fn legend() -> Legend {
    Legend {
        title: "Pickup & Dropoff Legend".to_string(),
        items: vec![
            LegendItem {
                color: PICKUP_FILL.to_string(),
                label: "Pickup Location".to_string(),
                border: Some(PICKUP_BORDER.to_string()),
                round: true,
            },
            LegendItem {
                color: DROPOFF_FILL.to_string(),
                label: "Dropoff Location".to_string(),
                border: Some(DROPOFF_BORDER.to_string()),
                round: true,
            },
        ],
    }
}

/// Capa de puntos; guarda los handles para redimensionarlos con el zoom
#[derive(Debug, Default)]
pub struct PickupDropoffLayer {
    pickups: Vec<MarkerHandle>,
    dropoffs: Vec<MarkerHandle>,
}

impl PickupDropoffLayer {
    pub fn render(surface: &mut dyn MapSurface, endpoints: &[TripEndpoints]) -> Self {
        let size = marker_size(surface.zoom());
        let mut layer = Self::default();

        for trip in endpoints {
            if let Some(start) = trip.start_location {
                layer.pickups.push(surface.create_marker(MarkerSpec {
                    position: start,
                    style: dot(size, PICKUP_FILL, PICKUP_BORDER),
                }));
            }
            if let Some(end) = trip.end_location {
                layer.dropoffs.push(surface.create_marker(MarkerSpec {
                    position: end,
                    style: dot(size, DROPOFF_FILL, DROPOFF_BORDER),
                }));
            }
        }

        surface.set_legend(legend());
        layer
    }

    pub fn pickup_count(&self) -> usize {
        self.pickups.len()
    }

    pub fn dropoff_count(&self) -> usize {
        self.dropoffs.len()
    }

    /// Cambio de zoom: aplica el nuevo zoom y redimensiona todos los puntos
    pub fn on_zoom(&self, surface: &mut dyn MapSurface, zoom: f64) -> Result<(), MapError> {
        surface.set_zoom(zoom);
        let size = marker_size(zoom);
        for handle in self.pickups.iter().chain(&self.dropoffs) {
            surface.set_marker_size(*handle, size)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{board::MarkerBoard, viewport::MapConfig};
    use crate::models::location::LngLat;

    #[test]
    fn test_marker_size_formula() {
        assert_eq!(marker_size(13.0), 20.0);
        assert!((marker_size(15.0) - 28.0).abs() < 1e-9);
        assert!((marker_size(12.0) - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_marker_size_never_negative() {
        assert_eq!(marker_size(8.0), 0.0);
        assert_eq!(marker_size(0.0), 0.0);
        assert!(marker_size(9.0) > 0.0);
    }

    #[test]
    fn test_zoom_change_resizes_every_dot() {
        let mut board = MarkerBoard::new(MapConfig::new(None));
        let endpoints = vec![
            TripEndpoints {
                start_location: Some(LngLat::new(123.19, 13.62)),
                end_location: Some(LngLat::new(123.20, 13.63)),
            },
            TripEndpoints {
                start_location: Some(LngLat::new(123.18, 13.61)),
                end_location: None,
            },
        ];

        let layer = PickupDropoffLayer::render(&mut board, &endpoints);
        assert_eq!(layer.pickup_count(), 2);
        assert_eq!(layer.dropoff_count(), 1);
        assert!(board.view().markers.iter().all(|m| m.style.size_px() == 20.0));

        layer.on_zoom(&mut board, 14.0).unwrap();
        let view = board.view();
        assert_eq!(view.zoom, 14.0);
        assert!(view.markers.iter().all(|m| (m.style.size_px() - 24.0).abs() < 1e-9));
    }
}
