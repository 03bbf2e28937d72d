use std::collections::HashMap;

use super::surface::{MapError, MapSurface, MarkerHandle, MarkerSpec, MarkerStyle, Popup};
use crate::models::location::LiveVehicle;
use crate::models::vehicle::{status_label, NO_DRIVER_LABEL};
use crate::services::live_location::MarkerDiff;

pub const BUS_ICON_URL: &str = "/busMarker.png";
pub const BUS_ICON_SIZE_PX: f64 = 40.0;
pub const POPUP_OFFSET: u32 = 25;

/// Popup de detalle de un vehículo en vivo
pub fn vehicle_popup(vehicle: &LiveVehicle) -> Popup {
    Popup::new(POPUP_OFFSET)
        .row("Type", vehicle.mjeep_code.as_deref().unwrap_or("Unknown"))
        .row("Plate Number", vehicle.plate_number.clone())
        .row("Seats", vehicle.seats.to_string())
        // sólo los vehículos activos llegan al snapshot
        .row("Status", status_label(true))
        .row("Driver", vehicle.driver_name.as_deref().unwrap_or(NO_DRIVER_LABEL))
}

fn bus_marker(vehicle: &LiveVehicle) -> MarkerSpec {
    MarkerSpec {
        position: vehicle.position,
        style: MarkerStyle::Icon {
            url: BUS_ICON_URL.to_string(),
            size_px: BUS_ICON_SIZE_PX,
        },
    }
}

/// Marcadores de vehículos en vivo, uno por entidad del snapshot
#[derive(Debug, Default)]
pub struct LiveMarkers {
    handles: HashMap<i64, MarkerHandle>,
}

impl LiveMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_of(&self, mjeep_id: i64) -> Option<MarkerHandle> {
        self.handles.get(&mjeep_id).copied()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Aplica el diff sobre la superficie
    pub fn apply(&mut self, diff: &MarkerDiff, surface: &mut dyn MapSurface) -> Result<(), MapError> {
        for mjeep_id in &diff.removed {
            if let Some(handle) = self.handles.remove(mjeep_id) {
                surface.remove_marker(handle)?;
            }
        }

        for vehicle in &diff.added {
            let handle = surface.create_marker(bus_marker(vehicle));
            surface.attach_popup(handle, vehicle_popup(vehicle))?;
            if let Some(stale) = self.handles.insert(vehicle.mjeep_id, handle) {
                surface.remove_marker(stale)?;
            }
        }

        for (mjeep_id, position) in &diff.moved {
            if let Some(handle) = self.handles.get(mjeep_id) {
                surface.set_marker_position(*handle, *position)?;
            }
        }

        for vehicle in &diff.details_changed {
            if let Some(handle) = self.handles.get(&vehicle.mjeep_id) {
                surface.attach_popup(*handle, vehicle_popup(vehicle))?;
            }
        }

        Ok(())
    }

    /// Retira todos los marcadores (desmontaje de la vista)
    pub fn clear(&mut self, surface: &mut dyn MapSurface) {
        for (_, handle) in self.handles.drain() {
            let _ = surface.remove_marker(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{board::MarkerBoard, viewport::MapConfig};
    use crate::models::location::{LngLat, LocationSnapshot};

    fn vehicle(id: i64, lng: f64) -> LiveVehicle {
        LiveVehicle {
            mjeep_id: id,
            driver_id: None,
            mjeep_code: Some(format!("MJ-{:02}", id)),
            plate_number: format!("PLT-{}", id),
            seats: 20,
            driver_name: None,
            position: LngLat::new(lng, 13.6),
        }
    }

    fn snapshot(vehicles: Vec<LiveVehicle>) -> LocationSnapshot {
        LocationSnapshot::from_vehicles(vehicles)
    }

    #[test]
    fn test_one_marker_per_entity_after_diffs() {
        let mut board = MarkerBoard::new(MapConfig::new(None));
        let mut markers = LiveMarkers::new();

        let first = snapshot(vec![vehicle(1, 123.1), vehicle(2, 123.2)]);
        markers
            .apply(&MarkerDiff::between(&LocationSnapshot::default(), &first), &mut board)
            .unwrap();
        assert_eq!(board.marker_count(), 2);

        let second = snapshot(vec![vehicle(2, 123.25), vehicle(3, 123.3)]);
        markers
            .apply(&MarkerDiff::between(&first, &second), &mut board)
            .unwrap();

        assert_eq!(board.marker_count(), 2);
        assert!(markers.handle_of(1).is_none());
        let moved = markers.handle_of(2).unwrap();
        let (spec, _) = board.marker(moved).unwrap();
        assert_eq!(spec.position, LngLat::new(123.25, 13.6));
    }

    #[test]
    fn test_popup_reveals_vehicle_details() {
        let mut board = MarkerBoard::new(MapConfig::new(None));
        let mut markers = LiveMarkers::new();
        let mut jeep = vehicle(7, 123.2);
        jeep.driver_name = Some("Juan Dela Cruz".to_string());

        markers
            .apply(
                &MarkerDiff::between(&LocationSnapshot::default(), &snapshot(vec![jeep])),
                &mut board,
            )
            .unwrap();

        let handle = markers.handle_of(7).unwrap();
        let popup = board.click(handle).unwrap().unwrap();
        assert_eq!(popup.offset, 25);
        assert_eq!(popup.value_of("Type"), Some("MJ-07"));
        assert_eq!(popup.value_of("Plate Number"), Some("PLT-7"));
        assert_eq!(popup.value_of("Seats"), Some("20"));
        assert_eq!(popup.value_of("Status"), Some("Active"));
        assert_eq!(popup.value_of("Driver"), Some("Juan Dela Cruz"));
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut board = MarkerBoard::new(MapConfig::new(None));
        let mut markers = LiveMarkers::new();
        let snap = snapshot(vec![vehicle(1, 123.1), vehicle(2, 123.2)]);
        markers
            .apply(&MarkerDiff::between(&LocationSnapshot::default(), &snap), &mut board)
            .unwrap();

        markers.clear(&mut board);
        assert!(markers.is_empty());
        assert_eq!(board.marker_count(), 0);
    }
}
