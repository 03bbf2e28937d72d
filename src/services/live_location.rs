//! Reconciliación de posiciones en vivo
//!
//! Cada respuesta de `get_modern_jeep_locations_geojson` pasa por:
//! normalización (sólo vehículos activos con coordenadas válidas), guardia de
//! secuencia (se descartan respuestas más antiguas que la última aceptada),
//! debounce (la propagación espera una ventana de silencio) y deduplicación
//! por igualdad profunda. Lo que sale es un `MarkerDiff` mínimo respecto al
//! último snapshot propagado.

use std::time::Duration;

use tokio::time::Instant;

use crate::models::location::{LiveVehicle, LngLat, LocationSnapshot, VehicleLocationRecord};
use crate::repositories::StoreResult;

/// Convierte filas crudas en el snapshot de vehículos renderizables
pub fn normalize(records: Vec<VehicleLocationRecord>) -> LocationSnapshot {
    let vehicles = records
        .into_iter()
        .filter(|record| record.status)
        .filter_map(|record| {
            let position = record.location.as_ref()?.lng_lat()?;
            Some(LiveVehicle {
                mjeep_id: record.mjeep_id,
                driver_id: record.driver_id,
                mjeep_code: record.mjeep_code,
                plate_number: record.plate_number,
                seats: record.seats,
                driver_name: record.driver_name,
                position,
            })
        })
        .collect();

    LocationSnapshot::from_vehicles(vehicles)
}

/// Cambios mínimos de marcadores entre dos snapshots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerDiff {
    pub added: Vec<LiveVehicle>,
    pub removed: Vec<i64>,
    pub moved: Vec<(i64, LngLat)>,
    pub details_changed: Vec<LiveVehicle>,
}

impl MarkerDiff {
    pub fn between(previous: &LocationSnapshot, next: &LocationSnapshot) -> Self {
        let mut diff = MarkerDiff::default();

        for vehicle in previous.vehicles() {
            if next.get(vehicle.mjeep_id).is_none() {
                diff.removed.push(vehicle.mjeep_id);
            }
        }

        for vehicle in next.vehicles() {
            match previous.get(vehicle.mjeep_id) {
                None => diff.added.push(vehicle.clone()),
                Some(old) => {
                    if old.position != vehicle.position {
                        diff.moved.push((vehicle.mjeep_id, vehicle.position));
                    }
                    if !old.same_details(vehicle) {
                        diff.details_changed.push(vehicle.clone());
                    }
                }
            }
        }

        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.moved.is_empty()
            && self.details_changed.is_empty()
    }
}

/// Resultado de entregar una respuesta al reconciliador
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Respuesta aceptada; la propagación queda programada
    Scheduled,
    /// Respuesta más antigua que la última aceptada
    Stale,
    /// El fetch falló; el snapshot no cambia
    Failed,
}

struct PendingSnapshot {
    snapshot: LocationSnapshot,
    due: Instant,
}

/// Estado de reconciliación de una vista en vivo
pub struct LocationReconciler {
    debounce: Duration,
    newest_accepted: Option<u64>,
    pending: Option<PendingSnapshot>,
    propagated: LocationSnapshot,
}

impl LocationReconciler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            newest_accepted: None,
            pending: None,
            propagated: LocationSnapshot::default(),
        }
    }

    /// Entrega la respuesta del fetch con número de secuencia `seq`
    pub fn accept(
        &mut self,
        seq: u64,
        result: StoreResult<Vec<VehicleLocationRecord>>,
        now: Instant,
    ) -> Completion {
        if self.newest_accepted.map_or(false, |newest| seq <= newest) {
            tracing::debug!("⏭️ Respuesta #{} descartada por antigua", seq);
            return Completion::Stale;
        }

        match result {
            Ok(records) => {
                self.newest_accepted = Some(seq);
                self.pending = Some(PendingSnapshot {
                    snapshot: normalize(records),
                    due: now + self.debounce,
                });
                Completion::Scheduled
            }
            Err(e) => {
                tracing::warn!("⚠️ Fetch de ubicaciones #{} falló: {}", seq, e);
                Completion::Failed
            }
        }
    }

    /// Instante en que vence la ventana de debounce pendiente
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    /// Propaga el snapshot pendiente si su ventana venció y difiere del último
    pub fn flush_due(&mut self, now: Instant) -> Option<MarkerDiff> {
        if self.pending.as_ref().map_or(true, |p| p.due > now) {
            return None;
        }
        let pending = self.pending.take()?;

        if pending.snapshot == self.propagated {
            return None;
        }

        let diff = MarkerDiff::between(&self.propagated, &pending.snapshot);
        self.propagated = pending.snapshot;
        Some(diff)
    }

    pub fn snapshot(&self) -> &LocationSnapshot {
        &self.propagated
    }
}
