//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle (fila de `modern_jeeps`) y sus
//! variantes para operaciones CRUD.

use serde::{Deserialize, Serialize};

use super::location::LngLat;

/// Etiqueta mostrada cuando un vehículo no tiene conductor asignado
pub const NO_DRIVER_LABEL: &str = "No Driver";

/// Vehicle principal - fila de `modern_jeeps` con el nombre del conductor resuelto
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub mjeep_id: i64,
    pub mjeep_code: String,
    pub plate_number: String,
    pub seats: i32,
    pub status: bool,
    pub driver_id: Option<i64>,
    pub driver_name: Option<String>,
    pub position: Option<LngLat>,
}

impl Vehicle {
    pub fn driver_label(&self) -> &str {
        self.driver_name.as_deref().unwrap_or(NO_DRIVER_LABEL)
    }

    pub fn status_label(&self) -> &'static str {
        status_label(self.status)
    }
}

/// Texto de estado usado en tablas y popups
pub fn status_label(active: bool) -> &'static str {
    if active {
        "Active"
    } else {
        "Inactive"
    }
}

/// Datos para insertar un vehículo nuevo
#[derive(Debug, Clone, PartialEq)]
pub struct NewVehicle {
    pub mjeep_code: String,
    pub plate_number: String,
    pub seats: i32,
    pub status: bool,
    pub driver_id: Option<i64>,
}

/// Cambios aplicables desde el formulario de edición
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleChanges {
    pub plate_number: String,
    pub seats: i32,
    pub driver_id: Option<i64>,
    pub status: Option<bool>,
}
