use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::Driver;
use crate::models::vehicle::Vehicle;
use crate::utils::validation::validate_not_blank;

pub const SELECT_DRIVER: &str = "Please select a driver.";

// Request para crear un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(custom(function = "validate_not_blank", message = "Jeep code is required."))]
    pub mjeep_code: String,
    #[validate(custom(function = "validate_not_blank", message = "Plate number is required."))]
    pub plate_number: String,
    #[validate(range(min = 1, message = "Seats must be greater than zero."))]
    pub seats: i32,
    #[validate(required(message = "Please select a driver."))]
    pub driver_id: Option<i64>,
    pub status: Option<bool>,
}

// Request para actualizar un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(custom(function = "validate_not_blank", message = "Plate number is required."))]
    pub plate_number: String,
    #[validate(range(min = 1, message = "Seats must be greater than zero."))]
    pub seats: i32,
    #[validate(required(message = "Please select a driver."))]
    pub driver_id: Option<i64>,
    pub status: Option<bool>,
}

// Query del desplegable de conductores
#[derive(Debug, Deserialize)]
pub struct AssignableQuery {
    /// Código del vehículo en edición; su conductor actual sigue disponible
    pub vehicle: Option<String>,
}

// Fila de la tabla de vehículos
#[derive(Debug, Clone, Serialize)]
pub struct VehicleResponse {
    pub mjeep_id: i64,
    pub mjeep_code: String,
    pub plate_number: String,
    pub seats: i32,
    pub status: String,
    pub driver_id: Option<i64>,
    pub driver_name: String,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            status: vehicle.status_label().to_string(),
            driver_name: vehicle.driver_label().to_string(),
            mjeep_id: vehicle.mjeep_id,
            mjeep_code: vehicle.mjeep_code,
            plate_number: vehicle.plate_number,
            seats: vehicle.seats,
            driver_id: vehicle.driver_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AssignableDriversResponse {
    pub drivers: Vec<Driver>,
}
