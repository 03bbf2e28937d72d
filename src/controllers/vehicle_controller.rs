use std::collections::HashSet;
use std::sync::Arc;

use validator::Validate;

use crate::dto::vehicle_dto::{CreateVehicleRequest, UpdateVehicleRequest, VehicleResponse, SELECT_DRIVER};
use crate::dto::ApiResponse;
use crate::models::user::{Driver, Role};
use crate::models::vehicle::{NewVehicle, VehicleChanges};
use crate::repositories::{FleetStore, StoreError};
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

pub const DRIVER_UNAVAILABLE: &str = "The selected driver is already assigned to another jeep.";

/// CRUD de la pantalla de conductores y vehículos
pub struct VehicleController {
    store: Arc<dyn FleetStore>,
}

impl VehicleController {
    pub fn new(store: Arc<dyn FleetStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<VehicleResponse>> {
        let vehicles = self.store.list_vehicles().await?;
        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }

    /// Conductores sin vehículo; al editar se ofrece también el conductor actual
    pub async fn assignable_drivers(&self, vehicle_code: Option<&str>) -> AppResult<Vec<Driver>> {
        let current_driver = match vehicle_code {
            Some(code) => self
                .store
                .find_vehicle_by_code(code)
                .await
                .map_err(|e| vehicle_lookup_error(e, code))?
                .driver_id,
            None => None,
        };

        let taken: HashSet<i64> = self
            .store
            .assigned_driver_ids(current_driver)
            .await?
            .into_iter()
            .collect();

        let drivers = self.store.list_users_by_role(Role::Driver).await?;
        Ok(drivers
            .into_iter()
            .filter(|driver| !taken.contains(&driver.user_id))
            .collect())
    }

    async fn ensure_assignable(&self, driver_id: i64, vehicle_code: Option<&str>) -> AppResult<()> {
        let assignable = self.assignable_drivers(vehicle_code).await?;
        if assignable.iter().any(|driver| driver.user_id == driver_id) {
            return Ok(());
        }
        Err(AppError::Conflict(DRIVER_UNAVAILABLE.to_string()))
    }

    pub async fn create(&self, request: CreateVehicleRequest) -> AppResult<ApiResponse<VehicleResponse>> {
        request.validate()?;
        let driver_id = request
            .driver_id
            .ok_or_else(|| AppError::InvalidForm(SELECT_DRIVER.to_string()))?;
        self.ensure_assignable(driver_id, None).await?;

        let code = request.mjeep_code.trim().to_string();
        let vehicle = self
            .store
            .insert_vehicle(NewVehicle {
                mjeep_code: code.clone(),
                plate_number: request.plate_number.trim().to_string(),
                seats: request.seats,
                status: request.status.unwrap_or(true),
                driver_id: Some(driver_id),
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => conflict_error("Jeep", "code", &code),
                other => AppError::Store(other),
            })?;

        log::info!("🚌 Jeep {} creado con conductor {}", vehicle.mjeep_code, driver_id);
        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(vehicle),
            "Jeep added successfully",
        ))
    }

    pub async fn update(
        &self,
        mjeep_code: &str,
        request: UpdateVehicleRequest,
    ) -> AppResult<ApiResponse<VehicleResponse>> {
        request.validate()?;
        let driver_id = request
            .driver_id
            .ok_or_else(|| AppError::InvalidForm(SELECT_DRIVER.to_string()))?;
        self.ensure_assignable(driver_id, Some(mjeep_code)).await?;

        let vehicle = self
            .store
            .update_vehicle(
                mjeep_code,
                VehicleChanges {
                    plate_number: request.plate_number.trim().to_string(),
                    seats: request.seats,
                    driver_id: Some(driver_id),
                    status: request.status,
                },
            )
            .await
            .map_err(|e| vehicle_lookup_error(e, mjeep_code))?;

        Ok(ApiResponse::success_with_message(
            VehicleResponse::from(vehicle),
            "Jeep updated successfully",
        ))
    }

    pub async fn delete(&self, mjeep_code: &str) -> AppResult<()> {
        self.store
            .delete_vehicle(mjeep_code)
            .await
            .map_err(|e| vehicle_lookup_error(e, mjeep_code))?;
        log::info!("🗑️ Jeep {} eliminado", mjeep_code);
        Ok(())
    }
}

fn vehicle_lookup_error(error: StoreError, mjeep_code: &str) -> AppError {
    match error {
        StoreError::NotFound(_) => not_found_error("Jeep", mjeep_code),
        other => AppError::Store(other),
    }
}
