use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::user::User;
use crate::utils::validation::validate_not_blank;

pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match.";

// Edición de la cuenta del administrador
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(custom(function = "validate_not_blank", message = "Name is required."))]
    pub name: String,
    #[validate(custom(function = "validate_not_blank", message = "Username is required."))]
    pub username: String,
    /// Vacío o ausente conserva el email actual
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Current password is required."))]
    pub current_password: String,
}

// Cambio de contraseña
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_password_confirmation", skip_on_field_errors = false))]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required."))]
    pub current_password: String,
    #[validate(length(min = 6, message = "Password should be at least 6 characters."))]
    pub new_password: String,
    pub confirm_password: String,
}

fn validate_password_confirmation(request: &ChangePasswordRequest) -> Result<(), ValidationError> {
    if request.new_password != request.confirm_password {
        let mut error = ValidationError::new("password_mismatch");
        error.message = Some(PASSWORDS_DO_NOT_MATCH.into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub user_id: i64,
    pub auth_user_id: Option<Uuid>,
    pub name: String,
    pub username: String,
    pub email: String,
}

impl From<User> for AccountResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            auth_user_id: user.auth_user_id,
            name: user.name,
            username: user.username,
            email: user.email,
        }
    }
}
