//! Modelo de User
//!
//! Filas de la tabla `users`: conductores y administradores comparten tabla y
//! se distinguen por `role_id`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Rol de un usuario según la columna `role_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Driver,
    Admin,
    Other(i32),
}

impl Role {
    pub const DRIVER_ID: i32 = 2;
    pub const ADMIN_ID: i32 = 3;

    pub fn from_id(role_id: i32) -> Self {
        match role_id {
            Self::DRIVER_ID => Role::Driver,
            Self::ADMIN_ID => Role::Admin,
            other => Role::Other(other),
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Role::Driver => Self::DRIVER_ID,
            Role::Admin => Self::ADMIN_ID,
            Role::Other(id) => *id,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// User - fila de la tabla `users` sin el hash de contraseña
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub auth_user_id: Option<Uuid>,
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Conductor ofrecido en los desplegables de asignación
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Driver {
    pub user_id: i64,
    pub name: String,
}

/// Datos para insertar un usuario nuevo
#[derive(Debug, Clone)]
pub struct NewUser {
    pub auth_user_id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Campos editables desde la pantalla de cuenta
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: String,
    pub username: String,
    pub email: String,
}
