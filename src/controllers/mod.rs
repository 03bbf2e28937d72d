//! Controllers
//!
//! Handlers y controladores de cada pantalla del dashboard.

pub mod account_controller;
pub mod analytics_controller;
pub mod auth_controller;
pub mod map_controller;
pub mod vehicle_controller;
