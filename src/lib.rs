//! Fleet dashboard backend
//!
//! Backend del panel de administración de una flota de jeepneys modernos:
//! mapa en vivo, analítica de viajes y CRUD de conductores y cuentas.

pub mod cache;
pub mod clients;
pub mod config;
pub mod controllers;
pub mod dto;
pub mod map;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
