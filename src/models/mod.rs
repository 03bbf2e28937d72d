//! Modelos del sistema
//!
//! Tipos de dominio desacoplados de la forma cruda de las filas del store.

pub mod analytics;
pub mod auth;
pub mod location;
pub mod trip;
pub mod user;
pub mod vehicle;
