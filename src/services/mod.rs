//! Services module
//!
//! Lógica de negocio del dashboard: autenticación y sesiones, cambios en
//! tiempo real, reconciliación de ubicaciones, sondeo de vistas en vivo,
//! analítica y geocodificación inversa.

pub mod analytics_service;
pub mod auth_service;
pub mod geocoding_service;
pub mod live_location;
pub mod live_view;
pub mod polling;
pub mod realtime;
pub mod session;

pub use geocoding_service::{CachedGeocoder, MapboxGeocoder, ReverseGeocoder};
pub use realtime::RealtimeHub;
pub use session::SessionContext;
