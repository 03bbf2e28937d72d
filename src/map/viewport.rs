use serde::Serialize;

/// Estilo base de todos los mapas del dashboard
pub const MAP_STYLE: &str = "mapbox://styles/mapbox/light-v11";
pub const DEFAULT_CENTER: [f64; 2] = [123.2, 13.605];
pub const DEFAULT_ZOOM: f64 = 13.0;
/// Límites de Naga City: [oeste, sur, este, norte]
pub const NAGA_BOUNDS: [f64; 4] = [
    123.0869253479996,
    13.516429633633399,
    123.39814271303992,
    13.714242556168118,
];

/// Configuración inicial de mapa entregada al cliente
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapConfig {
    pub style: String,
    pub center: [f64; 2],
    pub zoom: f64,
    pub max_bounds: [f64; 4],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl MapConfig {
    pub fn new(access_token: Option<String>) -> Self {
        Self {
            style: MAP_STYLE.to_string(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
            max_bounds: NAGA_BOUNDS,
            access_token,
        }
    }
}
