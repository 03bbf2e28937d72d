//! Superficie de mapa
//!
//! El cliente web dibuja exactamente lo que contiene un `MarkerBoard`: fuentes,
//! capas, leyenda y marcadores con su popup. Los módulos de capa
//! (vehículos en vivo, heatmap, recogidas/destinos) sólo hablan con el trait
//! `MapSurface`.

pub mod board;
pub mod heatmap;
pub mod live_markers;
pub mod pickup_dropoff;
pub mod surface;
pub mod viewport;

pub use board::{BoardView, MarkerBoard};
pub use surface::{
    LayerSpec, Legend, LegendItem, MapError, MapSurface, MarkerHandle, MarkerSpec, MarkerStyle,
    Popup, PopupRow,
};
pub use viewport::MapConfig;
