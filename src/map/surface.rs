use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::location::LngLat;

/// Identificador de un marcador dentro de una superficie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MarkerHandle(pub u64);

/// Aspecto visual de un marcador
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerStyle {
    Icon {
        url: String,
        size_px: f64,
    },
    Dot {
        size_px: f64,
        fill: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        border: Option<String>,
    },
}

impl MarkerStyle {
    pub fn size_px(&self) -> f64 {
        match self {
            MarkerStyle::Icon { size_px, .. } | MarkerStyle::Dot { size_px, .. } => *size_px,
        }
    }

    pub fn set_size_px(&mut self, size: f64) {
        match self {
            MarkerStyle::Icon { size_px, .. } | MarkerStyle::Dot { size_px, .. } => *size_px = size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerSpec {
    pub position: LngLat,
    pub style: MarkerStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupRow {
    pub label: String,
    pub value: String,
}

/// Popup asociado a un marcador, visible al hacer click
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub offset: u32,
    pub rows: Vec<PopupRow>,
}

impl Popup {
    pub fn new(offset: u32) -> Self {
        Self {
            offset,
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, label: &str, value: impl Into<String>) -> Self {
        self.rows.push(PopupRow {
            label: label.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn value_of(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
    }
}

/// Capa de estilo Mapbox (`id`, `type`, `source`, `paint`)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub paint: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendItem {
    pub color: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<String>,
    pub round: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub items: Vec<LegendItem>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("Map style not loaded yet")]
    NotLoaded,

    #[error("Source '{0}' already exists")]
    DuplicateSource(String),

    #[error("Layer references unknown source '{0}'")]
    UnknownSource(String),

    #[error("Unknown marker {0:?}")]
    UnknownMarker(MarkerHandle),
}

/// Operaciones de mapa que usan las capas del dashboard
pub trait MapSurface {
    /// Evento load-complete del estilo
    fn load(&mut self);
    fn is_loaded(&self) -> bool;

    fn add_source(&mut self, id: &str, data: Value) -> Result<(), MapError>;
    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), MapError>;
    fn set_legend(&mut self, legend: Legend);

    fn create_marker(&mut self, spec: MarkerSpec) -> MarkerHandle;
    fn remove_marker(&mut self, handle: MarkerHandle) -> Result<(), MapError>;
    fn set_marker_position(&mut self, handle: MarkerHandle, position: LngLat) -> Result<(), MapError>;
    fn set_marker_size(&mut self, handle: MarkerHandle, size_px: f64) -> Result<(), MapError>;
    fn attach_popup(&mut self, handle: MarkerHandle, popup: Popup) -> Result<(), MapError>;

    fn zoom(&self) -> f64;
    /// Evento zoom-changed
    fn set_zoom(&mut self, zoom: f64);
}
