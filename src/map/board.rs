use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::surface::{
    LayerSpec, Legend, MapError, MapSurface, MarkerHandle, MarkerSpec, MarkerStyle, Popup,
};
use super::viewport::MapConfig;
use crate::models::location::LngLat;

#[derive(Debug, Clone)]
struct BoardMarker {
    spec: MarkerSpec,
    popup: Option<Popup>,
}

/// Superficie de mapa en memoria cuyo estado se entrega al cliente como JSON
#[derive(Debug, Clone)]
pub struct MarkerBoard {
    config: MapConfig,
    loaded: bool,
    zoom: f64,
    next_handle: u64,
    markers: BTreeMap<MarkerHandle, BoardMarker>,
    sources: BTreeMap<String, Value>,
    layers: Vec<LayerSpec>,
    legend: Option<Legend>,
    open_popup: Option<MarkerHandle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerView {
    pub handle: MarkerHandle,
    pub position: LngLat,
    pub style: MarkerStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popup: Option<Popup>,
}

/// Estado serializable de la superficie
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardView {
    pub config: MapConfig,
    pub loaded: bool,
    pub zoom: f64,
    pub markers: Vec<MarkerView>,
    pub sources: BTreeMap<String, Value>,
    pub layers: Vec<LayerSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_popup: Option<MarkerHandle>,
}

impl MarkerBoard {
    pub fn new(config: MapConfig) -> Self {
        Self {
            zoom: config.zoom,
            config,
            loaded: false,
            next_handle: 1,
            markers: BTreeMap::new(),
            sources: BTreeMap::new(),
            layers: Vec::new(),
            legend: None,
            open_popup: None,
        }
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn marker(&self, handle: MarkerHandle) -> Option<(&MarkerSpec, Option<&Popup>)> {
        self.markers
            .get(&handle)
            .map(|m| (&m.spec, m.popup.as_ref()))
    }

    /// Click sobre un marcador: abre su popup si tiene uno
    pub fn click(&mut self, handle: MarkerHandle) -> Result<Option<Popup>, MapError> {
        let marker = self
            .markers
            .get(&handle)
            .ok_or(MapError::UnknownMarker(handle))?;

        self.open_popup = marker.popup.as_ref().map(|_| handle);
        Ok(marker.popup.clone())
    }

    pub fn view(&self) -> BoardView {
        BoardView {
            config: self.config.clone(),
            loaded: self.loaded,
            zoom: self.zoom,
            markers: self
                .markers
                .iter()
                .map(|(handle, m)| MarkerView {
                    handle: *handle,
                    position: m.spec.position,
                    style: m.spec.style.clone(),
                    popup: m.popup.clone(),
                })
                .collect(),
            sources: self.sources.clone(),
            layers: self.layers.clone(),
            legend: self.legend.clone(),
            open_popup: self.open_popup,
        }
    }

    fn marker_mut(&mut self, handle: MarkerHandle) -> Result<&mut BoardMarker, MapError> {
        self.markers
            .get_mut(&handle)
            .ok_or(MapError::UnknownMarker(handle))
    }
}

impl MapSurface for MarkerBoard {
    fn load(&mut self) {
        self.loaded = true;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn add_source(&mut self, id: &str, data: Value) -> Result<(), MapError> {
        if !self.loaded {
            return Err(MapError::NotLoaded);
        }
        if self.sources.contains_key(id) {
            return Err(MapError::DuplicateSource(id.to_string()));
        }
        self.sources.insert(id.to_string(), data);
        Ok(())
    }

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), MapError> {
        if !self.loaded {
            return Err(MapError::NotLoaded);
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(MapError::UnknownSource(layer.source));
        }
        self.layers.push(layer);
        Ok(())
    }

    fn set_legend(&mut self, legend: Legend) {
        self.legend = Some(legend);
    }

    fn create_marker(&mut self, spec: MarkerSpec) -> MarkerHandle {
        let handle = MarkerHandle(self.next_handle);
        self.next_handle += 1;
        self.markers.insert(handle, BoardMarker { spec, popup: None });
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) -> Result<(), MapError> {
        self.markers
            .remove(&handle)
            .ok_or(MapError::UnknownMarker(handle))?;
        if self.open_popup == Some(handle) {
            self.open_popup = None;
        }
        Ok(())
    }

    fn set_marker_position(&mut self, handle: MarkerHandle, position: LngLat) -> Result<(), MapError> {
        self.marker_mut(handle)?.spec.position = position;
        Ok(())
    }

    fn set_marker_size(&mut self, handle: MarkerHandle, size_px: f64) -> Result<(), MapError> {
        self.marker_mut(handle)?.spec.style.set_size_px(size_px);
        Ok(())
    }

    fn attach_popup(&mut self, handle: MarkerHandle, popup: Popup) -> Result<(), MapError> {
        self.marker_mut(handle)?.popup = Some(popup);
        Ok(())
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom;
    }
}
