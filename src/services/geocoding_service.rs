//! Geocodificación inversa
//!
//! Convierte puntos de recogida en nombres de lugar con la API v5 de Mapbox
//! (`mapbox.places`, `limit=1`). Los resultados se cachean en Redis cuando
//! está disponible.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Deserialize;

use crate::cache::{CacheOperations, RedisClient};
use crate::models::location::LngLat;

/// Etiqueta para puntos sin dirección conocida
pub const NO_ADDRESS_LABEL: &str = "No address available";
/// Etiqueta para fallos del geocodificador
pub const PLACE_NOT_FOUND_LABEL: &str = "Place not found";

const BATCH_SIZE: usize = 10;

#[derive(Debug, Deserialize)]
struct MapboxPlacesResponse {
    #[serde(default)]
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    place_name: Option<String>,
}

/// Geocodificación inversa de un punto.
///
/// `Ok(None)` significa que el servicio respondió sin resultados.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, position: LngLat) -> Result<Option<String>>;
}

pub struct MapboxGeocoder {
    mapbox_token: String,
    base_url: String,
    client: reqwest::Client,
}

impl MapboxGeocoder {
    pub fn new(mapbox_token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            mapbox_token: mapbox_token.to_string(),
            base_url: "https://api.mapbox.com".to_string(),
            client,
        })
    }

    fn url(&self, position: LngLat) -> String {
        format!(
            "{}/geocoding/v5/mapbox.places/{},{}.json?access_token={}&limit=1",
            self.base_url,
            position.lng,
            position.lat,
            urlencoding::encode(&self.mapbox_token)
        )
    }
}

#[async_trait]
impl ReverseGeocoder for MapboxGeocoder {
    async fn reverse(&self, position: LngLat) -> Result<Option<String>> {
        log::debug!("🗺️ Reverse geocoding {},{}", position.lng, position.lat);

        let response = self.client.get(self.url(position)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::error!("❌ Reverse geocoding failed with status {}: {}", status, error_text);
            return Err(anyhow!("Reverse geocoding failed: {}", status));
        }

        let parsed: MapboxPlacesResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse geocoding response: {}", e))?;

        match parsed.features.into_iter().next() {
            Some(feature) => feature
                .place_name
                .map(Some)
                .ok_or_else(|| anyhow!("First feature has no place_name")),
            None => Ok(None),
        }
    }
}

/// Decorador que consulta Redis antes de ir al geocodificador
pub struct CachedGeocoder<G> {
    inner: G,
    cache: Option<RedisClient>,
}

impl<G: ReverseGeocoder> CachedGeocoder<G> {
    pub fn new(inner: G, cache: Option<RedisClient>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<G: ReverseGeocoder> ReverseGeocoder for CachedGeocoder<G> {
    async fn reverse(&self, position: LngLat) -> Result<Option<String>> {
        let Some(cache) = &self.cache else {
            return self.inner.reverse(position).await;
        };

        let key = cache.place_key(position.lng, position.lat);
        match cache.get::<Option<String>>(&key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => log::warn!("⚠️ Cache de lugares ilegible para {}: {}", key, e),
        }

        let resolved = self.inner.reverse(position).await?;
        if let Err(e) = cache.set(&key, &resolved, cache.default_ttl()).await {
            log::warn!("⚠️ No se pudo cachear lugar {}: {}", key, e);
        }
        Ok(resolved)
    }
}

/// Resuelve la etiqueta de lugar de cada punto, en lotes concurrentes de 10
pub async fn resolve_place_labels(
    geocoder: &dyn ReverseGeocoder,
    points: &[Option<LngLat>],
) -> Vec<String> {
    let mut labels = Vec::with_capacity(points.len());

    for chunk in points.chunks(BATCH_SIZE) {
        let lookups = chunk.iter().map(|point| async move {
            let Some(position) = point else {
                return NO_ADDRESS_LABEL.to_string();
            };
            match geocoder.reverse(*position).await {
                Ok(Some(place)) => place,
                Ok(None) => NO_ADDRESS_LABEL.to_string(),
                Err(e) => {
                    log::warn!("⚠️ Reverse geocoding falló para {:?}: {}", position, e);
                    PLACE_NOT_FOUND_LABEL.to_string()
                }
            }
        });
        labels.extend(join_all(lookups).await);
    }

    labels
}
