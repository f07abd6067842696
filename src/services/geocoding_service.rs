//! Geocodificación de direcciones
//!
//! Colaborador externo detrás de una interfaz estrecha: dirección → punto.
//! Mapbox responde en `[lng, lat]`; la conversión al orden interno se hace aquí,
//! una sola vez, con `CoordinateOrder::LngLat`.

use async_trait::async_trait;
use serde::Deserialize;

use crate::models::geo::{CoordinateOrder, GeoPoint};
use crate::utils::errors::{AppError, AppResult};

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `Ok(None)` cuando el servicio no encuentra la dirección
    async fn geocode(&self, address: &str) -> AppResult<Option<GeoPoint>>;
}

#[derive(Debug, Deserialize)]
struct MapboxGeocodingResponse {
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    geometry: MapboxGeometry,
}

#[derive(Debug, Deserialize)]
struct MapboxGeometry {
    coordinates: Vec<f64>, // [longitude, latitude]
}

pub struct MapboxGeocoder {
    mapbox_token: String,
    country: Option<String>,
    client: reqwest::Client,
}

impl MapboxGeocoder {
    pub fn new(mapbox_token: String, country: Option<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            mapbox_token,
            country,
            client,
        })
    }

    fn build_url(&self, address: &str) -> String {
        let mut url = format!(
            "https://api.mapbox.com/search/geocode/v6/forward?q={}&access_token={}&limit=1",
            urlencoding::encode(address),
            self.mapbox_token
        );
        if let Some(country) = &self.country {
            url.push_str(&format!("&country={}", urlencoding::encode(country)));
        }
        url
    }
}

fn first_point(response: MapboxGeocodingResponse) -> AppResult<Option<GeoPoint>> {
    let Some(feature) = response.features.into_iter().next() else {
        return Ok(None);
    };

    match feature.geometry.coordinates.as_slice() {
        [lng, lat, ..] => Ok(Some(GeoPoint::from_pair([*lng, *lat], CoordinateOrder::LngLat)?)),
        _ => Ok(None),
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn geocode(&self, address: &str) -> AppResult<Option<GeoPoint>> {
        log::info!("🗺️ Geocoding address: {}", address);

        let response = self
            .client
            .get(self.build_url(address))
            .header("User-Agent", "TerritoryAllocation/1.0")
            .send()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Geocoding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            log::error!("❌ Geocoding failed with status {}", status);
            return Err(AppError::ExternalApi(format!("Geocoding failed: {}", status)));
        }

        let body: MapboxGeocodingResponse = response
            .json()
            .await
            .map_err(|e| AppError::ExternalApi(format!("Failed to parse geocoding response: {}", e)))?;

        let point = first_point(body)?;
        match &point {
            Some(p) => log::info!("✅ Geocoding successful: {} -> ({}, {})", address, p.lat, p.lng),
            None => log::warn!("⚠️ No coordinates found for address: {}", address),
        }
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapbox_coordinates_are_lng_lat() {
        let body: MapboxGeocodingResponse = serde_json::from_str(
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"Point","coordinates":[2.3316,48.8691]},"properties":{}}]}"#,
        )
        .unwrap();

        let point = first_point(body).unwrap().unwrap();
        assert_eq!(point.lat, 48.8691);
        assert_eq!(point.lng, 2.3316);
    }

    #[test]
    fn test_empty_features() {
        let body: MapboxGeocodingResponse = serde_json::from_str(r#"{"features":[]}"#).unwrap();
        assert!(first_point(body).unwrap().is_none());
    }

    #[test]
    fn test_url_encodes_address() {
        let geocoder = MapboxGeocoder::new("tok".to_string(), Some("fr".to_string())).unwrap();
        let url = geocoder.build_url("15 Rue de la Paix, Paris");
        assert!(url.contains("q=15%20Rue%20de%20la%20Paix%2C%20Paris"));
        assert!(url.ends_with("&country=fr"));
    }

    #[tokio::test]
    async fn test_geocoding_service() {
        // Requiere un token válido de Mapbox
        let token = std::env::var("MAPBOX_TOKEN").unwrap_or_default();
        if token.is_empty() {
            println!("⚠️ Skipping test: MAPBOX_TOKEN not set");
            return;
        }

        let geocoder = MapboxGeocoder::new(token, Some("fr".to_string())).unwrap();
        if let Ok(Some(point)) = geocoder.geocode("15 Rue de la Paix, 75001 Paris").await {
            assert!((48.0..49.5).contains(&point.lat));
        }
    }
}
