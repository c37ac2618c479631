use crate::adapters::{build_client, endpoint, ensure_success};
use crate::config::toml_config::{GeocodingConfig, HttpConfig};
use crate::domain::model::GeoLocation;
use crate::domain::ports::Geocoder;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const SERVICE: &str = "Nominatim";

/// OpenStreetMap Nominatim 地名查詢
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(http.timeout(), &http.user_agent)?,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, place: &str) -> Result<Option<GeoLocation>> {
        tracing::debug!("Geocoding '{}'", place);
        let response = self
            .client
            .get(endpoint(&self.base_url, "search"))
            .query(&[("q", place), ("format", "json"), ("limit", "1")])
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let places: Vec<Place> = response.json().await?;

        // Nominatim encodes coordinates as strings
        let location = places.into_iter().next().and_then(|p| {
            let lat = p.lat.parse().ok()?;
            let lon = p.lon.parse().ok()?;
            Some(GeoLocation {
                lat,
                lon,
                address: p.display_name,
            })
        });

        match &location {
            Some(loc) => tracing::info!("📍 '{}' → ({:.4}, {:.4})", place, loc.lat, loc.lon),
            None => tracing::warn!("⚠️ No geocoding match for '{}'", place),
        }
        Ok(location)
    }
}
