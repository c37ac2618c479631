use crate::adapters::{build_client, endpoint, ensure_success};
use crate::config::toml_config::{HttpConfig, SoilConfig};
use crate::core::soil::classify_texture;
use crate::core::synthetic::synthetic_soil_texture;
use crate::domain::model::{SoilReading, SoilTexture, TextureSource};
use crate::domain::ports::SoilProvider;
use crate::utils::error::{AdvisorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const WEATHER_SERVICE: &str = "Open-Meteo";
const SOILGRIDS_SERVICE: &str = "ISRIC SoilGrids";
pub const SOIL_SOURCE: &str = "Open-Meteo & ISRIC SoilGrids";

/// Open-Meteo 提供即時土壤溫溼度，ISRIC SoilGrids 提供 0-5cm 土壤質地
#[derive(Debug, Clone)]
pub struct OpenSoilClient {
    client: Client,
    weather_url: String,
    soilgrids_url: String,
}

#[derive(Debug, Default, PartialEq)]
struct SurfaceConditions {
    soil_temperature: Option<f64>,
    soil_moisture: Option<f64>,
    air_temperature: Option<f64>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    hourly: Option<HourlyBlock>,
    #[serde(default)]
    current_weather: Option<CurrentWeather>,
}

#[derive(Deserialize)]
struct HourlyBlock {
    #[serde(default)]
    soil_temperature_0cm: Vec<Option<f64>>,
    #[serde(default)]
    soil_moisture_0_to_1cm: Vec<Option<f64>>,
}

#[derive(Deserialize)]
struct CurrentWeather {
    temperature: Option<f64>,
}

#[derive(Deserialize)]
struct SoilGridsResponse {
    properties: SoilGridsProperties,
}

#[derive(Deserialize)]
struct SoilGridsProperties {
    #[serde(default)]
    layers: Vec<SoilGridsLayer>,
}

#[derive(Deserialize)]
struct SoilGridsLayer {
    name: String,
    #[serde(default)]
    depths: Vec<SoilGridsDepth>,
}

#[derive(Deserialize)]
struct SoilGridsDepth {
    values: SoilGridsValues,
}

#[derive(Deserialize)]
struct SoilGridsValues {
    mean: Option<f64>,
}

impl OpenSoilClient {
    pub fn new(config: &SoilConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(http.timeout(), &http.user_agent)?,
            weather_url: config.weather_url.clone(),
            soilgrids_url: config.soilgrids_url.clone(),
        })
    }

    async fn surface_conditions(&self, lat: f64, lon: f64) -> Result<SurfaceConditions> {
        let response = self
            .client
            .get(endpoint(&self.weather_url, "forecast"))
            .query(&[
                ("latitude", lat.to_string()),
                ("longitude", lon.to_string()),
                (
                    "hourly",
                    "soil_temperature_0cm,soil_moisture_0_to_1cm".to_string(),
                ),
                ("current_weather", "true".to_string()),
            ])
            .send()
            .await?;
        let response = ensure_success(WEATHER_SERVICE, response).await?;
        let body: ForecastResponse = response.json().await?;

        // first hourly slot is the current hour
        let (soil_temperature, soil_moisture) = match body.hourly {
            Some(h) => (
                h.soil_temperature_0cm.first().copied().flatten(),
                h.soil_moisture_0_to_1cm
                    .first()
                    .copied()
                    .flatten()
                    .map(|m| m * 100.0),
            ),
            None => (None, None),
        };

        Ok(SurfaceConditions {
            soil_temperature,
            soil_moisture,
            air_temperature: body.current_weather.and_then(|w| w.temperature),
        })
    }

    async fn measured_texture(&self, lat: f64, lon: f64) -> Result<SoilTexture> {
        let response = self
            .client
            .get(endpoint(&self.soilgrids_url, "properties/query"))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("property", "clay".to_string()),
                ("property", "silt".to_string()),
                ("property", "sand".to_string()),
                ("depth", "0-5cm".to_string()),
                ("value", "mean".to_string()),
            ])
            .send()
            .await?;
        let response = ensure_success(SOILGRIDS_SERVICE, response).await?;
        let body: SoilGridsResponse = response.json().await?;
        texture_from_layers(&body.properties.layers)
    }
}

/// SoilGrids 數值以 g/kg 表示 (250 = 25.0%)
fn texture_from_layers(layers: &[SoilGridsLayer]) -> Result<SoilTexture> {
    let value = |name: &str| {
        layers
            .iter()
            .find(|l| l.name == name)
            .and_then(|l| l.depths.first())
            .and_then(|d| d.values.mean)
            .map(|v| v / 10.0)
    };

    match (value("clay"), value("silt"), value("sand")) {
        (Some(clay), Some(silt), Some(sand)) => Ok(SoilTexture { clay, silt, sand }),
        _ => Err(AdvisorError::ProcessingError {
            message: "SoilGrids returned incomplete texture layers".to_string(),
        }),
    }
}

#[async_trait]
impl SoilProvider for OpenSoilClient {
    async fn soil_conditions(&self, lat: f64, lon: f64) -> Result<SoilReading> {
        tracing::info!("🌱 Fetching soil conditions for ({:.4}, {:.4})", lat, lon);

        let surface = self
            .surface_conditions(lat, lon)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("⚠️ {} unavailable: {}", WEATHER_SERVICE, e);
                SurfaceConditions::default()
            });

        let (texture, texture_source) = match self.measured_texture(lat, lon).await {
            Ok(texture) => (texture, TextureSource::Measured),
            Err(e) => {
                tracing::warn!("⚠️ {} unavailable ({}), using synthetic texture", SOILGRIDS_SERVICE, e);
                (synthetic_soil_texture(lat, lon), TextureSource::Synthetic)
            }
        };

        let source = match texture_source {
            TextureSource::Measured => SOIL_SOURCE.to_string(),
            TextureSource::Synthetic => format!("{} (synthetic texture)", SOIL_SOURCE),
        };

        Ok(SoilReading {
            soil_temperature: surface.soil_temperature,
            soil_moisture: surface.soil_moisture,
            air_temperature: surface.air_temperature,
            soil_type: classify_texture(Some(&texture)),
            texture,
            texture_source,
            source,
        })
    }
}
