use crate::adapters::openai::parse_json_reply;
use crate::domain::model::{
    ChatRequest, CropRecommendation, FarmerProfile, LocationInput, SoilReading, SoilTexture,
    SoilType,
};
use crate::domain::ports::{ChatProvider, Geocoder, SoilProvider};
use crate::utils::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

const MAX_RECOMMENDATIONS: usize = 5;

/// `/recommend` 請求：地名或座標擇一，可附帶農戶資料
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub location_name: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub profile: Option<FarmerProfile>,
}

impl RecommendRequest {
    pub fn for_profile(profile: &FarmerProfile) -> Self {
        let mut request = Self {
            profile: Some(profile.clone()),
            ..Default::default()
        };
        match &profile.location {
            Some(LocationInput::Named { location_name }) => {
                request.location_name = Some(location_name.clone());
            }
            Some(LocationInput::Coordinates {
                latitude,
                longitude,
            }) => {
                request.latitude = Some(*latitude);
                request.longitude = Some(*longitude);
            }
            None => {}
        }
        request
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentalSummary {
    /// Air temperature in °C.
    pub temperature: Option<f64>,
    pub soil_temperature: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub soil_type: SoilType,
    pub soil_texture: SoilTexture,
    pub source: String,
}

impl From<&SoilReading> for EnvironmentalSummary {
    fn from(reading: &SoilReading) -> Self {
        Self {
            temperature: reading.air_temperature,
            soil_temperature: reading.soil_temperature,
            soil_moisture: reading.soil_moisture,
            soil_type: reading.soil_type,
            soil_texture: reading.texture,
            source: reading.source.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropAdvice {
    pub location: ResolvedLocation,
    pub environmental_summary: EnvironmentalSummary,
    pub recommendations: Vec<CropRecommendation>,
}

impl CropAdvice {
    /// Distinct crop names in recommendation order. "Sweet Corn" and "sweet-corn" count once.
    pub fn crop_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.recommendations
            .iter()
            .map(|r| r.crop.trim().to_string())
            .filter(|c| !c.is_empty())
            .filter(|c| seen.insert(crop_key(c)))
            .collect()
    }
}

fn crop_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Deserialize)]
struct RecommendationReply {
    #[serde(default)]
    recommendations: Vec<CropRecommendation>,
}

/// Soil/climate crop advisor: geocode → soil conditions → LLM.
pub struct SoilClimateAdvisor {
    geocoder: Arc<dyn Geocoder>,
    soil: Arc<dyn SoilProvider>,
    chat: Arc<dyn ChatProvider>,
}

impl SoilClimateAdvisor {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        soil: Arc<dyn SoilProvider>,
        chat: Arc<dyn ChatProvider>,
    ) -> Self {
        Self {
            geocoder,
            soil,
            chat,
        }
    }

    /// 地名優先；查無結果時回傳客戶端錯誤，不會產生空座標
    pub async fn resolve_location(&self, request: &RecommendRequest) -> Result<ResolvedLocation> {
        if let Some(name) = request
            .location_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
        {
            let found = match self.geocoder.geocode(name).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!("⚠️ Geocoding '{}' failed: {}", name, e);
                    None
                }
            };
            return found
                .map(|g| ResolvedLocation {
                    latitude: g.lat,
                    longitude: g.lon,
                    address: g.address,
                })
                .ok_or_else(|| AdvisorError::LocationNotFound {
                    query: name.to_string(),
                });
        }

        match (request.latitude, request.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(AdvisorError::InvalidRequest {
                        message: format!("coordinates out of range: ({}, {})", lat, lon),
                    });
                }
                Ok(ResolvedLocation {
                    latitude: lat,
                    longitude: lon,
                    address: None,
                })
            }
            _ => Err(AdvisorError::InvalidRequest {
                message: "Please provide either 'latitude'/'longitude' or a 'location_name'."
                    .to_string(),
            }),
        }
    }

    pub async fn recommend(&self, request: &RecommendRequest) -> Result<CropAdvice> {
        let location = self.resolve_location(request).await?;
        let reading = self
            .soil
            .soil_conditions(location.latitude, location.longitude)
            .await?;

        let prompt = crop_prompt(&location, &reading, request.profile.as_ref());
        let reply = self.chat.complete(ChatRequest::json_prompt(prompt)).await?;
        let parsed: RecommendationReply = parse_json_reply(&reply)?;

        let mut recommendations = parsed.recommendations;
        recommendations.truncate(MAX_RECOMMENDATIONS);
        tracing::info!(
            "🌾 {} crop recommendations for ({:.4}, {:.4}), soil type {}",
            recommendations.len(),
            location.latitude,
            location.longitude,
            reading.soil_type
        );

        Ok(CropAdvice {
            environmental_summary: EnvironmentalSummary::from(&reading),
            location,
            recommendations,
        })
    }
}

fn reading_value(value: Option<f64>, unit: &str) -> String {
    value
        .map(|v| format!("{:.1}{}", v, unit))
        .unwrap_or_else(|| "unavailable".to_string())
}

pub(crate) fn crop_prompt(
    location: &ResolvedLocation,
    reading: &SoilReading,
    profile: Option<&FarmerProfile>,
) -> String {
    let mut prompt = format!(
        "You are an expert agronomist.\n\n\
         **Location**: {:.4}, {:.4}{}\n\
         **Air Temperature**: {}\n\
         **Soil Temperature**: {}\n\
         **Soil Moisture**: {}\n\
         **Soil Type**: {}\n\
         **Soil Texture**: clay {:.1}%, silt {:.1}%, sand {:.1}%\n",
        location.latitude,
        location.longitude,
        location
            .address
            .as_deref()
            .map(|a| format!(" ({})", a))
            .unwrap_or_default(),
        reading_value(reading.air_temperature, "°C"),
        reading_value(reading.soil_temperature, "°C"),
        reading_value(reading.soil_moisture, "%"),
        reading.soil_type,
        reading.texture.clay,
        reading.texture.silt,
        reading.texture.sand
    );

    if let Some(p) = profile {
        prompt.push_str(&format!(
            "\n**Farmer Profile**:\n\
             - Farm Size: {} acres\n\
             - Experience: {}\n\
             - Risk Tolerance: {}\n\
             - Budget: {}\n\
             Match crop choices to this risk tolerance and budget.\n",
            p.farm_size_acres, p.experience, p.risk_tolerance, p.budget
        ));
    }

    prompt.push_str(
        "\n**Task**:\n\
         Recommend 3-5 crops suited to these conditions, best fit first.\n\n\
         **Format**: JSON\n",
    );
    prompt.push_str(
        r#"{"recommendations": [{"crop": "Crop name", "reason": "Why it fits", "risk": "Main risk"}]}"#,
    );
    prompt
}
