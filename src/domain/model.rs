use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const PLACEHOLDER: &str = "N/A";

fn placeholder() -> String {
    PLACEHOLDER.to_string()
}

/// 靜態補助計畫目錄中的一筆記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantProgram {
    #[serde(default = "placeholder")]
    pub program_id: String,
    #[serde(default = "placeholder")]
    pub program_name: String,
    #[serde(default = "placeholder")]
    pub agency: String,
    #[serde(default = "placeholder")]
    pub program_type: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub eligibility: Vec<String>,
    #[serde(default = "placeholder")]
    pub funding_amount: String,
    #[serde(default = "placeholder")]
    pub application_deadlines: String,
    #[serde(default = "placeholder")]
    pub application_method: String,
    #[serde(default)]
    pub required_documents: Vec<String>,
    #[serde(default = "placeholder")]
    pub contact_info: String,
    #[serde(default = "placeholder")]
    pub official_url: String,
    #[serde(default)]
    pub year_round_application: bool,
}

impl GrantProgram {
    /// Text fed to the embedding model when the index is built.
    pub fn embedding_text(&self) -> String {
        format!(
            "{} ({}, {}). {} Eligibility: {}. Funding: {}.",
            self.program_name,
            self.agency,
            self.program_type,
            self.summary,
            self.eligibility.join("; "),
            self.funding_amount
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Beginner,
    #[default]
    Intermediate,
    Experienced,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RiskTolerance {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    #[default]
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BudgetRange {
    #[default]
    #[serde(rename = "< $5,000")]
    Under5k,
    #[serde(rename = "$5,000 - $20,000")]
    From5kTo20k,
    #[serde(rename = "$20,000 - $50,000")]
    From20kTo50k,
    #[serde(rename = "> $50,000")]
    Over50k,
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExperienceLevel::Beginner => "Beginner",
            ExperienceLevel::Intermediate => "Intermediate",
            ExperienceLevel::Experienced => "Experienced",
            ExperienceLevel::Expert => "Expert",
        };
        f.write_str(label)
    }
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskTolerance::VeryLow => "Very Low",
            RiskTolerance::Low => "Low",
            RiskTolerance::Medium => "Medium",
            RiskTolerance::High => "High",
            RiskTolerance::VeryHigh => "Very High",
        };
        f.write_str(label)
    }
}

impl fmt::Display for BudgetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BudgetRange::Under5k => "< $5,000",
            BudgetRange::From5kTo20k => "$5,000 - $20,000",
            BudgetRange::From20kTo50k => "$20,000 - $50,000",
            BudgetRange::Over50k => "> $50,000",
        };
        f.write_str(label)
    }
}

fn normalize_choice(s: &str) -> String {
    s.trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

impl FromStr for ExperienceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_choice(s).as_str() {
            "beginner" => Ok(ExperienceLevel::Beginner),
            "intermediate" => Ok(ExperienceLevel::Intermediate),
            "experienced" => Ok(ExperienceLevel::Experienced),
            "expert" => Ok(ExperienceLevel::Expert),
            _ => Err(format!(
                "unknown experience level '{}' (beginner, intermediate, experienced, expert)",
                s
            )),
        }
    }
}

impl FromStr for RiskTolerance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_choice(s).as_str() {
            "verylow" => Ok(RiskTolerance::VeryLow),
            "low" => Ok(RiskTolerance::Low),
            "medium" => Ok(RiskTolerance::Medium),
            "high" => Ok(RiskTolerance::High),
            "veryhigh" => Ok(RiskTolerance::VeryHigh),
            _ => Err(format!(
                "unknown risk tolerance '{}' (very-low, low, medium, high, very-high)",
                s
            )),
        }
    }
}

impl FromStr for BudgetRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_choice(s).as_str() {
            "under5k" | "5000" => Ok(BudgetRange::Under5k),
            "5kto20k" | "500020000" => Ok(BudgetRange::From5kTo20k),
            "20kto50k" | "2000050000" => Ok(BudgetRange::From20kTo50k),
            "over50k" | "50000" => Ok(BudgetRange::Over50k),
            _ => Err(format!(
                "unknown budget '{}' (under-5k, 5k-to-20k, 20k-to-50k, over-50k)",
                s
            )),
        }
    }
}

/// 使用者輸入的位置：地名或座標
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationInput {
    Named { location_name: String },
    Coordinates { latitude: f64, longitude: f64 },
}

impl LocationInput {
    pub fn label(&self) -> String {
        match self {
            LocationInput::Named { location_name } => location_name.clone(),
            LocationInput::Coordinates {
                latitude,
                longitude,
            } => format!("{:.4}, {:.4}", latitude, longitude),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmerProfile {
    pub location: Option<LocationInput>,
    #[serde(default = "default_farm_size")]
    pub farm_size_acres: u32,
    #[serde(default)]
    pub experience: ExperienceLevel,
    #[serde(default)]
    pub risk_tolerance: RiskTolerance,
    #[serde(default)]
    pub budget: BudgetRange,
    #[serde(default)]
    pub beginning_farmer: bool,
    #[serde(default)]
    pub veteran: bool,
    #[serde(default)]
    pub state: Option<String>,
}

fn default_farm_size() -> u32 {
    100
}

impl Default for FarmerProfile {
    fn default() -> Self {
        Self {
            location: None,
            farm_size_acres: default_farm_size(),
            experience: ExperienceLevel::default(),
            risk_tolerance: RiskTolerance::default(),
            budget: BudgetRange::default(),
            beginning_farmer: false,
            veteran: false,
            state: None,
        }
    }
}

impl FarmerProfile {
    /// The chat form's checkbox and the wizard's experience slider both mean "beginning farmer".
    pub fn is_beginning(&self) -> bool {
        self.beginning_farmer || self.experience == ExperienceLevel::Beginner
    }

    pub fn location_label(&self) -> String {
        self.location
            .as_ref()
            .map(LocationInput::label)
            .unwrap_or_else(|| "Not specified".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lon: f64,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceOrigin {
    Live,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub points: Vec<PricePoint>,
    pub origin: PriceOrigin,
}

impl PriceHistory {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilTexture {
    pub clay: f64,
    pub silt: f64,
    pub sand: f64,
}

impl SoilTexture {
    pub fn total(&self) -> f64 {
        self.clay + self.silt + self.sand
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureSource {
    Measured,
    Synthetic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoilType {
    Clay,
    #[serde(rename = "Sandy Clay")]
    SandyClay,
    #[serde(rename = "Sandy Loam")]
    SandyLoam,
    Sand,
    #[serde(rename = "Silty Clay")]
    SiltyClay,
    #[serde(rename = "Silt Loam")]
    SiltLoam,
    Loam,
    Unknown,
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SoilType::Clay => "Clay",
            SoilType::SandyClay => "Sandy Clay",
            SoilType::SandyLoam => "Sandy Loam",
            SoilType::Sand => "Sand",
            SoilType::SiltyClay => "Silty Clay",
            SoilType::SiltLoam => "Silt Loam",
            SoilType::Loam => "Loam",
            SoilType::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilReading {
    pub soil_temperature: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub air_temperature: Option<f64>,
    pub texture: SoilTexture,
    pub texture_source: TextureSource,
    pub soil_type: SoilType,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Ask the provider to constrain the output to a JSON object.
    pub json_mode: bool,
}

impl ChatRequest {
    pub fn json_prompt(prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(prompt)],
            json_mode: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecommendation {
    pub crop: String,
    #[serde(default = "default_reason")]
    pub reason: String,
    #[serde(default = "default_risk")]
    pub risk: String,
}

fn default_reason() -> String {
    "Well-suited".to_string()
}

fn default_risk() -> String {
    "Standard risks".to_string()
}
