use crate::utils::error::{AdvisorError, Result};
use crate::utils::validation::{
    validate_json_path, validate_non_empty_string, validate_range, validate_socket_addr,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "advisor.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub http: HttpConfig,
    pub openai: OpenAiConfig,
    pub brave: BraveConfig,
    pub nass: NassConfig,
    pub geocoding: GeocodingConfig,
    pub soil: SoilConfig,
    pub grants: GrantsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub addr: String,
    pub json_logs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".to_string(),
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            user_agent: concat!("farm-advisor/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    /// LLM calls run longer than the data APIs.
    pub timeout_seconds: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o".to_string(),
            embedding_model: "text-embedding-3-large".to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BraveConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for BraveConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.search.brave.com/res/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NassConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub mock_seed: u64,
}

impl Default for NassConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://quickstats.nass.usda.gov/api".to_string(),
            mock_seed: crate::core::synthetic::DEFAULT_PRICE_SEED,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    pub base_url: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SoilConfig {
    pub weather_url: String,
    pub soilgrids_url: String,
}

impl Default for SoilConfig {
    fn default() -> Self {
        Self {
            weather_url: "https://api.open-meteo.com/v1".to_string(),
            soilgrids_url: "https://rest.isric.org/soilgrids/v2.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrantsConfig {
    pub catalog_path: String,
    pub index_path: String,
    pub top_k: usize,
    pub web_results: usize,
    pub history_turns: usize,
}

impl Default for GrantsConfig {
    fn default() -> Self {
        Self {
            catalog_path: "data/usda_grants.json".to_string(),
            index_path: "data/usda_grants.index.json".to_string(),
            top_k: 5,
            web_results: 5,
            history_turns: 6,
        }
    }
}

fn env_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex"))
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AdvisorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        let mut config: AppConfig =
            toml::from_str(&processed_content).map_err(|e| AdvisorError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        config.normalize_secrets();
        Ok(config)
    }

    /// Loads `path` when it exists, otherwise starts from defaults; then fills
    /// unset API keys from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) if p.exists() => {
                tracing::debug!("Loading configuration from {}", p.display());
                Self::from_file(p)?
            }
            Some(p) => {
                tracing::debug!("{} not found, using defaults", p.display());
                Self::default()
            }
            None => Self::default(),
        };
        config.apply_env_fallbacks(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_placeholder()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    /// An unresolved `${VAR}` or blank value means the key is absent.
    fn normalize_secrets(&mut self) {
        for key in [
            &mut self.openai.api_key,
            &mut self.brave.api_key,
            &mut self.nass.api_key,
        ] {
            let unresolved = key
                .as_deref()
                .map(|k| k.trim().is_empty() || env_placeholder().is_match(k))
                .unwrap_or(false);
            if unresolved {
                *key = None;
            }
        }
    }

    pub fn apply_env_fallbacks<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |slot: &mut Option<String>, var: &str| {
            if slot.is_none() {
                *slot = lookup(var).filter(|v| !v.trim().is_empty());
            }
        };
        fill(&mut self.openai.api_key, "OPENAI_API_KEY");
        fill(&mut self.brave.api_key, "BRAVE_API_KEY");
        fill(&mut self.nass.api_key, "NASS_API_KEY");
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_socket_addr("server.addr", &self.server.addr)?;
        validate_range("http.timeout_seconds", self.http.timeout_seconds, 1, 300)?;
        validate_range("openai.timeout_seconds", self.openai.timeout_seconds, 1, 600)?;

        validate_url("openai.base_url", &self.openai.base_url)?;
        validate_url("brave.base_url", &self.brave.base_url)?;
        validate_url("nass.base_url", &self.nass.base_url)?;
        validate_url("geocoding.base_url", &self.geocoding.base_url)?;
        validate_url("soil.weather_url", &self.soil.weather_url)?;
        validate_url("soil.soilgrids_url", &self.soil.soilgrids_url)?;

        validate_non_empty_string("openai.chat_model", &self.openai.chat_model)?;
        validate_non_empty_string("openai.embedding_model", &self.openai.embedding_model)?;

        validate_json_path("grants.catalog_path", &self.grants.catalog_path)?;
        validate_json_path("grants.index_path", &self.grants.index_path)?;
        validate_range("grants.top_k", self.grants.top_k, 1, 50)?;
        validate_range("grants.web_results", self.grants.web_results, 1, 20)?;

        Ok(())
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
