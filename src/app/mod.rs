pub mod grants;
pub mod market;
pub mod recommend;
pub mod report;
pub mod session;

use crate::adapters::brave::BraveSearchClient;
use crate::adapters::nass::NassClient;
use crate::adapters::nominatim::NominatimGeocoder;
use crate::adapters::openai::OpenAiClient;
use crate::adapters::soil::OpenSoilClient;
use crate::config::toml_config::AppConfig;
use crate::core::catalog::GrantCatalog;
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::sync::Arc;

pub use grants::{GrantAnswer, GrantFinder, GrantMatch};
pub use market::{MarketOutlook, MarketPredictor};
pub use recommend::{CropAdvice, RecommendRequest, SoilClimateAdvisor};
pub use session::{AdvisorySession, WizardStep};

/// 所有服務共用同一組 HTTP 客戶端
pub struct AdvisorServices {
    pub advisor: SoilClimateAdvisor,
    pub market: MarketPredictor,
    /// `None` when the grant catalog or its index could not be loaded.
    pub grants: Option<GrantFinder>,
}

impl AdvisorServices {
    pub async fn from_config<S: Storage>(config: &AppConfig, storage: &S) -> Result<Self> {
        let openai = Arc::new(OpenAiClient::new(&config.openai, &config.http)?);
        let brave = Arc::new(BraveSearchClient::new(&config.brave, &config.http)?);
        let nass = Arc::new(NassClient::new(&config.nass, &config.http)?);
        let geocoder = Arc::new(NominatimGeocoder::new(&config.geocoding, &config.http)?);
        let soil = Arc::new(OpenSoilClient::new(&config.soil, &config.http)?);

        if !openai.is_configured() {
            tracing::warn!("⚠️ OPENAI_API_KEY is not set; LLM-backed features will fail");
        }
        if !brave.is_configured() {
            tracing::warn!("⚠️ BRAVE_API_KEY is not set; web and news search are disabled");
        }

        let grants = match GrantCatalog::load(
            storage,
            &config.grants.catalog_path,
            &config.grants.index_path,
        )
        .await
        {
            Ok(catalog) => Some(GrantFinder::new(
                catalog,
                openai.clone(),
                openai.clone(),
                brave.clone(),
                config.grants.clone(),
            )),
            Err(e) => {
                tracing::warn!("⚠️ Grant finder unavailable: {}", e);
                None
            }
        };

        Ok(Self {
            advisor: SoilClimateAdvisor::new(geocoder, soil, openai.clone()),
            market: MarketPredictor::new(nass, brave, openai),
            grants,
        })
    }
}
