use crate::domain::model::{ChatRequest, GeoLocation, PriceHistory, SoilReading, WebResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// text → fixed-length vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// role-tagged messages → generated text
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String>;
}

#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<WebResult>>;
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn headlines(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

/// Monthly price history for a commodity. Implementations substitute
/// deterministic synthetic data when the live source is unavailable.
#[async_trait]
pub trait PriceHistoryProvider: Send + Sync {
    async fn monthly_prices(
        &self,
        commodity: &str,
        year_start: i32,
        year_end: i32,
    ) -> Result<PriceHistory>;
}

/// place name → coordinates, `None` when nothing matches
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, place: &str) -> Result<Option<GeoLocation>>;
}

#[async_trait]
pub trait SoilProvider: Send + Sync {
    async fn soil_conditions(&self, lat: f64, lon: f64) -> Result<SoilReading>;
}
