use crate::app::market::MarketPredictor;
use crate::app::recommend::{RecommendRequest, SoilClimateAdvisor};
use crate::utils::error::{AdvisorError, ErrorCategory, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub const ROOT_MESSAGE: &str = "Soil and Climate Agent API is running.";

#[derive(Clone)]
pub struct ServerState {
    advisor: Arc<SoilClimateAdvisor>,
    market: Arc<MarketPredictor>,
}

impl ServerState {
    pub fn new(advisor: SoilClimateAdvisor, market: MarketPredictor) -> Self {
        Self {
            advisor: Arc::new(advisor),
            market: Arc::new(market),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MarketRequest {
    pub commodity: String,
}

/// `{"detail": ...}` error body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<AdvisorError> for ApiError {
    fn from(err: AdvisorError) -> Self {
        let status = if err.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        match err.category() {
            ErrorCategory::Input => tracing::info!("Rejected request: {}", err),
            _ => tracing::error!("❌ Request failed: {}", err),
        }

        Self {
            status,
            detail: err.user_friendly_message(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(read_root))
        .route("/recommend", post(recommend))
        .route("/market_predict", post(market_predict))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(addr: &str, state: ServerState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("🚀 Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn read_root() -> Json<Value> {
    Json(json!({ "message": ROOT_MESSAGE }))
}

async fn recommend(
    State(state): State<ServerState>,
    payload: std::result::Result<Json<RecommendRequest>, JsonRejection>,
) -> std::result::Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let advice = state.advisor.recommend(&request).await?;
    Ok(Json(serde_json::to_value(advice).map_err(AdvisorError::from)?))
}

async fn market_predict(
    State(state): State<ServerState>,
    payload: std::result::Result<Json<MarketRequest>, JsonRejection>,
) -> std::result::Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let outlook = state.market.predict(&request.commodity).await?;
    Ok(Json(serde_json::to_value(outlook).map_err(AdvisorError::from)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_400() {
        let err = ApiError::from(AdvisorError::LocationNotFound {
            query: "Atlantis".to_string(),
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.detail.contains("Atlantis"));
    }

    #[test]
    fn test_other_errors_map_to_500() {
        let err = ApiError::from(AdvisorError::MissingCredential {
            feature: "OpenAI".to_string(),
            variable: "OPENAI_API_KEY".to_string(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
