mod common;

use common::*;
use farm_advisor::adapters::brave::BraveSearchClient;
use farm_advisor::adapters::nass::NassClient;
use farm_advisor::adapters::openai::OpenAiClient;
use farm_advisor::app::market::{
    PredictionOutcome, NEWS_EMPTY, NEWS_UNAVAILABLE, SOURCE_GENERAL_KNOWLEDGE, SOURCE_LIVE,
    SOURCE_SYNTHETIC,
};
use farm_advisor::core::analysis::Trend;
use farm_advisor::{AdvisorError, AppConfig, MarketPredictor};
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn predictor(config: &AppConfig) -> MarketPredictor {
    let openai = Arc::new(OpenAiClient::new(&config.openai, &config.http).unwrap());
    let brave = Arc::new(BraveSearchClient::new(&config.brave, &config.http).unwrap());
    let nass = Arc::new(NassClient::new(&config.nass, &config.http).unwrap());
    MarketPredictor::new(nass, brave, openai)
}

fn mock_corn_prices(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/nass/api_GET")
            .query_param("commodity_desc", "CORN")
            .query_param("statisticcat_desc", "PRICE RECEIVED")
            .query_param("year__GE", "2022")
            .query_param("year__LE", "2024");
        then.status(200).json_body(json!({"data": [
            {"year": 2024, "reference_period_desc": "JAN", "Value": "4.60"},
            {"year": 2023, "reference_period_desc": "YEAR", "Value": "4.30"},
            {"year": "2023", "reference_period_desc": "JUL", "Value": "4.20"},
            {"year": 2023, "reference_period_desc": "JAN", "Value": "4.00"}
        ]}));
    });
}

fn mock_news(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET)
            .path("/brave/news/search")
            .query_param("q", "Corn price news 2024 market analysis");
        then.status(200).json_body(json!({"results": [
            {"title": "Corn rallies on export demand", "url": "https://www.reuters.com/markets/corn"},
            {"title": "Drought watch in the Plains", "url": "https://agweb.com/news/drought"}
        ]}));
    });
}

#[tokio::test]
async fn test_live_prices_drive_the_prediction() {
    let server = MockServer::start();
    mock_corn_prices(&server);
    mock_news(&server);
    let chat = server.mock(|when, then| {
        when.method(POST)
            .path("/openai/v1/chat/completions")
            .body_contains("Expert Agricultural Economist")
            .body_contains("Corn rallies on export demand")
            .body_contains("json_object");
        then.status(200).json_body(market_reply());
    });

    let outlook = predictor(&mocked_config(&server))
        .predict_for_year("Corn", 2024)
        .await
        .unwrap();

    chat.assert();
    assert_eq!(outlook.commodity, "Corn");
    assert_eq!(outlook.data_source, SOURCE_LIVE);
    assert_eq!(outlook.price_data.len(), 3);
    assert_eq!(outlook.analysis.current_price, Some(4.6));
    assert_eq!(outlook.analysis.trend, Trend::Upward);
    assert_eq!(
        outlook.news,
        vec![
            "- Corn rallies on export demand (reuters.com)".to_string(),
            "- Drought watch in the Plains (agweb.com)".to_string(),
        ]
    );
    assert_eq!(outlook.prediction.action(), Some("HOLD"));
}

#[tokio::test]
async fn test_nass_outage_falls_back_to_synthetic_prices() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/nass/api_GET");
        then.status(500).body("upstream down");
    });
    server.mock(|when, then| {
        when.method(GET).path("/brave/news/search");
        then.status(200).json_body(json!({"results": []}));
    });
    mock_chat(&server, "Expert Agricultural Economist", market_reply());

    let outlook = predictor(&mocked_config(&server))
        .predict_for_year("Wheat", 2024)
        .await
        .unwrap();

    assert_eq!(outlook.data_source, SOURCE_SYNTHETIC);
    assert!(!outlook.price_data.is_empty());
    assert!(outlook.analysis.has_prices());
    assert_eq!(outlook.news, vec![NEWS_EMPTY.to_string()]);
}

#[tokio::test]
async fn test_empty_nass_rows_fall_back_to_general_knowledge() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/nass/api_GET")
            .query_param("commodity_desc", "LAVENDER");
        then.status(200).json_body(json!({"data": []}));
    });
    server.mock(|when, then| {
        when.method(GET).path("/brave/news/search");
        then.status(200).json_body(json!({"results": []}));
    });
    let chat = mock_chat(&server, "No specific NASS price data", market_reply());

    let outlook = predictor(&mocked_config(&server))
        .predict_for_year("Lavender", 2024)
        .await
        .unwrap();

    chat.assert();
    assert_eq!(outlook.data_source, SOURCE_GENERAL_KNOWLEDGE);
    assert_eq!(outlook.analysis.trend, Trend::Unknown);
    assert!(outlook.price_data.is_empty());
    assert!(!outlook.analysis.has_prices());
    assert_eq!(outlook.prediction.action(), Some("HOLD"));

    let body = serde_json::to_value(&outlook).unwrap();
    assert_eq!(body["price_data"], json!([]));
    assert_eq!(body["analysis"]["trend"], "Unknown");
}

#[tokio::test]
async fn test_news_failure_is_reported_inline() {
    let server = MockServer::start();
    mock_corn_prices(&server);
    server.mock(|when, then| {
        when.method(GET).path("/brave/news/search");
        then.status(503);
    });
    mock_chat(&server, "Unable to fetch live news.", market_reply());

    let outlook = predictor(&mocked_config(&server))
        .predict_for_year("Corn", 2024)
        .await
        .unwrap();

    assert_eq!(outlook.news, vec![NEWS_UNAVAILABLE.to_string()]);
    assert!(matches!(outlook.prediction, PredictionOutcome::Forecast(_)));
}

#[tokio::test]
async fn test_llm_failure_is_embedded_as_error() {
    let server = MockServer::start();
    mock_corn_prices(&server);
    mock_news(&server);
    server.mock(|when, then| {
        when.method(POST).path("/openai/v1/chat/completions");
        then.status(500).body("model overloaded");
    });

    let outlook = predictor(&mocked_config(&server))
        .predict_for_year("Corn", 2024)
        .await
        .unwrap();

    match &outlook.prediction {
        PredictionOutcome::Failed { error } => assert!(error.starts_with("LLM Error:")),
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(outlook.prediction.action(), None);

    let body = serde_json::to_value(&outlook).unwrap();
    assert!(body["prediction"]["error"].is_string());
    assert_eq!(body["data_source"], SOURCE_LIVE);
}

#[tokio::test]
async fn test_missing_openai_key_fails_the_request() {
    let server = MockServer::start();
    mock_corn_prices(&server);
    mock_news(&server);

    let mut config = mocked_config(&server);
    config.openai.api_key = None;

    let err = predictor(&config)
        .predict_for_year("Corn", 2024)
        .await
        .unwrap_err();
    assert!(matches!(err, AdvisorError::MissingCredential { .. }));
}

#[tokio::test]
async fn test_blank_commodity_is_rejected() {
    let server = MockServer::start();
    let err = predictor(&mocked_config(&server))
        .predict_for_year("   ", 2024)
        .await
        .unwrap_err();
    assert!(err.is_client_error());
}
