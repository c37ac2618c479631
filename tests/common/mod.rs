#![allow(dead_code)]

use farm_advisor::core::index::FlatIndex;
use farm_advisor::domain::model::GrantProgram;
use farm_advisor::AppConfig;
use httpmock::prelude::*;
use httpmock::Mock;
use serde_json::{json, Value};
use std::path::Path;

pub const CATALOG_PATH: &str = "usda_grants.json";
pub const INDEX_PATH: &str = "usda_grants.index.json";

/// Every upstream API routed to one mock server under its own prefix.
pub fn mocked_config(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.openai.api_key = Some("sk-test".to_string());
    config.openai.base_url = server.url("/openai/v1");
    config.brave.api_key = Some("brave-test".to_string());
    config.brave.base_url = server.url("/brave");
    config.nass.api_key = Some("nass-test".to_string());
    config.nass.base_url = server.url("/nass");
    config.geocoding.base_url = server.url("/nominatim");
    config.soil.weather_url = server.url("/meteo/v1");
    config.soil.soilgrids_url = server.url("/soilgrids");
    config.grants.catalog_path = CATALOG_PATH.to_string();
    config.grants.index_path = INDEX_PATH.to_string();
    config
}

/// Chat completion reply whose content is the given JSON value.
pub fn chat_reply(content: Value) -> Value {
    chat_text_reply(&content.to_string())
}

pub fn chat_text_reply(content: &str) -> Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
}

pub fn mock_chat<'a>(server: &'a MockServer, prompt_marker: &str, reply: Value) -> Mock<'a> {
    server.mock(|when, then| {
        when.method(POST)
            .path("/openai/v1/chat/completions")
            .body_contains(prompt_marker);
        then.status(200).json_body(reply);
    })
}

pub fn mock_embedding<'a>(server: &'a MockServer, input_marker: &str, vector: &[f32]) -> Mock<'a> {
    let vector = vector.to_vec();
    server.mock(|when, then| {
        when.method(POST)
            .path("/openai/v1/embeddings")
            .body_contains(input_marker);
        then.status(200).json_body(json!({"data": [{"embedding": vector}]}));
    })
}

pub fn mock_geocode<'a>(server: &'a MockServer, place: &str, lat: &str, lon: &str) -> Mock<'a> {
    let body = json!([{"lat": lat, "lon": lon, "display_name": place}]);
    server.mock(|when, then| {
        when.method(GET).path("/nominatim/search").query_param("q", place);
        then.status(200).json_body(body);
    })
}

pub fn mock_soil(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/meteo/v1/forecast");
        then.status(200).json_body(json!({
            "current_weather": {"temperature": 22.0},
            "hourly": {
                "soil_temperature_0cm": [19.5, 20.0],
                "soil_moisture_0_to_1cm": [0.31, 0.3]
            }
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/soilgrids/properties/query");
        then.status(200).json_body(json!({
            "properties": {"layers": [
                {"name": "clay", "depths": [{"values": {"mean": 200.0}}]},
                {"name": "silt", "depths": [{"values": {"mean": 550.0}}]},
                {"name": "sand", "depths": [{"values": {"mean": 250.0}}]}
            ]}
        }));
    });
}

pub fn crop_reply() -> Value {
    chat_reply(json!({
        "recommendations": [
            {"crop": "Corn", "reason": "Deep silt loam holds moisture", "risk": "Late frost"},
            {"crop": "Soybeans", "reason": "Fixes nitrogen after corn", "risk": "Sudden death syndrome"},
            {"crop": "Oats"}
        ]
    }))
}

pub fn market_reply() -> Value {
    chat_reply(json!({
        "prediction": "Prices likely firm through spring.",
        "confidence": "Medium",
        "action": "HOLD",
        "reasoning": "Seasonal lows are behind us."
    }))
}

pub fn program(id: &str, name: &str, summary: &str, eligibility: &[&str], year_round: bool) -> GrantProgram {
    GrantProgram {
        program_id: id.to_string(),
        program_name: name.to_string(),
        agency: "USDA Farm Service Agency (FSA)".to_string(),
        program_type: "Loan".to_string(),
        summary: summary.to_string(),
        eligibility: eligibility.iter().map(|s| s.to_string()).collect(),
        funding_amount: "Up to $400,000".to_string(),
        application_deadlines: "Year-round".to_string(),
        application_method: "Local FSA office".to_string(),
        required_documents: vec!["Business plan".to_string()],
        contact_info: "Local FSA county office".to_string(),
        official_url: format!("https://www.fsa.usda.gov/{}", id),
        year_round_application: year_round,
    }
}

/// Three programs; the plain one sits closest to `[1, 0, 0]`.
pub fn sample_catalog() -> Vec<GrantProgram> {
    vec![
        program(
            "fsa-microloans",
            "Farm Microloans",
            "Small loans for equipment on small farms",
            &["Family farmers"],
            false,
        ),
        program(
            "fsa-beginning",
            "Beginning Farmer Loans",
            "Operating credit for new farmer applicants",
            &["Beginning farmer with under 10 years experience"],
            true,
        ),
        program(
            "ams-fmpp",
            "Farmers Market Promotion Program",
            "Grants for direct marketing",
            &["Producer networks"],
            false,
        ),
    ]
}

pub fn sample_vectors() -> Vec<Vec<f32>> {
    vec![
        vec![1.0, 0.0, 0.0],
        vec![0.8, 0.2, 0.0],
        vec![0.7, 0.0, 0.3],
    ]
}

pub fn write_catalog(dir: &Path, programs: &[GrantProgram], vectors: Vec<Vec<f32>>) {
    std::fs::write(
        dir.join(CATALOG_PATH),
        serde_json::to_vec_pretty(programs).unwrap(),
    )
    .unwrap();
    let index = FlatIndex::new(3, vectors).unwrap();
    std::fs::write(dir.join(INDEX_PATH), index.to_json().unwrap()).unwrap();
}
