mod common;

use common::*;
use farm_advisor::adapters::brave::BraveSearchClient;
use farm_advisor::adapters::openai::OpenAiClient;
use farm_advisor::app::grants::{build_index, GrantFinder};
use farm_advisor::core::catalog::GrantCatalog;
use farm_advisor::core::strategy::SearchStrategy;
use farm_advisor::domain::model::{ChatMessage, ExperienceLevel, FarmerProfile};
use farm_advisor::{AppConfig, LocalStorage};
use httpmock::prelude::*;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

async fn finder(config: &AppConfig, dir: &TempDir) -> GrantFinder {
    let storage = LocalStorage::new(dir.path());
    let catalog = GrantCatalog::load(&storage, CATALOG_PATH, INDEX_PATH)
        .await
        .unwrap();
    let openai = Arc::new(OpenAiClient::new(&config.openai, &config.http).unwrap());
    let brave = Arc::new(BraveSearchClient::new(&config.brave, &config.http).unwrap());
    GrantFinder::new(catalog, openai.clone(), openai, brave, config.grants.clone())
}

fn beginner() -> FarmerProfile {
    FarmerProfile {
        experience: ExperienceLevel::Beginner,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_local_search_orders_by_match_score() {
    let server = MockServer::start();
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path(), &sample_catalog(), sample_vectors());
    mock_embedding(&server, "operating loans", &[1.0, 0.0, 0.0]);

    let config = mocked_config(&server);
    let finder = finder(&config, &dir).await;

    let local = finder
        .search_local("operating loans", Some(&beginner()), 5)
        .await
        .unwrap();

    // 0.0, 0.08 and 0.18
    assert!((local.average_distance - 0.26 / 3.0).abs() < 1e-5);
    assert_eq!(local.matches.len(), 3);
    assert_eq!(local.matches[0].program.program_id, "fsa-beginning");
    assert_eq!(local.matches[0].match_score, 100);
    assert_eq!(local.matches[1].program.program_id, "fsa-microloans");
    assert_eq!(local.matches[1].confidence, 1.0);
}

#[tokio::test]
async fn test_distant_results_are_filtered() {
    let server = MockServer::start();
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path(), &sample_catalog(), sample_vectors());
    mock_embedding(&server, "drone subsidies", &[0.0, 0.0, 2.0]);

    let config = mocked_config(&server);
    let local = finder(&config, &dir)
        .await
        .search_local("drone subsidies", None, 5)
        .await
        .unwrap();

    assert!(local.matches.is_empty());
    assert!(local.average_distance > 1.5);
}

#[tokio::test]
async fn test_ask_local_only_skips_web_search() {
    let server = MockServer::start();
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path(), &sample_catalog(), sample_vectors());
    mock_embedding(&server, "beginning farmer loans", &[1.0, 0.0, 0.0]);
    let web = server.mock(|when, then| {
        when.method(GET).path("/brave/web/search");
        then.status(200).json_body(json!({"web": {"results": []}}));
    });
    let chat = server.mock(|when, then| {
        when.method(POST)
            .path("/openai/v1/chat/completions")
            .body_contains("a database of 3 programs")
            .body_contains("\"temperature\":0.6")
            .body_contains("\"max_tokens\":1200")
            .body_contains("earlier question");
        then.status(200)
            .json_body(chat_text_reply("Beginning Farmer Loans fit you best."));
    });

    let config = mocked_config(&server);
    let history = vec![
        ChatMessage::user("earlier question"),
        ChatMessage::assistant("earlier answer"),
    ];
    let answer = finder(&config, &dir)
        .await
        .ask("beginning farmer loans", Some(&beginner()), &history)
        .await
        .unwrap();

    chat.assert();
    assert_eq!(web.hits(), 0);
    assert_eq!(answer.strategy, SearchStrategy::LocalOnly);
    assert_eq!(answer.answer, "Beginning Farmer Loans fit you best.");
    assert!(answer.web_results.is_empty());
}

#[tokio::test]
async fn test_ask_with_recency_keyword_is_hybrid() {
    let server = MockServer::start();
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path(), &sample_catalog(), sample_vectors());
    mock_embedding(&server, "latest", &[1.0, 0.0, 0.0]);
    let web = server.mock(|when, then| {
        when.method(GET)
            .path("/brave/web/search")
            .query_param("q", "USDA grants latest microloan changes")
            .query_param("count", "5");
        then.status(200).json_body(json!({"web": {"results": [
            {"title": "FSA expands microloans", "description": "New limits", "url": "https://www.fsa.usda.gov/news"}
        ]}}));
    });
    mock_chat(
        &server,
        "both a local database AND web search",
        chat_text_reply("Microloan limits were raised."),
    );

    let config = mocked_config(&server);
    let answer = finder(&config, &dir)
        .await
        .ask("latest microloan changes", None, &[])
        .await
        .unwrap();

    web.assert();
    assert_eq!(answer.strategy, SearchStrategy::Hybrid);
    assert_eq!(answer.web_results.len(), 1);
    assert_eq!(answer.local_matches.len(), 3);
}

#[tokio::test]
async fn test_ask_web_only_survives_web_failure() {
    let server = MockServer::start();
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path(), &sample_catalog(), sample_vectors());
    mock_embedding(&server, "aquaculture", &[0.0, 0.0, 3.0]);
    server.mock(|when, then| {
        when.method(GET).path("/brave/web/search");
        then.status(429).body("rate limited");
    });
    mock_chat(
        &server,
        "couldn't find relevant matches",
        chat_text_reply("I could not find aquaculture programs."),
    );

    let config = mocked_config(&server);
    let answer = finder(&config, &dir)
        .await
        .ask("aquaculture", None, &[])
        .await
        .unwrap();

    assert_eq!(answer.strategy, SearchStrategy::WebOnly);
    assert!(answer.web_results.is_empty());
    assert!(answer.local_matches.is_empty());
}

#[tokio::test]
async fn test_find_for_profile_uses_profile_query() {
    let server = MockServer::start();
    let dir = TempDir::new().unwrap();
    write_catalog(dir.path(), &sample_catalog(), sample_vectors());
    let embed = mock_embedding(
        &server,
        "beginning farmer new rancher startup loans small farm microloans Corn Soybeans specialty crops",
        &[1.0, 0.0, 0.0],
    );

    let config = mocked_config(&server);
    let profile = FarmerProfile {
        experience: ExperienceLevel::Beginner,
        farm_size_acres: 20,
        ..Default::default()
    };
    let crops = vec!["Corn".to_string(), "Soybeans".to_string(), "Oats".to_string()];
    let matches = finder(&config, &dir)
        .await
        .find_for_profile(&profile, &crops)
        .await
        .unwrap();

    embed.assert();
    assert_eq!(matches[0].program.program_id, "fsa-beginning");
    // small farm bonus for the microloan program: 50 + 15
    let micro = matches
        .iter()
        .find(|m| m.program.program_id == "fsa-microloans")
        .unwrap();
    assert_eq!(micro.match_score, 65);
}

#[tokio::test]
async fn test_build_index_embeds_every_program() {
    let server = MockServer::start();
    let dir = TempDir::new().unwrap();
    let programs = sample_catalog();
    std::fs::write(
        dir.path().join(CATALOG_PATH),
        serde_json::to_vec(&programs).unwrap(),
    )
    .unwrap();

    let embed = server.mock(|when, then| {
        when.method(POST).path("/openai/v1/embeddings");
        then.status(200)
            .json_body(json!({"data": [{"embedding": [0.5, 0.5, 0.0, 1.0]}]}));
    });

    let config = mocked_config(&server);
    let storage = LocalStorage::new(dir.path());
    let openai = OpenAiClient::new(&config.openai, &config.http).unwrap();
    let index = build_index(&storage, &openai, CATALOG_PATH, INDEX_PATH, "test-embedding")
        .await
        .unwrap();

    embed.assert_hits(3);
    assert_eq!(index.len(), 3);
    assert_eq!(index.dimension(), 4);

    let catalog = GrantCatalog::load(&storage, CATALOG_PATH, INDEX_PATH)
        .await
        .unwrap();
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.index().model(), Some("test-embedding"));
}

#[tokio::test]
async fn test_shipped_catalog_parses() {
    let storage = LocalStorage::new(env!("CARGO_MANIFEST_DIR"));
    let programs =
        farm_advisor::core::catalog::load_programs(&storage, &AppConfig::default().grants.catalog_path)
            .await
            .unwrap();
    assert_eq!(programs.len(), 8);
    assert!(programs
        .iter()
        .any(|p| p.program_name == "Farm Operating Loans" && p.year_round_application));
}
