use crate::adapters::{build_client, endpoint, ensure_success};
use crate::config::toml_config::{BraveConfig, HttpConfig};
use crate::domain::model::WebResult;
use crate::domain::ports::{NewsProvider, WebSearchProvider};
use crate::utils::error::{AdvisorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const SERVICE: &str = "Brave Search";
const TOKEN_HEADER: &str = "X-Subscription-Token";

/// Brave Search API：網頁搜尋與新聞標題
#[derive(Debug, Clone)]
pub struct BraveSearchClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct WebSearchResponse {
    #[serde(default)]
    web: Option<WebSection>,
}

#[derive(Deserialize)]
struct WebSection {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Deserialize)]
struct NewsSearchResponse {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    url: String,
}

impl BraveSearchClient {
    pub fn new(config: &BraveConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(http.timeout(), &http.user_agent)?,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AdvisorError::MissingCredential {
                feature: SERVICE.to_string(),
                variable: "BRAVE_API_KEY".to_string(),
            })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &str,
        count: usize,
    ) -> Result<T> {
        let key = self.api_key()?;
        let response = self
            .client
            .get(endpoint(&self.base_url, path))
            .header(TOKEN_HEADER, key)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("q", query), ("count", &count.to_string())])
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        Ok(response.json().await?)
    }
}

fn hostname(link: &str) -> Option<String> {
    url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
}

/// "- title (source)"
pub fn format_headline(title: &str, link: &str) -> String {
    match hostname(link) {
        Some(host) => format!("- {} ({})", title, host),
        None => format!("- {}", title),
    }
}

#[async_trait]
impl WebSearchProvider for BraveSearchClient {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<WebResult>> {
        tracing::info!("🌐 Web search: {}", query);
        let body: WebSearchResponse = self.get("web/search", query, count).await?;

        let results: Vec<WebResult> = body
            .web
            .map(|w| w.results)
            .unwrap_or_default()
            .into_iter()
            .take(count)
            .map(|r| WebResult {
                title: r.title,
                snippet: r.description,
                link: r.url,
            })
            .collect();

        tracing::debug!("Web search returned {} results", results.len());
        Ok(results)
    }
}

#[async_trait]
impl NewsProvider for BraveSearchClient {
    async fn headlines(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        tracing::info!("📰 News search: {}", query);
        let body: NewsSearchResponse = self.get("news/search", query, limit).await?;

        Ok(body
            .results
            .into_iter()
            .take(limit)
            .map(|r| format_headline(&r.title, &r.url))
            .collect())
    }
}
