use crate::core::analysis::{analyze_price_trends, MarketAnalysis};
use crate::domain::model::{ChatRequest, PriceOrigin, PricePoint};
use crate::domain::ports::{ChatProvider, NewsProvider, PriceHistoryProvider};
use crate::utils::error::{AdvisorError, Result};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const HISTORY_YEARS: i32 = 2;
const NEWS_LIMIT: usize = 5;
const NEWS_IN_PROMPT: usize = 3;

pub const SOURCE_LIVE: &str = "USDA NASS (Live)";
pub const SOURCE_SYNTHETIC: &str = "Synthetic Estimates (USDA NASS unavailable)";
pub const SOURCE_GENERAL_KNOWLEDGE: &str = "LLM General Knowledge (Fallback)";
pub const NEWS_UNAVAILABLE: &str = "Unable to fetch live news.";
pub const NEWS_EMPTY: &str = "No recent news found.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketPrediction {
    #[serde(default)]
    pub prediction: String,
    #[serde(default)]
    pub confidence: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub reasoning: String,
}

/// LLM 預測結果；失敗時以 `{"error": ...}` 形式嵌入回應
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PredictionOutcome {
    Forecast(MarketPrediction),
    Failed { error: String },
}

impl PredictionOutcome {
    pub fn action(&self) -> Option<&str> {
        match self {
            PredictionOutcome::Forecast(p) => Some(p.action.as_str()),
            PredictionOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketOutlook {
    pub commodity: String,
    pub data_source: String,
    pub analysis: MarketAnalysis,
    pub prediction: PredictionOutcome,
    pub news: Vec<String>,
    pub price_data: Vec<PricePoint>,
}

/// 結合 NASS 價格、新聞標題與 LLM 的市場預測
pub struct MarketPredictor {
    prices: Arc<dyn PriceHistoryProvider>,
    news: Arc<dyn NewsProvider>,
    chat: Arc<dyn ChatProvider>,
}

impl MarketPredictor {
    pub fn new(
        prices: Arc<dyn PriceHistoryProvider>,
        news: Arc<dyn NewsProvider>,
        chat: Arc<dyn ChatProvider>,
    ) -> Self {
        Self { prices, news, chat }
    }

    pub async fn predict(&self, commodity: &str) -> Result<MarketOutlook> {
        self.predict_for_year(commodity, chrono::Local::now().year())
            .await
    }

    /// Same as [`predict`](Self::predict) with an explicit "current" year.
    pub async fn predict_for_year(&self, commodity: &str, current_year: i32) -> Result<MarketOutlook> {
        let commodity = commodity.trim();
        if commodity.is_empty() {
            return Err(AdvisorError::InvalidRequest {
                message: "commodity must not be empty".to_string(),
            });
        }
        tracing::info!("📊 Market prediction for {}", commodity);

        let history = self
            .prices
            .monthly_prices(commodity, current_year - HISTORY_YEARS, current_year)
            .await?;

        let news = self.fetch_news(commodity, current_year).await;
        let news_summary = news
            .iter()
            .take(NEWS_IN_PROMPT)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");

        let (analysis, prompt, data_source) = if history.is_empty() {
            tracing::warn!("⚠️ No price history for {}, using general knowledge", commodity);
            (
                MarketAnalysis::unavailable(),
                general_knowledge_prompt(commodity, &news_summary),
                SOURCE_GENERAL_KNOWLEDGE,
            )
        } else {
            let analysis = analyze_price_trends(&history.points);
            let prompt = data_driven_prompt(commodity, &analysis, &news_summary);
            let source = match history.origin {
                PriceOrigin::Live => SOURCE_LIVE,
                PriceOrigin::Synthetic => SOURCE_SYNTHETIC,
            };
            (analysis, prompt, source)
        };

        let prediction = match self.chat.complete(ChatRequest::json_prompt(prompt)).await {
            Ok(reply) => match crate::adapters::openai::parse_json_reply::<MarketPrediction>(&reply) {
                Ok(p) => PredictionOutcome::Forecast(p),
                Err(e) => PredictionOutcome::Failed {
                    error: format!("LLM Error: {}", e),
                },
            },
            // 沒有金鑰時整個功能無法使用
            Err(e @ AdvisorError::MissingCredential { .. }) => return Err(e),
            Err(e) => {
                tracing::warn!("⚠️ Market prediction LLM call failed: {}", e);
                PredictionOutcome::Failed {
                    error: format!("LLM Error: {}", e),
                }
            }
        };

        Ok(MarketOutlook {
            commodity: commodity.to_string(),
            data_source: data_source.to_string(),
            analysis,
            prediction,
            news,
            price_data: history.points,
        })
    }

    async fn fetch_news(&self, commodity: &str, year: i32) -> Vec<String> {
        let query = format!("{} price news {} market analysis", commodity, year);
        match self.news.headlines(&query, NEWS_LIMIT).await {
            Ok(items) if items.is_empty() => vec![NEWS_EMPTY.to_string()],
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("⚠️ News search failed: {}", e);
                vec![NEWS_UNAVAILABLE.to_string()]
            }
        }
    }
}

fn money(value: Option<f64>) -> String {
    value
        .map(|v| format!("${}", v))
        .unwrap_or_else(|| "N/A".to_string())
}

pub(crate) fn data_driven_prompt(commodity: &str, analysis: &MarketAnalysis, news: &str) -> String {
    format!(
        r#"You are an Expert Agricultural Economist.

**Commodity**: {commodity}
**Historical Data**: {history}
**Current Trend**: {trend} ({change}%)
**Current Price**: {current}
**Average Price**: {average}
**Seasonality**: {seasonality}

**Recent News**:
{news}

**Task**:
Predict the price movement for the next 3 months and recommend action.
Explicitly mention if the News or Seasonality supports your prediction.

**Format**: JSON
{{
    "prediction": "Short sentence on expected price movement.",
    "confidence": "High/Medium/Low",
    "action": "SELL NOW / HOLD / BUY",
    "reasoning": "Concise explanation citing data/news."
}}

**IMPORTANT GUIDELINES**:
- If the price trend is **Upward** (>5%) and Seasonality supports it, recommend **BUY**.
- If the price trend is **Downward** (<-5%) and Seasonality supports it, recommend **SELL** (to cut losses) or **HOLD** (if bottoming out).
- Do NOT default to "HOLD" unless the signals are truly conflicting. Be decisive.
- If Confidence is High, the Action MUST be BUY or SELL."#,
        history = analysis.history_summary,
        trend = analysis.trend,
        change = analysis.change_percent,
        current = money(analysis.current_price),
        average = money(analysis.average_price),
        seasonality = analysis.seasonality,
    )
}

pub(crate) fn general_knowledge_prompt(commodity: &str, news: &str) -> String {
    format!(
        r#"You are an Expert Agricultural Economist.

**Commodity**: {commodity}
**Data Status**: No specific NASS price data available for this niche crop.

**Recent News**:
{news}

**Task**:
Based on the recent news above AND your general knowledge, provide a market outlook.

**Format**: JSON
{{
    "prediction": "General market outlook (referencing news if relevant).",
    "confidence": "Low (News + General Knowledge)",
    "action": "RESEARCH LOCAL MARKET",
    "reasoning": "Explain drivers based on the news provided."
}}"#
    )
}
