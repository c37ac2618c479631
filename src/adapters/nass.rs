use crate::adapters::{build_client, endpoint, ensure_success};
use crate::config::toml_config::{HttpConfig, NassConfig};
use crate::core::synthetic::synthetic_price_history;
use crate::domain::model::{PriceHistory, PriceOrigin, PricePoint};
use crate::domain::ports::PriceHistoryProvider;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

const SERVICE: &str = "USDA NASS";

/// USDA NASS Quick Stats 月度「PRICE RECEIVED」查詢
///
/// 沒有 API key 或查詢失敗時改用固定種子的模擬資料，呼叫端不會收到錯誤。
#[derive(Debug, Clone)]
pub struct NassClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    mock_seed: u64,
}

#[derive(Debug, Deserialize)]
struct QuickStatsResponse {
    #[serde(default)]
    data: Vec<QuickStatsRow>,
}

#[derive(Debug, Deserialize)]
struct QuickStatsRow {
    #[serde(default)]
    year: Value,
    #[serde(default)]
    reference_period_desc: String,
    #[serde(default, rename = "Value")]
    value: String,
}

impl NassClient {
    pub fn new(config: &NassConfig, http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(http.timeout(), &http.user_agent)?,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            mock_seed: config.mock_seed,
        })
    }

    fn synthetic(&self, commodity: &str, year_start: i32, year_end: i32) -> PriceHistory {
        PriceHistory {
            points: synthetic_price_history(commodity, year_start, year_end, self.mock_seed),
            origin: PriceOrigin::Synthetic,
        }
    }

    async fn fetch_live(
        &self,
        key: &str,
        commodity: &str,
        year_start: i32,
        year_end: i32,
    ) -> Result<Vec<PricePoint>> {
        let commodity_desc = commodity.trim().to_uppercase();
        let year_ge = year_start.to_string();
        let year_le = year_end.to_string();

        let response = self
            .client
            .get(endpoint(&self.base_url, "api_GET"))
            .query(&[
                ("key", key),
                ("commodity_desc", commodity_desc.as_str()),
                ("statisticcat_desc", "PRICE RECEIVED"),
                ("freq_desc", "MONTHLY"),
                ("year__GE", year_ge.as_str()),
                ("year__LE", year_le.as_str()),
                ("format", "JSON"),
            ])
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let body: QuickStatsResponse = response.json().await?;
        Ok(parse_rows(body.data))
    }
}

fn month_from_abbrev(period: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ];
    let period = period.trim().to_uppercase();
    MONTHS
        .iter()
        .position(|m| *m == period)
        .map(|i| i as u32 + 1)
}

fn row_year(year: &Value) -> Option<i32> {
    match year {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 過濾年度平均 ("YEAR") 與無法解析的列，依日期排序
fn parse_rows(rows: Vec<QuickStatsRow>) -> Vec<PricePoint> {
    let mut points: Vec<PricePoint> = rows
        .into_iter()
        .filter_map(|row| {
            let month = month_from_abbrev(&row.reference_period_desc)?;
            let year = row_year(&row.year)?;
            let price: f64 = row.value.replace(',', "").trim().parse().ok()?;
            let date = NaiveDate::from_ymd_opt(year, month, 1)?;
            Some(PricePoint { date, price })
        })
        .collect();
    points.sort_by_key(|p| p.date);
    points
}

#[async_trait]
impl PriceHistoryProvider for NassClient {
    async fn monthly_prices(
        &self,
        commodity: &str,
        year_start: i32,
        year_end: i32,
    ) -> Result<PriceHistory> {
        let Some(key) = self.api_key.as_deref() else {
            tracing::warn!("⚠️ No NASS_API_KEY configured, using synthetic prices for {}", commodity);
            return Ok(self.synthetic(commodity, year_start, year_end));
        };

        match self.fetch_live(key, commodity, year_start, year_end).await {
            Ok(points) => {
                tracing::info!("📈 NASS returned {} monthly prices for {}", points.len(), commodity);
                Ok(PriceHistory {
                    points,
                    origin: PriceOrigin::Live,
                })
            }
            Err(e) => {
                tracing::warn!("⚠️ NASS request failed ({}), using synthetic prices", e);
                Ok(self.synthetic(commodity, year_start, year_end))
            }
        }
    }
}
