use crate::domain::model::PricePoint;
use chrono::{Datelike, Month};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Trend cutoffs in percent.
pub const UPWARD_CUTOFF: f64 = 5.0;
pub const DOWNWARD_CUTOFF: f64 = -5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Upward,
    Downward,
    Stable,
    #[serde(rename = "Insufficient Data")]
    InsufficientData,
    Unknown,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Upward => "Upward",
            Trend::Downward => "Downward",
            Trend::Stable => "Stable",
            Trend::InsufficientData => "Insufficient Data",
            Trend::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Seasonality {
    pub best_month: String,
    pub worst_month: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketAnalysis {
    pub current_price: Option<f64>,
    pub average_price: Option<f64>,
    pub trend: Trend,
    pub change_percent: f64,
    pub history_summary: String,
    pub seasonality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonal_extremes: Option<Seasonality>,
}

impl MarketAnalysis {
    /// Used when no price history could be obtained at all.
    pub fn unavailable() -> Self {
        Self {
            current_price: None,
            average_price: None,
            trend: Trend::Unknown,
            change_percent: 0.0,
            history_summary: "No NASS data available.".to_string(),
            seasonality: "N/A".to_string(),
            seasonal_extremes: None,
        }
    }

    pub fn has_prices(&self) -> bool {
        self.current_price.is_some()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Percentage change between the first and last price, 0 when the start is 0.
pub fn percent_change(first: f64, last: f64) -> f64 {
    if first == 0.0 {
        return 0.0;
    }
    (last - first) / first * 100.0
}

pub fn classify_trend(change_percent: f64) -> Trend {
    if change_percent > UPWARD_CUTOFF {
        Trend::Upward
    } else if change_percent < DOWNWARD_CUTOFF {
        Trend::Downward
    } else {
        Trend::Stable
    }
}

pub fn classify_series(prices: &[f64]) -> Trend {
    match (prices.first(), prices.last()) {
        (Some(first), Some(last)) if prices.len() >= 2 => {
            classify_trend(percent_change(*first, *last))
        }
        _ => Trend::InsufficientData,
    }
}

/// 依月份平均價格找出高低點
pub fn seasonal_extremes(prices: &[PricePoint]) -> Option<Seasonality> {
    let mut by_month: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for point in prices {
        let entry = by_month.entry(point.date.month()).or_insert((0.0, 0));
        entry.0 += point.price;
        entry.1 += 1;
    }

    let mut best: Option<(u32, f64)> = None;
    let mut worst: Option<(u32, f64)> = None;
    for (month, (sum, count)) in by_month {
        let avg = sum / count as f64;
        if best.map_or(true, |(_, b)| avg > b) {
            best = Some((month, avg));
        }
        if worst.map_or(true, |(_, w)| avg < w) {
            worst = Some((month, avg));
        }
    }

    let month_name = |m: u32| {
        u8::try_from(m)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name().to_string())
    };

    Some(Seasonality {
        best_month: month_name(best?.0)?,
        worst_month: month_name(worst?.0)?,
    })
}

pub fn analyze_price_trends(prices: &[PricePoint]) -> MarketAnalysis {
    if prices.len() < 2 {
        return MarketAnalysis {
            current_price: prices.last().map(|p| p.price),
            average_price: prices.last().map(|p| p.price),
            trend: Trend::InsufficientData,
            change_percent: 0.0,
            history_summary: "Not enough price points to establish a trend.".to_string(),
            seasonality: "Insufficient data for seasonality.".to_string(),
            seasonal_extremes: None,
        };
    }

    let start_price = prices[0].price;
    let current_price = prices[prices.len() - 1].price;
    let change = percent_change(start_price, current_price);
    let average = prices.iter().map(|p| p.price).sum::<f64>() / prices.len() as f64;

    let extremes = seasonal_extremes(prices);
    let seasonality = match &extremes {
        Some(s) => format!(
            "Historically, prices peak in {} and bottom out in {}.",
            s.best_month, s.worst_month
        ),
        None => "Insufficient data for seasonality.".to_string(),
    };

    MarketAnalysis {
        current_price: Some(current_price),
        average_price: Some(round_to(average, 2)),
        trend: classify_trend(change),
        change_percent: round_to(change, 1),
        history_summary: format!("Started at ${}, ended at ${}", start_price, current_price),
        seasonality,
        seasonal_extremes: extremes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn point(year: i32, month: u32, price: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
            price,
        }
    }

    #[test]
    fn two_point_series_classify_as_documented() {
        assert_eq!(classify_series(&[100.0, 106.0]), Trend::Upward);
        assert_eq!(classify_series(&[100.0, 94.0]), Trend::Downward);
        assert_eq!(classify_series(&[100.0, 101.0]), Trend::Stable);
        assert_eq!(classify_series(&[100.0]), Trend::InsufficientData);
    }

    #[test]
    fn cutoffs_are_exclusive() {
        assert_eq!(classify_trend(5.0), Trend::Stable);
        assert_eq!(classify_trend(-5.0), Trend::Stable);
        assert_eq!(classify_trend(5.01), Trend::Upward);
    }

    #[test]
    fn zero_start_price_does_not_divide() {
        assert_eq!(percent_change(0.0, 12.0), 0.0);
    }

    #[test]
    fn analysis_reports_change_average_and_seasonality() {
        let prices = vec![
            point(2024, 1, 4.00),
            point(2024, 6, 5.00),
            point(2024, 10, 3.50),
            point(2025, 1, 4.50),
        ];
        let analysis = analyze_price_trends(&prices);

        assert_eq!(analysis.trend, Trend::Upward);
        assert_eq!(analysis.change_percent, 12.5);
        assert_eq!(analysis.current_price, Some(4.50));
        assert_eq!(analysis.average_price, Some(4.25));

        let extremes = analysis.seasonal_extremes.unwrap();
        assert_eq!(extremes.best_month, "June");
        assert_eq!(extremes.worst_month, "October");
        assert!(analysis.seasonality.contains("peak in June"));
    }

    #[test]
    fn unavailable_analysis_is_unknown() {
        let analysis = MarketAnalysis::unavailable();
        assert_eq!(analysis.trend, Trend::Unknown);
        assert!(!analysis.has_prices());
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["trend"], "Unknown");
        assert!(json["current_price"].is_null());
    }
}
