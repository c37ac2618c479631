use serde::{Deserialize, Serialize};
use std::fmt;

/// Average distance below which the local catalog alone is trusted.
pub const GOOD_DISTANCE: f32 = 1.0;
/// Individual neighbours at or beyond this distance are dropped from local results.
pub const RELEVANCE_DISTANCE: f32 = 1.2;
/// Average distance at or beyond which local results are ignored.
pub const POOR_DISTANCE: f32 = 1.5;

/// Distance reported when the index returned nothing.
pub const NO_RESULTS_DISTANCE: f32 = 999.0;

pub const RECENCY_KEYWORDS: [&str; 10] = [
    "latest",
    "recent",
    "new",
    "current",
    "2025",
    "2026",
    "updated",
    "changes",
    "announcement",
    "news",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    LocalOnly,
    WebOnly,
    Hybrid,
}

impl SearchStrategy {
    pub fn uses_web(self) -> bool {
        matches!(self, SearchStrategy::WebOnly | SearchStrategy::Hybrid)
    }

    pub fn badge(self) -> &'static str {
        match self {
            SearchStrategy::LocalOnly => "📁 Local Database",
            SearchStrategy::WebOnly => "🌐 Web Search",
            SearchStrategy::Hybrid => "🔄 Local + Web",
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchStrategy::LocalOnly => "local_only",
            SearchStrategy::WebOnly => "web_only",
            SearchStrategy::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

pub fn needs_live_results(query: &str) -> bool {
    let query = query.to_lowercase();
    RECENCY_KEYWORDS.iter().any(|keyword| query.contains(keyword))
}

/// Pure over (keyword match, average distance). NaN counts as poor.
pub fn select_strategy(needs_web: bool, avg_distance: f32) -> SearchStrategy {
    if avg_distance.is_nan() || avg_distance >= POOR_DISTANCE {
        SearchStrategy::WebOnly
    } else if avg_distance < GOOD_DISTANCE && !needs_web {
        SearchStrategy::LocalOnly
    } else {
        SearchStrategy::Hybrid
    }
}

pub fn decide_strategy(query: &str, avg_distance: f32) -> SearchStrategy {
    select_strategy(needs_live_results(query), avg_distance)
}
