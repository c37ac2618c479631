pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

pub use app::{AdvisorServices, AdvisorySession, GrantFinder, MarketPredictor, SoilClimateAdvisor};
pub use config::cli::LocalStorage;
pub use config::toml_config::AppConfig;

#[cfg(feature = "cli")]
pub use config::Cli;

pub use utils::error::{AdvisorError, Result};
