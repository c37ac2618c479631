pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use args::{Cli, Command, GrantsCommand, LocationArgs, ProfileArgs};

#[cfg(feature = "cli")]
mod args {
    use crate::domain::model::{
        BudgetRange, ExperienceLevel, FarmerProfile, LocationInput, RiskTolerance,
    };
    use crate::utils::error::{AdvisorError, Result};
    use clap::{Args, Parser, Subcommand};
    use std::path::PathBuf;

    #[derive(Debug, Parser)]
    #[command(name = "farm-advisor")]
    #[command(about = "Agricultural advisory service: crops, markets and USDA grants")]
    #[command(version)]
    pub struct Cli {
        /// TOML configuration file
        #[arg(long, global = true, default_value = super::toml_config::DEFAULT_CONFIG_FILE)]
        pub config: PathBuf,

        #[arg(short, long, global = true, help = "Enable verbose output")]
        pub verbose: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Subcommand)]
    pub enum Command {
        /// Run the HTTP service (/recommend, /market_predict)
        Serve {
            #[arg(long)]
            addr: Option<String>,
            #[arg(long)]
            json_logs: bool,
        },
        /// Crop recommendation for a location
        Recommend {
            #[command(flatten)]
            location: LocationArgs,
        },
        /// Market prediction for a commodity
        Market { commodity: String },
        /// Grant finder
        Grants {
            #[command(subcommand)]
            command: GrantsCommand,
        },
        /// Run the five-step wizard and write an advisory bundle
        Plan {
            #[command(flatten)]
            profile: ProfileArgs,

            #[arg(long, default_value = "./output")]
            output_path: String,

            #[arg(long, default_value = "advisory_bundle.zip")]
            bundle_name: String,
        },
    }

    #[derive(Debug, Subcommand)]
    pub enum GrantsCommand {
        /// Ask a question about USDA programs
        Ask {
            question: String,
            #[arg(long)]
            beginning_farmer: bool,
            #[arg(long)]
            veteran: bool,
            #[arg(long)]
            state: Option<String>,
            #[arg(long)]
            farm_size: Option<u32>,
        },
        /// Print the application checklist of a catalog program
        Checklist { program_id: String },
        /// Embed the catalog and write the vector index
        BuildIndex,
    }

    #[derive(Debug, Clone, Args)]
    pub struct LocationArgs {
        /// Place name, e.g. "Ames, Iowa"
        #[arg(long)]
        pub location: Option<String>,
        #[arg(long, allow_negative_numbers = true, requires = "lon")]
        pub lat: Option<f64>,
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        pub lon: Option<f64>,
    }

    impl LocationArgs {
        pub fn to_input(&self) -> Option<LocationInput> {
            if let Some(name) = self.location.as_ref().filter(|n| !n.trim().is_empty()) {
                return Some(LocationInput::Named {
                    location_name: name.clone(),
                });
            }
            match (self.lat, self.lon) {
                (Some(latitude), Some(longitude)) => Some(LocationInput::Coordinates {
                    latitude,
                    longitude,
                }),
                _ => None,
            }
        }
    }

    #[derive(Debug, Clone, Args)]
    pub struct ProfileArgs {
        #[command(flatten)]
        pub location: LocationArgs,

        #[arg(long, default_value = "100")]
        pub farm_size: u32,

        /// beginner, intermediate, experienced, expert
        #[arg(long, default_value = "intermediate")]
        pub experience: ExperienceLevel,

        /// very-low, low, medium, high, very-high
        #[arg(long, default_value = "medium")]
        pub risk: RiskTolerance,

        /// under-5k, 5k-to-20k, 20k-to-50k, over-50k
        #[arg(long, default_value = "under-5k")]
        pub budget: BudgetRange,

        #[arg(long)]
        pub veteran: bool,

        #[arg(long)]
        pub state: Option<String>,
    }

    impl ProfileArgs {
        pub fn to_profile(&self) -> Result<FarmerProfile> {
            let location = self.location.to_input().ok_or_else(|| AdvisorError::InvalidRequest {
                message: "pass --location or both --lat and --lon".to_string(),
            })?;
            Ok(FarmerProfile {
                location: Some(location),
                farm_size_acres: self.farm_size,
                experience: self.experience,
                risk_tolerance: self.risk,
                budget: self.budget,
                beginning_farmer: self.experience == ExperienceLevel::Beginner,
                veteran: self.veteran,
                state: self.state.clone(),
            })
        }
    }

}
