pub mod analysis;
pub mod catalog;
pub mod checklist;
pub mod index;
pub mod scoring;
pub mod soil;
pub mod strategy;
pub mod synthetic;

pub use crate::domain::model::{FarmerProfile, GrantProgram, PricePoint, SoilTexture};
pub use crate::domain::ports::Storage;
pub use crate::utils::error::Result;
