use crate::app::grants::{fallback_recommendations, GrantFinder, GrantMatch};
use crate::app::market::{MarketOutlook, MarketPredictor};
use crate::app::recommend::{CropAdvice, RecommendRequest, SoilClimateAdvisor};
use crate::domain::model::{FarmerProfile, LocationInput};
use crate::utils::error::{AdvisorError, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

/// 精靈的五個線性步驟
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Profile,
    SoilClimate,
    Markets,
    Grants,
    Report,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Profile,
        WizardStep::SoilClimate,
        WizardStep::Markets,
        WizardStep::Grants,
        WizardStep::Report,
    ];

    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn next(self) -> Option<WizardStep> {
        Self::ALL.get(self as usize + 1).copied()
    }

    pub fn previous(self) -> Option<WizardStep> {
        (self as usize).checked_sub(1).map(|i| Self::ALL[i])
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self {
            WizardStep::Profile => "Farmer Profile",
            WizardStep::SoilClimate => "Soil & Climate Analysis",
            WizardStep::Markets => "Market Prices & Trends",
            WizardStep::Grants => "Grants & Financial Support",
            WizardStep::Report => "Action Plan",
        };
        write!(f, "Step {}: {}", self.number(), title)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MarketResult {
    Outlook(Box<MarketOutlook>),
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct CropMarket {
    pub crop: String,
    pub result: MarketResult,
}

impl CropMarket {
    pub fn outlook(&self) -> Option<&MarketOutlook> {
        match &self.result {
            MarketResult::Outlook(o) => Some(o),
            MarketResult::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GrantResults {
    pub matches: Vec<GrantMatch>,
    /// True when the fixed recommendations replaced a failed search.
    pub fallback: bool,
}

/// Explicit state of one advisory run. Every step stores its result here.
#[derive(Debug, Clone, Serialize)]
pub struct AdvisorySession {
    step: WizardStep,
    created_at: DateTime<Local>,
    profile: Option<FarmerProfile>,
    soil: Option<CropAdvice>,
    markets: Option<Vec<CropMarket>>,
    grants: Option<GrantResults>,
}

impl Default for AdvisorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvisorySession {
    pub fn new() -> Self {
        Self {
            step: WizardStep::Profile,
            created_at: Local::now(),
            profile: None,
            soil: None,
            markets: None,
            grants: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn profile(&self) -> Option<&FarmerProfile> {
        self.profile.as_ref()
    }

    pub fn soil(&self) -> Option<&CropAdvice> {
        self.soil.as_ref()
    }

    pub fn markets(&self) -> &[CropMarket] {
        self.markets.as_deref().unwrap_or_default()
    }

    pub fn grants(&self) -> Option<&GrantResults> {
        self.grants.as_ref()
    }

    pub fn recommended_crops(&self) -> Vec<String> {
        self.soil.as_ref().map(CropAdvice::crop_names).unwrap_or_default()
    }

    fn expect_step(&self, expected: WizardStep) -> Result<()> {
        if self.step != expected {
            return Err(AdvisorError::WorkflowError {
                message: format!("expected to be at {}, currently at {}", expected, self.step),
            });
        }
        Ok(())
    }

    fn require_profile(&self) -> Result<&FarmerProfile> {
        self.profile.as_ref().ok_or_else(|| AdvisorError::WorkflowError {
            message: "no farmer profile has been submitted".to_string(),
        })
    }

    fn clear_after(&mut self, step: WizardStep) {
        if step < WizardStep::SoilClimate {
            self.soil = None;
        }
        if step < WizardStep::Markets {
            self.markets = None;
        }
        if step < WizardStep::Grants {
            self.grants = None;
        }
    }

    fn has_result(&self, step: WizardStep) -> bool {
        match step {
            WizardStep::Profile => self.profile.is_some(),
            WizardStep::SoilClimate => self.soil.is_some(),
            WizardStep::Markets => self.markets.is_some(),
            WizardStep::Grants => self.grants.is_some(),
            WizardStep::Report => true,
        }
    }

    /// Step 1: validates and stores the profile, then moves to step 2.
    pub fn submit_profile(&mut self, profile: FarmerProfile) -> Result<()> {
        self.expect_step(WizardStep::Profile)?;

        match &profile.location {
            None => {
                return Err(AdvisorError::InvalidRequest {
                    message: "Please provide location information".to_string(),
                })
            }
            Some(LocationInput::Named { location_name }) if location_name.trim().is_empty() => {
                return Err(AdvisorError::InvalidRequest {
                    message: "Please provide location information".to_string(),
                })
            }
            Some(_) => {}
        }
        if profile.farm_size_acres == 0 {
            return Err(AdvisorError::InvalidRequest {
                message: "Please provide valid farm size".to_string(),
            });
        }

        tracing::info!("✅ Profile saved for {}", profile.location_label());
        self.profile = Some(profile);
        self.clear_after(WizardStep::Profile);
        self.step = WizardStep::SoilClimate;
        Ok(())
    }

    /// Step 2
    pub async fn run_soil_climate(&mut self, advisor: &SoilClimateAdvisor) -> Result<&CropAdvice> {
        self.expect_step(WizardStep::SoilClimate)?;
        let request = RecommendRequest::for_profile(self.require_profile()?);

        let advice = advisor.recommend(&request).await?;
        self.clear_after(WizardStep::SoilClimate);
        Ok(self.soil.insert(advice))
    }

    /// Step 3: every recommended crop is analysed; a failing crop is recorded, not fatal.
    pub async fn run_markets(&mut self, predictor: &MarketPredictor) -> Result<&[CropMarket]> {
        self.expect_step(WizardStep::Markets)?;
        let crops = self.recommended_crops();
        if crops.is_empty() {
            return Err(AdvisorError::WorkflowError {
                message: "no recommended crops to analyse".to_string(),
            });
        }

        let mut results = Vec::with_capacity(crops.len());
        for (i, crop) in crops.iter().enumerate() {
            tracing::info!("🤖 Analysing market for {} ({}/{})", crop, i + 1, crops.len());
            let result = match predictor.predict(crop).await {
                Ok(outlook) => MarketResult::Outlook(Box::new(outlook)),
                Err(e) => {
                    tracing::warn!("⚠️ Market analysis for {} failed: {}", crop, e);
                    MarketResult::Failed {
                        error: e.user_friendly_message(),
                    }
                }
            };
            results.push(CropMarket {
                crop: crop.clone(),
                result,
            });
        }

        self.clear_after(WizardStep::Markets);
        Ok(self.markets.insert(results))
    }

    /// Step 4. Without a finder, or when the search fails, fixed recommendations are used.
    pub async fn run_grants(&mut self, finder: Option<&GrantFinder>) -> Result<&GrantResults> {
        self.expect_step(WizardStep::Grants)?;
        let profile = self.require_profile()?.clone();
        let crops = self.recommended_crops();

        let search = match finder {
            Some(f) => f.find_for_profile(&profile, &crops).await,
            None => Err(AdvisorError::IndexError {
                message: "grant catalog is not loaded".to_string(),
            }),
        };

        let results = match search {
            Ok(matches) => {
                tracing::info!("✅ Found {} relevant grant opportunities", matches.len());
                GrantResults {
                    matches,
                    fallback: false,
                }
            }
            Err(e) => {
                tracing::warn!("⚠️ Grant search failed ({}), showing basic recommendations", e);
                GrantResults {
                    matches: fallback_recommendations(&profile),
                    fallback: true,
                }
            }
        };

        Ok(self.grants.insert(results))
    }

    /// Moves forward once the current step has produced its result.
    pub fn advance(&mut self) -> Result<WizardStep> {
        if !self.has_result(self.step) {
            return Err(AdvisorError::WorkflowError {
                message: format!("{} has not been completed", self.step),
            });
        }
        let next = self.step.next().ok_or_else(|| AdvisorError::WorkflowError {
            message: "already at the final step".to_string(),
        })?;
        self.step = next;
        Ok(next)
    }

    /// Moves one step back; results are kept until the step is re-run.
    pub fn back(&mut self) -> WizardStep {
        if let Some(prev) = self.step.previous() {
            self.step = prev;
        }
        self.step
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
