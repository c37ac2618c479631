use crate::domain::model::{FarmerProfile, GrantProgram};
use serde::Serialize;

pub const BASE_SCORE: u32 = 50;
pub const MAX_SCORE: u32 = 100;
pub const SMALL_FARM_ACRES: u32 = 50;

/// 加分條件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRule {
    BeginningFarmer,
    Veteran,
    SmallFarm,
    OperatingExpenses,
    YearRound,
}

impl ScoreRule {
    pub const ALL: [ScoreRule; 5] = [
        ScoreRule::BeginningFarmer,
        ScoreRule::Veteran,
        ScoreRule::SmallFarm,
        ScoreRule::OperatingExpenses,
        ScoreRule::YearRound,
    ];

    pub fn bonus(self) -> u32 {
        match self {
            ScoreRule::BeginningFarmer => 30,
            ScoreRule::Veteran => 20,
            ScoreRule::SmallFarm => 15,
            ScoreRule::OperatingExpenses => 10,
            ScoreRule::YearRound => 10,
        }
    }

    fn is_satisfied(self, program: &ProgramText, profile: &FarmerProfile) -> bool {
        match self {
            ScoreRule::BeginningFarmer => {
                profile.is_beginning()
                    && (program.eligibility.contains("beginning")
                        || program.summary.contains("new farmer"))
            }
            ScoreRule::Veteran => profile.veteran && program.eligibility.contains("veteran"),
            ScoreRule::SmallFarm => {
                profile.farm_size_acres < SMALL_FARM_ACRES && program.summary.contains("small")
            }
            ScoreRule::OperatingExpenses => {
                program.summary.contains("operating") || program.summary.contains("expense")
            }
            ScoreRule::YearRound => program.year_round,
        }
    }
}

/// Lower-cased views of the fields the rules inspect.
struct ProgramText {
    eligibility: String,
    summary: String,
    year_round: bool,
}

impl ProgramText {
    fn new(program: &GrantProgram) -> Self {
        Self {
            eligibility: program.eligibility.join(" ").to_lowercase(),
            summary: program.summary.to_lowercase(),
            year_round: program.year_round_application,
        }
    }
}

pub fn satisfied_rules(program: &GrantProgram, profile: &FarmerProfile) -> Vec<ScoreRule> {
    let text = ProgramText::new(program);
    ScoreRule::ALL
        .into_iter()
        .filter(|rule| rule.is_satisfied(&text, profile))
        .collect()
}

pub fn score_from_rules(rules: &[ScoreRule]) -> u32 {
    let raw = rules
        .iter()
        .fold(BASE_SCORE, |acc, rule| acc.saturating_add(rule.bonus()));
    raw.min(MAX_SCORE)
}

/// 0-100 fit of a program for a profile. Without a profile only the baseline applies.
pub fn match_score(program: &GrantProgram, profile: Option<&FarmerProfile>) -> u32 {
    match profile {
        Some(profile) => score_from_rules(&satisfied_rules(program, profile)),
        None => BASE_SCORE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchBand {
    #[serde(rename = "Excellent Match")]
    Excellent,
    #[serde(rename = "Great Match")]
    Great,
    #[serde(rename = "Good Match")]
    Good,
    #[serde(rename = "Possible Match")]
    Possible,
}

impl MatchBand {
    pub fn for_score(score: u32) -> Self {
        match score {
            85.. => MatchBand::Excellent,
            70..=84 => MatchBand::Great,
            50..=69 => MatchBand::Good,
            _ => MatchBand::Possible,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MatchBand::Excellent => "Excellent Match",
            MatchBand::Great => "Great Match",
            MatchBand::Good => "Good Match",
            MatchBand::Possible => "Possible Match",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ExperienceLevel;

    fn program(eligibility: &[&str], summary: &str, year_round: bool) -> GrantProgram {
        GrantProgram {
            program_id: "test".to_string(),
            program_name: "Test Program".to_string(),
            agency: "USDA".to_string(),
            program_type: "Loan".to_string(),
            summary: summary.to_string(),
            eligibility: eligibility.iter().map(|s| s.to_string()).collect(),
            funding_amount: "N/A".to_string(),
            application_deadlines: "N/A".to_string(),
            application_method: "N/A".to_string(),
            required_documents: vec![],
            contact_info: "N/A".to_string(),
            official_url: "N/A".to_string(),
            year_round_application: year_round,
        }
    }

    #[test]
    fn no_profile_returns_baseline() {
        let p = program(&["Beginning farmers"], "operating costs", true);
        assert_eq!(match_score(&p, None), BASE_SCORE);
    }

    #[test]
    fn beginning_and_veteran_bonuses_apply() {
        let p = program(&["Beginning farmers", "Veterans welcome"], "", false);
        let profile = FarmerProfile {
            beginning_farmer: true,
            veteran: true,
            ..Default::default()
        };
        assert_eq!(match_score(&p, Some(&profile)), 100);

        let veteran_only = FarmerProfile {
            veteran: true,
            ..Default::default()
        };
        assert_eq!(match_score(&p, Some(&veteran_only)), 70);
    }

    #[test]
    fn wizard_profile_gets_size_and_operating_bonuses() {
        let p = program(
            &["Family farms"],
            "Loans for small operations covering operating expenses for a new farmer",
            true,
        );
        let profile = FarmerProfile {
            farm_size_acres: 20,
            experience: ExperienceLevel::Beginner,
            ..Default::default()
        };
        let rules = satisfied_rules(&p, &profile);
        assert_eq!(
            rules,
            vec![
                ScoreRule::BeginningFarmer,
                ScoreRule::SmallFarm,
                ScoreRule::OperatingExpenses,
                ScoreRule::YearRound
            ]
        );
        assert_eq!(match_score(&p, Some(&profile)), 100);
    }

    #[test]
    fn score_is_monotonic_and_capped_over_every_rule_subset() {
        let subsets: Vec<Vec<ScoreRule>> = (0u32..(1 << ScoreRule::ALL.len()))
            .map(|mask| {
                ScoreRule::ALL
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, r)| *r)
                    .collect()
            })
            .collect();

        for subset in &subsets {
            let score = score_from_rules(subset);
            assert!(score >= BASE_SCORE && score <= MAX_SCORE);

            for extra in ScoreRule::ALL {
                if subset.contains(&extra) {
                    continue;
                }
                let mut superset = subset.clone();
                superset.push(extra);
                assert!(score_from_rules(&superset) >= score);
            }
        }
    }

    #[test]
    fn bands_follow_thresholds() {
        assert_eq!(MatchBand::for_score(100), MatchBand::Excellent);
        assert_eq!(MatchBand::for_score(80), MatchBand::Great);
        assert_eq!(MatchBand::for_score(50), MatchBand::Good);
        assert_eq!(MatchBand::for_score(49).label(), "Possible Match");
    }
}
