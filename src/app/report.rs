use crate::app::session::AdvisorySession;
use crate::core::checklist::{application_checklist, checklist_filename};
use crate::core::scoring::MatchBand;
use crate::domain::model::{FarmerProfile, PricePoint};
use crate::domain::ports::Storage;
use crate::utils::error::{AdvisorError, Result};
use std::collections::HashSet;
use std::fmt::{self, Write as _};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

const TOP_FUNDING_OPTIONS: usize = 3;

fn na<T: ToString>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

/// 最終行動方案 (Markdown)
pub fn action_plan(session: &AdvisorySession) -> Result<String> {
    let profile = session.profile().ok_or_else(|| AdvisorError::WorkflowError {
        message: "cannot build a plan without a farmer profile".to_string(),
    })?;

    let mut out = String::new();
    write_plan(&mut out, session, profile).map_err(|e| AdvisorError::ProcessingError {
        message: format!("failed to render action plan: {}", e),
    })?;
    Ok(out)
}

fn write_plan(out: &mut String, session: &AdvisorySession, profile: &FarmerProfile) -> fmt::Result {
    let soil = session.soil();
    let markets = session.markets();
    let grants = session.grants().map(|g| g.matches.as_slice()).unwrap_or_default();
    let crops = session.recommended_crops();

    writeln!(out, "# 📋 Your Personalized Farming Action Plan")?;
    writeln!(
        out,
        "_Generated {}_",
        session.created_at().format("%B %d, %Y at %H:%M:%S")
    )?;
    writeln!(out)?;

    writeln!(out, "## Executive Summary")?;
    writeln!(out)?;
    writeln!(out, "### 👨‍🌾 Farm Profile")?;
    writeln!(out, "- **Location:** {}", profile.location_label())?;
    writeln!(out, "- **Farm Size:** {} acres", profile.farm_size_acres)?;
    writeln!(out, "- **Experience:** {}", profile.experience)?;
    writeln!(out, "- **Risk Tolerance:** {}", profile.risk_tolerance)?;
    writeln!(out, "- **Budget:** {}", profile.budget)?;
    writeln!(out)?;

    writeln!(out, "### 🌱 Analysis Results")?;
    let env = soil.map(|s| &s.environmental_summary);
    writeln!(out, "- **Soil Type:** {}", na(env.map(|e| e.soil_type)))?;
    writeln!(
        out,
        "- **Temperature:** {}",
        na(env.and_then(|e| e.temperature).map(|t| format!("{:.1}°C", t)))
    )?;
    writeln!(out, "- **Crops Recommended:** {}", crops.len())?;
    writeln!(out, "- **Market Analyses:** {}", markets.len())?;
    writeln!(out)?;

    writeln!(out, "### 💰 Funding Opportunities")?;
    writeln!(out, "- **Grants Found:** {}", grants.len())?;
    writeln!(
        out,
        "- **Best Match:** {}",
        na(grants.first().map(|g| format!("{}%", g.match_score)))
    )?;
    if session.grants().map(|g| g.fallback).unwrap_or(false) {
        writeln!(out, "- _Grant search was unavailable; showing basic recommendations._")?;
    }
    writeln!(out)?;

    writeln!(out, "## 🎯 #1 Recommended Action Plan")?;
    writeln!(out)?;
    match (crops.first(), soil.and_then(|s| s.recommendations.first())) {
        (Some(top_crop), Some(rec)) => {
            writeln!(out, "### 🌾 Recommended Crop: {}", top_crop)?;
            writeln!(out, "- **Why:** {}", rec.reason)?;
            writeln!(out, "- **Risk:** {}", rec.risk)?;
            writeln!(out)?;

            writeln!(out, "### 💰 Market Outlook")?;
            match markets
                .iter()
                .find(|m| &m.crop == top_crop)
                .and_then(|m| m.outlook())
            {
                Some(outlook) => {
                    let a = &outlook.analysis;
                    writeln!(out, "- **Current Price:** {}", na(a.current_price.map(|p| format!("${}", p))))?;
                    writeln!(out, "- **Trend:** {} ({}%)", a.trend, a.change_percent)?;
                    writeln!(out, "- **Action:** {}", na(outlook.prediction.action()))?;
                    writeln!(out, "- **Data Source:** {}", outlook.data_source)?;
                }
                None => writeln!(out, "- Market outlook unavailable for {}", top_crop)?,
            }
        }
        _ => writeln!(out, "No crop recommendation is available yet.")?,
    }
    writeln!(out)?;

    writeln!(out, "## 🏛️ Top Funding Options")?;
    writeln!(out)?;
    if grants.is_empty() {
        writeln!(out, "No matching programs found.")?;
    }
    for (i, g) in grants.iter().take(TOP_FUNDING_OPTIONS).enumerate() {
        let p = &g.program;
        writeln!(
            out,
            "{}. **{}** ({}) - {}% {}",
            i + 1,
            p.program_name,
            p.agency,
            g.match_score,
            MatchBand::for_score(g.match_score).label()
        )?;
        writeln!(out, "   - Funding: {}", p.funding_amount)?;
        writeln!(out, "   - Deadline: {}", p.application_deadlines)?;
        writeln!(out, "   - Apply: {}", p.official_url)?;
    }

    let failed: Vec<&str> = markets
        .iter()
        .filter(|m| m.outlook().is_none())
        .map(|m| m.crop.as_str())
        .collect();
    if !failed.is_empty() {
        writeln!(out)?;
        writeln!(out, "_Market analysis failed for: {}_", failed.join(", "))?;
    }
    Ok(())
}

/// date,price
pub fn price_csv(points: &[PricePoint]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["date", "price"])?;
    for point in points {
        writer.write_record([point.date.to_string(), format!("{:.2}", point.price)])?;
    }
    writer
        .into_inner()
        .map_err(|e| AdvisorError::ProcessingError {
            message: format!("failed to finish price table: {}", e),
        })
}

fn file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "crop".to_string()
    } else {
        stem
    }
}

/// Zip entry names must be distinct; a repeated `<dir>/<stem><ext>` becomes `<stem>_2`, `<stem>_3`, ...
fn unique_entry(used: &mut HashSet<String>, dir: &str, stem: &str, ext: &str) -> String {
    let mut name = format!("{}/{}{}", dir, stem, ext);
    let mut n = 2;
    while !used.insert(name.clone()) {
        name = format!("{}/{}_{}{}", dir, stem, n, ext);
        n += 1;
    }
    name
}

/// Zip archive: plan.md, prices/<crop>.csv, checklists/<program>.md, session.json
pub fn advisory_bundle(session: &AdvisorySession) -> Result<Vec<u8>> {
    let plan = action_plan(session)?;

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let mut used = HashSet::new();

    zip.start_file::<_, ()>("plan.md", FileOptions::default())?;
    zip.write_all(plan.as_bytes())?;

    for market in session.markets() {
        if let Some(outlook) = market.outlook() {
            if outlook.price_data.is_empty() {
                continue;
            }
            let name = unique_entry(&mut used, "prices", &file_stem(&market.crop), ".csv");
            zip.start_file::<_, ()>(name, FileOptions::default())?;
            zip.write_all(&price_csv(&outlook.price_data)?)?;
        }
    }

    if let Some(grants) = session.grants() {
        for g in &grants.matches {
            let file = checklist_filename(&g.program);
            let stem = file.strip_suffix(".md").unwrap_or(&file);
            let name = unique_entry(&mut used, "checklists", stem, ".md");
            zip.start_file::<_, ()>(name, FileOptions::default())?;
            zip.write_all(application_checklist(&g.program).as_bytes())?;
        }
    }

    zip.start_file::<_, ()>("session.json", FileOptions::default())?;
    zip.write_all(serde_json::to_string_pretty(session)?.as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

pub async fn write_bundle<S: Storage>(
    storage: &S,
    path: &str,
    session: &AdvisorySession,
) -> Result<usize> {
    let data = advisory_bundle(session)?;
    tracing::debug!("Writing advisory bundle ({} bytes) to {}", data.len(), path);
    storage.write_file(path, &data).await?;
    tracing::info!("📦 Advisory bundle saved to {}", path);
    Ok(data.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FarmerProfile, LocationInput};
    use chrono::NaiveDate;

    #[test]
    fn test_price_csv_layout() {
        let points = vec![
            PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                price: 4.5,
            },
            PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                price: 4.25,
            },
        ];
        let csv = String::from_utf8(price_csv(&points).unwrap()).unwrap();
        assert_eq!(csv, "date,price\n2024-01-01,4.50\n2024-02-01,4.25\n");
    }

    #[test]
    fn test_plan_requires_profile() {
        assert!(action_plan(&AdvisorySession::new()).is_err());
    }

    #[test]
    fn test_plan_with_profile_only() {
        let mut session = AdvisorySession::new();
        session
            .submit_profile(FarmerProfile {
                location: Some(LocationInput::Named {
                    location_name: "Iowa, USA".to_string(),
                }),
                farm_size_acres: 40,
                ..Default::default()
            })
            .unwrap();

        let plan = action_plan(&session).unwrap();
        assert!(plan.contains("- **Location:** Iowa, USA"));
        assert!(plan.contains("- **Farm Size:** 40 acres"));
        assert!(plan.contains("- **Soil Type:** N/A"));
        assert!(plan.contains("No crop recommendation is available yet."));
        assert!(plan.contains("No matching programs found."));
    }

    #[test]
    fn test_unique_entry_suffixes_repeats() {
        let mut used = HashSet::new();
        assert_eq!(unique_entry(&mut used, "prices", "sweet_corn", ".csv"), "prices/sweet_corn.csv");
        assert_eq!(unique_entry(&mut used, "prices", "sweet_corn", ".csv"), "prices/sweet_corn_2.csv");
        assert_eq!(unique_entry(&mut used, "prices", "sweet_corn", ".csv"), "prices/sweet_corn_3.csv");
        assert_eq!(
            unique_entry(&mut used, "checklists", "sweet_corn", ".md"),
            "checklists/sweet_corn.md"
        );
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Sweet Corn"), "sweet_corn");
        assert_eq!(file_stem(" "), "crop");
    }
}
