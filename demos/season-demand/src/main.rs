//! Seasonal nirsevimab demand demo.
//!
//! Runs the weekly and monthly variants of three uptake scenarios over
//! synthetic birth and growth data and prints season totals by dosage.
//!
//! `RUST_LOG=debug` shows per-scenario resolution statistics.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{Days, Months, NaiveDate};
use colored::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use drugdemand_nirsevimab::{
    season_totals, BirthCohort, Interval, NirsevimabCalculator, ScenarioParams, WeightForAge,
};

const SCENARIOS: &str = r#"[
    {"scenario": "highest_100", "growth_chart": "WHO", "p_high_risk": 0.04, "delays": {"0": 0.8, "8": 0.2}, "interval": "week"},
    {"scenario": "middle_100",  "growth_chart": "WHO", "p_high_risk": 0.03, "delays": {"0": 0.8, "4": 0.2}, "interval": "week"},
    {"scenario": "lowest_100",  "growth_chart": "CDC", "p_high_risk": 0.02, "delays": {"0": 1.0}, "interval": "week"},
    {"scenario": "highest_100", "growth_chart": "WHO", "p_high_risk": 0.04, "delays": {"0": 0.8, "2": 0.2}, "interval": "month"},
    {"scenario": "middle_100",  "growth_chart": "WHO", "p_high_risk": 0.03, "delays": {"0": 0.8, "1": 0.2}, "interval": "month"},
    {"scenario": "lowest_100",  "growth_chart": "CDC", "p_high_risk": 0.02, "delays": {"0": 1.0}, "interval": "month"}
]"#;

/// Fields shared by every embedded scenario.
const UPTAKE: f64 = 0.8;
const SEASON_START: &str = "2024-10-01";
const SEASON_END: &str = "2025-03-31";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let scenarios = embedded_scenarios()?;
    info!(scenarios = scenarios.len(), "Loaded scenarios");

    println!(
        "{}",
        "╔══════════════════════════════════════════════════════════════════╗".cyan()
    );
    println!(
        "{}",
        "║          Nirsevimab Demand, RSV Season 2024/2025                 ║".cyan()
    );
    println!(
        "{}",
        "╚══════════════════════════════════════════════════════════════════╝".cyan()
    );
    println!();
    println!(
        "{:<14} {:<6} {:>10} {:>10} {:>10} {:>7}",
        "scenario".bold(),
        "unit".bold(),
        "50mg".bold(),
        "100mg".bold(),
        "total".bold(),
        "%50mg".bold()
    );

    for params in scenarios {
        let births = synthetic_births(params.interval)?;
        let weights = synthetic_weights(params.interval, params.growth_chart.as_deref());
        let label = params.scenario.clone().unwrap_or_else(|| "unnamed".into());
        let interval = params.interval;

        let calc = NirsevimabCalculator::new(params, &births, &weights)
            .with_context(|| format!("running scenario {} ({})", label, interval))?;
        print_totals(&label, interval, &season_totals(calc.rows()));
    }

    Ok(())
}

fn embedded_scenarios() -> Result<Vec<ScenarioParams>> {
    let mut values: Vec<serde_json::Value> = serde_json::from_str(SCENARIOS)?;
    for value in &mut values {
        let fields = value
            .as_object_mut()
            .context("scenario entries must be objects")?;
        fields.insert("uptake".into(), UPTAKE.into());
        fields.insert("season_start".into(), SEASON_START.into());
        fields.insert("season_end".into(), SEASON_END.into());
    }
    values
        .into_iter()
        .map(|value| Ok(ScenarioParams::from_json(&value.to_string())?))
        .collect()
}

// ── Synthetic reference data ────────────────────────────────────────────

/// Flat births from March 2023 through the season end.
fn synthetic_births(interval: Interval) -> Result<Vec<BirthCohort>> {
    let first = NaiveDate::from_ymd_opt(2023, 3, 6).context("invalid start date")?;
    let last = NaiveDate::parse_from_str(SEASON_END, "%Y-%m-%d")?;
    let mut cohorts = Vec::new();
    let mut date = first;
    while date <= last {
        let births = match interval {
            Interval::Month => 3_000.0,
            Interval::Week => 700.0,
        };
        cohorts.push(BirthCohort::new(date, births));
        date = match interval {
            Interval::Month => date.checked_add_months(Months::new(1)),
            Interval::Week => date.checked_add_days(Days::new(7)),
        }
        .context("birth cohort date out of range")?;
    }
    Ok(cohorts)
}

/// Age at first exceeding 5kg. CDC charts put infants there a little later.
fn synthetic_weights(interval: Interval, chart: Option<&str>) -> Vec<WeightForAge> {
    let cdc = chart == Some("CDC");
    let table: &[(u32, f64)] = match (interval, cdc) {
        (Interval::Week, false) => &[(0, 0.0), (2, 0.1), (4, 0.3), (6, 0.3), (8, 0.2), (10, 0.1)],
        (Interval::Week, true) => &[(0, 0.0), (2, 0.05), (4, 0.25), (6, 0.3), (8, 0.25), (10, 0.15)],
        (Interval::Month, false) => &[(0, 0.0), (1, 0.4), (2, 0.5), (3, 0.1)],
        (Interval::Month, true) => &[(0, 0.0), (1, 0.3), (2, 0.5), (3, 0.2)],
    };
    table
        .iter()
        .map(|(age, p)| WeightForAge::new(*age, *p, interval))
        .collect()
}

fn print_totals(label: &str, interval: Interval, totals: &BTreeMap<String, f64>) {
    let low = totals.get("50mg").copied().unwrap_or_default();
    let high = totals.get("100mg").copied().unwrap_or_default();
    let total = low + high;
    let share = if total > 0.0 { low / total } else { 0.0 };
    println!(
        "{:<14} {:<6} {:>10.0} {:>10.0} {:>10} {:>7.3}",
        label,
        interval.as_str(),
        low,
        high,
        format!("{:.0}", total).green(),
        share
    );
}
