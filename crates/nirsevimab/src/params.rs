//! Scenario parameters.
//!
//! A scenario fixes uptake, the share of high-risk infants, the RSV season
//! window, the cohort interval, and the distribution of dosing delays.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{NirsevimabError, NirsevimabResult};
use crate::interval::Interval;

/// Tolerance when checking that delay proportions sum to 1.
pub const DELAY_TOLERANCE: f64 = 1e-6;

/// Parameters of one demand scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    /// Optional scenario label, carried into result rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    /// Share of each cohort that will receive the drug.
    pub uptake: f64,
    /// Share of each cohort at high risk.
    pub p_high_risk: f64,
    pub season_start: NaiveDate,
    pub season_end: NaiveDate,
    /// Unit of cohorts, delays and weight-for-age ages.
    #[serde(default)]
    pub interval: Interval,
    /// `{delay in intervals: proportion}`; absent means no delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delays: Option<BTreeMap<u32, f64>>,
    /// Growth chart the weight table was drawn from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_chart: Option<String>,
}

impl ScenarioParams {
    pub fn new(
        uptake: f64,
        p_high_risk: f64,
        season_start: NaiveDate,
        season_end: NaiveDate,
    ) -> Self {
        Self {
            scenario: None,
            uptake,
            p_high_risk,
            season_start,
            season_end,
            interval: Interval::default(),
            delays: None,
            growth_chart: None,
        }
    }

    pub fn with_scenario(mut self, name: impl Into<String>) -> Self {
        self.scenario = Some(name.into());
        self
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_delays(mut self, delays: impl IntoIterator<Item = (u32, f64)>) -> Self {
        self.delays = Some(delays.into_iter().collect());
        self
    }

    pub fn with_growth_chart(mut self, chart: impl Into<String>) -> Self {
        self.growth_chart = Some(chart.into());
        self
    }

    /// Parse and validate a scenario from JSON.
    pub fn from_json(json: &str) -> NirsevimabResult<Self> {
        let params: Self = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> NirsevimabResult<()> {
        check_share("uptake", self.uptake)?;
        check_share("p_high_risk", self.p_high_risk)?;
        if self.season_start > self.season_end {
            return Err(NirsevimabError::InvalidScenario(format!(
                "season starts {} after it ends {}",
                self.season_start, self.season_end
            )));
        }
        if let Some(delays) = &self.delays {
            validate_delays(delays)?;
        }
        Ok(())
    }

    /// Delay distribution, defaulting to everyone at zero delay.
    pub fn delay_levels(&self) -> Vec<(u32, f64)> {
        match &self.delays {
            Some(delays) => delays.iter().map(|(d, p)| (*d, *p)).collect(),
            None => vec![(0, 1.0)],
        }
    }

    /// Parameters as `name -> text` columns for result rows.
    pub fn columns(&self) -> BTreeMap<String, String> {
        let mut columns = BTreeMap::new();
        columns.insert("uptake".to_string(), self.uptake.to_string());
        columns.insert("p_high_risk".to_string(), self.p_high_risk.to_string());
        columns.insert("season_start".to_string(), self.season_start.to_string());
        columns.insert("season_end".to_string(), self.season_end.to_string());
        columns.insert("interval".to_string(), self.interval.to_string());
        if let Some(name) = &self.scenario {
            columns.insert("scenario".to_string(), name.clone());
        }
        if let Some(delays) = &self.delays {
            let entries: Vec<String> = delays.iter().map(|(d, p)| format!("{}: {}", d, p)).collect();
            columns.insert("delays".to_string(), format!("{{{}}}", entries.join(", ")));
        }
        if let Some(chart) = &self.growth_chart {
            columns.insert("growth_chart".to_string(), chart.clone());
        }
        columns
    }
}

fn check_share(name: &str, value: f64) -> NirsevimabResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(NirsevimabError::InvalidScenario(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

/// Check a `{delay: proportion}` table: non-empty, non-negative, summing to 1.
pub fn validate_delays(delays: &BTreeMap<u32, f64>) -> NirsevimabResult<()> {
    if delays.is_empty() {
        return Err(NirsevimabError::InvalidScenario("no delays given".into()));
    }
    if let Some((delay, p)) = delays.iter().find(|(_, p)| !p.is_finite() || **p < 0.0) {
        return Err(NirsevimabError::InvalidScenario(format!(
            "delay {} has proportion {}",
            delay, p
        )));
    }
    let total: f64 = delays.values().sum();
    if (total - 1.0).abs() > DELAY_TOLERANCE {
        return Err(NirsevimabError::InvalidScenario(format!(
            "delay proportions sum to {}",
            total
        )));
    }
    Ok(())
}
