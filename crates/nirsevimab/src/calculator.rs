//! Nirsevimab demand over stratified birth cohorts.
//!
//! The population is described by five characteristics: birth cohort,
//! willingness to receive, risk level, age at reaching 5kg, and dosing
//! delay. [`NirsevimabCalculator::calculate_demand`] reads them lazily, so a
//! cohort that is unwilling or born after the season is never split on
//! weight or risk.

use chrono::NaiveDate;
use tracing::info;

use drugdemand_population::{
    CharacteristicSet, Level, PopulationConfig, PopulationKey, PopulationStore,
};

use crate::dosage::{DrugDemand, DrugDosage};
use crate::error::{NirsevimabError, NirsevimabResult};
use crate::interval::Interval;
use crate::params::ScenarioParams;
use crate::reference::{check_weight_interval, total_births, BirthCohort, WeightForAge};
use crate::row::DemandRow;

pub const BIRTH_DATE: &str = "birth_date";
pub const WILL_RECEIVE: &str = "will_receive";
pub const RISK_LEVEL: &str = "risk_level";
pub const AGE_AT_5KG: &str = "age_at_5kg";
pub const DELAY: &str = "delay";

pub const HIGH_RISK: &str = "high";
pub const BASELINE_RISK: &str = "baseline";

/// Infants younger than this (in months) qualify regardless of risk.
pub const FIRST_SEASON_MAX_MONTHS: i64 = 8;
/// High-risk infants younger than this (in months) get a second-season dose.
pub const SECOND_SEASON_MAX_MONTHS: i64 = 19;

/// Runs one scenario and holds its demand rows.
#[derive(Clone, Debug)]
pub struct NirsevimabCalculator {
    params: ScenarioParams,
    total_births: f64,
    populations: usize,
    rows: Vec<DemandRow>,
}

impl NirsevimabCalculator {
    pub fn new(
        params: ScenarioParams,
        births: &[BirthCohort],
        weights: &[WeightForAge],
    ) -> NirsevimabResult<Self> {
        Self::with_config(params, births, weights, PopulationConfig::default())
    }

    pub fn with_config(
        params: ScenarioParams,
        births: &[BirthCohort],
        weights: &[WeightForAge],
        config: PopulationConfig,
    ) -> NirsevimabResult<Self> {
        params.validate()?;
        check_weight_interval(weights, params.interval)?;
        let total = total_births(births)?;
        let characteristics = Self::characteristics(&params, births, weights, &config)?;

        let mut store = PopulationStore::with_config(total, characteristics, config)?;
        let events: Vec<(PopulationKey, Option<DrugDemand>)> = store
            .map(|key, size| Self::calculate_demand(key, size, &params))
            .collect::<NirsevimabResult<_>>()?;

        let mut rows = Vec::new();
        for (key, demand) in events {
            if let Some(demand) = demand {
                let size = store.get_size(&key)?;
                rows.push(DemandRow::new(&key, demand, size));
            }
        }

        let total_doses: f64 = rows.iter().map(|r| r.n_doses).sum();
        info!(
            scenario = params.scenario.as_deref().unwrap_or("unnamed"),
            births = total,
            populations = store.len(),
            partitions = store.partition_count(),
            rows = rows.len(),
            total_doses,
            "Calculated nirsevimab demand"
        );

        Ok(Self {
            params,
            total_births: total,
            populations: store.len(),
            rows,
        })
    }

    /// Characteristic set for a scenario and its reference data.
    pub fn characteristics(
        params: &ScenarioParams,
        births: &[BirthCohort],
        weights: &[WeightForAge],
        config: &PopulationConfig,
    ) -> NirsevimabResult<CharacteristicSet> {
        let total = total_births(births)?;
        let set = CharacteristicSet::builder()
            .with_config(config)
            .characteristic(
                BIRTH_DATE,
                births.iter().map(|c| (c.date, c.births / total)),
            )
            .characteristic(
                WILL_RECEIVE,
                [(true, params.uptake), (false, 1.0 - params.uptake)],
            )
            .characteristic(
                RISK_LEVEL,
                [
                    (HIGH_RISK, params.p_high_risk),
                    (BASELINE_RISK, 1.0 - params.p_high_risk),
                ],
            )
            .characteristic(AGE_AT_5KG, weights.iter().map(|w| (w.age, w.p_gt_5kg)))
            .characteristic(DELAY, params.delay_levels())
            .build()?;
        Ok(set)
    }

    /// Amount and timing of demand for one population, if any.
    ///
    /// Characteristics are read only as the eligibility rule needs them;
    /// an unresolved read returns the resolution signal.
    pub fn calculate_demand(
        key: &PopulationKey,
        size: f64,
        params: &ScenarioParams,
    ) -> NirsevimabResult<Option<DrugDemand>> {
        if size == 0.0 {
            return Ok(None);
        }
        if !bool_level(key, WILL_RECEIVE)? {
            return Ok(None);
        }

        let birth_date = date_level(key, BIRTH_DATE)?;
        let eligibility_date = if birth_date < params.season_start {
            params.season_start
        } else if birth_date <= params.season_end {
            birth_date
        } else {
            return Ok(None);
        };

        let delay = int_level(key, DELAY)?;
        let delay = u32::try_from(delay).map_err(|_| {
            NirsevimabError::InvalidScenario(format!("delay must be non-negative, got {}", delay))
        })?;
        let immunization_date = params
            .interval
            .offset(eligibility_date, delay)
            .ok_or_else(|| {
                NirsevimabError::InvalidScenario(format!(
                    "delay of {} {}s from {} is out of range",
                    delay, params.interval, eligibility_date
                ))
            })?;
        if immunization_date > params.season_end {
            return Ok(None);
        }

        // eligibility is by age in months even when cohorts are weekly
        let age_months = Interval::Month.age_between(birth_date, immunization_date);
        let age = params.interval.age_between(birth_date, immunization_date);
        let over_5kg = int_level(key, AGE_AT_5KG)? <= age;

        let demand = |dosage: DrugDosage, n_doses: f64| {
            Some(DrugDemand::new(dosage, n_doses, immunization_date))
        };
        if (0..FIRST_SEASON_MAX_MONTHS).contains(&age_months) {
            if over_5kg {
                Ok(demand(DrugDosage::nirsevimab_100mg(), size))
            } else {
                Ok(demand(DrugDosage::nirsevimab_50mg(), size))
            }
        } else if (FIRST_SEASON_MAX_MONTHS..SECOND_SEASON_MAX_MONTHS).contains(&age_months)
            && text_level(key, RISK_LEVEL)? == HIGH_RISK
        {
            Ok(demand(DrugDosage::nirsevimab_100mg(), 2.0 * size))
        } else {
            Ok(None)
        }
    }

    pub fn params(&self) -> &ScenarioParams {
        &self.params
    }

    pub fn total_births(&self) -> f64 {
        self.total_births
    }

    /// Populations tracked by the store when resolution finished.
    pub fn populations(&self) -> usize {
        self.populations
    }

    /// One row per population with demand.
    pub fn rows(&self) -> &[DemandRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<DemandRow> {
        self.rows
    }

    /// Rows with the scenario parameters appended as columns.
    pub fn rows_with_params(&self) -> NirsevimabResult<Vec<DemandRow>> {
        self.rows
            .iter()
            .cloned()
            .map(|row| row.with_params(&self.params))
            .collect()
    }
}

fn level_type(name: &str, expected: &'static str, found: &Level) -> NirsevimabError {
    NirsevimabError::LevelType {
        characteristic: name.to_string(),
        expected,
        found: found.kind(),
    }
}

fn bool_level(key: &PopulationKey, name: &str) -> NirsevimabResult<bool> {
    let level = key.get(name)?;
    level.as_bool().ok_or_else(|| level_type(name, "bool", level))
}

fn int_level(key: &PopulationKey, name: &str) -> NirsevimabResult<i64> {
    let level = key.get(name)?;
    level.as_int().ok_or_else(|| level_type(name, "int", level))
}

fn date_level(key: &PopulationKey, name: &str) -> NirsevimabResult<NaiveDate> {
    let level = key.get(name)?;
    level.as_date().ok_or_else(|| level_type(name, "date", level))
}

fn text_level<'k>(key: &'k PopulationKey, name: &str) -> NirsevimabResult<&'k str> {
    let level = key.get(name)?;
    level.as_text().ok_or_else(|| level_type(name, "text", level))
}
