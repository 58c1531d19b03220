//! Reference data: birth cohorts and weight-for-age.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{NirsevimabError, NirsevimabResult};
use crate::interval::Interval;

/// Births in the cohort starting on `date`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BirthCohort {
    pub date: NaiveDate,
    pub births: f64,
}

impl BirthCohort {
    pub fn new(date: NaiveDate, births: f64) -> Self {
        Self { date, births }
    }
}

/// Share of infants who first exceed 5kg at `age` intervals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightForAge {
    pub age: u32,
    pub p_gt_5kg: f64,
    #[serde(default)]
    pub interval: Interval,
}

impl WeightForAge {
    pub fn new(age: u32, p_gt_5kg: f64, interval: Interval) -> Self {
        Self {
            age,
            p_gt_5kg,
            interval,
        }
    }
}

/// Total births, rejecting negative counts and an empty population.
pub fn total_births(births: &[BirthCohort]) -> NirsevimabResult<f64> {
    if let Some(bad) = births.iter().find(|c| !c.births.is_finite() || c.births < 0.0) {
        return Err(NirsevimabError::InvalidInput(format!(
            "cohort {} has {} births",
            bad.date, bad.births
        )));
    }
    let total: f64 = births.iter().map(|c| c.births).sum();
    if total <= 0.0 {
        return Err(NirsevimabError::InvalidInput("no births".into()));
    }
    Ok(total)
}

/// Weight rows must be expressed in the scenario's interval.
pub fn check_weight_interval(weights: &[WeightForAge], interval: Interval) -> NirsevimabResult<()> {
    match weights.iter().find(|w| w.interval != interval) {
        Some(w) => Err(NirsevimabError::InvalidInput(format!(
            "weight row for age {} uses {} intervals, scenario uses {}",
            w.age, w.interval, interval
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn totals_births() {
        let births = vec![
            BirthCohort::new(d(2024, 10, 1), 40.0),
            BirthCohort::new(d(2024, 11, 1), 60.0),
        ];
        assert_eq!(total_births(&births).unwrap(), 100.0);
    }

    #[test]
    fn rejects_negative_and_empty_births() {
        assert!(total_births(&[]).is_err());
        assert!(total_births(&[BirthCohort::new(d(2024, 10, 1), -1.0)]).is_err());
        assert!(total_births(&[BirthCohort::new(d(2024, 10, 1), 0.0)]).is_err());
    }

    #[test]
    fn weight_interval_must_match() {
        let weights = vec![
            WeightForAge::new(0, 0.5, Interval::Month),
            WeightForAge::new(1, 0.5, Interval::Week),
        ];
        assert!(check_weight_interval(&weights, Interval::Month).is_err());
        assert!(check_weight_interval(&weights[..1], Interval::Month).is_ok());
    }
}
