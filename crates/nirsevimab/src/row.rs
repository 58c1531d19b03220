//! Flat result rows and seasonal summaries.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use drugdemand_population::PopulationKey;

use crate::dosage::DrugDemand;
use crate::error::{NirsevimabError, NirsevimabResult};
use crate::params::ScenarioParams;

/// Columns every row carries besides population attributes.
pub const RESULT_COLUMNS: [&str; 4] = ["drug_dosage", "n_doses", "time", "size"];

/// One demand event: population attributes, the demand, and the population size.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DemandRow {
    /// Characteristic name to level text; `"unresolved"` where never split.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
    pub drug_dosage: String,
    pub n_doses: f64,
    pub time: NaiveDate,
    pub size: f64,
    /// Scenario parameter columns, once appended.
    #[serde(flatten)]
    pub parameters: BTreeMap<String, String>,
}

impl DemandRow {
    pub fn new(key: &PopulationKey, demand: DrugDemand, size: f64) -> Self {
        Self {
            attributes: key.attributes(),
            drug_dosage: demand.drug_dosage.dosage,
            n_doses: demand.n_doses,
            time: demand.time,
            size,
            parameters: BTreeMap::new(),
        }
    }

    /// Append scenario parameters as columns.
    ///
    /// Fails if a parameter shares its name with an attribute or result column.
    pub fn with_params(mut self, params: &ScenarioParams) -> NirsevimabResult<Self> {
        for (name, value) in params.columns() {
            if self.attributes.contains_key(&name) || RESULT_COLUMNS.contains(&name.as_str()) {
                return Err(NirsevimabError::ColumnCollision(name));
            }
            self.parameters.insert(name, value);
        }
        Ok(self)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Doses per dosage summed over the whole season.
pub fn season_totals(rows: &[DemandRow]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for row in rows {
        *totals.entry(row.drug_dosage.clone()).or_insert(0.0) += row.n_doses;
    }
    totals
}

/// Doses per `(date, dosage)`.
pub fn demand_by_time(rows: &[DemandRow]) -> BTreeMap<(NaiveDate, String), f64> {
    let mut totals = BTreeMap::new();
    for row in rows {
        *totals
            .entry((row.time, row.drug_dosage.clone()))
            .or_insert(0.0) += row.n_doses;
    }
    totals
}
