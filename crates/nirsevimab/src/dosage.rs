//! Drug dosages, quantities, and dated demand.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{NirsevimabError, NirsevimabResult};

pub const NIRSEVIMAB: &str = "nirsevimab";

/// A drug at a fixed dosage, e.g. nirsevimab 50mg.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DrugDosage {
    pub drug: String,
    pub dosage: String,
}

impl DrugDosage {
    pub fn new(drug: impl Into<String>, dosage: impl Into<String>) -> Self {
        Self {
            drug: drug.into(),
            dosage: dosage.into(),
        }
    }

    pub fn nirsevimab_50mg() -> Self {
        Self::new(NIRSEVIMAB, "50mg")
    }

    pub fn nirsevimab_100mg() -> Self {
        Self::new(NIRSEVIMAB, "100mg")
    }
}

impl fmt::Display for DrugDosage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.drug, self.dosage)
    }
}

/// A non-negative number of doses of one dosage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrugQuantity {
    drug_dosage: DrugDosage,
    n_doses: f64,
}

impl DrugQuantity {
    pub fn new(drug_dosage: DrugDosage, n_doses: f64) -> NirsevimabResult<Self> {
        if !n_doses.is_finite() || n_doses < 0.0 {
            return Err(NirsevimabError::NegativeQuantity(n_doses));
        }
        Ok(Self {
            drug_dosage,
            n_doses,
        })
    }

    pub fn drug_dosage(&self) -> &DrugDosage {
        &self.drug_dosage
    }

    pub fn n_doses(&self) -> f64 {
        self.n_doses
    }

    /// Sum two quantities of the same dosage.
    pub fn checked_add(&self, other: &DrugQuantity) -> NirsevimabResult<DrugQuantity> {
        if self.drug_dosage != other.drug_dosage {
            return Err(NirsevimabError::DosageMismatch {
                left: self.drug_dosage.to_string(),
                right: other.drug_dosage.to_string(),
            });
        }
        Self::new(self.drug_dosage.clone(), self.n_doses + other.n_doses)
    }
}

/// Doses of one dosage needed on a given date.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DrugDemand {
    pub drug_dosage: DrugDosage,
    pub n_doses: f64,
    pub time: NaiveDate,
}

impl DrugDemand {
    pub fn new(drug_dosage: DrugDosage, n_doses: f64, time: NaiveDate) -> Self {
        Self {
            drug_dosage,
            n_doses,
            time,
        }
    }

    pub fn quantity(&self) -> NirsevimabResult<DrugQuantity> {
        DrugQuantity::new(self.drug_dosage.clone(), self.n_doses)
    }
}
