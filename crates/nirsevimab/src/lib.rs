//! # drugdemand-nirsevimab
//!
//! Seasonal nirsevimab demand for infant birth cohorts.
//!
//! A scenario ([`ScenarioParams`]) plus reference data (monthly or weekly
//! [`BirthCohort`]s and [`WeightForAge`] proportions) is turned into a
//! lazily stratified population. Each leaf population either produces one
//! [`DrugDemand`] (dosage, number of doses, date) or none.
//!
//! ```text
//!   ScenarioParams ─┐
//!   BirthCohort[] ──┼──► NirsevimabCalculator::new
//!   WeightForAge[] ─┘            │
//!                                ▼
//!                PopulationStore::map(calculate_demand)
//!                                │
//!                                ▼
//!                 DemandRow[] ──► season_totals / demand_by_time
//! ```
//!
//! ## Eligibility
//!
//! - Infants under 8 months on their immunization date get one dose:
//!   100mg if they already weigh over 5kg, 50mg otherwise.
//! - High-risk infants aged 8 to 18 months get two 100mg doses.
//! - Unwilling families, births after the season, and immunizations
//!   pushed past the season end produce no demand.

#![deny(unsafe_code)]

pub mod calculator;
pub mod dosage;
pub mod error;
pub mod interval;
pub mod params;
pub mod reference;
pub mod row;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use calculator::{
    NirsevimabCalculator, AGE_AT_5KG, BASELINE_RISK, BIRTH_DATE, DELAY, FIRST_SEASON_MAX_MONTHS,
    HIGH_RISK, RISK_LEVEL, SECOND_SEASON_MAX_MONTHS, WILL_RECEIVE,
};
pub use dosage::{DrugDemand, DrugDosage, DrugQuantity, NIRSEVIMAB};
pub use error::{NirsevimabError, NirsevimabResult};
pub use interval::Interval;
pub use params::{validate_delays, ScenarioParams, DELAY_TOLERANCE};
pub use reference::{check_weight_interval, total_births, BirthCohort, WeightForAge};
pub use row::{demand_by_time, season_totals, DemandRow, RESULT_COLUMNS};
