//! Characteristics, their levels, and the validated set of level proportions.
//!
//! A [`CharacteristicSet`] is built once and then only read. It fixes a
//! canonical (lexicographic) order of characteristic names, which every
//! [`PopulationKey`] derived from it shares.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{PopulationConfig, DEFAULT_PROPORTION_TOLERANCE};
use crate::error::{PopulationError, PopulationResult};
use crate::key::PopulationKey;

// ── Level ───────────────────────────────────────────────────────────────

/// One concrete value a characteristic can take.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Level {
    Bool(bool),
    Int(i64),
    Date(NaiveDate),
    Text(String),
}

impl Level {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Level::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Level::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Level::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Level::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Level::Bool(_) => "bool",
            Level::Int(_) => "int",
            Level::Date(_) => "date",
            Level::Text(_) => "text",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Bool(b) => write!(f, "{}", b),
            Level::Int(n) => write!(f, "{}", n),
            Level::Date(d) => write!(f, "{}", d),
            Level::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Level {
    fn from(b: bool) -> Self {
        Level::Bool(b)
    }
}

impl From<i64> for Level {
    fn from(n: i64) -> Self {
        Level::Int(n)
    }
}

impl From<i32> for Level {
    fn from(n: i32) -> Self {
        Level::Int(i64::from(n))
    }
}

impl From<u32> for Level {
    fn from(n: u32) -> Self {
        Level::Int(i64::from(n))
    }
}

impl From<NaiveDate> for Level {
    fn from(d: NaiveDate) -> Self {
        Level::Date(d)
    }
}

impl From<&str> for Level {
    fn from(s: &str) -> Self {
        Level::Text(s.to_string())
    }
}

impl From<String> for Level {
    fn from(s: String) -> Self {
        Level::Text(s)
    }
}

// ── Characteristic set ──────────────────────────────────────────────────

/// Level/proportion table of a single characteristic, in declaration order.
pub type LevelTable = Vec<(Level, f64)>;

/// Validated mapping from characteristic name to its level proportions.
#[derive(Clone, Debug)]
pub struct CharacteristicSet {
    /// Characteristic names in canonical order; shared with every key.
    names: Arc<[String]>,
    /// Level tables, indexed like `names`.
    tables: Vec<LevelTable>,
}

impl CharacteristicSet {
    pub fn builder() -> CharacteristicSetBuilder {
        CharacteristicSetBuilder::default()
    }

    /// Build from `(name, levels)` pairs with the default tolerance.
    pub fn new<I, N>(characteristics: I) -> PopulationResult<Self>
    where
        I: IntoIterator<Item = (N, LevelTable)>,
        N: Into<String>,
    {
        let mut builder = Self::builder();
        for (name, table) in characteristics {
            builder = builder.characteristic(name, table);
        }
        builder.build()
    }

    /// Names in canonical order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Position of `name` in the canonical order.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).ok()
    }

    /// The `(level, proportion)` table of a characteristic.
    pub fn proportions_for(&self, name: &str) -> PopulationResult<&[(Level, f64)]> {
        self.index_of(name)
            .map(|i| self.tables[i].as_slice())
            .ok_or_else(|| PopulationError::UnknownCharacteristic(name.to_string()))
    }

    /// The levels of a characteristic, in declaration order.
    pub fn levels_of(&self, name: &str) -> PopulationResult<Vec<&Level>> {
        Ok(self.proportions_for(name)?.iter().map(|(l, _)| l).collect())
    }

    /// Proportion of one level, if both the characteristic and level exist.
    pub fn proportion_of(&self, name: &str, level: &Level) -> Option<f64> {
        self.proportions_for(name)
            .ok()?
            .iter()
            .find(|(l, _)| l == level)
            .map(|(_, p)| *p)
    }

    /// Key for the full, undivided population: every characteristic unresolved.
    pub fn unresolved_key(&self) -> PopulationKey {
        PopulationKey::unresolved(Arc::clone(&self.names))
    }

    pub(crate) fn table_at(&self, index: usize) -> &[(Level, f64)] {
        &self.tables[index]
    }
}

/// Builder that validates every characteristic on [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct CharacteristicSetBuilder {
    tolerance: f64,
    entries: Vec<(String, LevelTable)>,
}

impl Default for CharacteristicSetBuilder {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_PROPORTION_TOLERANCE,
            entries: Vec::new(),
        }
    }
}

impl CharacteristicSetBuilder {
    /// Declare a characteristic with its `(level, proportion)` pairs.
    pub fn characteristic<N, I, L>(mut self, name: N, levels: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (L, f64)>,
        L: Into<Level>,
    {
        let table = levels.into_iter().map(|(l, p)| (l.into(), p)).collect();
        self.entries.push((name.into(), table));
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_config(self, config: &PopulationConfig) -> Self {
        self.tolerance(config.proportion_tolerance)
    }

    pub fn build(mut self) -> PopulationResult<CharacteristicSet> {
        PopulationConfig::default()
            .with_proportion_tolerance(self.tolerance)
            .validate()?;

        self.entries.sort_by(|a, b| a.0.cmp(&b.0));

        for pair in self.entries.windows(2) {
            if pair[0].0 == pair[1].0 {
                return Err(PopulationError::InvalidKey(format!(
                    "duplicate characteristic '{}'",
                    pair[0].0
                )));
            }
        }

        for (name, table) in &self.entries {
            validate_name(name)?;
            validate_table(name, table, self.tolerance)?;
        }

        let (names, tables): (Vec<String>, Vec<LevelTable>) = self.entries.into_iter().unzip();

        Ok(CharacteristicSet {
            names: names.into(),
            tables,
        })
    }
}

/// Characteristic names must look like identifiers.
fn validate_name(name: &str) -> PopulationResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(PopulationError::InvalidKey(format!(
            "characteristic name '{}' is not an identifier",
            name
        )))
    }
}

fn validate_table(name: &str, table: &[(Level, f64)], tolerance: f64) -> PopulationResult<()> {
    let invalid = |reason: String| PopulationError::InvalidProportions {
        characteristic: name.to_string(),
        reason,
    };

    if table.is_empty() {
        return Err(invalid("no levels declared".into()));
    }

    let mut seen = HashSet::with_capacity(table.len());
    for (level, proportion) in table {
        if !seen.insert(level) {
            return Err(PopulationError::InvalidKey(format!(
                "duplicate level '{}' for characteristic '{}'",
                level, name
            )));
        }
        if !proportion.is_finite() || *proportion < 0.0 {
            return Err(invalid(format!(
                "level '{}' has proportion {}",
                level, proportion
            )));
        }
    }

    let total: f64 = table.iter().map(|(_, p)| p).sum();
    if (total - 1.0).abs() > tolerance {
        return Err(invalid(format!("proportions sum to {}", total)));
    }
    Ok(())
}
