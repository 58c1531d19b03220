//! Immutable identifiers for partial and fully resolved subpopulations.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::characteristic::Level;
use crate::error::{PopulationError, PopulationResult};

/// Text used for an unresolved slot when a key is flattened to attributes.
pub const UNRESOLVED_LABEL: &str = "unresolved";

/// The value of one characteristic within a key.
///
/// `Unresolved` compares equal to every other `Unresolved`, whatever
/// characteristic it sits under.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    Unresolved,
    Resolved(Level),
}

impl Slot {
    pub fn level(&self) -> Option<&Level> {
        match self {
            Slot::Resolved(level) => Some(level),
            Slot::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Slot::Resolved(_))
    }
}

/// Identity of a (possibly partial) subpopulation.
///
/// Holds one [`Slot`] per characteristic, in the canonical order of the
/// characteristic set the key was derived from. Keys have value semantics:
/// [`with_assignment`](Self::with_assignment) returns a new key.
#[derive(Clone, Debug)]
pub struct PopulationKey {
    names: Arc<[String]>,
    slots: Vec<Slot>,
}

impl PopulationKey {
    pub(crate) fn unresolved(names: Arc<[String]>) -> Self {
        let slots = vec![Slot::Unresolved; names.len()];
        Self { names, slots }
    }

    /// All-unresolved key over the given characteristic names.
    pub fn from_characteristics<I, S>(names: I) -> PopulationResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        for pair in names.windows(2) {
            if pair[0] == pair[1] {
                return Err(PopulationError::InvalidKey(format!(
                    "duplicate characteristic '{}'",
                    pair[0]
                )));
            }
        }
        Ok(Self::unresolved(names.into()))
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).ok()
    }

    /// Strict read: fails with `UnresolvedCharacteristic` if `name` is not
    /// yet resolved. Evaluation functions read through this.
    pub fn get(&self, name: &str) -> PopulationResult<&Level> {
        match self.slot(name) {
            Some(Slot::Resolved(level)) => Ok(level),
            Some(Slot::Unresolved) => Err(PopulationError::UnresolvedCharacteristic(
                name.to_string(),
            )),
            None => Err(PopulationError::UnknownCharacteristic(name.to_string())),
        }
    }

    /// Safe read: `None` when `name` is unresolved or not part of the key.
    pub fn try_get(&self, name: &str) -> Option<&Level> {
        self.slot(name).and_then(Slot::level)
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.index_of(name).map(|i| &self.slots[i])
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.slot(name).is_some_and(Slot::is_resolved)
    }

    /// A copy of this key with `name` assigned to `level`.
    pub fn with_assignment(&self, name: &str, level: impl Into<Level>) -> PopulationResult<Self> {
        let index = self
            .index_of(name)
            .ok_or_else(|| PopulationError::UnknownCharacteristic(name.to_string()))?;
        Ok(self.assigned_at(index, level.into()))
    }

    pub(crate) fn assigned_at(&self, index: usize, level: Level) -> Self {
        let mut slots = self.slots.clone();
        slots[index] = Slot::Resolved(level);
        Self {
            names: Arc::clone(&self.names),
            slots,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// `(name, level)` pairs in canonical order; `None` for unresolved.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Level>)> + '_ {
        self.names
            .iter()
            .zip(self.slots.iter())
            .map(|(n, s)| (n.as_str(), s.level()))
    }

    pub fn resolved_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_resolved()).count()
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.slots.iter().all(Slot::is_resolved)
    }

    pub fn is_fully_unresolved(&self) -> bool {
        self.slots.iter().all(|s| !s.is_resolved())
    }

    pub fn unresolved_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().filter(|(_, l)| l.is_none()).map(|(n, _)| n)
    }

    /// Does this key agree with `partial` on every characteristic `partial`
    /// has resolved?
    pub fn refines(&self, partial: &PopulationKey) -> bool {
        self.names == partial.names
            && self
                .slots
                .iter()
                .zip(partial.slots.iter())
                .all(|(mine, theirs)| !theirs.is_resolved() || mine == theirs)
    }

    /// Flatten to `name -> text`, with unresolved slots as `"unresolved"`.
    pub fn attributes(&self) -> BTreeMap<String, String> {
        self.iter()
            .map(|(n, l)| {
                let value = l.map_or_else(|| UNRESOLVED_LABEL.to_string(), Level::to_string);
                (n.to_string(), value)
            })
            .collect()
    }
}

impl PartialEq for PopulationKey {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.names, &other.names) || self.names == other.names)
            && self.slots == other.slots
    }
}

impl Eq for PopulationKey {}

impl Hash for PopulationKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // names are shared by every key in a store
        self.slots.hash(state);
    }
}

impl PartialOrd for PopulationKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PopulationKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.names
            .cmp(&other.names)
            .then_with(|| self.slots.cmp(&other.slots))
    }
}

impl fmt::Display for PopulationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, level)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match level {
                Some(level) => write!(f, "{}={}", name, level)?,
                None => write!(f, "{}=?", name)?,
            }
        }
        write!(f, "}}")
    }
}

impl Serialize for PopulationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, level) in self.iter() {
            map.serialize_entry(name, &level)?;
        }
        map.end()
    }
}
