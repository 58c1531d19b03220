//! Population sizes keyed by [`PopulationKey`], and the partition operation.
//!
//! The tracked keys always partition the initial total: every partition
//! replaces one parent with one child per level of the resolved
//! characteristic, sized by that level's proportion.

use std::collections::HashMap;

use tracing::trace;

use crate::characteristic::CharacteristicSet;
use crate::config::PopulationConfig;
use crate::error::{PopulationError, PopulationResult, ResolutionSignal};
use crate::key::PopulationKey;
use crate::resolver::Resolver;

/// Mapping from population key to (non-negative) population size.
#[derive(Clone, Debug)]
pub struct PopulationStore {
    characteristics: CharacteristicSet,
    sizes: HashMap<PopulationKey, f64>,
    config: PopulationConfig,
    partitions: usize,
}

impl PopulationStore {
    /// Seed a store with one all-unresolved population of `size`.
    pub fn new(size: f64, characteristics: CharacteristicSet) -> PopulationResult<Self> {
        Self::with_config(size, characteristics, PopulationConfig::default())
    }

    pub fn with_config(
        size: f64,
        characteristics: CharacteristicSet,
        config: PopulationConfig,
    ) -> PopulationResult<Self> {
        config.validate()?;
        let mut store = Self {
            sizes: HashMap::new(),
            characteristics,
            config,
            partitions: 0,
        };
        let root = store.characteristics.unresolved_key();
        store.set_size(root, size)?;
        Ok(store)
    }

    pub fn characteristics(&self) -> &CharacteristicSet {
        &self.characteristics
    }

    pub fn config(&self) -> &PopulationConfig {
        &self.config
    }

    /// Insert or overwrite the size of a population.
    pub fn set_size(&mut self, key: PopulationKey, size: f64) -> PopulationResult<()> {
        if !size.is_finite() || size < 0.0 {
            return Err(PopulationError::InvalidSize(size));
        }
        if key.names() != self.characteristics.names() {
            return Err(PopulationError::InvalidKey(format!(
                "{} does not match the store's characteristics",
                key
            )));
        }
        self.sizes.insert(key, size);
        Ok(())
    }

    pub fn get_size(&self, key: &PopulationKey) -> PopulationResult<f64> {
        self.sizes
            .get(key)
            .copied()
            .ok_or_else(|| PopulationError::UnknownPopulation(key.to_string()))
    }

    pub fn delete_key(&mut self, key: &PopulationKey) -> PopulationResult<f64> {
        self.sizes
            .remove(key)
            .ok_or_else(|| PopulationError::UnknownPopulation(key.to_string()))
    }

    pub fn contains(&self, key: &PopulationKey) -> bool {
        self.sizes.contains_key(key)
    }

    /// Currently tracked keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &PopulationKey> + '_ {
        self.sizes.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PopulationKey, f64)> + '_ {
        self.sizes.iter().map(|(k, s)| (k, *s))
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    /// Sum of every tracked size; equal to the seed size at all times.
    pub fn total_size(&self) -> f64 {
        self.sizes.values().sum()
    }

    /// Total size of the tracked keys that refine `partial`.
    pub fn size_matching(&self, partial: &PopulationKey) -> f64 {
        self.iter()
            .filter(|(k, _)| k.refines(partial))
            .map(|(_, s)| s)
            .sum()
    }

    /// Number of partition calls made on this store.
    pub fn partition_count(&self) -> usize {
        self.partitions
    }

    /// Split `key` into one child per level of `characteristic`.
    ///
    /// Children are returned in the level order of the characteristic set.
    /// A single-level characteristic still yields one child. The store is
    /// left untouched if any precondition fails.
    pub fn partition(
        &mut self,
        key: &PopulationKey,
        characteristic: &str,
    ) -> PopulationResult<Vec<PopulationKey>> {
        let index = key
            .index_of(characteristic)
            .ok_or_else(|| PopulationError::UnknownCharacteristic(characteristic.to_string()))?;
        if key.is_resolved(characteristic) {
            return Err(PopulationError::AlreadyResolved {
                characteristic: characteristic.to_string(),
                population: key.to_string(),
            });
        }
        let parent_size = self.get_size(key)?;

        let children: Vec<(PopulationKey, f64)> = self
            .characteristics
            .table_at(index)
            .iter()
            .map(|(level, proportion)| {
                (key.assigned_at(index, level.clone()), proportion * parent_size)
            })
            .collect();

        self.delete_key(key)?;
        let mut keys = Vec::with_capacity(children.len());
        for (child, size) in children {
            self.sizes.insert(child.clone(), size);
            keys.push(child);
        }
        self.partitions += 1;

        trace!(
            population = %key,
            characteristic,
            children = keys.len(),
            "Partitioned population"
        );
        Ok(keys)
    }

    /// Partition every tracked key on every unresolved characteristic.
    ///
    /// This materializes the full cross-product up front. Mapping a function
    /// afterwards yields the same totals as lazy resolution, at the cost of
    /// splitting on characteristics the function may never read.
    pub fn expand_all(&mut self) -> PopulationResult<usize> {
        let mut pending: Vec<PopulationKey> = self.sizes.keys().cloned().collect();
        let mut leaves = 0;
        while let Some(key) = pending.pop() {
            match key.unresolved_names().next().map(str::to_string) {
                Some(name) => pending.extend(self.partition(&key, &name)?),
                None => leaves += 1,
            }
        }
        Ok(leaves)
    }

    /// Lazily evaluate `f` on every population, splitting on demand.
    ///
    /// See [`Resolver`] for the expansion rules.
    pub fn map<T, E, F>(&mut self, f: F) -> Resolver<'_, T, E, F>
    where
        F: FnMut(&PopulationKey, f64) -> Result<T, E>,
        E: ResolutionSignal + From<PopulationError>,
    {
        Resolver::new(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::characteristic::Level;

    fn store() -> PopulationStore {
        let set = CharacteristicSet::builder()
            .characteristic("risk_level", [("low", 0.5), ("high", 0.5)])
            .characteristic("age_group", [("infant", 0.1), ("child", 0.1), ("adult", 0.8)])
            .build()
            .unwrap();
        PopulationStore::new(100.0, set).unwrap()
    }

    #[test]
    fn seeded_with_single_unresolved_population() {
        let pm = store();
        assert_eq!(pm.len(), 1);
        let root = pm.keys().next().unwrap().clone();
        assert!(root.is_fully_unresolved());
        assert_eq!(pm.get_size(&root).unwrap(), 100.0);
    }

    #[test]
    fn partition_splits_by_proportion() {
        let mut pm = store();
        let root = pm.characteristics().unresolved_key();
        let children = pm.partition(&root, "risk_level").unwrap();

        assert_eq!(children.len(), 2);
        assert_eq!(children[0].get("risk_level").unwrap(), &Level::from("low"));
        assert_eq!(children[1].get("risk_level").unwrap(), &Level::from("high"));

        let low = root.with_assignment("risk_level", "low").unwrap();
        assert_eq!(pm.get_size(&low).unwrap(), 50.0);
        assert!(!pm.contains(&root));
        assert_eq!(pm.len(), 2);
        assert_eq!(pm.partition_count(), 1);
        assert!((pm.total_size() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn partition_already_resolved_fails() {
        let mut pm = store();
        let root = pm.characteristics().unresolved_key();
        let children = pm.partition(&root, "risk_level").unwrap();
        let err = pm.partition(&children[0], "risk_level").unwrap_err();
        assert!(matches!(err, PopulationError::AlreadyResolved { .. }));
        assert_eq!(pm.len(), 2);
    }

    #[test]
    fn partition_unknown_population_or_characteristic_fails() {
        let mut pm = store();
        let root = pm.characteristics().unresolved_key();
        let stray = root.with_assignment("risk_level", "low").unwrap();
        assert!(matches!(
            pm.partition(&stray, "age_group"),
            Err(PopulationError::UnknownPopulation(_))
        ));
        assert!(matches!(
            pm.partition(&root, "sex"),
            Err(PopulationError::UnknownCharacteristic(_))
        ));
        assert_eq!(pm.partition_count(), 0);
    }

    #[test]
    fn set_size_rejects_negative_and_foreign_keys() {
        let mut pm = store();
        let root = pm.characteristics().unresolved_key();
        assert!(matches!(
            pm.set_size(root.clone(), -1.0),
            Err(PopulationError::InvalidSize(_))
        ));
        assert!(matches!(
            pm.set_size(root, f64::NAN),
            Err(PopulationError::InvalidSize(_))
        ));

        let foreign = PopulationKey::from_characteristics(["sex"]).unwrap();
        assert!(matches!(
            pm.set_size(foreign, 1.0),
            Err(PopulationError::InvalidKey(_))
        ));
    }

    #[test]
    fn delete_and_get_unknown_fail() {
        let mut pm = store();
        let root = pm.characteristics().unresolved_key();
        assert_eq!(pm.delete_key(&root).unwrap(), 100.0);
        assert!(matches!(
            pm.get_size(&root),
            Err(PopulationError::UnknownPopulation(_))
        ));
        assert!(matches!(
            pm.delete_key(&root),
            Err(PopulationError::UnknownPopulation(_))
        ));
    }

    #[test]
    fn negative_seed_size_rejected() {
        let set = CharacteristicSet::builder()
            .characteristic("x", [(true, 1.0)])
            .build()
            .unwrap();
        assert!(matches!(
            PopulationStore::new(-5.0, set),
            Err(PopulationError::InvalidSize(_))
        ));
    }

    #[test]
    fn expand_all_materializes_cross_product() {
        let mut pm = store();
        assert_eq!(pm.expand_all().unwrap(), 6);
        assert_eq!(pm.len(), 6);
        assert!(pm.keys().all(PopulationKey::is_fully_resolved));
        assert!((pm.total_size() - 100.0).abs() < 1e-9);

        let low = pm
            .characteristics()
            .unresolved_key()
            .with_assignment("risk_level", "low")
            .unwrap();
        assert!((pm.size_matching(&low) - 50.0).abs() < 1e-9);
    }
}
