//! Demand-driven resolution of a population store.
//!
//! The [`Resolver`] evaluates a caller-supplied function on each tracked
//! population. When the function reads a characteristic that is not yet
//! resolved (strict [`PopulationKey::get`]), the population is partitioned
//! on it and each child is evaluated in turn. Characteristics that no
//! evaluation reads are never split.
//!
//! Every partition resolves one more characteristic on each child, so no
//! population is split more times than there are characteristics and the
//! work queue always drains.

use std::collections::VecDeque;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::config::TraversalOrder;
use crate::error::{PopulationError, ResolutionSignal};
use crate::key::PopulationKey;
use crate::store::PopulationStore;

/// Outcome of one evaluation, with the expansion request made explicit.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution<T> {
    /// The function produced a value for this population.
    Resolved(T),
    /// The function needs this characteristic split first.
    NeedsCharacteristic(String),
}

impl<T> Resolution<T> {
    /// Separate the expansion signal from real failures.
    pub fn classify<E: ResolutionSignal>(outcome: Result<T, E>) -> Result<Self, E> {
        match outcome {
            Ok(value) => Ok(Resolution::Resolved(value)),
            Err(err) => match err.requested_characteristic() {
                Some(name) => Ok(Resolution::NeedsCharacteristic(name.to_string())),
                None => Err(err),
            },
        }
    }
}

/// Pull-based iterator over `(leaf key, result)` pairs.
///
/// Created by [`PopulationStore::map`]. Leaf entries stay in the store, so
/// their sizes can be queried once the resolver is dropped. The first
/// non-signal error is yielded as an item and ends the iteration.
pub struct Resolver<'s, T, E, F> {
    store: &'s mut PopulationStore,
    f: F,
    pending: VecDeque<PopulationKey>,
    order: TraversalOrder,
    evaluations: usize,
    leaves: usize,
    done: bool,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<'s, T, E, F> Resolver<'s, T, E, F>
where
    F: FnMut(&PopulationKey, f64) -> Result<T, E>,
    E: ResolutionSignal + From<PopulationError>,
{
    pub(crate) fn new(store: &'s mut PopulationStore, f: F) -> Self {
        let pending: VecDeque<PopulationKey> = store.keys().cloned().collect();
        let order = store.config().traversal;
        Self {
            store,
            f,
            pending,
            order,
            evaluations: 0,
            leaves: 0,
            done: false,
            _marker: PhantomData,
        }
    }

    /// Number of times the evaluation function has been called.
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Number of leaves yielded so far.
    pub fn leaves(&self) -> usize {
        self.leaves
    }

    /// Populations still waiting for evaluation.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn store(&self) -> &PopulationStore {
        self.store
    }

    fn schedule(&mut self, children: Vec<PopulationKey>) {
        match self.order {
            TraversalOrder::BreadthFirst => {
                for child in children.into_iter().rev() {
                    self.pending.push_front(child);
                }
            }
            TraversalOrder::DepthFirst => {
                for child in children.into_iter().rev() {
                    self.pending.push_back(child);
                }
            }
        }
    }

    fn fail(&mut self, err: E) -> Option<Result<(PopulationKey, T), E>> {
        self.done = true;
        self.pending.clear();
        Some(Err(err))
    }
}

impl<'s, T, E, F> Iterator for Resolver<'s, T, E, F>
where
    F: FnMut(&PopulationKey, f64) -> Result<T, E>,
    E: ResolutionSignal + From<PopulationError>,
{
    type Item = Result<(PopulationKey, T), E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while let Some(key) = self.pending.pop_back() {
            let size = match self.store.get_size(&key) {
                Ok(size) => size,
                Err(err) => return self.fail(err.into()),
            };

            self.evaluations += 1;
            match Resolution::classify((self.f)(&key, size)) {
                Ok(Resolution::Resolved(value)) => {
                    self.leaves += 1;
                    trace!(population = %key, size, "Evaluated population");
                    return Some(Ok((key, value)));
                }
                Ok(Resolution::NeedsCharacteristic(name)) => {
                    match self.store.partition(&key, &name) {
                        Ok(children) => self.schedule(children),
                        Err(err) => return self.fail(err.into()),
                    }
                }
                Err(err) => return self.fail(err),
            }
        }

        self.done = true;
        debug!(
            evaluations = self.evaluations,
            leaves = self.leaves,
            populations = self.store.len(),
            partitions = self.store.partition_count(),
            "Resolution complete"
        );
        None
    }
}

impl<'s, T, E, F> std::iter::FusedIterator for Resolver<'s, T, E, F>
where
    F: FnMut(&PopulationKey, f64) -> Result<T, E>,
    E: ResolutionSignal + From<PopulationError>,
{
}
