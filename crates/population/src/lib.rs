//! # drugdemand-population
//!
//! Lazy stratification of a population into statistically independent
//! subgroups.
//!
//! A population is described by a [`CharacteristicSet`]: named
//! characteristics, each with a finite set of levels and their proportions.
//! Instead of materializing the cross-product of every level up front, a
//! [`PopulationStore`] starts from one undivided population and splits it
//! only along the characteristics an evaluation function actually reads.
//!
//! ```text
//!   CharacteristicSet ──► PopulationStore::new(total, set)
//!                                │  one all-unresolved key
//!                                ▼
//!                     PopulationStore::map(f) ──► Resolver
//!                                │
//!              f(key, size) ─────┼──► Ok(value)      → yield (key, value)
//!                                └──► Err(Unresolved) → partition, retry children
//! ```
//!
//! ## Key Principles
//!
//! - **Mass conservation**: the tracked sizes always sum to the seed size.
//! - **Demand-driven**: a characteristic is split only if some evaluation
//!   reads it through the strict [`PopulationKey::get`].
//! - **Explicit signal**: an evaluation asks for a split by returning the
//!   `UnresolvedCharacteristic` error, usually via `?` on `get`. The
//!   [`Resolver`] is the only place that acts on it.

#![deny(unsafe_code)]

pub mod characteristic;
pub mod config;
pub mod error;
pub mod key;
pub mod resolver;
pub mod store;

// ── Re-exports ──────────────────────────────────────────────────────────

pub use characteristic::{CharacteristicSet, CharacteristicSetBuilder, Level, LevelTable};
pub use config::{PopulationConfig, TraversalOrder, DEFAULT_PROPORTION_TOLERANCE};
pub use error::{PopulationError, PopulationResult, ResolutionSignal};
pub use key::{PopulationKey, Slot, UNRESOLVED_LABEL};
pub use resolver::{Resolution, Resolver};
pub use store::PopulationStore;
