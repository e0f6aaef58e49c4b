//! `ndtile` global configuration options.
//!
//! The global configuration is read with [`global_config`] and changed with [`global_config_mut`].
//! Partitioners copy the relevant options into their [`PartitionerOptions`](crate::partitioner::PartitionerOptions) when they are created.
//!
//! ## Memory Budget
//! > default: 5 GiB
//!
//! [`Config::memory_budget`] bounds the fixed-size part of the maximum in-memory size of each field of a partition.
//!
//! ## Variable-Size Memory Budget
//! > default: 10 GiB
//!
//! [`Config::memory_budget_var`] bounds the variable-size part of the maximum in-memory size of each field of a partition.
//!
//! ## Multi-Range Reduction in Split
//! > default: `0.3`
//!
//! [`Config::multi_range_reduction_in_split`] is the fraction of whole ranges dropped from the current partition by
//! [`SubarrayPartitioner::split_current`](crate::partitioner::SubarrayPartitioner::split_current).

use std::sync::{LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

/// Global configuration options for the `ndtile` crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
/// A configuration deserializes from a partial document, missing options take their default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    memory_budget: u64,
    memory_budget_var: u64,
    multi_range_reduction_in_split: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_budget: 5 * (1 << 30),
            memory_budget_var: 10 * (1 << 30),
            multi_range_reduction_in_split: 0.3,
        }
    }
}

impl Config {
    /// Get the [memory budget](#memory-budget) configuration.
    #[must_use]
    pub fn memory_budget(&self) -> u64 {
        self.memory_budget
    }

    /// Set the [memory budget](#memory-budget) configuration.
    pub fn set_memory_budget(&mut self, memory_budget: u64) -> &mut Self {
        self.memory_budget = memory_budget;
        self
    }

    /// Get the [variable-size memory budget](#variable-size-memory-budget) configuration.
    #[must_use]
    pub fn memory_budget_var(&self) -> u64 {
        self.memory_budget_var
    }

    /// Set the [variable-size memory budget](#variable-size-memory-budget) configuration.
    pub fn set_memory_budget_var(&mut self, memory_budget_var: u64) -> &mut Self {
        self.memory_budget_var = memory_budget_var;
        self
    }

    /// Get the [multi-range reduction in split](#multi-range-reduction-in-split) configuration.
    #[must_use]
    pub fn multi_range_reduction_in_split(&self) -> f64 {
        self.multi_range_reduction_in_split
    }

    /// Set the [multi-range reduction in split](#multi-range-reduction-in-split) configuration.
    ///
    /// The value is clamped to `[0, 1]`.
    pub fn set_multi_range_reduction_in_split(&mut self, reduction: f64) -> &mut Self {
        self.multi_range_reduction_in_split = reduction.clamp(0.0, 1.0);
        self
    }
}

static CONFIG: LazyLock<RwLock<Config>> = LazyLock::new(|| RwLock::new(Config::default()));

/// Returns a reference to the global `ndtile` configuration.
///
/// # Panics
/// This function might panic if the global config is already mutably held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG.read().unwrap_or_else(PoisonError::into_inner)
}

/// Returns a mutable reference to the global `ndtile` configuration.
///
/// # Panics
/// This function might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG.write().unwrap_or_else(PoisonError::into_inner)
}
