use crate::config::global_config;

/// Subarray partitioner options.
///
/// The default values are taken from the [global configuration](crate::config::global_config):
/// - `memory_budget`: [`Config::memory_budget`](crate::config::Config::memory_budget)
/// - `memory_budget_var`: [`Config::memory_budget_var`](crate::config::Config::memory_budget_var)
/// - `multi_range_reduction_in_split`: [`Config::multi_range_reduction_in_split`](crate::config::Config::multi_range_reduction_in_split)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionerOptions {
    memory_budget: u64,
    memory_budget_var: u64,
    multi_range_reduction_in_split: f64,
}

impl Default for PartitionerOptions {
    fn default() -> Self {
        let config = global_config();
        Self {
            memory_budget: config.memory_budget(),
            memory_budget_var: config.memory_budget_var(),
            multi_range_reduction_in_split: config.multi_range_reduction_in_split(),
        }
    }
}

impl PartitionerOptions {
    /// Return the memory budget for the fixed-size part of each field.
    #[must_use]
    pub fn memory_budget(&self) -> u64 {
        self.memory_budget
    }

    /// Set the memory budget for the fixed-size part of each field.
    pub fn set_memory_budget(&mut self, memory_budget: u64) -> &mut Self {
        self.memory_budget = memory_budget;
        self
    }

    /// Set the memory budget for the fixed-size part of each field.
    #[must_use]
    pub fn with_memory_budget(mut self, memory_budget: u64) -> Self {
        self.memory_budget = memory_budget;
        self
    }

    /// Return the memory budget for the variable-size part of each field.
    #[must_use]
    pub fn memory_budget_var(&self) -> u64 {
        self.memory_budget_var
    }

    /// Set the memory budget for the variable-size part of each field.
    pub fn set_memory_budget_var(&mut self, memory_budget_var: u64) -> &mut Self {
        self.memory_budget_var = memory_budget_var;
        self
    }

    /// Set the memory budget for the variable-size part of each field.
    #[must_use]
    pub fn with_memory_budget_var(mut self, memory_budget_var: u64) -> Self {
        self.memory_budget_var = memory_budget_var;
        self
    }

    /// Return the fraction of ranges dropped when splitting a partition of whole ranges.
    #[must_use]
    pub fn multi_range_reduction_in_split(&self) -> f64 {
        self.multi_range_reduction_in_split
    }

    /// Set the fraction of ranges dropped when splitting a partition of whole ranges.
    ///
    /// The value is clamped to `[0, 1]`.
    pub fn set_multi_range_reduction_in_split(&mut self, reduction: f64) -> &mut Self {
        self.multi_range_reduction_in_split = reduction.clamp(0.0, 1.0);
        self
    }

    /// Set the fraction of ranges dropped when splitting a partition of whole ranges.
    ///
    /// The value is clamped to `[0, 1]`.
    #[must_use]
    pub fn with_multi_range_reduction_in_split(mut self, reduction: f64) -> Self {
        self.set_multi_range_reduction_in_split(reduction);
        self
    }
}
