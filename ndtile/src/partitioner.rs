//! The subarray partitioner.
//!
//! A [`SubarrayPartitioner`] splits a [`Subarray`] into a sequence of [`Partition`]s whose estimated result sizes fit per-field [`ResultBudget`]s.
//! Partitions are disjoint, cover the subarray exactly, and are emitted in the order of the subarray layout.
//!
//! The partitioner walks the range combinations of the subarray.
//! Consecutive combinations are grouped into one partition while their summed estimates fit the budgets.
//! A group is trimmed so that it forms a box of whole ranges, the last dimension of the range order spanning all of its ranges.
//! A combination or slab that does not fit is split in two, lower half first, until each half fits.
//! Halves waiting to be emitted are held on an explicit stack.
//! A single cell that does not fit is emitted anyway, flagged with [`Partition::exceeds_budget`].
//!
//! ```
//! # use std::collections::BTreeMap;
//! # use std::sync::Arc;
//! # use ndtile::estimator::{CellSizeEstimator, FieldSize, ResultBudget};
//! # use ndtile::partitioner::SubarrayPartitioner;
//! # use ndtile::subarray::Subarray;
//! # use ndtile_domain::{Dimension, Domain, Layout};
//! # use ndtile_range::{Datatype, Range};
//! let domain = Arc::new(Domain::new(vec![
//!     Dimension::new("rows", Datatype::Int32, Range::new(0i32, 99)?, 10)?,
//!     Dimension::new("cols", Datatype::Int32, Range::new(0i32, 99)?, 10)?,
//! ])?);
//! let mut subarray = Subarray::new(domain, Layout::RowMajor);
//! subarray.add_range_bounds(0, 0i32, 19)?;
//!
//! let estimator = CellSizeEstimator::new().with_field("a", FieldSize::Fixed(1));
//! let budgets = BTreeMap::from([("a".to_string(), ResultBudget::new_fixed(1000))]);
//! let partitions = SubarrayPartitioner::new(subarray, budgets, estimator)
//!     .collect::<Result<Vec<_>, _>>()?;
//! assert_eq!(partitions.len(), 2);
//! assert_eq!(partitions[0].subarray().to_string(), "[0, 9] x [0, 99]");
//! # Ok::<_, Box<dyn std::error::Error>>(())
//! ```

mod options;
mod split;

pub use options::PartitionerOptions;

use std::collections::{BTreeMap, VecDeque};

use derive_more::Display;
use ndtile_domain::Layout;
use ndtile_range::OverflowError;
use thiserror::Error;

use crate::estimator::{EstimateError, ResultBudget, ResultSize, ResultSizeEstimator};
use crate::subarray::{Subarray, SubarrayError};
use split::{split_multi_range, split_single_range, Halves};

/// A subarray partitioner error.
#[derive(Clone, Debug, Error)]
pub enum PartitionerError {
    /// A field has a zero budget but a non-empty result.
    #[error("field {field} has a zero result budget but a non-empty result")]
    EmptyBudget {
        /// The field name.
        field: String,
    },
    /// There is no current partition to split.
    #[error("there is no current partition to split")]
    NoCurrentPartition,
    /// A subarray error.
    #[error(transparent)]
    Subarray(#[from] SubarrayError),
    /// A result size estimation error.
    #[error(transparent)]
    Estimate(#[from] EstimateError),
    /// A count overflow.
    #[error(transparent)]
    Overflow(#[from] OverflowError),
}

/// The state of a [`SubarrayPartitioner`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Display)]
pub enum PartitionerState {
    /// No partition has been requested yet.
    #[default]
    #[display("unstarted")]
    Unstarted,
    /// Partitions remain.
    #[display("ready")]
    Ready,
    /// The whole subarray has been emitted.
    #[display("exhausted")]
    Exhausted,
}

/// A partition of a subarray.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition {
    subarray: Subarray,
    estimated_sizes: BTreeMap<String, ResultSize>,
    exceeds_budget: bool,
}

impl Partition {
    /// The subarray of the partition.
    #[must_use]
    pub fn subarray(&self) -> &Subarray {
        &self.subarray
    }

    /// Consume the partition and return its subarray.
    #[must_use]
    pub fn into_subarray(self) -> Subarray {
        self.subarray
    }

    /// The estimated result size of each budgeted field.
    #[must_use]
    pub fn estimated_sizes(&self) -> &BTreeMap<String, ResultSize> {
        &self.estimated_sizes
    }

    /// The estimated result size of `field`.
    #[must_use]
    pub fn estimated_size(&self, field: &str) -> Option<ResultSize> {
        self.estimated_sizes.get(field).copied()
    }

    /// Returns true if the partition is a single cell that does not fit the budgets.
    #[must_use]
    pub const fn exceeds_budget(&self) -> bool {
        self.exceeds_budget
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Stack {
    SingleRange,
    MultiRange,
}

/// Splits a [`Subarray`] into partitions that fit per-field result budgets.
///
/// See the [module documentation](self) for the partitioning strategy.
/// The partitioner is an [`Iterator`] over `Result<Partition, PartitionerError>`.
#[derive(Debug)]
pub struct SubarrayPartitioner<E> {
    subarray: Subarray,
    budgets: BTreeMap<String, ResultBudget>,
    estimator: E,
    options: PartitionerOptions,
    state: PartitionerState,
    /// The first range combination that has not been emitted.
    start: u64,
    /// The last range combination.
    end: u64,
    /// The range combinations of the current partition, or of the slab being split.
    interval: (u64, u64),
    single_range: VecDeque<Subarray>,
    multi_range: VecDeque<Subarray>,
    current: Option<Partition>,
    current_from_multi_range: bool,
    emitted_cell_num: Option<u64>,
}

impl<E: ResultSizeEstimator> SubarrayPartitioner<E> {
    /// Create a new partitioner of `subarray` with per-field `budgets`.
    ///
    /// Result sizes are estimated by `estimator`.
    /// The options default to the [global configuration](crate::config::global_config).
    #[must_use]
    pub fn new(subarray: Subarray, budgets: BTreeMap<String, ResultBudget>, estimator: E) -> Self {
        Self {
            subarray,
            budgets,
            estimator,
            options: PartitionerOptions::default(),
            state: PartitionerState::Unstarted,
            start: 0,
            end: 0,
            interval: (0, 0),
            single_range: VecDeque::new(),
            multi_range: VecDeque::new(),
            current: None,
            current_from_multi_range: false,
            emitted_cell_num: None,
        }
    }

    /// Set the partitioner options.
    #[must_use]
    pub fn with_options(mut self, options: PartitionerOptions) -> Self {
        self.options = options;
        self
    }

    /// The partitioner options.
    #[must_use]
    pub fn options(&self) -> &PartitionerOptions {
        &self.options
    }

    /// The subarray being partitioned.
    #[must_use]
    pub fn subarray(&self) -> &Subarray {
        &self.subarray
    }

    /// The result size estimator.
    #[must_use]
    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// The partitioner state.
    #[must_use]
    pub fn state(&self) -> PartitionerState {
        self.state
    }

    /// The last emitted partition.
    #[must_use]
    pub fn current(&self) -> Option<&Partition> {
        self.current.as_ref()
    }

    /// Returns true if the whole subarray has been emitted.
    #[must_use]
    pub fn done(&self) -> bool {
        match self.state {
            PartitionerState::Unstarted => false,
            PartitionerState::Ready => self.start > self.end,
            PartitionerState::Exhausted => true,
        }
    }

    /// The result budget of `field`.
    #[must_use]
    pub fn result_budget(&self, field: &str) -> Option<&ResultBudget> {
        self.budgets.get(field)
    }

    /// The result budgets of all fields.
    #[must_use]
    pub fn result_budgets(&self) -> &BTreeMap<String, ResultBudget> {
        &self.budgets
    }

    /// Set the result budget of `field`.
    ///
    /// The budget applies to partitions emitted after the call.
    pub fn set_result_budget(
        &mut self,
        field: impl Into<String>,
        budget: ResultBudget,
    ) -> &mut Self {
        self.budgets.insert(field.into(), budget);
        self
    }

    /// The number of cells emitted so far.
    ///
    /// Returns [`None`] before the first partition and for subarrays with uncountable real-valued ranges.
    #[must_use]
    pub fn emitted_cell_num(&self) -> Option<u64> {
        self.emitted_cell_num
    }

    /// Return the next partition, or [`None`] if the whole subarray has been emitted.
    ///
    /// # Errors
    /// Returns [`PartitionerError::EmptyBudget`] on the first call if a field has a zero budget but a non-empty result.
    /// Returns [`PartitionerError`] if a result size cannot be estimated or a count overflows.
    pub fn next_partition(&mut self) -> Result<Option<Partition>, PartitionerError> {
        if self.state == PartitionerState::Unstarted {
            self.begin()?;
        }
        if self.done() {
            self.state = PartitionerState::Exhausted;
            return Ok(None);
        }
        let partition = if !self.single_range.is_empty() {
            self.next_from_stack(Stack::SingleRange)?
        } else if !self.multi_range.is_empty() {
            self.next_from_stack(Stack::MultiRange)?
        } else {
            self.next_from_subarray()?
        };
        self.emit(partition).map(Some)
    }

    /// Split the current partition and return the first part, which becomes the current partition.
    ///
    /// This is used when a partition turns out not to fit once it is read.
    /// A partition of several whole range combinations drops [`PartitionerOptions::multi_range_reduction_in_split`] of them,
    /// if the kept combinations form a slab in the layout cell order.
    /// Other partitions are split in two.
    /// A single cell partition is returned again with [`Partition::exceeds_budget`] set.
    ///
    /// # Errors
    /// Returns [`PartitionerError::NoCurrentPartition`] if no partition has been emitted.
    /// Returns [`PartitionerError`] if a result size cannot be estimated or a count overflows.
    pub fn split_current(&mut self) -> Result<Partition, PartitionerError> {
        let current = self
            .current
            .take()
            .ok_or(PartitionerError::NoCurrentPartition)?;
        if let (Some(emitted), Ok(cell_num)) =
            (self.emitted_cell_num, current.subarray.cell_num())
        {
            self.emitted_cell_num = Some(emitted.saturating_sub(cell_num));
        }
        if current.subarray.is_unary() {
            return self.emit(Partition {
                exceeds_budget: true,
                ..current
            });
        }
        let shrunk = if !self.current_from_multi_range && self.interval.0 < self.interval.1 {
            self.shrink_interval()?
        } else {
            None
        };
        let partition = if let Some(partition) = shrunk {
            partition
        } else if self.current_from_multi_range || self.interval.0 < self.interval.1 {
            if self.multi_range.is_empty() {
                self.start = self.interval.0;
            }
            self.push_split(Stack::MultiRange, current.subarray)?;
            self.next_from_stack(Stack::MultiRange)?
        } else {
            if self.single_range.is_empty() {
                self.start = self.start.saturating_sub(1);
            }
            self.push_split(Stack::SingleRange, current.subarray)?;
            self.next_from_stack(Stack::SingleRange)?
        };
        self.emit(partition)
    }

    fn begin(&mut self) -> Result<(), PartitionerError> {
        for (field, budget) in &self.budgets {
            if budget.values() == 0 || budget.offsets() == Some(0) {
                let estimate = self
                    .estimator
                    .estimate_result_size(&self.subarray, field)?;
                if budget.is_empty_for(&estimate) {
                    return Err(PartitionerError::EmptyBudget {
                        field: field.clone(),
                    });
                }
            }
        }
        let range_num_total = self.subarray.range_num_total()?;
        log::debug!(
            "partitioning {} with {range_num_total} range combinations",
            self.subarray
        );
        self.start = 0;
        self.end = range_num_total.saturating_sub(1);
        self.emitted_cell_num = Some(0);
        self.state = PartitionerState::Ready;
        Ok(())
    }

    fn emit(&mut self, partition: Partition) -> Result<Partition, PartitionerError> {
        self.emitted_cell_num = match (self.emitted_cell_num, partition.subarray.cell_num()) {
            (Some(emitted), Ok(cell_num)) => Some(
                emitted
                    .checked_add(cell_num)
                    .ok_or(OverflowError::new("cell"))?,
            ),
            (None, Ok(_)) | (_, Err(SubarrayError::UncountableCells(_))) => None,
            (_, Err(err)) => return Err(err.into()),
        };
        if partition.exceeds_budget {
            log::warn!(
                "partition {} exceeds the result budget and cannot be split",
                partition.subarray
            );
        } else {
            log::debug!("partition {}", partition.subarray);
        }
        if self.start > self.end {
            self.state = PartitionerState::Exhausted;
            if let (Some(emitted), Ok(cell_num)) =
                (self.emitted_cell_num, self.subarray.cell_num())
            {
                debug_assert_eq!(emitted, cell_num, "emitted cells must cover the subarray");
            }
        } else {
            self.state = PartitionerState::Ready;
        }
        self.current = Some(partition.clone());
        Ok(partition)
    }

    /// Estimate the result sizes of `subarray` and check them against the budgets.
    fn evaluate(
        &self,
        subarray: &Subarray,
    ) -> Result<(bool, BTreeMap<String, ResultSize>), PartitionerError> {
        let mut fits = true;
        let mut estimated_sizes = BTreeMap::new();
        for (field, budget) in &self.budgets {
            let estimate = self.estimator.estimate_result_size(subarray, field)?;
            let memory = self.estimator.max_memory_size(subarray, field)?;
            if !budget.admits(&estimate)
                || !budget.admits_memory(
                    &memory,
                    self.options.memory_budget(),
                    self.options.memory_budget_var(),
                )
            {
                fits = false;
            }
            estimated_sizes.insert(field.clone(), estimate);
        }
        Ok((fits, estimated_sizes))
    }

    fn stack_mut(&mut self, stack: Stack) -> &mut VecDeque<Subarray> {
        match stack {
            Stack::SingleRange => &mut self.single_range,
            Stack::MultiRange => &mut self.multi_range,
        }
    }

    fn split(stack: Stack, subarray: &Subarray) -> Result<Option<Halves>, SubarrayError> {
        if subarray.is_unary() {
            return Ok(None);
        }
        match stack {
            Stack::SingleRange => split_single_range(subarray),
            Stack::MultiRange => split_multi_range(subarray),
        }
    }

    fn push_split(&mut self, stack: Stack, subarray: Subarray) -> Result<(), PartitionerError> {
        let split = Self::split(stack, &subarray)?;
        let stack = self.stack_mut(stack);
        match split {
            Some((lower, upper)) => {
                stack.push_front(upper);
                stack.push_front(lower);
            }
            None => stack.push_front(subarray),
        }
        Ok(())
    }

    /// Find the longest run of range combinations from `start` that fits the budgets.
    ///
    /// Returns false if not even the first combination fits.
    fn compute_current_start_end(&mut self) -> Result<bool, PartitionerError> {
        let mut sizes: BTreeMap<&str, (ResultSize, ResultSize)> = BTreeMap::new();
        let mut last_fitting = None;
        'combinations: for combination in self.start..=self.end {
            let candidate = self.subarray.subarray_between(combination, combination)?;
            for (field, budget) in &self.budgets {
                let estimate = self.estimator.estimate_result_size(&candidate, field)?;
                let memory = self.estimator.max_memory_size(&candidate, field)?;
                let (size, memory_size) = sizes.entry(field.as_str()).or_default();
                *size = size
                    .checked_add(&estimate)
                    .ok_or(OverflowError::new("result size"))?;
                *memory_size = memory_size
                    .checked_add(&memory)
                    .ok_or(OverflowError::new("memory size"))?;
                if !budget.admits(size)
                    || !budget.admits_memory(
                        memory_size,
                        self.options.memory_budget(),
                        self.options.memory_budget_var(),
                    )
                {
                    break 'combinations;
                }
            }
            last_fitting = Some(combination);
        }
        self.interval = (self.start, last_fitting.unwrap_or(self.start));
        log::debug!(
            "range combinations {}..={} fit: {}",
            self.interval.0,
            self.interval.1,
            last_fitting.is_some()
        );
        Ok(last_fitting.is_some())
    }

    /// The range coordinates of the last combination of the largest box of whole ranges in `start..=end` that begins at `start`.
    fn calibrated_end_coords(&self, start: u64, end: u64) -> Result<Vec<u64>, SubarrayError> {
        let rank = self.subarray.rank();
        let start_coords = self.subarray.range_coords(start)?;
        let mut end_coords = self.subarray.range_coords(end)?;
        let range_num = (0..rank)
            .map(|dim_idx| self.subarray.range_num(dim_idx))
            .collect::<Result<Vec<_>, _>>()?;
        let axes: Vec<usize> = self.subarray.range_order().axes(rank).collect();
        for position in 0..rank.saturating_sub(1) {
            let major = axes[position];
            let minor = &axes[position + 1..];
            let starts_at_beginning = minor.iter().all(|&dim_idx| start_coords[dim_idx] == 0);
            let ends_at_end = minor
                .iter()
                .all(|&dim_idx| end_coords[dim_idx] == range_num[dim_idx] - 1);
            if starts_at_beginning {
                if ends_at_end {
                    break;
                }
                if start_coords[major] < end_coords[major] {
                    end_coords[major] -= 1;
                    for &dim_idx in minor {
                        end_coords[dim_idx] = range_num[dim_idx] - 1;
                    }
                    break;
                }
            } else if end_coords[major] > start_coords[major] {
                end_coords[major] = start_coords[major];
                for &dim_idx in minor {
                    end_coords[dim_idx] = range_num[dim_idx] - 1;
                }
            }
        }
        Ok(end_coords)
    }

    /// Extend `end_coords` to a slab, so that the box of whole ranges from `start_coords` is contiguous in the layout cell order.
    ///
    /// Every dimension after the first one in range order that is not a single unary range must span all of its ranges.
    /// Unordered and global order subarrays are never extended.
    ///
    /// Returns true if `end_coords` was extended.
    fn extend_to_slab(
        &self,
        start_coords: &[u64],
        end_coords: &mut [u64],
    ) -> Result<bool, SubarrayError> {
        if matches!(self.subarray.layout(), Layout::GlobalOrder | Layout::Unordered) {
            return Ok(false);
        }
        let mut axes = self.subarray.range_order().axes(self.subarray.rank());
        for dim_idx in axes.by_ref() {
            if start_coords[dim_idx] != end_coords[dim_idx]
                || !self.subarray.range(dim_idx, start_coords[dim_idx])?.is_unary()
            {
                break;
            }
        }
        let mut extended = false;
        for dim_idx in axes {
            let last = self.subarray.range_num(dim_idx)? - 1;
            if end_coords[dim_idx] != last {
                end_coords[dim_idx] = last;
                extended = true;
            }
        }
        Ok(extended)
    }

    /// Trim the current interval to a box of whole ranges and extend it to a slab for row and column major layouts.
    ///
    /// Returns true if the interval was extended and must be split.
    fn calibrate_current_start_end(&mut self) -> Result<bool, SubarrayError> {
        if self.subarray.layout() == Layout::GlobalOrder {
            return Ok(false);
        }
        let (start, end) = self.interval;
        let start_coords = self.subarray.range_coords(start)?;
        let mut end_coords = self.calibrated_end_coords(start, end)?;
        let must_split_slab = self.extend_to_slab(&start_coords, &mut end_coords)?;
        self.interval.1 = self.subarray.range_idx(&end_coords)?;
        Ok(must_split_slab)
    }

    fn next_from_subarray(&mut self) -> Result<Partition, PartitionerError> {
        let found = self.compute_current_start_end()?;
        if !found && matches!(self.subarray.layout(), Layout::Unordered | Layout::GlobalOrder) {
            return self.next_from_stack(Stack::SingleRange);
        }
        let must_split_slab = self.calibrate_current_start_end()?;
        if found && !must_split_slab {
            let (start, end) = self.interval;
            let subarray = self.subarray.subarray_between(start, end)?;
            let (_, estimated_sizes) = self.evaluate(&subarray)?;
            self.current_from_multi_range = false;
            self.start = end + 1;
            return Ok(Partition {
                subarray,
                estimated_sizes,
                exceeds_budget: false,
            });
        }
        self.next_from_stack(Stack::MultiRange)
    }

    fn next_from_stack(&mut self, stack: Stack) -> Result<Partition, PartitionerError> {
        let mut candidate = match self.stack_mut(stack).pop_front() {
            Some(candidate) => candidate,
            None => {
                // a new candidate is split before it is evaluated
                let candidate = self
                    .subarray
                    .subarray_between(self.interval.0, self.interval.1)?;
                match Self::split(stack, &candidate)? {
                    Some((lower, upper)) => {
                        log::trace!("split {candidate} into {lower} and {upper}");
                        self.stack_mut(stack).push_front(upper);
                        lower
                    }
                    None => candidate,
                }
            }
        };
        let (estimated_sizes, exceeds_budget) = loop {
            let (fits, estimated_sizes) = self.evaluate(&candidate)?;
            if fits {
                break (estimated_sizes, false);
            }
            match Self::split(stack, &candidate)? {
                Some((lower, upper)) => {
                    log::trace!("split {candidate} into {lower} and {upper}");
                    self.stack_mut(stack).push_front(upper);
                    candidate = lower;
                }
                None => break (estimated_sizes, true),
            }
        };
        self.current_from_multi_range = stack == Stack::MultiRange;
        if self.stack_mut(stack).is_empty() {
            self.start = match stack {
                Stack::SingleRange => self.start + 1,
                Stack::MultiRange => self.interval.1 + 1,
            };
        }
        Ok(Partition {
            subarray: candidate,
            estimated_sizes,
            exceeds_budget,
        })
    }

    /// Drop trailing range combinations from the current interval of whole ranges.
    ///
    /// Returns [`None`] if every shorter slab from the interval start is the whole interval.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn shrink_interval(&mut self) -> Result<Option<Partition>, PartitionerError> {
        let (start, end) = self.interval;
        let range_num = end - start + 1;
        let reduction = self.options.multi_range_reduction_in_split();
        let kept = ((range_num as f64) * (1.0 - reduction)).floor() as u64;
        // at least one combination is kept and at least one dropped
        let kept = kept.clamp(1, range_num - 1);
        let start_coords = self.subarray.range_coords(start)?;
        let mut end_coords = self.calibrated_end_coords(start, start + kept - 1)?;
        self.extend_to_slab(&start_coords, &mut end_coords)?;
        let shrunk_end = self.subarray.range_idx(&end_coords)?;
        if shrunk_end >= end {
            return Ok(None);
        }
        log::trace!("shrink range combinations {start}..={end} to {start}..={shrunk_end}");
        self.interval = (start, shrunk_end);
        let subarray = self.subarray.subarray_between(start, shrunk_end)?;
        let (_, estimated_sizes) = self.evaluate(&subarray)?;
        self.current_from_multi_range = false;
        self.start = shrunk_end + 1;
        Ok(Some(Partition {
            subarray,
            estimated_sizes,
            exceeds_budget: false,
        }))
    }
}

impl<E: ResultSizeEstimator> Iterator for SubarrayPartitioner<E> {
    type Item = Result<Partition, PartitionerError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_partition().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ndtile_domain::{Dimension, Domain};
    use ndtile_range::{Datatype, Range, TypedRange};

    use super::*;
    use crate::estimator::{CellSizeEstimator, FieldSize};

    fn domain_2d() -> Arc<Domain> {
        Arc::new(
            Domain::new(vec![
                Dimension::new("rows", Datatype::Int32, Range::new(0i32, 99).unwrap(), 10)
                    .unwrap(),
                Dimension::new("cols", Datatype::Int32, Range::new(0i32, 99).unwrap(), 10)
                    .unwrap(),
            ])
            .unwrap(),
        )
    }

    fn r(start: i32, end: i32) -> TypedRange {
        TypedRange::new(start, end).unwrap()
    }

    fn from_ndrange(ranges: Vec<TypedRange>) -> Subarray {
        Subarray::from_ndrange(domain_2d(), Layout::RowMajor, &ranges.into()).unwrap()
    }

    fn estimator() -> CellSizeEstimator {
        CellSizeEstimator::new().with_field("a", FieldSize::Fixed(1))
    }

    fn budget(values: u64) -> BTreeMap<String, ResultBudget> {
        BTreeMap::from([("a".to_string(), ResultBudget::new_fixed(values))])
    }

    fn options() -> PartitionerOptions {
        PartitionerOptions::default()
            .with_memory_budget(u64::MAX)
            .with_memory_budget_var(u64::MAX)
            .with_multi_range_reduction_in_split(0.3)
    }

    fn partitioner(subarray: Subarray, values: u64) -> SubarrayPartitioner<CellSizeEstimator> {
        SubarrayPartitioner::new(subarray, budget(values), estimator()).with_options(options())
    }

    fn multi_range() -> Subarray {
        let mut subarray = Subarray::new(domain_2d(), Layout::RowMajor);
        subarray.add_range_bounds(0, 0i32, 1).unwrap();
        subarray.add_range_bounds(0, 10i32, 11).unwrap();
        for start in [0i32, 10, 20] {
            subarray.add_range_bounds(1, start, start + 4).unwrap();
        }
        subarray
    }

    #[test]
    fn partitioner_states() {
        let subarray = from_ndrange(vec![r(0, 9), r(0, 9)]);
        let mut partitioner = partitioner(subarray, 100);
        assert_eq!(partitioner.state(), PartitionerState::Unstarted);
        assert!(!partitioner.done());
        assert!(partitioner.current().is_none());
        assert!(matches!(
            partitioner.split_current(),
            Err(PartitionerError::NoCurrentPartition)
        ));
        let partition = partitioner.next_partition().unwrap().unwrap();
        assert_eq!(partition.estimated_size("a"), Some(ResultSize::new_fixed(100)));
        assert!(!partition.exceeds_budget());
        assert_eq!(partitioner.state(), PartitionerState::Exhausted);
        assert!(partitioner.done());
        assert_eq!(partitioner.current(), Some(&partition));
        assert!(partitioner.next_partition().unwrap().is_none());
        assert_eq!(partitioner.emitted_cell_num(), Some(100));
        assert_eq!(PartitionerState::Ready.to_string(), "ready");
    }

    #[test]
    fn partitioner_groups_whole_ranges() {
        // 6 combinations of 10 cells, 3 per row slab
        let mut partitioner = partitioner(multi_range(), 35);
        let first = partitioner.next_partition().unwrap().unwrap();
        assert_eq!(first.subarray().ranges(0).unwrap(), &[r(0, 1)]);
        assert_eq!(first.subarray().range_num(1).unwrap(), 3);
        let second = partitioner.next_partition().unwrap().unwrap();
        assert_eq!(second.subarray().ranges(0).unwrap(), &[r(10, 11)]);
        assert!(partitioner.next_partition().unwrap().is_none());
    }

    #[test]
    fn partitioner_splits_slabs() {
        // a slab of 30 cells does not fit, its rows are bisected
        let partitions = partitioner(multi_range(), 25)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let cells: Vec<u64> = partitions
            .iter()
            .map(|p| p.subarray().cell_num().unwrap())
            .collect();
        assert_eq!(cells, vec![15, 15, 15, 15]);
        assert_eq!(partitions[0].subarray().ranges(0).unwrap(), &[r(0, 0)]);
        assert_eq!(partitions[0].subarray().range_num(1).unwrap(), 3);
        assert_eq!(partitions[2].subarray().ranges(0).unwrap(), &[r(10, 10)]);
    }

    #[test]
    fn partitioner_splits_range_lists() {
        let mut subarray = Subarray::new(domain_2d(), Layout::RowMajor);
        subarray.add_range_bounds(0, 0i32, 0).unwrap();
        subarray.add_range_bounds(0, 10i32, 10).unwrap();
        for start in [0i32, 10, 20] {
            subarray.add_range_bounds(1, start, start + 4).unwrap();
        }
        // a slab of 15 cells does not fit, its column ranges are divided
        let partitions = partitioner(subarray, 12)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        let cells: Vec<u64> = partitions
            .iter()
            .map(|p| p.subarray().cell_num().unwrap())
            .collect();
        assert_eq!(cells, vec![10, 5, 10, 5]);
        assert_eq!(partitions[0].subarray().ranges(1).unwrap(), &[r(0, 4), r(10, 14)]);
        assert_eq!(partitions[1].subarray().ranges(1).unwrap(), &[r(20, 24)]);
        assert_eq!(partitions[3].subarray().ranges(0).unwrap(), &[r(10, 10)]);
    }

    #[test]
    fn partitioner_exceeds_budget() {
        let subarray = from_ndrange(vec![r(0, 1), r(0, 0)]);
        let estimator = CellSizeEstimator::new().with_field("a", FieldSize::Fixed(2));
        let partitions = SubarrayPartitioner::new(subarray, budget(1), estimator)
            .with_options(options())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(partitions.len(), 2);
        assert!(partitions.iter().all(Partition::exceeds_budget));
        assert_eq!(partitions[1].subarray().ranges(0).unwrap(), &[r(1, 1)]);
    }

    #[test]
    fn partitioner_empty_budget() {
        let subarray = Subarray::new(domain_2d(), Layout::RowMajor);
        let mut partitioner = partitioner(subarray, 0);
        assert!(matches!(
            partitioner.next_partition(),
            Err(PartitionerError::EmptyBudget { field }) if field == "a"
        ));
    }

    #[test]
    fn partitioner_memory_budget() {
        let subarray = from_ndrange(vec![r(0, 3), r(0, 9)]);
        let estimator = MemoryEstimator;
        let partitions = SubarrayPartitioner::new(subarray, budget(u64::MAX), estimator)
            .with_options(options().with_memory_budget(20))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0].subarray().ranges(0).unwrap(), &[r(0, 1)]);
    }

    struct MemoryEstimator;

    impl ResultSizeEstimator for MemoryEstimator {
        fn estimate_result_size(
            &self,
            subarray: &Subarray,
            _field: &str,
        ) -> Result<ResultSize, EstimateError> {
            Ok(ResultSize::new_fixed(subarray.cell_num()?))
        }

        fn max_memory_size(
            &self,
            subarray: &Subarray,
            _field: &str,
        ) -> Result<ResultSize, EstimateError> {
            Ok(ResultSize::new_fixed(subarray.cell_num()?))
        }
    }

    #[test]
    fn partitioner_split_current() {
        let subarray = from_ndrange(vec![r(0, 3), r(0, 9)]);
        let mut partitioner = partitioner(subarray, 1000);
        let whole = partitioner.next_partition().unwrap().unwrap();
        assert_eq!(whole.subarray().cell_num().unwrap(), 40);
        assert!(partitioner.done());

        let lower = partitioner.split_current().unwrap();
        assert_eq!(lower.subarray().ranges(0).unwrap(), &[r(0, 1)]);
        assert_eq!(partitioner.state(), PartitionerState::Ready);
        assert_eq!(partitioner.emitted_cell_num(), Some(20));

        let upper = partitioner.next_partition().unwrap().unwrap();
        assert_eq!(upper.subarray().ranges(0).unwrap(), &[r(2, 3)]);
        assert!(partitioner.next_partition().unwrap().is_none());
        assert_eq!(partitioner.emitted_cell_num(), Some(40));
    }

    #[test]
    fn partitioner_split_current_whole_ranges() {
        let mut subarray = Subarray::new(domain_2d(), Layout::RowMajor);
        for start in [0i32, 10, 20, 30, 40, 50, 60, 70, 80, 90] {
            subarray.add_range_bounds(0, start, start).unwrap();
        }
        subarray.add_range_bounds(1, 0i32, 9).unwrap();
        let mut partitioner = partitioner(subarray, 1000);
        let whole = partitioner.next_partition().unwrap().unwrap();
        assert_eq!(whole.subarray().range_num(0).unwrap(), 10);

        // 30% of the 10 ranges are dropped
        let shrunk = partitioner.split_current().unwrap();
        assert_eq!(shrunk.subarray().range_num(0).unwrap(), 7);
        let rest = partitioner.next_partition().unwrap().unwrap();
        assert_eq!(rest.subarray().ranges(0).unwrap(), &[r(70, 70), r(80, 80), r(90, 90)]);
        assert!(partitioner.next_partition().unwrap().is_none());
        assert_eq!(partitioner.emitted_cell_num(), Some(100));
    }

    #[test]
    fn partitioner_split_current_unary() {
        let subarray = from_ndrange(vec![r(5, 5), r(5, 5)]);
        let mut partitioner = partitioner(subarray, 1000);
        let partition = partitioner.next_partition().unwrap().unwrap();
        assert!(!partition.exceeds_budget());
        let again = partitioner.split_current().unwrap();
        assert!(again.exceeds_budget());
        assert_eq!(again.subarray(), partition.subarray());
        assert!(partitioner.done());
        assert_eq!(partitioner.emitted_cell_num(), Some(1));
    }
}
