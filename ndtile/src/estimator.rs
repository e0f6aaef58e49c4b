//! Result size estimation.
//!
//! A [`ResultSizeEstimator`] estimates the number of bytes a read of a [`Subarray`] returns for a field.
//! The [`SubarrayPartitioner`](crate::partitioner::SubarrayPartitioner) compares these estimates against per-field [`ResultBudget`]s.
//!
//! Estimators:
//!  - [`CellSizeEstimator`]: cell count times cell size, exact for dense arrays,
//!  - [`FragmentEstimator`]: the overlap of the subarray with each fragment, for sparse arrays,
//!  - [`FnEstimator`]: a closure.

use std::collections::BTreeMap;
use std::sync::Arc;

use ndtile_range::{DomainError, IncompatibleDimensionalityError, OverflowError, TypedRange};
use rayon::prelude::*;
use thiserror::Error;

use crate::fragment_index::FragmentDomainIndex;
use crate::subarray::{Subarray, SubarrayError};

/// The size of a result in bytes.
///
/// Variable-size fields have an offsets part and a values part, fixed-size fields only a values part.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultSize {
    offsets: u64,
    values: u64,
}

impl ResultSize {
    /// Create a new result size.
    #[must_use]
    pub const fn new(offsets: u64, values: u64) -> Self {
        Self { offsets, values }
    }

    /// Create a new result size of a fixed-size field.
    #[must_use]
    pub const fn new_fixed(values: u64) -> Self {
        Self { offsets: 0, values }
    }

    /// The size of the offsets in bytes.
    #[must_use]
    pub const fn offsets(&self) -> u64 {
        self.offsets
    }

    /// The size of the values in bytes.
    #[must_use]
    pub const fn values(&self) -> u64 {
        self.values
    }

    /// Returns true if both parts are zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.offsets == 0 && self.values == 0
    }

    /// Add `other`, returning [`None`] on overflow.
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        Some(Self {
            offsets: self.offsets.checked_add(other.offsets)?,
            values: self.values.checked_add(other.values)?,
        })
    }
}

/// The result budget of a field.
///
/// A variable-size field has a budget for its offsets and its values, a fixed-size field only for its values.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ResultBudget {
    offsets: Option<u64>,
    values: u64,
}

impl ResultBudget {
    /// Create a new result budget of a fixed-size field.
    #[must_use]
    pub const fn new_fixed(values: u64) -> Self {
        Self {
            offsets: None,
            values,
        }
    }

    /// Create a new result budget of a variable-size field.
    #[must_use]
    pub const fn new_var(offsets: u64, values: u64) -> Self {
        Self {
            offsets: Some(offsets),
            values,
        }
    }

    /// The offsets budget in bytes, [`None`] for a fixed-size field.
    #[must_use]
    pub const fn offsets(&self) -> Option<u64> {
        self.offsets
    }

    /// The values budget in bytes.
    #[must_use]
    pub const fn values(&self) -> u64 {
        self.values
    }

    /// Returns true if the budget is of a variable-size field.
    #[must_use]
    pub const fn is_var(&self) -> bool {
        self.offsets.is_some()
    }

    /// Returns true if `size` fits the budget.
    #[must_use]
    pub fn admits(&self, size: &ResultSize) -> bool {
        size.values <= self.values && self.offsets.is_none_or(|offsets| size.offsets <= offsets)
    }

    /// Returns true if a part of the budget is zero while the corresponding part of `size` is not.
    #[must_use]
    pub fn is_empty_for(&self, size: &ResultSize) -> bool {
        (self.values == 0 && size.values > 0) || (self.offsets == Some(0) && size.offsets > 0)
    }

    /// Returns true if the maximum in-memory size `memory` fits the memory budgets.
    ///
    /// The fixed-size part of a variable-size field is its offsets, and the variable-size part its values.
    /// A fixed-size field has no variable-size part.
    #[must_use]
    pub fn admits_memory(
        &self,
        memory: &ResultSize,
        memory_budget: u64,
        memory_budget_var: u64,
    ) -> bool {
        if self.is_var() {
            memory.offsets <= memory_budget && memory.values <= memory_budget_var
        } else {
            memory.values <= memory_budget
        }
    }
}

/// A result size estimation error.
#[derive(Clone, Debug, Error)]
pub enum EstimateError {
    /// The field is unknown to the estimator.
    #[error("unknown field {0}")]
    UnknownField(String),
    /// The number of fragment cell counts does not match the number of fragments.
    #[error("{0} fragment cell counts supplied for {1} fragments")]
    FragmentCountMismatch(usize, usize),
    /// A subarray error.
    #[error(transparent)]
    Subarray(#[from] SubarrayError),
    /// A domain error.
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// A size overflow.
    #[error(transparent)]
    Overflow(#[from] OverflowError),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Traits for estimating the result size of reading a [`Subarray`].
///
/// Estimates must be deterministic for a fixed subarray and field.
pub trait ResultSizeEstimator {
    /// Estimate the result size of reading `field` from `subarray`.
    ///
    /// # Errors
    /// Returns [`EstimateError`] if the estimate cannot be computed.
    fn estimate_result_size(
        &self,
        subarray: &Subarray,
        field: &str,
    ) -> Result<ResultSize, EstimateError>;

    /// The maximum in-memory size of the tiles of `field` read for `subarray`.
    ///
    /// The default implementation returns zero, placing no memory constraint on the partitioner.
    ///
    /// # Errors
    /// Returns [`EstimateError`] if the size cannot be computed.
    fn max_memory_size(
        &self,
        _subarray: &Subarray,
        _field: &str,
    ) -> Result<ResultSize, EstimateError> {
        Ok(ResultSize::default())
    }
}

impl<E: ResultSizeEstimator + ?Sized> ResultSizeEstimator for &E {
    fn estimate_result_size(
        &self,
        subarray: &Subarray,
        field: &str,
    ) -> Result<ResultSize, EstimateError> {
        (**self).estimate_result_size(subarray, field)
    }

    fn max_memory_size(
        &self,
        subarray: &Subarray,
        field: &str,
    ) -> Result<ResultSize, EstimateError> {
        (**self).max_memory_size(subarray, field)
    }
}

impl<E: ResultSizeEstimator + ?Sized> ResultSizeEstimator for Box<E> {
    fn estimate_result_size(
        &self,
        subarray: &Subarray,
        field: &str,
    ) -> Result<ResultSize, EstimateError> {
        (**self).estimate_result_size(subarray, field)
    }

    fn max_memory_size(
        &self,
        subarray: &Subarray,
        field: &str,
    ) -> Result<ResultSize, EstimateError> {
        (**self).max_memory_size(subarray, field)
    }
}

impl<E: ResultSizeEstimator + ?Sized> ResultSizeEstimator for Arc<E> {
    fn estimate_result_size(
        &self,
        subarray: &Subarray,
        field: &str,
    ) -> Result<ResultSize, EstimateError> {
        (**self).estimate_result_size(subarray, field)
    }

    fn max_memory_size(
        &self,
        subarray: &Subarray,
        field: &str,
    ) -> Result<ResultSize, EstimateError> {
        (**self).max_memory_size(subarray, field)
    }
}

/// A [`ResultSizeEstimator`] calling a closure.
#[derive(Clone)]
pub struct FnEstimator<F>(F);

impl<F> FnEstimator<F>
where
    F: Fn(&Subarray, &str) -> Result<ResultSize, EstimateError>,
{
    /// Create a new estimator from `estimate`.
    pub const fn new(estimate: F) -> Self {
        Self(estimate)
    }
}

impl<F> ResultSizeEstimator for FnEstimator<F>
where
    F: Fn(&Subarray, &str) -> Result<ResultSize, EstimateError>,
{
    fn estimate_result_size(
        &self,
        subarray: &Subarray,
        field: &str,
    ) -> Result<ResultSize, EstimateError> {
        (self.0)(subarray, field)
    }
}

/// The size of the cells of a field.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FieldSize {
    /// A fixed-size field with cells of the given size in bytes.
    Fixed(u64),
    /// A variable-size field, with an offset per cell and values of the given average size in bytes.
    Var {
        /// The average size of the values of a cell in bytes.
        avg_value_size: u64,
    },
}

impl FieldSize {
    /// The size of a cell offset in bytes.
    pub const OFFSET_SIZE: u64 = 8;

    fn size_of_cells(self, cell_num: u64) -> Result<ResultSize, OverflowError> {
        let overflow = || OverflowError::new("result size");
        match self {
            Self::Fixed(size) => Ok(ResultSize::new_fixed(
                cell_num.checked_mul(size).ok_or_else(overflow)?,
            )),
            Self::Var { avg_value_size } => Ok(ResultSize::new(
                cell_num.checked_mul(Self::OFFSET_SIZE).ok_or_else(overflow)?,
                cell_num.checked_mul(avg_value_size).ok_or_else(overflow)?,
            )),
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn size_of_estimated_cells(self, cell_num: f64) -> ResultSize {
        // float to int casts saturate
        let bytes = |size: u64| (cell_num * size as f64).ceil() as u64;
        match self {
            Self::Fixed(size) => ResultSize::new_fixed(bytes(size)),
            Self::Var { avg_value_size } => {
                ResultSize::new(bytes(Self::OFFSET_SIZE), bytes(avg_value_size))
            }
        }
    }
}

/// Estimates result sizes from the number of cells in a subarray.
///
/// Every cell of the subarray is assumed to hold data, as in a dense array.
#[derive(Clone, Debug, Default)]
pub struct CellSizeEstimator {
    fields: BTreeMap<String, FieldSize>,
}

impl CellSizeEstimator {
    /// Create a new estimator without fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, size: FieldSize) -> Self {
        self.fields.insert(name.into(), size);
        self
    }

    /// The size of the cells of `field`.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<FieldSize> {
        self.fields.get(field).copied()
    }
}

impl ResultSizeEstimator for CellSizeEstimator {
    fn estimate_result_size(
        &self,
        subarray: &Subarray,
        field: &str,
    ) -> Result<ResultSize, EstimateError> {
        let size = self
            .field(field)
            .ok_or_else(|| EstimateError::UnknownField(field.to_string()))?;
        Ok(size.size_of_cells(subarray.cell_num()?)?)
    }
}

/// Estimates result sizes from the overlap of a subarray with the fragments of a sparse array.
///
/// The estimated number of cells read from a fragment is its cell count times the fraction of its non-empty domain covered by the subarray.
/// The fraction is the product over dimensions of the summed overlap ratios of the ranges of the dimension, capped at 1.
/// The maximum memory size applies the same estimate to the subarray expanded to tile boundaries.
#[derive(Clone, Debug)]
pub struct FragmentEstimator {
    index: Arc<FragmentDomainIndex>,
    cell_nums: Vec<u64>,
    fields: BTreeMap<String, FieldSize>,
}

impl FragmentEstimator {
    /// Create a new estimator from a fragment index and the number of cells in each fragment.
    ///
    /// # Errors
    /// Returns [`EstimateError::FragmentCountMismatch`] if `cell_nums` does not have an entry per fragment.
    pub fn new(
        index: Arc<FragmentDomainIndex>,
        cell_nums: Vec<u64>,
    ) -> Result<Self, EstimateError> {
        if cell_nums.len() != index.len() {
            return Err(EstimateError::FragmentCountMismatch(
                cell_nums.len(),
                index.len(),
            ));
        }
        Ok(Self {
            index,
            cell_nums,
            fields: BTreeMap::new(),
        })
    }

    /// Add a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, size: FieldSize) -> Self {
        self.fields.insert(name.into(), size);
        self
    }

    /// The fragment index.
    #[must_use]
    pub fn index(&self) -> &Arc<FragmentDomainIndex> {
        &self.index
    }

    fn field(&self, field: &str) -> Result<FieldSize, EstimateError> {
        self.fields
            .get(field)
            .copied()
            .ok_or_else(|| EstimateError::UnknownField(field.to_string()))
    }

    fn dim_ranges(
        &self,
        subarray: &Subarray,
        expand: bool,
    ) -> Result<Vec<Vec<TypedRange>>, EstimateError> {
        let domain = self.index.domain();
        if subarray.rank() != domain.rank() {
            return Err(DomainError::from(IncompatibleDimensionalityError::new(
                subarray.rank(),
                domain.rank(),
            ))
            .into());
        }
        let mut dim_ranges = Vec::with_capacity(domain.rank());
        for (dim_idx, dimension) in domain.dimensions().iter().enumerate() {
            let ranges = subarray.ranges(dim_idx)?;
            if expand {
                dim_ranges.push(
                    ranges
                        .iter()
                        .map(|range| dimension.expand_to_tile(range))
                        .collect::<Result<Vec<_>, _>>()?,
                );
            } else {
                dim_ranges.push(ranges.to_vec());
            }
        }
        Ok(dim_ranges)
    }

    /// The estimated number of cells of the fragments within `dim_ranges`.
    #[allow(clippy::cast_precision_loss)]
    fn estimated_cell_num(&self, dim_ranges: &[Vec<TypedRange>]) -> Result<f64, EstimateError> {
        let dimensions = self.index.domain().dimensions();
        let per_fragment = self
            .index
            .fragments()
            .par_iter()
            .zip(&self.cell_nums)
            .map(|(mbr, &cell_num)| -> Result<f64, DomainError> {
                let mut ratio = 1.0;
                for ((dimension, ranges), mbr_range) in
                    std::iter::zip(std::iter::zip(dimensions, dim_ranges), mbr.iter())
                {
                    let mut dim_ratio = 0.0;
                    for range in ranges {
                        dim_ratio += dimension.overlap_ratio(range, mbr_range)?;
                    }
                    ratio *= f64::min(dim_ratio, 1.0);
                }
                Ok(ratio * cell_num as f64)
            })
            .collect::<Result<Vec<f64>, DomainError>>()?;
        // summed sequentially so the estimate does not depend on the thread count
        Ok(per_fragment.into_iter().sum())
    }
}

impl ResultSizeEstimator for FragmentEstimator {
    fn estimate_result_size(
        &self,
        subarray: &Subarray,
        field: &str,
    ) -> Result<ResultSize, EstimateError> {
        let size = self.field(field)?;
        let cell_num = self.estimated_cell_num(&self.dim_ranges(subarray, false)?)?;
        Ok(size.size_of_estimated_cells(cell_num))
    }

    fn max_memory_size(
        &self,
        subarray: &Subarray,
        field: &str,
    ) -> Result<ResultSize, EstimateError> {
        let size = self.field(field)?;
        let cell_num = self.estimated_cell_num(&self.dim_ranges(subarray, true)?)?;
        Ok(size.size_of_estimated_cells(cell_num))
    }
}

#[cfg(test)]
mod tests {
    use ndtile_domain::{Dimension, Domain, Layout};
    use ndtile_range::{Datatype, NDRange, Range};

    use super::*;

    fn domain_1d() -> Arc<Domain> {
        Arc::new(
            Domain::new(vec![Dimension::new(
                "d",
                Datatype::Int64,
                Range::new(0i64, 99).unwrap(),
                10,
            )
            .unwrap()])
            .unwrap(),
        )
    }

    fn subarray(ranges: &[(i64, i64)]) -> Subarray {
        let mut subarray = Subarray::new(domain_1d(), Layout::RowMajor);
        for &(start, end) in ranges {
            subarray.add_range_bounds(0, start, end).unwrap();
        }
        subarray
    }

    #[test]
    fn result_budget_admits() {
        let fixed = ResultBudget::new_fixed(100);
        assert!(!fixed.is_var());
        assert!(fixed.admits(&ResultSize::new_fixed(100)));
        assert!(!fixed.admits(&ResultSize::new_fixed(101)));
        assert!(fixed.admits_memory(&ResultSize::new(1000, 1000), 1000, 0));
        assert!(!fixed.admits_memory(&ResultSize::new(0, 1001), 1000, 0));

        let var = ResultBudget::new_var(80, 200);
        assert!(var.is_var());
        assert!(var.admits(&ResultSize::new(80, 200)));
        assert!(!var.admits(&ResultSize::new(88, 200)));
        assert!(var.admits_memory(&ResultSize::new(10, 20), 10, 20));
        assert!(!var.admits_memory(&ResultSize::new(10, 21), 10, 20));

        assert!(ResultBudget::new_fixed(0).is_empty_for(&ResultSize::new_fixed(1)));
        assert!(!ResultBudget::new_fixed(0).is_empty_for(&ResultSize::default()));
        assert!(ResultBudget::new_var(0, 10).is_empty_for(&ResultSize::new(8, 0)));
    }

    #[test]
    fn cell_size_estimator() {
        let estimator = CellSizeEstimator::new()
            .with_field("a", FieldSize::Fixed(4))
            .with_field("b", FieldSize::Var { avg_value_size: 3 });
        let subarray = subarray(&[(0, 9), (20, 24)]);
        assert_eq!(
            estimator.estimate_result_size(&subarray, "a").unwrap(),
            ResultSize::new_fixed(60)
        );
        assert_eq!(
            estimator.estimate_result_size(&subarray, "b").unwrap(),
            ResultSize::new(120, 45)
        );
        assert_eq!(
            estimator.max_memory_size(&subarray, "a").unwrap(),
            ResultSize::default()
        );
        assert!(matches!(
            estimator.estimate_result_size(&subarray, "c"),
            Err(EstimateError::UnknownField(field)) if field == "c"
        ));
    }

    #[test]
    fn fn_estimator() {
        let estimator = FnEstimator::new(|subarray: &Subarray, _field: &str| {
            Ok(ResultSize::new_fixed(subarray.cell_num()? * 2))
        });
        let estimator = Arc::new(estimator);
        assert_eq!(
            estimator
                .estimate_result_size(&subarray(&[(0, 4)]), "a")
                .unwrap(),
            ResultSize::new_fixed(10)
        );
    }

    fn fragment_estimator() -> FragmentEstimator {
        let fragments = vec![
            NDRange::new(vec![TypedRange::new(0i64, 49).unwrap()]),
            NDRange::new(vec![TypedRange::new(50i64, 99).unwrap()]),
        ];
        let index = Arc::new(FragmentDomainIndex::new(domain_1d(), fragments).unwrap());
        FragmentEstimator::new(index, vec![10, 100])
            .unwrap()
            .with_field("a", FieldSize::Fixed(8))
    }

    #[test]
    fn fragment_estimator_overlap() {
        let estimator = fragment_estimator();
        // 5 of 50 coordinates of the first fragment
        assert_eq!(
            estimator
                .estimate_result_size(&subarray(&[(0, 4)]), "a")
                .unwrap(),
            ResultSize::new_fixed(8)
        );
        // half of the first fragment and a fifth of the second
        assert_eq!(
            estimator
                .estimate_result_size(&subarray(&[(25, 59)]), "a")
                .unwrap(),
            ResultSize::new_fixed((5 + 20) * 8)
        );
        // expanded to [0, 9]
        assert_eq!(
            estimator.max_memory_size(&subarray(&[(0, 4)]), "a").unwrap(),
            ResultSize::new_fixed(16)
        );
        assert_eq!(
            estimator
                .estimate_result_size(&Subarray::new(domain_1d(), Layout::RowMajor), "a")
                .unwrap(),
            ResultSize::new_fixed(110 * 8)
        );
    }

    #[test]
    fn fragment_estimator_errors() {
        let index = fragment_estimator().index().clone();
        assert!(matches!(
            FragmentEstimator::new(index, vec![1]),
            Err(EstimateError::FragmentCountMismatch(1, 2))
        ));
        assert!(matches!(
            fragment_estimator().estimate_result_size(&subarray(&[(0, 4)]), "b"),
            Err(EstimateError::UnknownField(_))
        ));
    }
}
