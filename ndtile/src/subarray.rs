//! Subarrays.
//!
//! A [`Subarray`] holds a sorted list of disjoint ranges per dimension of a [`Domain`].
//! The queried cells are the Cartesian product of the ranges.
//! Each element of the product is a range combination, enumerated in the order of the subarray [`Layout`].

use std::cmp::Ordering;
use std::fmt::Display;
use std::sync::Arc;

use itertools::Itertools;
use ndtile_domain::{Domain, Layout, Order};
use ndtile_range::{
    with_physical_type, Coordinate, DimensionTypeMismatchError, DomainError,
    IncompatibleDimensionalityError, InvalidRangeError, NDRange, OverflowError, PhysicalType,
    Range, TypedRange,
};
use thiserror::Error;

/// A subarray error.
#[derive(Clone, Debug, Error)]
pub enum SubarrayError {
    /// A range index is out of bounds.
    #[error("range index {range_idx} is out of bounds for dimension {dim_idx} with {range_num} ranges")]
    RangeIndexOutOfBounds {
        /// The dimension index.
        dim_idx: usize,
        /// The range index.
        range_idx: u64,
        /// The number of ranges of the dimension.
        range_num: u64,
    },
    /// A range combination index is out of bounds.
    #[error("range combination {0} is out of bounds for {1} range combinations")]
    CombinationOutOfBounds(u64, u64),
    /// An interval of range combinations is reversed.
    #[error("range combination interval [{start}, {end}] is reversed")]
    ReversedCombinationInterval {
        /// The first range combination.
        start: u64,
        /// The last range combination.
        end: u64,
    },
    /// A global order subarray has multiple ranges on a dimension.
    #[error("a global order subarray must have a single range per dimension")]
    MultiRangeGlobalOrder,
    /// The cells of a non-unary real-valued range cannot be counted.
    #[error("cannot count the cells of non-unary real-valued range {0}")]
    UncountableCells(String),
    /// An invalid range.
    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),
    /// A dimension type mismatch.
    #[error(transparent)]
    DimensionTypeMismatch(#[from] DimensionTypeMismatchError),
    /// An incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// A count overflow.
    #[error(transparent)]
    Overflow(#[from] OverflowError),
    /// A domain error.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// A subarray of a [`Domain`].
///
/// Each dimension holds one or more sorted, disjoint ranges.
/// A dimension without explicitly added ranges holds the default range, the whole dimension domain.
/// Under [`Layout::GlobalOrder`] each dimension holds a single range.
#[derive(Clone, Debug, PartialEq)]
pub struct Subarray {
    domain: Arc<Domain>,
    layout: Layout,
    ranges: Vec<Vec<TypedRange>>,
    is_default: Vec<bool>,
}

impl Display for Subarray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dims = self.ranges.iter().map(|ranges| {
            if ranges.len() == 1 {
                ranges.iter().join("")
            } else {
                format!("{{{}}}", ranges.iter().join(", "))
            }
        });
        write!(f, "{}", dims.format(" x "))
    }
}

fn insert_coalesced<T: Coordinate>(
    ranges: &mut Vec<TypedRange>,
    range: Range<T>,
) -> Result<(), DimensionTypeMismatchError> {
    let mut merged = range;
    let mut kept = Vec::with_capacity(ranges.len() + 1);
    for existing in ranges.iter() {
        let existing_typed = existing.get::<T>()?;
        if existing_typed.touches(&merged) {
            merged = merged.hull(existing_typed);
        } else {
            kept.push(*existing);
        }
    }
    let merged = T::into_typed_range(merged);
    let position = kept.partition_point(|r| r.compare(&merged) == Ordering::Less);
    kept.insert(position, merged);
    *ranges = kept;
    Ok(())
}

fn range_cell_num(range: &TypedRange) -> Result<u64, SubarrayError> {
    range.count().ok_or_else(|| {
        if matches!(
            range.physical_type(),
            PhysicalType::Float32 | PhysicalType::Float64
        ) {
            SubarrayError::UncountableCells(range.to_string())
        } else {
            OverflowError::new("cell").into()
        }
    })
}

impl Subarray {
    /// Create a new subarray covering the whole `domain`.
    #[must_use]
    pub fn new(domain: Arc<Domain>, layout: Layout) -> Self {
        let ranges = domain
            .dimensions()
            .iter()
            .map(|dimension| vec![*dimension.domain()])
            .collect();
        let is_default = vec![true; domain.rank()];
        Self {
            domain,
            layout,
            ranges,
            is_default,
        }
    }

    /// Create a new subarray holding the single range combination `ndrange`.
    ///
    /// # Errors
    /// Returns [`SubarrayError`] if `ndrange` is not within `domain`.
    pub fn from_ndrange(
        domain: Arc<Domain>,
        layout: Layout,
        ndrange: &NDRange,
    ) -> Result<Self, SubarrayError> {
        domain.check_ndrange(ndrange)?;
        let ranges = ndrange.iter().map(|range| vec![*range]).collect();
        let is_default = vec![false; domain.rank()];
        Ok(Self {
            domain,
            layout,
            ranges,
            is_default,
        })
    }

    /// Return a copy of the subarray with the ranges of `dim_idx` replaced by `ranges`.
    ///
    /// `ranges` must be sorted, disjoint, non-empty, and within the domain.
    pub(crate) fn with_dim_ranges(&self, dim_idx: usize, ranges: Vec<TypedRange>) -> Self {
        let mut subarray = self.clone();
        subarray.ranges[dim_idx] = ranges;
        subarray.is_default[dim_idx] = false;
        subarray
    }

    /// The domain.
    #[must_use]
    pub fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    /// The layout.
    #[must_use]
    pub const fn layout(&self) -> Layout {
        self.layout
    }

    /// The number of dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.ranges.len()
    }

    /// The order range combinations are enumerated in.
    #[must_use]
    pub fn range_order(&self) -> Order {
        self.layout.range_order(self.domain.cell_order())
    }

    /// Returns true if any dimension holds explicitly added ranges.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.is_default.iter().any(|is_default| !is_default)
    }

    /// Returns true if dimension `dim_idx` holds the default range.
    #[must_use]
    pub fn is_default(&self, dim_idx: usize) -> bool {
        self.is_default.get(dim_idx).copied().unwrap_or(false)
    }

    fn dim_ranges(&self, dim_idx: usize) -> Result<&Vec<TypedRange>, SubarrayError> {
        self.ranges
            .get(dim_idx)
            .ok_or_else(|| DomainError::DimensionIndexOutOfBounds(dim_idx, self.rank()).into())
    }

    fn check_rank(&self, rank: usize) -> Result<(), IncompatibleDimensionalityError> {
        if rank == self.rank() {
            Ok(())
        } else {
            Err(IncompatibleDimensionalityError::new(rank, self.rank()))
        }
    }

    /// Add `range` to dimension `dim_idx`.
    ///
    /// The first range added to a dimension replaces its default range.
    /// A range that intersects or, for integers, is adjacent to existing ranges is merged with them, keeping the ranges sorted and disjoint.
    ///
    /// # Errors
    /// Returns [`SubarrayError::DimensionTypeMismatch`] if `range` does not match the dimension type,
    /// [`SubarrayError::Domain`] if `range` is outside of the dimension domain, or
    /// [`SubarrayError::MultiRangeGlobalOrder`] if a second range is added to a global order subarray.
    pub fn add_range(&mut self, dim_idx: usize, range: TypedRange) -> Result<(), SubarrayError> {
        let dimension = self.domain.dimension(dim_idx)?;
        range.check_type(dimension.physical_type())?;
        dimension.check_range(&range)?;
        let mut ranges = if self.is_default[dim_idx] {
            Vec::with_capacity(1)
        } else {
            self.ranges[dim_idx].clone()
        };
        with_physical_type!(dimension.physical_type(), T => {
            insert_coalesced::<T>(&mut ranges, *range.get::<T>()?)?;
        });
        if self.layout == Layout::GlobalOrder && ranges.len() > 1 {
            return Err(SubarrayError::MultiRangeGlobalOrder);
        }
        self.ranges[dim_idx] = ranges;
        self.is_default[dim_idx] = false;
        Ok(())
    }

    /// Add the range `[start, end]` to dimension `dim_idx`.
    ///
    /// # Errors
    /// Returns [`SubarrayError::InvalidRange`] if `start > end` or either bound is NaN.
    /// See [`Subarray::add_range`] for other errors.
    pub fn add_range_bounds<T: Coordinate>(
        &mut self,
        dim_idx: usize,
        start: T,
        end: T,
    ) -> Result<(), SubarrayError> {
        self.add_range(dim_idx, TypedRange::new(start, end)?)
    }

    /// The number of ranges on dimension `dim_idx`, 1 for the default range.
    ///
    /// # Errors
    /// Returns [`DomainError::DimensionIndexOutOfBounds`] if `dim_idx` is out of bounds.
    pub fn range_num(&self, dim_idx: usize) -> Result<u64, SubarrayError> {
        Ok(self.dim_ranges(dim_idx)?.len() as u64)
    }

    /// The ranges of dimension `dim_idx`.
    ///
    /// # Errors
    /// Returns [`DomainError::DimensionIndexOutOfBounds`] if `dim_idx` is out of bounds.
    pub fn ranges(&self, dim_idx: usize) -> Result<&[TypedRange], SubarrayError> {
        Ok(self.dim_ranges(dim_idx)?)
    }

    /// The range `range_idx` of dimension `dim_idx`.
    ///
    /// # Errors
    /// Returns [`SubarrayError`] if `dim_idx` or `range_idx` is out of bounds.
    pub fn range(&self, dim_idx: usize, range_idx: u64) -> Result<&TypedRange, SubarrayError> {
        let ranges = self.dim_ranges(dim_idx)?;
        usize::try_from(range_idx)
            .ok()
            .and_then(|idx| ranges.get(idx))
            .ok_or(SubarrayError::RangeIndexOutOfBounds {
                dim_idx,
                range_idx,
                range_num: ranges.len() as u64,
            })
    }

    /// The number of range combinations.
    ///
    /// # Errors
    /// Returns [`SubarrayError::Overflow`] if the count overflows [`u64`].
    pub fn range_num_total(&self) -> Result<u64, SubarrayError> {
        self.ranges
            .iter()
            .try_fold(1u64, |acc, ranges| acc.checked_mul(ranges.len() as u64))
            .ok_or_else(|| OverflowError::new("range combination").into())
    }

    /// The stride of each dimension in the linear range combination index.
    fn range_offsets(&self) -> Result<Vec<u64>, SubarrayError> {
        let rank = self.rank();
        let axes: Vec<usize> = self.range_order().axes(rank).collect();
        let mut offsets = vec![1u64; rank];
        for position in (0..rank.saturating_sub(1)).rev() {
            let (axis, next) = (axes[position], axes[position + 1]);
            offsets[axis] = offsets[next]
                .checked_mul(self.ranges[next].len() as u64)
                .ok_or(OverflowError::new("range combination"))?;
        }
        Ok(offsets)
    }

    /// The per-dimension range indices of range combination `combination_idx`.
    ///
    /// # Errors
    /// Returns [`SubarrayError::CombinationOutOfBounds`] if `combination_idx` is out of bounds.
    pub fn range_coords(&self, combination_idx: u64) -> Result<Vec<u64>, SubarrayError> {
        let total = self.range_num_total()?;
        if combination_idx >= total {
            return Err(SubarrayError::CombinationOutOfBounds(combination_idx, total));
        }
        let offsets = self.range_offsets()?;
        let mut coords = vec![0; self.rank()];
        let mut remainder = combination_idx;
        for axis in self.range_order().axes(self.rank()) {
            coords[axis] = remainder / offsets[axis];
            remainder %= offsets[axis];
        }
        Ok(coords)
    }

    /// The range combination index of the per-dimension range indices `range_coords`.
    ///
    /// # Errors
    /// Returns [`SubarrayError`] if `range_coords` has the wrong length or an index is out of bounds.
    pub fn range_idx(&self, range_coords: &[u64]) -> Result<u64, SubarrayError> {
        self.check_rank(range_coords.len())?;
        let offsets = self.range_offsets()?;
        let mut combination_idx = 0;
        for (dim_idx, (&range_idx, ranges)) in
            std::iter::zip(range_coords, &self.ranges).enumerate()
        {
            let range_num = ranges.len() as u64;
            if range_idx >= range_num {
                return Err(SubarrayError::RangeIndexOutOfBounds {
                    dim_idx,
                    range_idx,
                    range_num,
                });
            }
            combination_idx += range_idx * offsets[dim_idx];
        }
        Ok(combination_idx)
    }

    /// The [`NDRange`] of range combination `combination_idx`.
    ///
    /// # Errors
    /// Returns [`SubarrayError::CombinationOutOfBounds`] if `combination_idx` is out of bounds.
    pub fn combined_ndrange(&self, combination_idx: u64) -> Result<NDRange, SubarrayError> {
        let coords = self.range_coords(combination_idx)?;
        std::iter::zip(&coords, 0..)
            .map(|(&range_idx, dim_idx)| self.range(dim_idx, range_idx).copied())
            .collect::<Result<Vec<_>, _>>()
            .map(NDRange::new)
    }

    /// The subarray spanning range combinations `start` to `end` (inclusive).
    ///
    /// Each dimension keeps the ranges between the range indices of `start` and `end`.
    ///
    /// # Errors
    /// Returns [`SubarrayError`] if `start > end` or either is out of bounds.
    pub fn subarray_between(&self, start: u64, end: u64) -> Result<Self, SubarrayError> {
        if start > end {
            return Err(SubarrayError::ReversedCombinationInterval { start, end });
        }
        let start_coords = self.range_coords(start)?;
        let end_coords = self.range_coords(end)?;
        let mut ranges = Vec::with_capacity(self.rank());
        for (dim_ranges, (&first, &last)) in
            std::iter::zip(&self.ranges, std::iter::zip(&start_coords, &end_coords))
        {
            let (first, last) = (first.min(last), first.max(last));
            #[allow(clippy::cast_possible_truncation)]
            ranges.push(dim_ranges[first as usize..=last as usize].to_vec());
        }
        Ok(Self {
            domain: self.domain.clone(),
            layout: self.layout,
            ranges,
            is_default: self.is_default.clone(),
        })
    }

    /// The number of cells in the subarray.
    ///
    /// # Errors
    /// Returns [`SubarrayError::UncountableCells`] if a real-valued range is not unary, or
    /// [`SubarrayError::Overflow`] if the count overflows [`u64`].
    pub fn cell_num(&self) -> Result<u64, SubarrayError> {
        let mut cell_num = 1u64;
        for ranges in &self.ranges {
            let mut dim_cell_num = 0u64;
            for range in ranges {
                dim_cell_num = dim_cell_num
                    .checked_add(range_cell_num(range)?)
                    .ok_or(OverflowError::new("cell"))?;
            }
            cell_num = cell_num
                .checked_mul(dim_cell_num)
                .ok_or(OverflowError::new("cell"))?;
        }
        Ok(cell_num)
    }

    /// Returns true if the subarray holds a single cell.
    #[must_use]
    pub fn is_unary(&self) -> bool {
        self.ranges
            .iter()
            .all(|ranges| ranges.len() == 1 && ranges[0].is_unary())
    }

    /// The bounding box of the subarray.
    ///
    /// # Errors
    /// Returns [`SubarrayError::DimensionTypeMismatch`] if the ranges of a dimension have inconsistent types.
    pub fn bounding_ndrange(&self) -> Result<NDRange, SubarrayError> {
        let mut bounds = Vec::with_capacity(self.rank());
        for (dim_idx, ranges) in self.ranges.iter().enumerate() {
            let Some((first, rest)) = ranges.split_first() else {
                return Err(SubarrayError::RangeIndexOutOfBounds {
                    dim_idx,
                    range_idx: 0,
                    range_num: 0,
                });
            };
            bounds.push(rest.iter().try_fold(*first, |acc, range| acc.hull(range))?);
        }
        Ok(NDRange::new(bounds))
    }

    /// Returns true if any range combination intersects `ndrange`.
    ///
    /// # Errors
    /// Returns [`SubarrayError`] if the rank or types of `ndrange` do not match the subarray.
    pub fn overlaps(&self, ndrange: &NDRange) -> Result<bool, SubarrayError> {
        self.check_rank(ndrange.rank())?;
        for (ranges, other) in std::iter::zip(&self.ranges, ndrange.iter()) {
            let mut any = false;
            for range in ranges {
                if range.intersects(other)? {
                    any = true;
                    break;
                }
            }
            if !any {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Crop the subarray to `ndrange`.
    ///
    /// Returns [`None`] if no range combination intersects `ndrange`.
    ///
    /// # Errors
    /// Returns [`SubarrayError`] if the rank or types of `ndrange` do not match the subarray.
    pub fn crop(&self, ndrange: &NDRange) -> Result<Option<Self>, SubarrayError> {
        self.check_rank(ndrange.rank())?;
        let mut ranges = Vec::with_capacity(self.rank());
        for (dim_ranges, other) in std::iter::zip(&self.ranges, ndrange.iter()) {
            let mut cropped = Vec::with_capacity(dim_ranges.len());
            for range in dim_ranges {
                if let Some(intersection) = range.intersection(other)? {
                    cropped.push(intersection);
                }
            }
            if cropped.is_empty() {
                return Ok(None);
            }
            ranges.push(cropped);
        }
        Ok(Some(Self {
            domain: self.domain.clone(),
            layout: self.layout,
            ranges,
            is_default: vec![false; self.rank()],
        }))
    }

    /// Returns true if the subarray holds a single range per dimension that starts and ends on tile boundaries.
    ///
    /// # Errors
    /// Returns [`SubarrayError::Domain`] if a range is outside of the domain.
    pub fn coincides_with_tiles(&self) -> Result<bool, SubarrayError> {
        if self.ranges.iter().any(|ranges| ranges.len() != 1) {
            return Ok(false);
        }
        for (dimension, ranges) in std::iter::zip(self.domain.dimensions(), &self.ranges) {
            if !dimension.coincides_with_tiles(&ranges[0])? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use ndtile_domain::Dimension;
    use ndtile_range::Datatype;

    use super::*;

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

    #[test]
    fn subarray_default() {
        let subarray = Subarray::new(domain_2d(), Layout::RowMajor);
        assert!(!subarray.is_set());
        assert!(subarray.is_default(0));
        assert_eq!(subarray.range_num(0).unwrap(), 1);
        assert_eq!(subarray.ranges(1).unwrap(), &[r(0, 99)]);
        assert_eq!(subarray.cell_num().unwrap(), 10_000);
        assert_eq!(subarray.range_num_total().unwrap(), 1);
        assert!(subarray.range_num(2).is_err());
        assert_eq!(subarray.to_string(), "[0, 99] x [0, 99]");
    }

    #[test]
    fn subarray_add_range_coalesces() {
        let mut subarray = Subarray::new(domain_2d(), Layout::RowMajor);
        subarray.add_range_bounds(0, 50i32, 59).unwrap();
        assert_eq!(subarray.ranges(0).unwrap(), &[r(50, 59)]);
        subarray.add_range_bounds(0, 10i32, 19).unwrap();
        subarray.add_range_bounds(0, 30i32, 39).unwrap();
        assert_eq!(
            subarray.ranges(0).unwrap(),
            &[r(10, 19), r(30, 39), r(50, 59)]
        );
        // adjacent on the left, overlapping on the right
        subarray.add_range_bounds(0, 20i32, 32).unwrap();
        assert_eq!(subarray.ranges(0).unwrap(), &[r(10, 39), r(50, 59)]);
        // bridges the remaining gap
        subarray.add_range_bounds(0, 40i32, 49).unwrap();
        assert_eq!(subarray.ranges(0).unwrap(), &[r(10, 59)]);
        assert!(subarray.is_set());
        assert!(subarray.is_default(1));
        assert_eq!(
            subarray.to_string(),
            "[10, 59] x [0, 99]"
        );
    }

    #[test]
    fn subarray_add_range_errors() {
        let mut subarray = Subarray::new(domain_2d(), Layout::RowMajor);
        assert!(matches!(
            subarray.add_range_bounds(0, 5i32, 4),
            Err(SubarrayError::InvalidRange(_))
        ));
        assert!(matches!(
            subarray.add_range_bounds(0, 5i64, 6),
            Err(SubarrayError::DimensionTypeMismatch(_))
        ));
        assert!(matches!(
            subarray.add_range_bounds(0, 90i32, 100),
            Err(SubarrayError::Domain(DomainError::RangeOutOfBounds { .. }))
        ));
        assert!(matches!(
            subarray.add_range_bounds(2, 0i32, 1),
            Err(SubarrayError::Domain(DomainError::DimensionIndexOutOfBounds(2, 2)))
        ));
        assert!(!subarray.is_set());

        let mut subarray = Subarray::new(domain_2d(), Layout::GlobalOrder);
        subarray.add_range_bounds(0, 0i32, 4).unwrap();
        subarray.add_range_bounds(0, 5i32, 9).unwrap();
        assert!(matches!(
            subarray.add_range_bounds(0, 20i32, 29),
            Err(SubarrayError::MultiRangeGlobalOrder)
        ));
        assert_eq!(subarray.ranges(0).unwrap(), &[r(0, 9)]);
    }

    fn multi_range(layout: Layout) -> Subarray {
        let mut subarray = Subarray::new(domain_2d(), layout);
        subarray.add_range_bounds(0, 0i32, 1).unwrap();
        subarray.add_range_bounds(0, 5i32, 6).unwrap();
        subarray.add_range_bounds(1, 0i32, 2).unwrap();
        subarray.add_range_bounds(1, 10i32, 12).unwrap();
        subarray.add_range_bounds(1, 20i32, 22).unwrap();
        subarray
    }

    #[test]
    fn subarray_range_combinations_row_major() {
        let subarray = multi_range(Layout::RowMajor);
        assert_eq!(subarray.range_num_total().unwrap(), 6);
        assert_eq!(subarray.range_coords(0).unwrap(), vec![0, 0]);
        assert_eq!(subarray.range_coords(2).unwrap(), vec![0, 2]);
        assert_eq!(subarray.range_coords(4).unwrap(), vec![1, 1]);
        assert_eq!(subarray.range_idx(&[1, 1]).unwrap(), 4);
        assert_eq!(
            subarray.combined_ndrange(4).unwrap(),
            NDRange::new(vec![r(5, 6), r(10, 12)])
        );
        assert!(matches!(
            subarray.range_coords(6),
            Err(SubarrayError::CombinationOutOfBounds(6, 6))
        ));
        assert!(matches!(
            subarray.range_idx(&[2, 0]),
            Err(SubarrayError::RangeIndexOutOfBounds { .. })
        ));
        assert_eq!(subarray.cell_num().unwrap(), 4 * 9);
        assert_eq!(
            subarray.to_string(),
            "{[0, 1], [5, 6]} x {[0, 2], [10, 12], [20, 22]}"
        );
    }

    #[test]
    fn subarray_range_combinations_col_major() {
        let subarray = multi_range(Layout::ColMajor);
        assert_eq!(subarray.range_coords(1).unwrap(), vec![1, 0]);
        assert_eq!(subarray.range_coords(4).unwrap(), vec![0, 2]);
        assert_eq!(subarray.range_idx(&[1, 2]).unwrap(), 5);
        for idx in 0..6 {
            let coords = subarray.range_coords(idx).unwrap();
            assert_eq!(subarray.range_idx(&coords).unwrap(), idx);
        }
    }

    #[test]
    fn subarray_between() {
        let subarray = multi_range(Layout::RowMajor);
        let between = subarray.subarray_between(0, 2).unwrap();
        assert_eq!(between.ranges(0).unwrap(), &[r(0, 1)]);
        assert_eq!(between.range_num(1).unwrap(), 3);
        let between = subarray.subarray_between(3, 5).unwrap();
        assert_eq!(between.ranges(0).unwrap(), &[r(5, 6)]);
        let between = subarray.subarray_between(4, 4).unwrap();
        assert_eq!(between.cell_num().unwrap(), 6);
        assert!(matches!(
            subarray.subarray_between(3, 2),
            Err(SubarrayError::ReversedCombinationInterval { start: 3, end: 2 })
        ));
    }

    #[test]
    fn subarray_cell_num_errors() {
        let domain = Arc::new(
            Domain::new(vec![
                Dimension::new("x", Datatype::Float64, Range::new(0.0f64, 1.0).unwrap(), 0.5)
                    .unwrap(),
            ])
            .unwrap(),
        );
        let mut subarray = Subarray::new(domain, Layout::RowMajor);
        assert!(matches!(
            subarray.cell_num(),
            Err(SubarrayError::UncountableCells(_))
        ));
        subarray.add_range_bounds(0, 0.25f64, 0.25).unwrap();
        assert_eq!(subarray.cell_num().unwrap(), 1);
        assert!(subarray.is_unary());

        let dim = |name: &str| {
            Dimension::new(
                name,
                Datatype::UInt64,
                Range::new(0u64, u64::MAX - 1).unwrap(),
                1 << 32,
            )
            .unwrap()
        };
        let domain = Arc::new(Domain::new(vec![dim("a"), dim("b")]).unwrap());
        assert!(matches!(
            Subarray::new(domain, Layout::RowMajor).cell_num(),
            Err(SubarrayError::Overflow(_))
        ));
    }

    #[test]
    fn subarray_geometry() {
        let subarray = multi_range(Layout::RowMajor);
        assert_eq!(
            subarray.bounding_ndrange().unwrap(),
            NDRange::new(vec![r(0, 6), r(0, 22)])
        );
        assert!(subarray.overlaps(&NDRange::new(vec![r(4, 5), r(11, 11)])).unwrap());
        assert!(!subarray.overlaps(&NDRange::new(vec![r(2, 4), r(0, 99)])).unwrap());
        assert!(subarray.overlaps(&NDRange::new(vec![r(0, 99)])).is_err());

        let cropped = subarray
            .crop(&NDRange::new(vec![r(1, 5), r(2, 10)]))
            .unwrap()
            .unwrap();
        assert_eq!(cropped.ranges(0).unwrap(), &[r(1, 1), r(5, 5)]);
        assert_eq!(cropped.ranges(1).unwrap(), &[r(2, 2), r(10, 10)]);
        assert!(subarray
            .crop(&NDRange::new(vec![r(2, 4), r(0, 99)]))
            .unwrap()
            .is_none());

        assert!(!subarray.coincides_with_tiles().unwrap());
        let tiles = Subarray::from_ndrange(
            domain_2d(),
            Layout::RowMajor,
            &NDRange::new(vec![r(10, 29), r(0, 9)]),
        )
        .unwrap();
        assert!(tiles.coincides_with_tiles().unwrap());
        assert!(!tiles.is_unary());
        assert!(Subarray::from_ndrange(
            domain_2d(),
            Layout::RowMajor,
            &NDRange::new(vec![r(10, 29), r(0, 100)]),
        )
        .is_err());
    }
}
