//! N-dimensional ranges.

use std::cmp::Ordering;
use std::fmt::Display;

use derive_more::{Deref, From};
use itertools::Itertools;

use crate::{DomainError, IncompatibleDimensionalityError, TypedRange};

/// An N-dimensional range, one [`TypedRange`] per dimension.
///
/// An `NDRange` describes a domain's bounding box, a fragment's non-empty domain, or one range combination of a subarray.
#[derive(Clone, Debug, PartialEq, Default, Deref, From)]
pub struct NDRange(Vec<TypedRange>);

impl Display for NDRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join(" x "))
    }
}

impl FromIterator<TypedRange> for NDRange {
    fn from_iter<I: IntoIterator<Item = TypedRange>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for NDRange {
    type Item = TypedRange;
    type IntoIter = std::vec::IntoIter<TypedRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl NDRange {
    /// Create a new N-dimensional range.
    #[must_use]
    pub fn new(ranges: Vec<TypedRange>) -> Self {
        Self(ranges)
    }

    /// The number of dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Consume the range and return the per-dimension ranges.
    #[must_use]
    pub fn into_inner(self) -> Vec<TypedRange> {
        self.0
    }

    /// Mutable access to the range of dimension `dim_idx`.
    pub fn get_mut(&mut self, dim_idx: usize) -> Option<&mut TypedRange> {
        self.0.get_mut(dim_idx)
    }

    fn check_rank(&self, other: &Self) -> Result<(), IncompatibleDimensionalityError> {
        if self.rank() == other.rank() {
            Ok(())
        } else {
            Err(IncompatibleDimensionalityError::new(other.rank(), self.rank()))
        }
    }

    /// Returns true if every dimension intersects the corresponding dimension of `other`.
    ///
    /// # Errors
    /// Returns [`DomainError`] if the ranks or per-dimension types differ.
    pub fn intersects(&self, other: &Self) -> Result<bool, DomainError> {
        self.check_rank(other)?;
        for (a, b) in std::iter::zip(&self.0, &other.0) {
            if !a.intersects(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Return the intersection with `other`, if any.
    ///
    /// # Errors
    /// Returns [`DomainError`] if the ranks or per-dimension types differ.
    pub fn intersection(&self, other: &Self) -> Result<Option<Self>, DomainError> {
        self.check_rank(other)?;
        let mut ranges = Vec::with_capacity(self.rank());
        for (a, b) in std::iter::zip(&self.0, &other.0) {
            match a.intersection(b)? {
                Some(range) => ranges.push(range),
                None => return Ok(None),
            }
        }
        Ok(Some(Self(ranges)))
    }

    /// Returns true if `other` lies entirely within the range.
    ///
    /// # Errors
    /// Returns [`DomainError`] if the ranks or per-dimension types differ.
    pub fn covers(&self, other: &Self) -> Result<bool, DomainError> {
        self.check_rank(other)?;
        for (a, b) in std::iter::zip(&self.0, &other.0) {
            if !a.covers(b)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Expand the range to the bounding box of itself and `other`.
    ///
    /// # Errors
    /// Returns [`DomainError`] if the ranks or per-dimension types differ.
    pub fn expand(&mut self, other: &Self) -> Result<(), DomainError> {
        self.check_rank(other)?;
        for (a, b) in std::iter::zip(&mut self.0, &other.0) {
            *a = a.hull(b)?;
        }
        Ok(())
    }

    /// The number of cells in the range.
    ///
    /// Returns [`None`] if a real-valued dimension is not unary or the count overflows.
    #[must_use]
    pub fn cell_num(&self) -> Option<u64> {
        self.0
            .iter()
            .try_fold(1u64, |acc, range| acc.checked_mul(range.count()?))
    }

    /// Compare lexicographically, dimension by dimension.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        std::iter::zip(&self.0, &other.0)
            .map(|(a, b)| a.compare(b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }
}
