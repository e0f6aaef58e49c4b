//! Inclusive one-dimensional ranges and range arithmetic.

use std::cmp::Ordering;
use std::fmt::Display;
use std::ops::RangeInclusive;

use thiserror::Error;

use crate::{Coordinate, DomainError};

/// An invalid range error.
#[derive(Clone, Debug, Error)]
pub enum InvalidRangeError {
    /// The range start is greater than the range end.
    #[error("range start {start} is greater than range end {end}")]
    Reversed {
        /// The range start.
        start: String,
        /// The range end.
        end: String,
    },
    /// A range bound is NaN.
    #[error("range bounds must not be NaN")]
    NaN,
}

/// An inclusive range `[start, end]` of coordinates.
///
/// A range always satisfies `start <= end` and never holds NaN.
/// Ranges are ordered lexicographically by `(start, end)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Range<T> {
    start: T,
    end: T,
}

impl<T: Coordinate> Display for Range<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

impl<T: Coordinate> TryFrom<RangeInclusive<T>> for Range<T> {
    type Error = InvalidRangeError;

    fn try_from(range: RangeInclusive<T>) -> Result<Self, Self::Error> {
        let (start, end) = range.into_inner();
        Self::new(start, end)
    }
}

impl<T: Coordinate> PartialOrd for Range<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl<T: Coordinate> Range<T> {
    /// Create a new range.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError`] if `start > end` or either bound is NaN.
    pub fn new(start: T, end: T) -> Result<Self, InvalidRangeError> {
        if start.is_nan() || end.is_nan() {
            Err(InvalidRangeError::NaN)
        } else if start > end {
            Err(InvalidRangeError::Reversed {
                start: start.to_string(),
                end: end.to_string(),
            })
        } else {
            Ok(Self { start, end })
        }
    }

    /// Create a new range holding the single coordinate `value`.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError`] if `value` is NaN.
    pub fn new_unary(value: T) -> Result<Self, InvalidRangeError> {
        Self::new(value, value)
    }

    /// The start of the range.
    #[must_use]
    pub fn start(&self) -> T {
        self.start
    }

    /// The end of the range (inclusive).
    #[must_use]
    pub fn end(&self) -> T {
        self.end
    }

    /// Returns true if the range holds a single coordinate.
    #[must_use]
    pub fn is_unary(&self) -> bool {
        self.start == self.end
    }

    /// Returns true if `value` is within the range.
    #[must_use]
    pub fn contains(&self, value: T) -> bool {
        self.start <= value && value <= self.end
    }

    /// Returns true if the range intersects `other`.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Return the intersection of the range with `other`, if any.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        self.intersects(other).then(|| Self {
            start: partial_max(self.start, other.start),
            end: partial_min(self.end, other.end),
        })
    }

    /// Returns true if `other` lies entirely within the range.
    #[must_use]
    pub fn covers(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns true if the range intersects `other` or, for integers, is directly adjacent to it.
    #[must_use]
    pub fn touches(&self, other: &Self) -> bool {
        self.intersects(other)
            || (T::IS_INTEGER
                && ((self.end < other.start && self.end.successor() == other.start)
                    || (other.end < self.start && other.end.successor() == self.start)))
    }

    /// Return the smallest range covering both the range and `other`.
    #[must_use]
    pub fn hull(&self, other: &Self) -> Self {
        Self {
            start: partial_min(self.start, other.start),
            end: partial_max(self.end, other.end),
        }
    }

    /// Compare lexicographically by `(start, end)`.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        let start = self.start.partial_cmp(&other.start);
        let end = self.end.partial_cmp(&other.end);
        start
            .unwrap_or(Ordering::Equal)
            .then(end.unwrap_or(Ordering::Equal))
    }

    /// The number of coordinates in the range.
    ///
    /// Returns [`None`] for a non-unary real range or if the count exceeds [`u64::MAX`].
    #[must_use]
    pub fn count(&self) -> Option<u64> {
        T::count(self.start, self.end)
    }

    /// The fraction of `mbr` covered by the range, in `[0, 1]`.
    #[must_use]
    pub fn overlap_ratio(&self, mbr: &Self) -> f64 {
        match self.intersection(mbr) {
            Some(overlap) => {
                (T::width(overlap.start, overlap.end) / T::width(mbr.start, mbr.end)).min(1.0)
            }
            None => 0.0,
        }
    }

    /// The coordinate the range is split after when bisected.
    ///
    /// Returns [`None`] for a unary range.
    /// The split point is `start + (end - start) / 2`, falling back to `start` where rounding reaches `end`.
    #[must_use]
    pub fn split_point(&self) -> Option<T> {
        if self.is_unary() {
            return None;
        }
        let point = T::bisect(self.start, self.end);
        if point < self.end && point >= self.start {
            Some(point)
        } else {
            Some(self.start)
        }
    }

    /// Split the range into `[start, point]` and `[successor(point), end]`.
    ///
    /// Returns [`None`] unless `start <= point < end`.
    #[must_use]
    pub fn split_at(&self, point: T) -> Option<(Self, Self)> {
        if point < self.start || point >= self.end {
            return None;
        }
        Some((
            Self {
                start: self.start,
                end: point,
            },
            Self {
                start: point.successor(),
                end: self.end,
            },
        ))
    }
}

fn partial_max<T: PartialOrd>(a: T, b: T) -> T {
    if b > a {
        b
    } else {
        a
    }
}

fn partial_min<T: PartialOrd>(a: T, b: T) -> T {
    if b < a {
        b
    } else {
        a
    }
}

/// Return the index of the tile holding `coord`, `floor((coord - domain_start) / tile_extent)`.
///
/// # Errors
/// Returns [`DomainError::CoordinateBeforeDomainStart`] if `coord < domain_start`, or
/// [`DomainError::InvalidTileExtent`] if `tile_extent` is not positive.
pub fn tile_idx<T: Coordinate>(
    coord: T,
    domain_start: T,
    tile_extent: T,
) -> Result<u64, DomainError> {
    if !(tile_extent > T::zero()) {
        return Err(DomainError::InvalidTileExtent {
            tile_extent: tile_extent.to_string(),
            domain: format!("[{domain_start}, ..]"),
        });
    }
    if coord < domain_start || coord.is_nan() {
        return Err(DomainError::CoordinateBeforeDomainStart {
            coord: coord.to_string(),
            domain_start: domain_start.to_string(),
        });
    }
    Ok(coord.tile_offset(domain_start, tile_extent))
}

/// Returns true if `a` and `b` intersect.
#[must_use]
pub fn intersects<T: Coordinate>(a: &Range<T>, b: &Range<T>) -> bool {
    a.intersects(b)
}

/// Return the intersection of `a` and `b`, if any.
#[must_use]
pub fn intersection<T: Coordinate>(a: &Range<T>, b: &Range<T>) -> Option<Range<T>> {
    a.intersection(b)
}

/// Compare `a` and `b` lexicographically by `(start, end)`.
#[must_use]
pub fn compare<T: Coordinate>(a: &Range<T>, b: &Range<T>) -> Ordering {
    a.compare(b)
}
