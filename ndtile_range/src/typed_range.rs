//! Type-erased ranges and coordinates.

use std::cmp::Ordering;
use std::fmt::Display;

use derive_more::From;
use thiserror::Error;

use crate::{with_physical_type, Coordinate, PhysicalType, Range};

/// A dimension type mismatch error.
#[derive(Copy, Clone, Debug, Error)]
#[error("dimension type mismatch: got {got}, expected {expected}")]
pub struct DimensionTypeMismatchError {
    got: PhysicalType,
    expected: PhysicalType,
}

impl DimensionTypeMismatchError {
    /// Create a new dimension type mismatch error.
    #[must_use]
    pub const fn new(got: PhysicalType, expected: PhysicalType) -> Self {
        Self { got, expected }
    }

    /// The physical type that was supplied.
    #[must_use]
    pub const fn got(&self) -> PhysicalType {
        self.got
    }

    /// The physical type that was expected.
    #[must_use]
    pub const fn expected(&self) -> PhysicalType {
        self.expected
    }
}

/// A type-erased [`Range`].
#[derive(Copy, Clone, Debug, PartialEq, From)]
#[allow(missing_docs)]
pub enum TypedRange {
    Int8(Range<i8>),
    UInt8(Range<u8>),
    Int16(Range<i16>),
    UInt16(Range<u16>),
    Int32(Range<i32>),
    UInt32(Range<u32>),
    Int64(Range<i64>),
    UInt64(Range<u64>),
    Float32(Range<f32>),
    Float64(Range<f64>),
}

/// A type-erased coordinate.
#[derive(Copy, Clone, Debug, PartialEq, From)]
#[allow(missing_docs)]
pub enum TypedValue {
    Int8(i8),
    UInt8(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
}

macro_rules! map_typed_range {
    ($range:expr, $r:ident => $body:expr) => {
        match $range {
            TypedRange::Int8($r) => $body,
            TypedRange::UInt8($r) => $body,
            TypedRange::Int16($r) => $body,
            TypedRange::UInt16($r) => $body,
            TypedRange::Int32($r) => $body,
            TypedRange::UInt32($r) => $body,
            TypedRange::Int64($r) => $body,
            TypedRange::UInt64($r) => $body,
            TypedRange::Float32($r) => $body,
            TypedRange::Float64($r) => $body,
        }
    };
}

impl Display for TypedRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        map_typed_range!(self, range => Display::fmt(range, f))
    }
}

impl Display for TypedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int8(value) => Display::fmt(value, f),
            Self::UInt8(value) => Display::fmt(value, f),
            Self::Int16(value) => Display::fmt(value, f),
            Self::UInt16(value) => Display::fmt(value, f),
            Self::Int32(value) => Display::fmt(value, f),
            Self::UInt32(value) => Display::fmt(value, f),
            Self::Int64(value) => Display::fmt(value, f),
            Self::UInt64(value) => Display::fmt(value, f),
            Self::Float32(value) => Display::fmt(value, f),
            Self::Float64(value) => Display::fmt(value, f),
        }
    }
}

impl TypedValue {
    /// The physical type of the value.
    #[must_use]
    pub const fn physical_type(&self) -> PhysicalType {
        match self {
            Self::Int8(_) => PhysicalType::Int8,
            Self::UInt8(_) => PhysicalType::UInt8,
            Self::Int16(_) => PhysicalType::Int16,
            Self::UInt16(_) => PhysicalType::UInt16,
            Self::Int32(_) => PhysicalType::Int32,
            Self::UInt32(_) => PhysicalType::UInt32,
            Self::Int64(_) => PhysicalType::Int64,
            Self::UInt64(_) => PhysicalType::UInt64,
            Self::Float32(_) => PhysicalType::Float32,
            Self::Float64(_) => PhysicalType::Float64,
        }
    }

    /// Return the value as `T`.
    ///
    /// # Errors
    /// Returns [`DimensionTypeMismatchError`] if the value does not hold a `T`.
    pub fn get<T: Coordinate>(&self) -> Result<T, DimensionTypeMismatchError> {
        T::from_typed_value(self)
            .ok_or_else(|| DimensionTypeMismatchError::new(self.physical_type(), T::PHYSICAL_TYPE))
    }

    /// Compare with a value of the same physical type.
    ///
    /// # Errors
    /// Returns [`DimensionTypeMismatchError`] if the physical types differ.
    pub fn compare(&self, other: &Self) -> Result<Ordering, DimensionTypeMismatchError> {
        with_physical_type!(self.physical_type(), T => {
            let a = self.get::<T>()?;
            let b = other.get::<T>()?;
            Ok(a.partial_cmp(&b).unwrap_or(Ordering::Equal))
        })
    }
}

impl TypedRange {
    /// Create a type-erased range from `start` and `end`.
    ///
    /// # Errors
    /// Returns [`InvalidRangeError`](crate::InvalidRangeError) if `start > end` or either bound is NaN.
    pub fn new<T: Coordinate>(start: T, end: T) -> Result<Self, crate::InvalidRangeError> {
        Ok(T::into_typed_range(Range::new(start, end)?))
    }

    /// The physical type of the range.
    #[must_use]
    pub const fn physical_type(&self) -> PhysicalType {
        match self {
            Self::Int8(_) => PhysicalType::Int8,
            Self::UInt8(_) => PhysicalType::UInt8,
            Self::Int16(_) => PhysicalType::Int16,
            Self::UInt16(_) => PhysicalType::UInt16,
            Self::Int32(_) => PhysicalType::Int32,
            Self::UInt32(_) => PhysicalType::UInt32,
            Self::Int64(_) => PhysicalType::Int64,
            Self::UInt64(_) => PhysicalType::UInt64,
            Self::Float32(_) => PhysicalType::Float32,
            Self::Float64(_) => PhysicalType::Float64,
        }
    }

    /// Borrow the range as a `Range<T>`.
    ///
    /// # Errors
    /// Returns [`DimensionTypeMismatchError`] if the range does not hold a `Range<T>`.
    pub fn get<T: Coordinate>(&self) -> Result<&Range<T>, DimensionTypeMismatchError> {
        T::from_typed_range(self)
            .ok_or_else(|| DimensionTypeMismatchError::new(self.physical_type(), T::PHYSICAL_TYPE))
    }

    /// Check that the range has the physical type `expected`.
    ///
    /// # Errors
    /// Returns [`DimensionTypeMismatchError`] if the physical types differ.
    pub fn check_type(&self, expected: PhysicalType) -> Result<(), DimensionTypeMismatchError> {
        if self.physical_type() == expected {
            Ok(())
        } else {
            Err(DimensionTypeMismatchError::new(self.physical_type(), expected))
        }
    }

    /// The start of the range.
    #[must_use]
    pub fn start(&self) -> TypedValue {
        map_typed_range!(self, range => range.start().into_typed_value())
    }

    /// The end of the range.
    #[must_use]
    pub fn end(&self) -> TypedValue {
        map_typed_range!(self, range => range.end().into_typed_value())
    }

    /// Returns true if the range holds a single coordinate.
    #[must_use]
    pub fn is_unary(&self) -> bool {
        map_typed_range!(self, range => range.is_unary())
    }

    /// The number of coordinates in the range.
    ///
    /// Returns [`None`] for a non-unary real range or if the count exceeds [`u64::MAX`].
    #[must_use]
    pub fn count(&self) -> Option<u64> {
        map_typed_range!(self, range => range.count())
    }

    /// Returns true if the range intersects `other`.
    ///
    /// # Errors
    /// Returns [`DimensionTypeMismatchError`] if the physical types differ.
    pub fn intersects(&self, other: &Self) -> Result<bool, DimensionTypeMismatchError> {
        with_physical_type!(self.physical_type(), T => {
            Ok(self.get::<T>()?.intersects(other.get::<T>()?))
        })
    }

    /// Return the intersection with `other`, if any.
    ///
    /// # Errors
    /// Returns [`DimensionTypeMismatchError`] if the physical types differ.
    pub fn intersection(&self, other: &Self) -> Result<Option<Self>, DimensionTypeMismatchError> {
        with_physical_type!(self.physical_type(), T => {
            Ok(self
                .get::<T>()?
                .intersection(other.get::<T>()?)
                .map(T::into_typed_range))
        })
    }

    /// Returns true if `other` lies entirely within the range.
    ///
    /// # Errors
    /// Returns [`DimensionTypeMismatchError`] if the physical types differ.
    pub fn covers(&self, other: &Self) -> Result<bool, DimensionTypeMismatchError> {
        with_physical_type!(self.physical_type(), T => {
            Ok(self.get::<T>()?.covers(other.get::<T>()?))
        })
    }

    /// Return the smallest range covering both the range and `other`.
    ///
    /// # Errors
    /// Returns [`DimensionTypeMismatchError`] if the physical types differ.
    pub fn hull(&self, other: &Self) -> Result<Self, DimensionTypeMismatchError> {
        with_physical_type!(self.physical_type(), T => {
            Ok(T::into_typed_range(self.get::<T>()?.hull(other.get::<T>()?)))
        })
    }

    /// The fraction of `mbr` covered by the range.
    ///
    /// # Errors
    /// Returns [`DimensionTypeMismatchError`] if the physical types differ.
    pub fn overlap_ratio(&self, mbr: &Self) -> Result<f64, DimensionTypeMismatchError> {
        with_physical_type!(self.physical_type(), T => {
            Ok(self.get::<T>()?.overlap_ratio(mbr.get::<T>()?))
        })
    }

    /// Compare lexicographically by `(start, end)`.
    ///
    /// Ranges of different physical types are ordered by their physical type.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        if self.physical_type() != other.physical_type() {
            return self.physical_type().cmp(&other.physical_type());
        }
        with_physical_type!(self.physical_type(), T => {
            match (T::from_typed_range(self), T::from_typed_range(other)) {
                (Some(a), Some(b)) => a.compare(b),
                _ => Ordering::Equal,
            }
        })
    }
}
