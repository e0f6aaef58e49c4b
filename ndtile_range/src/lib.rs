//! Typed coordinate ranges and N-dimensional ranges for the `ndtile` crate.
//!
//! This crate holds the range arithmetic that the domain model, subarrays and the partitioner build on:
//!  - [`Range<T>`]: an inclusive range over a [`Coordinate`] type with tiling, intersection and ordering helpers,
//!  - [`TypedRange`] and [`TypedValue`]: type-erased ranges and coordinates over the supported [`PhysicalType`]s,
//!  - [`NDRange`]: one [`TypedRange`] per dimension.
//!
//! ## Licence
//! `ndtile_range` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.

mod coordinate;
pub use coordinate::Coordinate;

mod datatype;
pub use datatype::{Datatype, PhysicalType, TimeUnit};

mod range;
pub use range::{compare, intersection, intersects, tile_idx, InvalidRangeError, Range};

mod typed_range;
pub use typed_range::{DimensionTypeMismatchError, TypedRange, TypedValue};

mod nd_range;
pub use nd_range::NDRange;

use thiserror::Error;

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

/// A count overflow error.
#[derive(Copy, Clone, Debug, Error)]
#[error("{0} count overflows u64")]
pub struct OverflowError(&'static str);

impl OverflowError {
    /// Create a new overflow error for a count of `what`.
    #[must_use]
    pub const fn new(what: &'static str) -> Self {
        Self(what)
    }
}

/// A domain error.
#[derive(Clone, Debug, Error)]
pub enum DomainError {
    /// A coordinate precedes the start of the domain.
    #[error("coordinate {coord} is before the domain start {domain_start}")]
    CoordinateBeforeDomainStart {
        /// The coordinate.
        coord: String,
        /// The domain start.
        domain_start: String,
    },
    /// A range is outside the domain of a dimension.
    #[error("range {range} is out of bounds of dimension {dimension} with domain {domain}")]
    RangeOutOfBounds {
        /// The dimension name.
        dimension: String,
        /// The range.
        range: String,
        /// The dimension domain.
        domain: String,
    },
    /// A tile extent is not positive, exceeds the domain, or cannot be applied to the domain.
    #[error("invalid tile extent {tile_extent} for domain {domain}")]
    InvalidTileExtent {
        /// The tile extent.
        tile_extent: String,
        /// The dimension domain.
        domain: String,
    },
    /// A dimension index is out of bounds.
    #[error("dimension index {0} is out of bounds for rank {1}")]
    DimensionIndexOutOfBounds(usize, usize),
    /// Tile coordinates are outside of the tile grid.
    #[error("tile coordinates {tile_coords:?} are out of bounds of the tile grid {grid_shape:?}")]
    TileOutOfBounds {
        /// The tile coordinates.
        tile_coords: Vec<u64>,
        /// The tile grid shape.
        grid_shape: Vec<u64>,
    },
    /// Two dimensions share a name.
    #[error("duplicate dimension name {0}")]
    DuplicateDimensionName(String),
    /// A domain has no dimensions.
    #[error("a domain must have at least one dimension")]
    EmptyDomain,
    /// An incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionality(#[from] IncompatibleDimensionalityError),
    /// A dimension type mismatch.
    #[error(transparent)]
    DimensionTypeMismatch(#[from] DimensionTypeMismatchError),
    /// An invalid range.
    #[error(transparent)]
    InvalidRange(#[from] InvalidRangeError),
    /// A count overflow.
    #[error(transparent)]
    Overflow(#[from] OverflowError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            IncompatibleDimensionalityError::new(3, 2).to_string(),
            "incompatible dimensionality 3, expected 2"
        );
        assert_eq!(
            OverflowError::new("cell").to_string(),
            "cell count overflows u64"
        );
        let err: DomainError =
            DimensionTypeMismatchError::new(PhysicalType::Int8, PhysicalType::UInt8).into();
        assert_eq!(err.to_string(), "dimension type mismatch: got i8, expected u8");
        assert_eq!(
            DomainError::DimensionIndexOutOfBounds(4, 2).to_string(),
            "dimension index 4 is out of bounds for rank 2"
        );
    }
}
