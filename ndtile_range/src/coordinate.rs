//! The [`Coordinate`] trait implemented by every physical coordinate type.

use std::fmt::{Debug, Display};

use crate::{PhysicalType, Range, TypedRange, TypedValue};

mod private {
    pub trait Sealed {}
}

/// A coordinate of a dimension.
///
/// Implemented for `i8`, `u8`, `i16`, `u16`, `i32`, `u32`, `i64`, `u64`, `f32`, and `f64`.
/// Integer arithmetic is performed exactly (widened to `i128`), real arithmetic in `f64`.
pub trait Coordinate:
    private::Sealed
    + Copy
    + PartialOrd
    + Debug
    + Display
    + num::Bounded
    + num::Zero
    + num::ToPrimitive
    + Send
    + Sync
    + 'static
{
    /// The physical type of the coordinate.
    const PHYSICAL_TYPE: PhysicalType;

    /// True for integer coordinates.
    const IS_INTEGER: bool;

    /// The index of the tile holding `self` on a grid starting at `domain_start`.
    ///
    /// The caller must ensure `self >= domain_start` and `tile_extent > 0`.
    fn tile_offset(self, domain_start: Self, tile_extent: Self) -> u64;

    /// The first coordinate of tile `tile_idx`, `domain_start + tile_idx * tile_extent`.
    ///
    /// For real coordinates this is the first representable coordinate with a [`tile_offset`](Coordinate::tile_offset) of `tile_idx`.
    ///
    /// Returns [`None`] if the coordinate is not representable.
    fn tile_origin(tile_idx: u64, domain_start: Self, tile_extent: Self) -> Option<Self>;

    /// The last coordinate of tile `tile_idx`, the predecessor of the origin of the next tile.
    ///
    /// Returns [`None`] if the coordinate is not representable.
    fn tile_end(tile_idx: u64, domain_start: Self, tile_extent: Self) -> Option<Self>;

    /// The bisection point `start + (end - start) / 2`, rounded towards `start`.
    fn bisect(start: Self, end: Self) -> Self;

    /// The next representable coordinate (saturating).
    #[must_use]
    fn successor(self) -> Self;

    /// The previous representable coordinate (saturating).
    #[must_use]
    fn predecessor(self) -> Self;

    /// The number of distinct coordinates in `[start, end]`.
    ///
    /// Returns [`None`] if the count exceeds [`u64::MAX`] or if a real-valued range is not unary.
    fn count(start: Self, end: Self) -> Option<u64>;

    /// The width of `[start, end]` used for overlap ratios.
    ///
    /// Integer ranges count their coordinates.
    /// Real ranges use `end - start`, with a zero width raised to the smallest positive `f64`.
    fn width(start: Self, end: Self) -> f64;

    /// Returns true if the coordinate is NaN.
    fn is_nan(self) -> bool;

    /// Wrap a range into a [`TypedRange`].
    fn into_typed_range(range: Range<Self>) -> TypedRange;

    /// Borrow the range of a [`TypedRange`] if it holds this coordinate type.
    fn from_typed_range(range: &TypedRange) -> Option<&Range<Self>>;

    /// Wrap the coordinate into a [`TypedValue`].
    fn into_typed_value(self) -> TypedValue;

    /// Return the coordinate of a [`TypedValue`] if it holds this coordinate type.
    fn from_typed_value(value: &TypedValue) -> Option<Self>;
}

macro_rules! impl_coordinate_wrapping {
    ($variant:ident) => {
        fn into_typed_range(range: Range<Self>) -> TypedRange {
            TypedRange::$variant(range)
        }

        fn from_typed_range(range: &TypedRange) -> Option<&Range<Self>> {
            if let TypedRange::$variant(range) = range {
                Some(range)
            } else {
                None
            }
        }

        fn into_typed_value(self) -> TypedValue {
            TypedValue::$variant(self)
        }

        fn from_typed_value(value: &TypedValue) -> Option<Self> {
            if let TypedValue::$variant(value) = value {
                Some(*value)
            } else {
                None
            }
        }
    };
}

macro_rules! impl_integer_coordinate {
    ($t:ty, $variant:ident) => {
        impl Coordinate for $t {
            const PHYSICAL_TYPE: PhysicalType = PhysicalType::$variant;
            const IS_INTEGER: bool = true;

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            fn tile_offset(self, domain_start: Self, tile_extent: Self) -> u64 {
                debug_assert!(self >= domain_start);
                let offset = i128::from(self) - i128::from(domain_start);
                (offset / i128::from(tile_extent)) as u64
            }

            fn tile_origin(tile_idx: u64, domain_start: Self, tile_extent: Self) -> Option<Self> {
                let origin = i128::from(domain_start)
                    .checked_add(i128::from(tile_idx).checked_mul(i128::from(tile_extent))?)?;
                Self::try_from(origin).ok()
            }

            fn tile_end(tile_idx: u64, domain_start: Self, tile_extent: Self) -> Option<Self> {
                let tiles = i128::from(tile_idx).checked_add(1)?;
                let end = i128::from(domain_start)
                    .checked_add(tiles.checked_mul(i128::from(tile_extent))?)?;
                Self::try_from(end - 1).ok()
            }

            #[allow(clippy::cast_possible_truncation)]
            fn bisect(start: Self, end: Self) -> Self {
                let start_wide = i128::from(start);
                let half = (i128::from(end) - start_wide) / 2;
                (start_wide + half) as Self
            }

            fn successor(self) -> Self {
                self.saturating_add(1)
            }

            fn predecessor(self) -> Self {
                self.saturating_sub(1)
            }

            fn count(start: Self, end: Self) -> Option<u64> {
                u64::try_from(i128::from(end) - i128::from(start) + 1).ok()
            }

            #[allow(clippy::cast_precision_loss)]
            fn width(start: Self, end: Self) -> f64 {
                (i128::from(end) - i128::from(start) + 1) as f64
            }

            fn is_nan(self) -> bool {
                false
            }

            impl_coordinate_wrapping!($variant);
        }

        impl private::Sealed for $t {}
    };
}

macro_rules! impl_real_coordinate {
    ($t:ty, $variant:ident) => {
        impl Coordinate for $t {
            const PHYSICAL_TYPE: PhysicalType = PhysicalType::$variant;
            const IS_INTEGER: bool = false;

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            fn tile_offset(self, domain_start: Self, tile_extent: Self) -> u64 {
                debug_assert!(self >= domain_start);
                let offset = f64::from(self) - f64::from(domain_start);
                (offset / f64::from(tile_extent)).floor() as u64
            }

            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            fn tile_origin(tile_idx: u64, domain_start: Self, tile_extent: Self) -> Option<Self> {
                let estimate = f64::from(domain_start) + tile_idx as f64 * f64::from(tile_extent);
                let mut origin = estimate as Self;
                if !origin.is_finite() {
                    return None;
                }
                if origin < domain_start {
                    origin = domain_start;
                }
                // the origin is the first coordinate whose tile offset reaches tile_idx
                while origin > domain_start
                    && origin.predecessor().tile_offset(domain_start, tile_extent) >= tile_idx
                {
                    origin = origin.predecessor();
                }
                while origin.tile_offset(domain_start, tile_extent) < tile_idx {
                    if origin == Self::MAX {
                        return None;
                    }
                    origin = origin.successor();
                }
                Some(origin)
            }

            fn tile_end(tile_idx: u64, domain_start: Self, tile_extent: Self) -> Option<Self> {
                Self::tile_origin(tile_idx.checked_add(1)?, domain_start, tile_extent)
                    .map(Coordinate::predecessor)
            }

            fn bisect(start: Self, end: Self) -> Self {
                start + (end / 2.0 - start / 2.0)
            }

            fn successor(self) -> Self {
                if self == Self::MAX {
                    self
                } else {
                    self.next_up()
                }
            }

            fn predecessor(self) -> Self {
                if self == Self::MIN {
                    self
                } else {
                    self.next_down()
                }
            }

            fn count(start: Self, end: Self) -> Option<u64> {
                (start == end).then_some(1)
            }

            fn width(start: Self, end: Self) -> f64 {
                let width = f64::from(end) - f64::from(start);
                if width > 0.0 {
                    width
                } else {
                    f64::from_bits(1)
                }
            }

            fn is_nan(self) -> bool {
                <$t>::is_nan(self)
            }

            impl_coordinate_wrapping!($variant);
        }

        impl private::Sealed for $t {}
    };
}

impl_integer_coordinate!(i8, Int8);
impl_integer_coordinate!(u8, UInt8);
impl_integer_coordinate!(i16, Int16);
impl_integer_coordinate!(u16, UInt16);
impl_integer_coordinate!(i32, Int32);
impl_integer_coordinate!(u32, UInt32);
impl_integer_coordinate!(i64, Int64);
impl_integer_coordinate!(u64, UInt64);
impl_real_coordinate!(f32, Float32);
impl_real_coordinate!(f64, Float64);
