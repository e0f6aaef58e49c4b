//! Dimensions.

use ndtile_range::{
    tile_idx, with_physical_type, Coordinate, Datatype, DimensionTypeMismatchError, DomainError,
    OverflowError, PhysicalType, Range, TypedRange, TypedValue,
};

/// A dimension of a [`Domain`](crate::Domain).
///
/// A dimension has a name, a datatype, an inclusive domain and a tile extent.
/// The tile extent is positive, no larger than the domain, and expanding the domain to a whole number of tiles must not overflow the datatype.
#[derive(Clone, Debug, PartialEq)]
pub struct Dimension {
    name: String,
    datatype: Datatype,
    domain: TypedRange,
    tile_extent: TypedValue,
    grid_len: u64,
}

/// A [`Dimension`] viewed with its concrete coordinate type `T`.
#[derive(Copy, Clone, Debug)]
pub struct TypedDimension<'a, T: Coordinate> {
    dimension: &'a Dimension,
    domain: Range<T>,
    tile_extent: T,
}

macro_rules! with_typed_dimension {
    ($dimension:expr, $d:ident => $body:expr) => {
        with_physical_type!($dimension.physical_type(), T => {
            let $d = $dimension.typed::<T>()?;
            $body
        })
    };
}

fn validate_tile_extent<T: Coordinate>(
    domain: Range<T>,
    tile_extent: T,
) -> Result<u64, DomainError> {
    let invalid = || DomainError::InvalidTileExtent {
        tile_extent: tile_extent.to_string(),
        domain: domain.to_string(),
    };
    if tile_extent.is_nan() || !(tile_extent > T::zero()) {
        return Err(invalid());
    }
    let (start, end) = (domain.start(), domain.end());
    if T::IS_INTEGER {
        let extent = tile_extent.to_u128().ok_or_else(invalid)?;
        let length = T::count(start, end).map_or(1u128 << 64, u128::from);
        if extent > length {
            return Err(invalid());
        }
    } else {
        let width = end.to_f64().unwrap_or(f64::NAN) - start.to_f64().unwrap_or(f64::NAN);
        if tile_extent.to_f64().is_none_or(|extent| extent > width) {
            return Err(invalid());
        }
    }
    let last_tile = end.tile_offset(start, tile_extent);
    if T::IS_INTEGER && T::tile_end(last_tile, start, tile_extent).is_none() {
        // the domain cannot be expanded to a whole number of tiles
        return Err(invalid());
    }
    last_tile
        .checked_add(1)
        .ok_or_else(|| OverflowError::new("tile").into())
}

impl Dimension {
    /// Create a new dimension.
    ///
    /// # Errors
    /// Returns [`DomainError::DimensionTypeMismatch`] if `T` is not the physical type of `datatype`, or
    /// [`DomainError::InvalidTileExtent`] if `tile_extent` is not valid for `domain`.
    pub fn new<T: Coordinate>(
        name: impl Into<String>,
        datatype: Datatype,
        domain: Range<T>,
        tile_extent: T,
    ) -> Result<Self, DomainError> {
        if datatype.physical_type() != T::PHYSICAL_TYPE {
            return Err(
                DimensionTypeMismatchError::new(T::PHYSICAL_TYPE, datatype.physical_type()).into(),
            );
        }
        let grid_len = validate_tile_extent(domain, tile_extent)?;
        Ok(Self {
            name: name.into(),
            datatype,
            domain: T::into_typed_range(domain),
            tile_extent: tile_extent.into_typed_value(),
            grid_len,
        })
    }

    /// Create a new dimension from a type-erased domain and tile extent.
    ///
    /// # Errors
    /// See [`Dimension::new`].
    pub fn new_typed(
        name: impl Into<String>,
        datatype: Datatype,
        domain: TypedRange,
        tile_extent: TypedValue,
    ) -> Result<Self, DomainError> {
        with_physical_type!(datatype.physical_type(), T => {
            Self::new(name, datatype, *domain.get::<T>()?, tile_extent.get::<T>()?)
        })
    }

    /// The dimension name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The dimension datatype.
    #[must_use]
    pub const fn datatype(&self) -> Datatype {
        self.datatype
    }

    /// The physical type of the dimension coordinates.
    #[must_use]
    pub const fn physical_type(&self) -> PhysicalType {
        self.datatype.physical_type()
    }

    /// The dimension domain.
    #[must_use]
    pub const fn domain(&self) -> &TypedRange {
        &self.domain
    }

    /// The tile extent.
    #[must_use]
    pub const fn tile_extent(&self) -> &TypedValue {
        &self.tile_extent
    }

    /// The number of tiles along the dimension, counting a trailing partial tile.
    #[must_use]
    pub const fn grid_len(&self) -> u64 {
        self.grid_len
    }

    /// View the dimension with its concrete coordinate type.
    ///
    /// # Errors
    /// Returns [`DimensionTypeMismatchError`] if `T` is not the physical type of the dimension.
    pub fn typed<T: Coordinate>(
        &self,
    ) -> Result<TypedDimension<'_, T>, DimensionTypeMismatchError> {
        Ok(TypedDimension {
            dimension: self,
            domain: *self.domain.get::<T>()?,
            tile_extent: self.tile_extent.get::<T>()?,
        })
    }

    /// The index of the tile holding `coord`.
    ///
    /// # Errors
    /// Returns [`DomainError`] if `coord` has the wrong type or is outside of the domain.
    pub fn tile_idx(&self, coord: &TypedValue) -> Result<u64, DomainError> {
        with_typed_dimension!(self, d => d.tile_idx(coord.get()?))
    }

    /// The number of tiles `range` intersects.
    ///
    /// # Errors
    /// Returns [`DomainError`] if `range` has the wrong type or is outside of the domain.
    pub fn tile_num(&self, range: &TypedRange) -> Result<u64, DomainError> {
        with_typed_dimension!(self, d => d.tile_num(range.get()?))
    }

    /// The range of tile `tile_idx`, cropped to the domain.
    ///
    /// # Errors
    /// Returns [`DomainError::TileOutOfBounds`] if `tile_idx` is outside of the tile grid.
    pub fn tile_range(&self, tile_idx: u64) -> Result<TypedRange, DomainError> {
        with_typed_dimension!(self, d => Ok(T::into_typed_range(d.tile_range(tile_idx)?)))
    }

    /// Expand `range` to the boundaries of the tiles it intersects.
    ///
    /// Real-valued ranges are returned unchanged.
    ///
    /// # Errors
    /// Returns [`DomainError`] if `range` has the wrong type or is outside of the domain.
    pub fn expand_to_tile(&self, range: &TypedRange) -> Result<TypedRange, DomainError> {
        with_typed_dimension!(self, d => Ok(T::into_typed_range(d.expand_to_tile(range.get()?)?)))
    }

    /// Crop `range` to the domain.
    ///
    /// Returns [`None`] if `range` does not intersect the domain.
    ///
    /// # Errors
    /// Returns [`DomainError::DimensionTypeMismatch`] if `range` has the wrong type.
    pub fn crop(&self, range: &TypedRange) -> Result<Option<TypedRange>, DomainError> {
        Ok(self.domain.intersection(range)?)
    }

    /// Returns true if `range` starts and ends on tile boundaries.
    ///
    /// # Errors
    /// Returns [`DomainError`] if `range` has the wrong type or is outside of the domain.
    pub fn coincides_with_tiles(&self, range: &TypedRange) -> Result<bool, DomainError> {
        with_typed_dimension!(self, d => d.coincides_with_tiles(range.get()?))
    }

    /// Check that `range` is within the domain.
    ///
    /// # Errors
    /// Returns [`DomainError::RangeOutOfBounds`] if it is not, or [`DomainError::DimensionTypeMismatch`] if `range` has the wrong type.
    pub fn check_range(&self, range: &TypedRange) -> Result<(), DomainError> {
        with_typed_dimension!(self, d => d.check_range(range.get()?))
    }

    /// The fraction of `mbr` covered by `range`.
    ///
    /// # Errors
    /// Returns [`DomainError::DimensionTypeMismatch`] if either range has the wrong type.
    pub fn overlap_ratio(&self, range: &TypedRange, mbr: &TypedRange) -> Result<f64, DomainError> {
        range.check_type(self.physical_type())?;
        Ok(range.overlap_ratio(mbr)?)
    }
}

impl<T: Coordinate> TypedDimension<'_, T> {
    /// The untyped dimension.
    #[must_use]
    pub const fn dimension(&self) -> &Dimension {
        self.dimension
    }

    /// The dimension domain.
    #[must_use]
    pub const fn domain(&self) -> &Range<T> {
        &self.domain
    }

    /// The tile extent.
    #[must_use]
    pub const fn tile_extent(&self) -> T {
        self.tile_extent
    }

    /// The number of tiles along the dimension.
    #[must_use]
    pub const fn grid_len(&self) -> u64 {
        self.dimension.grid_len
    }

    /// Check that `range` is within the domain.
    ///
    /// # Errors
    /// Returns [`DomainError::RangeOutOfBounds`] if it is not.
    pub fn check_range(&self, range: &Range<T>) -> Result<(), DomainError> {
        if self.domain.covers(range) {
            Ok(())
        } else {
            Err(DomainError::RangeOutOfBounds {
                dimension: self.dimension.name.clone(),
                range: range.to_string(),
                domain: self.domain.to_string(),
            })
        }
    }

    /// The index of the tile holding `coord`.
    ///
    /// # Errors
    /// Returns [`DomainError`] if `coord` is outside of the domain.
    pub fn tile_idx(&self, coord: T) -> Result<u64, DomainError> {
        if coord > self.domain.end() {
            return Err(DomainError::RangeOutOfBounds {
                dimension: self.dimension.name.clone(),
                range: format!("[{coord}, {coord}]"),
                domain: self.domain.to_string(),
            });
        }
        tile_idx(coord, self.domain.start(), self.tile_extent)
    }

    /// The number of tiles `range` intersects.
    ///
    /// # Errors
    /// Returns [`DomainError::RangeOutOfBounds`] if `range` is outside of the domain.
    pub fn tile_num(&self, range: &Range<T>) -> Result<u64, DomainError> {
        self.check_range(range)?;
        Ok(self.tile_idx(range.end())? - self.tile_idx(range.start())? + 1)
    }

    /// The range of tile `tile_idx`, cropped to the domain.
    ///
    /// # Errors
    /// Returns [`DomainError::TileOutOfBounds`] if `tile_idx` is outside of the tile grid.
    pub fn tile_range(&self, tile_idx: u64) -> Result<Range<T>, DomainError> {
        let out_of_bounds = || DomainError::TileOutOfBounds {
            tile_coords: vec![tile_idx],
            grid_shape: vec![self.grid_len()],
        };
        if tile_idx >= self.grid_len() {
            return Err(out_of_bounds());
        }
        let start = T::tile_origin(tile_idx, self.domain.start(), self.tile_extent)
            .ok_or_else(out_of_bounds)?;
        let end = match T::tile_end(tile_idx, self.domain.start(), self.tile_extent) {
            Some(end) if end < self.domain.end() => end,
            _ => self.domain.end(),
        };
        Ok(Range::new(start, end)?)
    }

    /// The origin of the tile holding `value`.
    ///
    /// # Errors
    /// Returns [`DomainError`] if `value` is outside of the domain.
    pub fn floor_to_tile(&self, value: T) -> Result<T, DomainError> {
        let tile_idx = self.tile_idx(value)?;
        T::tile_origin(tile_idx, self.domain.start(), self.tile_extent).ok_or_else(|| {
            DomainError::TileOutOfBounds {
                tile_coords: vec![tile_idx],
                grid_shape: vec![self.grid_len()],
            }
        })
    }

    /// The last coordinate of tile `tile_idx`, not cropped to the domain.
    ///
    /// # Errors
    /// Returns [`DomainError::TileOutOfBounds`] if the coordinate is not representable.
    pub fn tile_end(&self, tile_idx: u64) -> Result<T, DomainError> {
        T::tile_end(tile_idx, self.domain.start(), self.tile_extent).ok_or_else(|| {
            DomainError::TileOutOfBounds {
                tile_coords: vec![tile_idx],
                grid_shape: vec![self.grid_len()],
            }
        })
    }

    /// Expand `range` to the boundaries of the tiles it intersects.
    ///
    /// The expanded range may extend past the domain end by up to one partial tile.
    /// Real-valued ranges are returned unchanged.
    ///
    /// # Errors
    /// Returns [`DomainError::RangeOutOfBounds`] if `range` is outside of the domain.
    pub fn expand_to_tile(&self, range: &Range<T>) -> Result<Range<T>, DomainError> {
        self.check_range(range)?;
        if !T::IS_INTEGER {
            return Ok(*range);
        }
        let start = self.floor_to_tile(range.start())?;
        let end = self.tile_end(self.tile_idx(range.end())?)?;
        Ok(Range::new(start, end)?)
    }

    /// Crop `range` to the domain.
    #[must_use]
    pub fn crop(&self, range: &Range<T>) -> Option<Range<T>> {
        self.domain.intersection(range)
    }

    /// Returns true if `range` starts and ends on tile boundaries.
    ///
    /// Always false for real-valued dimensions.
    ///
    /// # Errors
    /// Returns [`DomainError::RangeOutOfBounds`] if `range` is outside of the domain.
    pub fn coincides_with_tiles(&self, range: &Range<T>) -> Result<bool, DomainError> {
        self.check_range(range)?;
        if !T::IS_INTEGER {
            return Ok(false);
        }
        Ok(self.expand_to_tile(range)? == *range)
    }

    /// The fraction of `mbr` covered by `range`.
    #[must_use]
    pub fn overlap_ratio(&self, range: &Range<T>, mbr: &Range<T>) -> f64 {
        range.overlap_ratio(mbr)
    }
}
