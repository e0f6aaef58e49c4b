//! Linear indexing of the tile grid of a [`Domain`].

use std::iter::FusedIterator;

use ndtile_range::{
    with_physical_type, Coordinate, DomainError, IncompatibleDimensionalityError, NDRange,
    OverflowError, TypedRange, TypedValue,
};

use crate::{Domain, Order, TileCoords};

/// Converts tile coordinates to and from linear tile positions in a tile order.
///
/// The conversion uses a table of hyperrow sizes: `hyperrow_sizes[rank] = 1` and
/// `hyperrow_sizes[i] = hyperrow_sizes[i + 1] * grid_shape[axis(i)]`, where `axis(i)` is the dimension at traversal position `i` of the tile order.
/// The linear position of tile coordinates `c` is the sum of `c[axis(i)] * hyperrow_sizes[i + 1]`.
#[derive(Clone, Debug)]
pub struct TileIndexer<'a> {
    domain: &'a Domain,
    tile_order: Order,
    grid_shape: Vec<u64>,
    hyperrow_sizes: Vec<u64>,
}

impl<'a> TileIndexer<'a> {
    /// Create a tile indexer in the tile order of `domain`.
    ///
    /// # Errors
    /// Returns [`DomainError::Overflow`] if the number of tiles in the domain overflows [`u64`].
    pub fn new(domain: &'a Domain) -> Result<Self, DomainError> {
        Self::with_tile_order(domain, domain.tile_order())
    }

    /// Create a tile indexer with an explicit `tile_order`.
    ///
    /// # Errors
    /// Returns [`DomainError::Overflow`] if the number of tiles in the domain overflows [`u64`].
    pub fn with_tile_order(domain: &'a Domain, tile_order: Order) -> Result<Self, DomainError> {
        let rank = domain.rank();
        let grid_shape = domain.grid_shape();
        let mut hyperrow_sizes = vec![1u64; rank + 1];
        for position in (0..rank).rev() {
            let axis = tile_order.axis(position, rank);
            hyperrow_sizes[position] = hyperrow_sizes[position + 1]
                .checked_mul(grid_shape[axis])
                .ok_or(OverflowError::new("tile"))?;
        }
        Ok(Self {
            domain,
            tile_order,
            grid_shape,
            hyperrow_sizes,
        })
    }

    /// The domain.
    #[must_use]
    pub const fn domain(&self) -> &Domain {
        self.domain
    }

    /// The tile order.
    #[must_use]
    pub const fn tile_order(&self) -> Order {
        self.tile_order
    }

    /// The number of tiles along each dimension.
    #[must_use]
    pub fn grid_shape(&self) -> &[u64] {
        &self.grid_shape
    }

    /// The hyperrow sizes, indexed by traversal position. The table has `rank + 1` entries.
    #[must_use]
    pub fn hyperrow_sizes(&self) -> &[u64] {
        &self.hyperrow_sizes
    }

    /// The total number of tiles in the domain.
    #[must_use]
    pub fn grid_num_tiles(&self) -> u64 {
        self.hyperrow_sizes[0]
    }

    /// The tile coordinates of the tile holding `coords`.
    ///
    /// # Errors
    /// Returns [`DomainError`] if `coords` does not match the rank or types of the domain, or lies outside of it.
    pub fn tile_coords(&self, coords: &[TypedValue]) -> Result<TileCoords, DomainError> {
        self.check_rank(coords.len())?;
        std::iter::zip(self.domain.dimensions(), coords)
            .map(|(dimension, coord)| dimension.tile_idx(coord))
            .collect()
    }

    /// The tile coordinates of the tile holding the lower corner of `ndrange`.
    ///
    /// # Errors
    /// Returns [`DomainError`] if `ndrange` does not match the rank or types of the domain, or lies outside of it.
    pub fn lower_tile_coords(&self, ndrange: &NDRange) -> Result<TileCoords, DomainError> {
        let lower: Vec<TypedValue> = ndrange.iter().map(TypedRange::start).collect();
        self.tile_coords(&lower)
    }

    /// The tile coordinates of the tile holding the upper corner of `ndrange`.
    ///
    /// # Errors
    /// Returns [`DomainError`] if `ndrange` does not match the rank or types of the domain, or lies outside of it.
    pub fn upper_tile_coords(&self, ndrange: &NDRange) -> Result<TileCoords, DomainError> {
        let upper: Vec<TypedValue> = ndrange.iter().map(TypedRange::end).collect();
        self.tile_coords(&upper)
    }

    /// The linear position of `tile_coords` in the tile order.
    ///
    /// # Errors
    /// Returns [`DomainError::TileOutOfBounds`] if `tile_coords` is outside of the tile grid.
    pub fn tile_pos(&self, tile_coords: &[u64]) -> Result<u64, DomainError> {
        self.check_rank(tile_coords.len())?;
        let rank = self.domain.rank();
        let mut pos = 0;
        for position in 0..rank {
            let axis = self.tile_order.axis(position, rank);
            if tile_coords[axis] >= self.grid_shape[axis] {
                return Err(self.tile_out_of_bounds(tile_coords));
            }
            pos += tile_coords[axis] * self.hyperrow_sizes[position + 1];
        }
        Ok(pos)
    }

    /// The tile coordinates at linear position `tile_pos` in the tile order.
    ///
    /// # Errors
    /// Returns [`DomainError::TileOutOfBounds`] if `tile_pos` is outside of the tile grid.
    pub fn tile_coords_at(&self, tile_pos: u64) -> Result<TileCoords, DomainError> {
        if tile_pos >= self.grid_num_tiles() {
            return Err(self.tile_out_of_bounds(&[tile_pos]));
        }
        let rank = self.domain.rank();
        let mut tile_coords: TileCoords = std::iter::repeat_n(0, rank).collect();
        let mut remainder = tile_pos;
        for position in 0..rank {
            let axis = self.tile_order.axis(position, rank);
            let size = self.hyperrow_sizes[position + 1];
            tile_coords[axis] = remainder / size;
            remainder %= size;
        }
        Ok(tile_coords)
    }

    /// The linear position of the tile holding the lower corner of `ndrange`.
    ///
    /// # Errors
    /// Returns [`DomainError`] if `ndrange` does not match the rank or types of the domain, or lies outside of it.
    pub fn start_tile_offset(&self, ndrange: &NDRange) -> Result<u64, DomainError> {
        self.tile_pos(&self.lower_tile_coords(ndrange)?)
    }

    /// The number of tiles `ndrange` intersects.
    ///
    /// # Errors
    /// See [`Domain::num_tiles`].
    pub fn num_tiles(&self, ndrange: &NDRange) -> Result<u64, DomainError> {
        self.domain.num_tiles(ndrange)
    }

    /// The range of the tile at `tile_coords`, cropped to the domain.
    ///
    /// # Errors
    /// Returns [`DomainError::TileOutOfBounds`] if `tile_coords` is outside of the tile grid.
    pub fn tile_ndrange(&self, tile_coords: &[u64]) -> Result<NDRange, DomainError> {
        self.check_rank(tile_coords.len())?;
        if std::iter::zip(tile_coords, &self.grid_shape).any(|(c, s)| c >= s) {
            return Err(self.tile_out_of_bounds(tile_coords));
        }
        std::iter::zip(self.domain.dimensions(), tile_coords)
            .map(|(dimension, &tile_idx)| dimension.tile_range(tile_idx))
            .collect::<Result<Vec<_>, _>>()
            .map(NDRange::new)
    }

    /// Iterate over the tiles intersecting `ndrange` in the tile order.
    ///
    /// The iterator yields the linear tile position and tile coordinates of each tile.
    ///
    /// # Errors
    /// Returns [`DomainError`] if `ndrange` is not within the domain.
    pub fn iter_tiles(&self, ndrange: &NDRange) -> Result<TileIterator<'_>, DomainError> {
        self.domain.check_ndrange(ndrange)?;
        let lower = self.lower_tile_coords(ndrange)?;
        let upper = self.upper_tile_coords(ndrange)?;
        let shape: TileCoords = std::iter::zip(lower.iter(), upper.iter())
            .map(|(l, u)| u - l + 1)
            .collect();
        let num_tiles = shape
            .iter()
            .try_fold(1u64, |acc, &s| acc.checked_mul(s))
            .ok_or(OverflowError::new("tile"))?;
        Ok(TileIterator {
            indexer: self,
            lower,
            shape,
            range: 0..num_tiles,
        })
    }

    /// Returns the first coordinate of the tile at `tile_idx` along dimension `dim_idx`.
    ///
    /// # Errors
    /// Returns [`DomainError`] if `dim_idx` or `tile_idx` is out of bounds.
    pub fn tile_origin(&self, dim_idx: usize, tile_idx: u64) -> Result<TypedValue, DomainError> {
        let dimension = self.domain.dimension(dim_idx)?;
        with_physical_type!(dimension.physical_type(), T => {
            let range = dimension.typed::<T>()?.tile_range(tile_idx)?;
            Ok(T::into_typed_value(range.start()))
        })
    }

    fn check_rank(&self, rank: usize) -> Result<(), IncompatibleDimensionalityError> {
        if rank == self.domain.rank() {
            Ok(())
        } else {
            Err(IncompatibleDimensionalityError::new(rank, self.domain.rank()))
        }
    }

    fn tile_out_of_bounds(&self, tile_coords: &[u64]) -> DomainError {
        DomainError::TileOutOfBounds {
            tile_coords: tile_coords.to_vec(),
            grid_shape: self.grid_shape.clone(),
        }
    }
}

/// An iterator over the tiles intersecting an [`NDRange`], in tile order.
///
/// See [`TileIndexer::iter_tiles`].
#[derive(Clone)]
pub struct TileIterator<'a> {
    indexer: &'a TileIndexer<'a>,
    lower: TileCoords,
    shape: TileCoords,
    range: std::ops::Range<u64>,
}

impl TileIterator<'_> {
    fn tile_at(&self, index: u64) -> Option<(u64, TileCoords)> {
        let rank = self.shape.len();
        let mut tile_coords = self.lower.clone();
        let mut remainder = index;
        for axis in self.indexer.tile_order.axes(rank).rev() {
            tile_coords[axis] += remainder % self.shape[axis];
            remainder /= self.shape[axis];
        }
        let tile_pos = self.indexer.tile_pos(&tile_coords).ok()?;
        Some((tile_pos, tile_coords))
    }
}

impl Iterator for TileIterator<'_> {
    type Item = (u64, TileCoords);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.range.next()?;
        self.tile_at(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = usize::try_from(self.range.end - self.range.start).unwrap_or(usize::MAX);
        (len, Some(len))
    }
}

impl DoubleEndedIterator for TileIterator<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let index = self.range.next_back()?;
        self.tile_at(index)
    }
}

impl ExactSizeIterator for TileIterator<'_> {}

impl FusedIterator for TileIterator<'_> {}
