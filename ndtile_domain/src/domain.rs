//! Domains.

use std::cmp::Ordering;

use ndtile_range::{
    DomainError, IncompatibleDimensionalityError, NDRange, OverflowError, TypedRange, TypedValue,
};

use crate::{Dimension, Order};

/// An ordered sequence of [`Dimension`]s with a tile order and a cell order.
///
/// Dimension names are unique and a domain has at least one dimension.
#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    dimensions: Vec<Dimension>,
    cell_order: Order,
    tile_order: Order,
}

impl Domain {
    /// Create a new domain with row-major tile and cell orders.
    ///
    /// # Errors
    /// Returns [`DomainError::EmptyDomain`] if `dimensions` is empty, or [`DomainError::DuplicateDimensionName`] if two dimensions share a name.
    pub fn new(dimensions: Vec<Dimension>) -> Result<Self, DomainError> {
        if dimensions.is_empty() {
            return Err(DomainError::EmptyDomain);
        }
        for (i, dimension) in dimensions.iter().enumerate() {
            if dimensions[..i]
                .iter()
                .any(|other| other.name() == dimension.name())
            {
                return Err(DomainError::DuplicateDimensionName(
                    dimension.name().to_string(),
                ));
            }
        }
        Ok(Self {
            dimensions,
            cell_order: Order::RowMajor,
            tile_order: Order::RowMajor,
        })
    }

    /// Set the cell order.
    #[must_use]
    pub fn with_cell_order(mut self, cell_order: Order) -> Self {
        self.cell_order = cell_order;
        self
    }

    /// Set the tile order.
    #[must_use]
    pub fn with_tile_order(mut self, tile_order: Order) -> Self {
        self.tile_order = tile_order;
        self
    }

    /// The number of dimensions.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    /// The dimensions.
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// The dimension at `dim_idx`.
    ///
    /// # Errors
    /// Returns [`DomainError::DimensionIndexOutOfBounds`] if `dim_idx >= rank`.
    pub fn dimension(&self, dim_idx: usize) -> Result<&Dimension, DomainError> {
        self.dimensions
            .get(dim_idx)
            .ok_or(DomainError::DimensionIndexOutOfBounds(dim_idx, self.rank()))
    }

    /// The index of the dimension named `name`.
    #[must_use]
    pub fn dimension_index(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d.name() == name)
    }

    /// The cell order.
    #[must_use]
    pub const fn cell_order(&self) -> Order {
        self.cell_order
    }

    /// The tile order.
    #[must_use]
    pub const fn tile_order(&self) -> Order {
        self.tile_order
    }

    /// The bounding box of the domain.
    #[must_use]
    pub fn ndrange(&self) -> NDRange {
        self.dimensions.iter().map(|d| *d.domain()).collect()
    }

    /// The tile extents.
    #[must_use]
    pub fn tile_extents(&self) -> Vec<TypedValue> {
        self.dimensions.iter().map(|d| *d.tile_extent()).collect()
    }

    /// The shape of the tile grid, the number of tiles along each dimension.
    #[must_use]
    pub fn grid_shape(&self) -> Vec<u64> {
        self.dimensions.iter().map(Dimension::grid_len).collect()
    }

    fn check_rank(&self, rank: usize) -> Result<(), IncompatibleDimensionalityError> {
        if rank == self.rank() {
            Ok(())
        } else {
            Err(IncompatibleDimensionalityError::new(rank, self.rank()))
        }
    }

    /// Check that `ndrange` has the rank and types of the domain and lies within it.
    ///
    /// # Errors
    /// Returns [`DomainError`] if it does not.
    pub fn check_ndrange(&self, ndrange: &NDRange) -> Result<(), DomainError> {
        self.check_rank(ndrange.rank())?;
        for (dimension, range) in std::iter::zip(&self.dimensions, ndrange.iter()) {
            dimension.check_range(range)?;
        }
        Ok(())
    }

    /// The number of tiles `ndrange` intersects.
    ///
    /// Partial tiles count as whole tiles.
    ///
    /// # Errors
    /// Returns [`DomainError`] if `ndrange` is not within the domain or the count overflows.
    pub fn num_tiles(&self, ndrange: &NDRange) -> Result<u64, DomainError> {
        self.check_rank(ndrange.rank())?;
        let mut num_tiles = 1u64;
        for (dimension, range) in std::iter::zip(&self.dimensions, ndrange.iter()) {
            num_tiles = num_tiles
                .checked_mul(dimension.tile_num(range)?)
                .ok_or(OverflowError::new("tile"))?;
        }
        Ok(num_tiles)
    }

    /// Expand `ndrange` to the boundaries of the tiles it intersects.
    ///
    /// # Errors
    /// Returns [`DomainError`] if `ndrange` is not within the domain.
    pub fn expand_to_tiles(&self, ndrange: &NDRange) -> Result<NDRange, DomainError> {
        self.check_rank(ndrange.rank())?;
        std::iter::zip(&self.dimensions, ndrange.iter())
            .map(|(dimension, range)| dimension.expand_to_tile(range))
            .collect::<Result<Vec<TypedRange>, _>>()
            .map(NDRange::new)
    }

    /// Crop `ndrange` to the domain.
    ///
    /// Returns [`None`] if `ndrange` does not intersect the domain.
    ///
    /// # Errors
    /// Returns [`DomainError`] if the rank or types of `ndrange` do not match the domain.
    pub fn crop(&self, ndrange: &NDRange) -> Result<Option<NDRange>, DomainError> {
        self.check_rank(ndrange.rank())?;
        self.ndrange().intersection(ndrange)
    }

    /// Compare two coordinate tuples in the global cell order.
    ///
    /// Coordinates are first ordered by their tiles in tile order, then by the cell order within a tile.
    ///
    /// # Errors
    /// Returns [`DomainError`] if either tuple does not match the rank or types of the domain, or lies outside of it.
    pub fn global_order_cmp(
        &self,
        a: &[TypedValue],
        b: &[TypedValue],
    ) -> Result<Ordering, DomainError> {
        self.check_rank(a.len())?;
        self.check_rank(b.len())?;
        for axis in self.tile_order.axes(self.rank()) {
            let dimension = &self.dimensions[axis];
            let ordering = dimension.tile_idx(&a[axis])?.cmp(&dimension.tile_idx(&b[axis])?);
            if ordering.is_ne() {
                return Ok(ordering);
            }
        }
        for axis in self.cell_order.axes(self.rank()) {
            let ordering = a[axis].compare(&b[axis])?;
            if ordering.is_ne() {
                return Ok(ordering);
            }
        }
        Ok(Ordering::Equal)
    }
}
