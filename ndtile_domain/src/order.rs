//! Tile and cell orders, and subarray layouts.

use derive_more::Display;
use itertools::Either;
use serde::{Deserialize, Serialize};

/// A traversal order of a tile grid or of the cells within a tile.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Order {
    /// The last dimension varies fastest.
    #[default]
    #[display("row-major")]
    RowMajor,
    /// The first dimension varies fastest.
    #[display("col-major")]
    ColMajor,
}

impl Order {
    /// The dimension indices of a rank `rank` space, from slowest to fastest varying.
    ///
    /// Identity for [`Order::RowMajor`], reversed for [`Order::ColMajor`].
    pub fn axes(self, rank: usize) -> impl DoubleEndedIterator<Item = usize> + ExactSizeIterator {
        match self {
            Self::RowMajor => Either::Left(0..rank),
            Self::ColMajor => Either::Right((0..rank).rev()),
        }
    }

    /// The dimension index at traversal position `position`.
    #[must_use]
    pub const fn axis(self, position: usize, rank: usize) -> usize {
        match self {
            Self::RowMajor => position,
            Self::ColMajor => rank - 1 - position,
        }
    }
}

/// The layout of a subarray, the order its cells and range combinations are enumerated in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    /// Row-major order across the whole subarray.
    #[display("row-major")]
    RowMajor,
    /// Column-major order across the whole subarray.
    #[display("col-major")]
    ColMajor,
    /// The global order of the domain: tile order across tiles, cell order within a tile.
    #[display("global-order")]
    GlobalOrder,
    /// No particular order.
    #[default]
    #[display("unordered")]
    Unordered,
}

impl Layout {
    /// The order range combinations are enumerated in.
    ///
    /// [`Layout::GlobalOrder`] and [`Layout::Unordered`] fall back to the `cell_order` of the domain.
    #[must_use]
    pub const fn range_order(self, cell_order: Order) -> Order {
        match self {
            Self::RowMajor => Order::RowMajor,
            Self::ColMajor => Order::ColMajor,
            Self::GlobalOrder | Self::Unordered => cell_order,
        }
    }
}
