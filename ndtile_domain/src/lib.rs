//! Dimensions, domains and tile indexing for the `ndtile` crate.
//!
//! A [`Domain`] is an ordered sequence of [`Dimension`]s, each with a datatype, an inclusive domain and a tile extent.
//! The [`TileIndexer`] linearises the tile grid of a domain in its tile [`Order`].
//!
//! ## Licence
//! `ndtile_domain` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.

mod dimension;
pub use dimension::{Dimension, TypedDimension};

mod domain;
pub use domain::Domain;

mod order;
pub use order::{Layout, Order};

mod tile_indexer;
pub use tile_indexer::{TileIndexer, TileIterator};

/// The coordinates of a tile in the tile grid.
/// Uses [`TinyVec`](tinyvec::TinyVec) for stack allocation up to 4 dimensions.
pub type TileCoords = tinyvec::TinyVec<[u64; 4]>;
