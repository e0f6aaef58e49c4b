//! Domain tiling and memory-bounded subarray partitioning for multidimensional arrays.
//!
//! `ndtile` splits a read request over a tiled multidimensional [`Domain`] into partitions whose estimated results fit in memory.
//!
//! ## Overview
//! - [`subarray`]: a [`Subarray`] holds one or more ranges per dimension of a domain and enumerates their combinations in a [`Layout`].
//! - [`fragment_index`]: a [`FragmentDomainIndex`] holds the non-empty domains of the fragments of an array, checks that they tile the domain, and finds the fragments a subarray overlaps.
//! - [`estimator`]: [`ResultSizeEstimator`]s estimate the bytes a subarray read returns for a field.
//! - [`partitioner`]: a [`SubarrayPartitioner`] emits the partitions of a subarray in layout order, each within per-field [`ResultBudget`]s.
//! - [`config`]: the global [`Config`] of memory budgets and split parameters.
//!
//! The range arithmetic and domain model live in the [`ndtile_range`] and [`ndtile_domain`] crates, re-exported here.
//!
//! ## Logging
//! `ndtile` logs through the [`log`] crate.
//! Partitions are logged at the debug level, splits at the trace level, and partitions that exceed their budget at the warn level.
//!
//! ## Licence
//! `ndtile` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted for inclusion in the work by you, as defined in the Apache-2.0 license, shall be dual licensed as above, without any additional terms or conditions.

pub mod config;
pub mod estimator;
pub mod fragment_index;
pub mod partitioner;
pub mod subarray;

pub use ndtile_domain;
pub use ndtile_range;

pub use config::{global_config, global_config_mut, Config};
pub use estimator::{
    CellSizeEstimator, EstimateError, FieldSize, FnEstimator, FragmentEstimator, ResultBudget,
    ResultSize, ResultSizeEstimator,
};
pub use fragment_index::{CoverageError, FragmentCoverage, FragmentDomainIndex, FragmentId};
pub use ndtile_domain::{Dimension, Domain, Layout, Order, TileIndexer};
pub use partitioner::{
    Partition, PartitionerError, PartitionerOptions, PartitionerState, SubarrayPartitioner,
};
pub use subarray::{Subarray, SubarrayError};
