//! The fragment domain index.
//!
//! A [`FragmentDomainIndex`] holds the non-empty domains of the fragments of an array.
//! It locates the fragments a [`Subarray`] reads from and checks that a fragment set partitions the tile space.

use std::cmp::Ordering;
use std::sync::Arc;

use derive_more::{Display, From};
use ndtile_domain::{Domain, TileIndexer};
use ndtile_range::{DomainError, NDRange};
use rayon::prelude::*;
use thiserror::Error;

use crate::subarray::{Subarray, SubarrayError};

/// A fragment identifier, the position of the fragment in a [`FragmentDomainIndex`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From)]
#[display("fragment {_0}")]
pub struct FragmentId(usize);

impl FragmentId {
    /// Create a new fragment identifier.
    #[must_use]
    pub const fn new(id: usize) -> Self {
        Self(id)
    }

    /// The position of the fragment.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

/// The tiles covered by a fragment in the global tile order.
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentCoverage {
    fragment_id: FragmentId,
    ndrange: NDRange,
    tile_offset: u64,
    tile_count: u64,
}

impl FragmentCoverage {
    /// The fragment identifier.
    #[must_use]
    pub const fn fragment_id(&self) -> FragmentId {
        self.fragment_id
    }

    /// The non-empty domain of the fragment.
    #[must_use]
    pub const fn ndrange(&self) -> &NDRange {
        &self.ndrange
    }

    /// The position of the first tile of the fragment in the global tile order.
    #[must_use]
    pub const fn tile_offset(&self) -> u64 {
        self.tile_offset
    }

    /// The number of tiles the fragment intersects.
    #[must_use]
    pub const fn tile_count(&self) -> u64 {
        self.tile_count
    }

    fn cmp_global(&self, other: &Self) -> Ordering {
        self.tile_offset
            .cmp(&other.tile_offset)
            .then_with(|| self.ndrange.compare(&other.ndrange))
            .then_with(|| self.fragment_id.cmp(&other.fragment_id))
    }
}

/// A coverage error.
#[derive(Clone, Debug, Error)]
pub enum CoverageError {
    /// A fragment starts after the tiles covered so far.
    #[error("{fragment} starts at tile {found}, leaving a gap after tile {expected}")]
    Gap {
        /// The fragment.
        fragment: FragmentId,
        /// The expected tile offset.
        expected: u64,
        /// The tile offset of the fragment.
        found: u64,
    },
    /// A fragment starts before the end of the tiles covered so far, or runs past the end of the domain.
    #[error("{fragment} starts at tile {found}, overlapping tiles before {expected}")]
    Overlap {
        /// The fragment.
        fragment: FragmentId,
        /// The expected tile offset.
        expected: u64,
        /// The tile offset of the fragment.
        found: u64,
    },
    /// The fragments cover fewer tiles than the domain.
    #[error("fragments cover {covered} of {total} tiles")]
    Underrun {
        /// The number of covered tiles.
        covered: u64,
        /// The number of tiles of the domain.
        total: u64,
    },
    /// A domain error.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// The non-empty domains of the fragments of an array.
#[derive(Clone, Debug)]
pub struct FragmentDomainIndex {
    domain: Arc<Domain>,
    fragments: Vec<NDRange>,
}

impl FragmentDomainIndex {
    /// Create a new fragment domain index.
    ///
    /// # Errors
    /// Returns [`DomainError`] if a fragment is not within `domain`.
    pub fn new(domain: Arc<Domain>, fragments: Vec<NDRange>) -> Result<Self, DomainError> {
        for fragment in &fragments {
            domain.check_ndrange(fragment)?;
        }
        Ok(Self { domain, fragments })
    }

    /// The domain.
    #[must_use]
    pub fn domain(&self) -> &Arc<Domain> {
        &self.domain
    }

    /// The non-empty domains of the fragments.
    #[must_use]
    pub fn fragments(&self) -> &[NDRange] {
        &self.fragments
    }

    /// The non-empty domain of `fragment`.
    #[must_use]
    pub fn fragment(&self, fragment: FragmentId) -> Option<&NDRange> {
        self.fragments.get(fragment.get())
    }

    /// The number of fragments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    /// Returns true if there are no fragments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn fragment_coverage(
        indexer: &TileIndexer,
        id: usize,
        ndrange: &NDRange,
    ) -> Result<FragmentCoverage, DomainError> {
        Ok(FragmentCoverage {
            fragment_id: FragmentId(id),
            ndrange: ndrange.clone(),
            tile_offset: indexer.start_tile_offset(ndrange)?,
            tile_count: indexer.num_tiles(ndrange)?,
        })
    }

    /// The tile coverage of every fragment, sorted by tile offset.
    ///
    /// Fragments with the same tile offset are ordered by their non-empty domain, then by their identifier.
    ///
    /// # Errors
    /// Returns [`DomainError`] if a tile count overflows.
    pub fn coverage(&self) -> Result<Vec<FragmentCoverage>, DomainError> {
        let indexer = TileIndexer::new(&self.domain)?;
        let mut coverage = self
            .fragments
            .par_iter()
            .enumerate()
            .map(|(id, ndrange)| Self::fragment_coverage(&indexer, id, ndrange))
            .collect::<Result<Vec<_>, _>>()?;
        coverage.sort_unstable_by(FragmentCoverage::cmp_global);
        Ok(coverage)
    }

    /// The fragments intersecting `subarray`, in the global tile order of their first tile.
    ///
    /// A fragment is relevant if its non-empty domain intersects at least one range combination of `subarray`.
    ///
    /// # Errors
    /// Returns [`SubarrayError`] if `subarray` does not match the rank or types of the domain.
    pub fn relevant_fragments(
        &self,
        subarray: &Subarray,
    ) -> Result<Vec<FragmentId>, SubarrayError> {
        let indexer = TileIndexer::new(&self.domain)?;
        let mut relevant = self
            .fragments
            .par_iter()
            .enumerate()
            .filter_map(|(id, ndrange)| match subarray.overlaps(ndrange) {
                Ok(true) => Some(
                    Self::fragment_coverage(&indexer, id, ndrange).map_err(SubarrayError::from),
                ),
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        relevant.sort_unstable_by(FragmentCoverage::cmp_global);
        Ok(relevant
            .into_iter()
            .map(|coverage| coverage.fragment_id)
            .collect())
    }

    /// Check that the fragments partition the tile space of the domain.
    ///
    /// Walking the fragments in tile offset order, each fragment must start at the number of tiles covered so far,
    /// and the fragments must cover exactly the tiles of the domain.
    /// The order the fragments were added in is irrelevant.
    ///
    /// # Errors
    /// Returns the first discrepancy as a [`CoverageError`].
    pub fn validate_full_coverage(&self) -> Result<(), CoverageError> {
        let total = TileIndexer::new(&self.domain)?.grid_num_tiles();
        let coverage = self.coverage()?;
        let mut covered = 0u64;
        let mut last = None;
        for fragment in &coverage {
            match fragment.tile_offset.cmp(&covered) {
                Ordering::Greater => {
                    return Err(CoverageError::Gap {
                        fragment: fragment.fragment_id,
                        expected: covered,
                        found: fragment.tile_offset,
                    });
                }
                Ordering::Less => {
                    return Err(CoverageError::Overlap {
                        fragment: fragment.fragment_id,
                        expected: covered,
                        found: fragment.tile_offset,
                    });
                }
                Ordering::Equal => {}
            }
            covered = covered.saturating_add(fragment.tile_count);
            last = Some(fragment);
        }
        match (covered.cmp(&total), last) {
            (Ordering::Less, _) | (_, None) => Err(CoverageError::Underrun { covered, total }),
            (Ordering::Greater, Some(last)) => Err(CoverageError::Overlap {
                fragment: last.fragment_id,
                expected: total,
                found: covered,
            }),
            (Ordering::Equal, Some(_)) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndtile_domain::{Dimension, Layout};
    use ndtile_range::{Datatype, Range, TypedRange};

    use super::*;

    fn domain_2d() -> Arc<Domain> {
        Arc::new(
            Domain::new(vec![
                Dimension::new("rows", Datatype::Int32, Range::new(0i32, 99).unwrap(), 10)
                    .unwrap(),
                Dimension::new("cols", Datatype::Int32, Range::new(0i32, 99).unwrap(), 10)
                    .unwrap(),
            ])
            .unwrap(),
        )
    }

    fn nd(ranges: &[(i32, i32)]) -> NDRange {
        ranges
            .iter()
            .map(|&(start, end)| TypedRange::new(start, end).unwrap())
            .collect()
    }

    fn row_slabs() -> Vec<NDRange> {
        vec![
            nd(&[(50, 99), (0, 99)]),
            nd(&[(0, 19), (0, 99)]),
            nd(&[(20, 49), (0, 99)]),
        ]
    }

    #[test]
    fn fragment_index_coverage() {
        let index = FragmentDomainIndex::new(domain_2d(), row_slabs()).unwrap();
        assert_eq!(index.len(), 3);
        assert!(!index.is_empty());
        let coverage = index.coverage().unwrap();
        let offsets: Vec<_> = coverage
            .iter()
            .map(|c| (c.fragment_id().get(), c.tile_offset(), c.tile_count()))
            .collect();
        assert_eq!(offsets, vec![(1, 0, 20), (2, 20, 30), (0, 50, 50)]);
        assert!(index.validate_full_coverage().is_ok());
        assert_eq!(index.fragment(FragmentId::new(1)), Some(&nd(&[(0, 19), (0, 99)])));
        assert_eq!(FragmentId::new(3).to_string(), "fragment 3");
    }

    #[test]
    fn fragment_index_out_of_domain() {
        assert!(FragmentDomainIndex::new(domain_2d(), vec![nd(&[(0, 100), (0, 9)])]).is_err());
        assert!(FragmentDomainIndex::new(domain_2d(), vec![nd(&[(0, 10)])]).is_err());
    }

    #[test]
    fn fragment_index_coverage_errors() {
        let mut fragments = row_slabs();
        fragments.remove(2);
        let index = FragmentDomainIndex::new(domain_2d(), fragments).unwrap();
        assert!(matches!(
            index.validate_full_coverage(),
            Err(CoverageError::Gap {
                fragment,
                expected: 20,
                found: 50
            }) if fragment == FragmentId::new(0)
        ));

        let mut fragments = row_slabs();
        fragments.push(nd(&[(20, 29), (0, 99)]));
        let index = FragmentDomainIndex::new(domain_2d(), fragments).unwrap();
        assert!(matches!(
            index.validate_full_coverage(),
            Err(CoverageError::Overlap {
                fragment,
                expected: 30,
                found: 20,
            }) if fragment == FragmentId::new(2)
        ));

        let mut fragments = row_slabs();
        fragments.remove(0);
        let index = FragmentDomainIndex::new(domain_2d(), fragments).unwrap();
        assert!(matches!(
            index.validate_full_coverage(),
            Err(CoverageError::Underrun {
                covered: 50,
                total: 100
            })
        ));

        let index = FragmentDomainIndex::new(domain_2d(), vec![]).unwrap();
        assert!(matches!(
            index.validate_full_coverage(),
            Err(CoverageError::Underrun {
                covered: 0,
                total: 100
            })
        ));
    }

    #[test]
    fn fragment_index_relevant_fragments() {
        let index = FragmentDomainIndex::new(domain_2d(), row_slabs()).unwrap();
        let mut subarray = Subarray::new(domain_2d(), Layout::RowMajor);
        subarray.add_range_bounds(0, 45i32, 55).unwrap();
        let relevant = index.relevant_fragments(&subarray).unwrap();
        assert_eq!(relevant, vec![FragmentId::new(2), FragmentId::new(0)]);

        let mut subarray = Subarray::new(domain_2d(), Layout::RowMajor);
        subarray.add_range_bounds(0, 0i32, 5).unwrap();
        subarray.add_range_bounds(0, 95i32, 99).unwrap();
        let relevant = index.relevant_fragments(&subarray).unwrap();
        assert_eq!(relevant, vec![FragmentId::new(1), FragmentId::new(0)]);

        let full = Subarray::new(domain_2d(), Layout::RowMajor);
        assert_eq!(index.relevant_fragments(&full).unwrap().len(), 3);
    }
}
