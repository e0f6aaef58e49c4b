//! Splitting subarrays in two, lower half first in the subarray layout.

use ndtile_domain::Layout;
use ndtile_range::{with_physical_type, Coordinate, TypedRange};

use crate::subarray::{Subarray, SubarrayError};

/// A subarray split into its lower and upper halves.
pub(super) type Halves = (Subarray, Subarray);

/// Bisect `range` after its split point.
///
/// Returns [`None`] for a unary range.
pub(super) fn split_range(
    range: &TypedRange,
) -> Result<Option<(TypedRange, TypedRange)>, SubarrayError> {
    with_physical_type!(range.physical_type(), T => {
        let range = range.get::<T>()?;
        Ok(range
            .split_point()
            .and_then(|point| range.split_at(point))
            .map(|(lower, upper)| (T::into_typed_range(lower), T::into_typed_range(upper))))
    })
}

fn halves(
    subarray: &Subarray,
    dim_idx: usize,
    lower: Vec<TypedRange>,
    upper: Vec<TypedRange>,
) -> Halves {
    (
        subarray.with_dim_ranges(dim_idx, lower),
        subarray.with_dim_ranges(dim_idx, upper),
    )
}

/// Split a single range subarray on a tile boundary.
///
/// The first dimension in tile order spanning more than one tile is split at the tile boundary closest to its middle tile.
/// Returns [`None`] if the subarray lies within one tile.
fn split_on_tiles(subarray: &Subarray) -> Result<Option<Halves>, SubarrayError> {
    let domain = subarray.domain();
    for dim_idx in domain.tile_order().axes(domain.rank()) {
        let dimension = domain.dimension(dim_idx)?;
        let range = subarray.range(dim_idx, 0)?;
        let split = with_physical_type!(dimension.physical_type(), T => {
            let typed = dimension.typed::<T>()?;
            let range = range.get::<T>()?;
            let first = typed.tile_idx(range.start())?;
            let tiles_apart = typed.tile_idx(range.end())? - first;
            if tiles_apart == 0 {
                None
            } else {
                let mid = first + (tiles_apart / 2).max(1);
                range
                    .split_at(typed.tile_end(mid - 1)?)
                    .map(|(lower, upper)| (T::into_typed_range(lower), T::into_typed_range(upper)))
            }
        });
        if let Some((lower, upper)) = split {
            return Ok(Some(halves(subarray, dim_idx, vec![lower], vec![upper])));
        }
    }
    Ok(None)
}

/// Split a subarray with a single range per dimension.
///
/// Global order subarrays are split on tile boundaries where possible.
/// Otherwise the first non-unary dimension in the range order is bisected.
/// Returns [`None`] for a unary subarray.
pub(super) fn split_single_range(subarray: &Subarray) -> Result<Option<Halves>, SubarrayError> {
    if subarray.layout() == Layout::GlobalOrder {
        if let Some(halves) = split_on_tiles(subarray)? {
            return Ok(Some(halves));
        }
    }
    for dim_idx in subarray.range_order().axes(subarray.rank()) {
        if let Some((lower, upper)) = split_range(subarray.range(dim_idx, 0)?)? {
            return Ok(Some(halves(subarray, dim_idx, vec![lower], vec![upper])));
        }
    }
    Ok(None)
}

/// Split a subarray with any number of ranges per dimension.
///
/// The first dimension in the range order that has multiple ranges or a non-unary range is split.
/// Multiple ranges are divided after range `(range_num - 1) / 2`, a single range is bisected.
/// Returns [`None`] for a unary subarray.
pub(super) fn split_multi_range(subarray: &Subarray) -> Result<Option<Halves>, SubarrayError> {
    if subarray.range_num_total()? == 1 {
        return split_single_range(subarray);
    }
    for dim_idx in subarray.range_order().axes(subarray.rank()) {
        let ranges = subarray.ranges(dim_idx)?;
        if ranges.len() > 1 {
            let split = (ranges.len() - 1) / 2;
            return Ok(Some(halves(
                subarray,
                dim_idx,
                ranges[..=split].to_vec(),
                ranges[split + 1..].to_vec(),
            )));
        }
        if let Some((lower, upper)) = split_range(&ranges[0])? {
            return Ok(Some(halves(subarray, dim_idx, vec![lower], vec![upper])));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ndtile_domain::{Dimension, Domain, Order};
    use ndtile_range::{Datatype, Range};

    use super::*;

    fn domain_2d(cell_order: Order, tile_order: Order) -> Arc<Domain> {
        Arc::new(
            Domain::new(vec![
                Dimension::new("rows", Datatype::Int32, Range::new(0i32, 99).unwrap(), 10)
                    .unwrap(),
                Dimension::new("cols", Datatype::Int32, Range::new(0i32, 99).unwrap(), 10)
                    .unwrap(),
            ])
            .unwrap()
            .with_cell_order(cell_order)
            .with_tile_order(tile_order),
        )
    }

    fn r(start: i32, end: i32) -> TypedRange {
        TypedRange::new(start, end).unwrap()
    }

    #[test]
    fn split_range_bisects() {
        assert_eq!(split_range(&r(0, 19)).unwrap(), Some((r(0, 9), r(10, 19))));
        assert_eq!(split_range(&r(4, 5)).unwrap(), Some((r(4, 4), r(5, 5))));
        assert_eq!(split_range(&r(7, 7)).unwrap(), None);
        let (lower, upper) = split_range(&TypedRange::new(0.0f64, 1.0).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(lower, TypedRange::new(0.0f64, 0.5).unwrap());
        assert_eq!(upper.start(), 0.5f64.next_up().into());
    }

    #[test]
    fn split_single_range_layout_order() {
        let domain = domain_2d(Order::RowMajor, Order::RowMajor);
        let mut subarray = Subarray::new(domain.clone(), Layout::RowMajor);
        subarray.add_range_bounds(0, 0i32, 19).unwrap();
        let (lower, upper) = split_single_range(&subarray).unwrap().unwrap();
        assert_eq!(lower.ranges(0).unwrap(), &[r(0, 9)]);
        assert_eq!(upper.ranges(0).unwrap(), &[r(10, 19)]);
        assert_eq!(upper.ranges(1).unwrap(), &[r(0, 99)]);

        let mut subarray = Subarray::new(domain, Layout::ColMajor);
        subarray.add_range_bounds(0, 0i32, 19).unwrap();
        let (lower, upper) = split_single_range(&subarray).unwrap().unwrap();
        assert_eq!(lower.ranges(1).unwrap(), &[r(0, 49)]);
        assert_eq!(upper.ranges(1).unwrap(), &[r(50, 99)]);

        // unordered follows the cell order
        let domain = domain_2d(Order::ColMajor, Order::RowMajor);
        let subarray = Subarray::new(domain, Layout::Unordered);
        let (lower, _) = split_single_range(&subarray).unwrap().unwrap();
        assert_eq!(lower.ranges(1).unwrap(), &[r(0, 49)]);

        let unary = Subarray::from_ndrange(
            domain_2d(Order::RowMajor, Order::RowMajor),
            Layout::RowMajor,
            &vec![r(3, 3), r(4, 4)].into(),
        )
        .unwrap();
        assert!(split_single_range(&unary).unwrap().is_none());
    }

    #[test]
    fn split_global_order_on_tiles() {
        let domain = domain_2d(Order::RowMajor, Order::RowMajor);
        let mut subarray = Subarray::new(domain.clone(), Layout::GlobalOrder);
        subarray.add_range_bounds(0, 5i32, 42).unwrap();
        let (lower, upper) = split_single_range(&subarray).unwrap().unwrap();
        // tiles 0..=4, split after tile 1
        assert_eq!(lower.ranges(0).unwrap(), &[r(5, 19)]);
        assert_eq!(upper.ranges(0).unwrap(), &[r(20, 42)]);

        let mut subarray = Subarray::new(domain.clone(), Layout::GlobalOrder);
        subarray.add_range_bounds(0, 5i32, 12).unwrap();
        let (lower, upper) = split_single_range(&subarray).unwrap().unwrap();
        assert_eq!(lower.ranges(0).unwrap(), &[r(5, 9)]);
        assert_eq!(upper.ranges(0).unwrap(), &[r(10, 12)]);

        // within a single tile the cell order applies
        let mut subarray = Subarray::new(domain, Layout::GlobalOrder);
        subarray.add_range_bounds(0, 0i32, 9).unwrap();
        subarray.add_range_bounds(1, 0i32, 9).unwrap();
        let (lower, upper) = split_single_range(&subarray).unwrap().unwrap();
        assert_eq!(lower.ranges(0).unwrap(), &[r(0, 4)]);
        assert_eq!(upper.ranges(0).unwrap(), &[r(5, 9)]);
    }

    #[test]
    fn split_multi_range_lists() {
        let domain = domain_2d(Order::RowMajor, Order::RowMajor);
        let mut subarray = Subarray::new(domain, Layout::RowMajor);
        subarray.add_range_bounds(0, 3i32, 3).unwrap();
        for start in [0i32, 10, 20, 30] {
            subarray.add_range_bounds(1, start, start + 1).unwrap();
        }
        let (lower, upper) = split_multi_range(&subarray).unwrap().unwrap();
        assert_eq!(lower.ranges(1).unwrap(), &[r(0, 1), r(10, 11)]);
        assert_eq!(upper.ranges(1).unwrap(), &[r(20, 21), r(30, 31)]);

        let (lower, upper) = split_multi_range(&upper).unwrap().unwrap();
        assert_eq!(lower.ranges(1).unwrap(), &[r(20, 21)]);
        assert_eq!(upper.ranges(1).unwrap(), &[r(30, 31)]);

        // a single range split on dimension 0 before the range list of dimension 1
        let mut rows = lower.clone();
        rows.add_range_bounds(0, 4i32, 5).unwrap();
        rows.add_range_bounds(1, 30i32, 31).unwrap();
        let (lower, upper) = split_multi_range(&rows).unwrap().unwrap();
        assert_eq!(lower.ranges(0).unwrap(), &[r(3, 4)]);
        assert_eq!(upper.ranges(0).unwrap(), &[r(5, 5)]);
        assert_eq!(upper.range_num(1).unwrap(), 2);
    }
}
