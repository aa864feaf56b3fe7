//! Legality checks for proposed block footprints.

use gridlock_core::{CellCoord, PlacementError};

use crate::grid::GridOccupancy;

/// Checks whether `targets` may be claimed by a block currently covering `own_cells`.
///
/// The block's own cells count as free, which matches clearing them on a copy
/// of the grid without touching the real one. Cells are inspected in order and
/// the first failure is reported: out of bounds, then wall, then occupied.
/// An empty target set is always valid.
pub fn check_placement(
    grid: &GridOccupancy,
    own_cells: Option<&[CellCoord]>,
    targets: &[CellCoord],
) -> Result<(), PlacementError> {
    let own_cells = own_cells.unwrap_or(&[]);
    for target in targets {
        if !grid.is_within_bounds(*target) {
            return Err(PlacementError::OutOfBounds);
        }
        if grid.is_wall(*target) {
            return Err(PlacementError::Wall);
        }
        if grid.is_occupied(*target) && !own_cells.contains(target) {
            return Err(PlacementError::Occupied);
        }
    }
    Ok(())
}

/// Reports whether `targets` may be claimed by a block currently covering `own_cells`.
#[must_use]
pub fn is_valid_placement(
    grid: &GridOccupancy,
    own_cells: Option<&[CellCoord]>,
    targets: &[CellCoord],
) -> bool {
    check_placement(grid, own_cells, targets).is_ok()
}
