//! Dense occupancy and wall tracking for the puzzle board.

use std::collections::VecDeque;

use glam::Vec3;
use gridlock_core::{CellCoord, GridSpec};

const WALL_GLYPH: char = '#';
const OCCUPIED_GLYPH: char = 'o';
const FREE_GLYPH: char = '.';

/// Occupancy state of every cell on the board.
///
/// Two parallel arrays indexed `z * width + x` record whether a cell is
/// occupied and whether it is a wall. A wall cell is always occupied.
#[derive(Clone, Debug, PartialEq)]
pub struct GridOccupancy {
    pub(crate) spec: GridSpec,
    pub(crate) occupied: Vec<bool>,
    pub(crate) walls: Vec<bool>,
}

impl GridOccupancy {
    /// Creates an empty grid matching the provided description.
    #[must_use]
    pub fn new(spec: GridSpec) -> Self {
        let capacity = spec.cell_count();
        Self {
            spec,
            occupied: vec![false; capacity],
            walls: vec![false; capacity],
        }
    }

    /// Dimensions and world placement of the grid.
    #[must_use]
    pub const fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Number of cells along the X axis.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.spec.width
    }

    /// Number of cells along the Z axis.
    #[must_use]
    pub const fn length(&self) -> u32 {
        self.spec.length
    }

    /// Reports whether the cell lies on the grid.
    #[must_use]
    pub fn is_within_bounds(&self, cell: CellCoord) -> bool {
        self.index(cell).is_some()
    }

    /// Reports whether the cell is occupied. Out-of-bounds cells are not.
    #[must_use]
    pub fn is_occupied(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.occupied.get(index).copied())
            .unwrap_or(false)
    }

    /// Reports whether the cell is a wall. Out-of-bounds cells are not.
    #[must_use]
    pub fn is_wall(&self, cell: CellCoord) -> bool {
        self.index(cell)
            .and_then(|index| self.walls.get(index).copied())
            .unwrap_or(false)
    }

    /// Sets the occupancy of every in-bounds cell; other cells are ignored.
    ///
    /// Clearing a wall cell leaves it occupied.
    pub fn set_occupied(&mut self, cells: &[CellCoord], value: bool) {
        for cell in cells {
            let Some(index) = self.index(*cell) else {
                continue;
            };
            let is_wall = self.walls.get(index).copied().unwrap_or(false);
            if let Some(slot) = self.occupied.get_mut(index) {
                *slot = value || is_wall;
            }
        }
    }

    /// Turns every in-bounds cell into a wall, returning the cells that changed.
    pub fn place_walls(&mut self, cells: &[CellCoord]) -> Vec<CellCoord> {
        let mut placed = Vec::new();
        for cell in cells {
            let Some(index) = self.index(*cell) else {
                continue;
            };
            if self.walls[index] {
                continue;
            }
            self.walls[index] = true;
            self.occupied[index] = true;
            placed.push(*cell);
        }
        placed
    }

    /// Non-wall cells reachable from the border through 4-connected non-wall cells.
    #[must_use]
    pub fn exterior_cells(&self) -> Vec<CellCoord> {
        let mut reached = vec![false; self.walls.len()];
        let mut queue = VecDeque::new();
        let width = self.width() as i32;
        let length = self.length() as i32;

        let visit = |cell: CellCoord, reached: &mut Vec<bool>, queue: &mut VecDeque<_>| {
            if let Some(index) = self.index(cell) {
                if !self.walls[index] && !reached[index] {
                    reached[index] = true;
                    queue.push_back(cell);
                }
            }
        };

        for x in 0..width {
            visit(CellCoord::new(x, 0), &mut reached, &mut queue);
            visit(CellCoord::new(x, length - 1), &mut reached, &mut queue);
        }
        for z in 0..length {
            visit(CellCoord::new(0, z), &mut reached, &mut queue);
            visit(CellCoord::new(width - 1, z), &mut reached, &mut queue);
        }

        let mut exterior = Vec::new();
        while let Some(cell) = queue.pop_front() {
            exterior.push(cell);
            for (dx, dz) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let neighbor = CellCoord::new(cell.x() + dx, cell.z() + dz);
                visit(neighbor, &mut reached, &mut queue);
            }
        }
        exterior.sort();
        exterior
    }

    /// Walls off every exterior cell and returns how many cells were masked.
    pub fn mask_exterior(&mut self) -> usize {
        let exterior = self.exterior_cells();
        self.place_walls(&exterior).len()
    }

    /// Frees every non-wall cell.
    pub fn clear_non_wall(&mut self) {
        for (slot, is_wall) in self.occupied.iter_mut().zip(&self.walls) {
            *slot = *is_wall;
        }
    }

    /// Converts a world position to the nearest cell, rounding X and Z.
    ///
    /// The result may lie outside the grid.
    #[must_use]
    pub fn world_to_grid(&self, position: Vec3) -> CellCoord {
        let (x, z) = self.exact_grid_position(position);
        CellCoord::new(x.round() as i32, z.round() as i32)
    }

    /// Converts a world position to unrounded cell coordinates.
    #[must_use]
    pub fn exact_grid_position(&self, position: Vec3) -> (f32, f32) {
        let local = position - self.spec.origin;
        (
            local.x / self.spec.cell_size,
            local.z / self.spec.cell_size,
        )
    }

    /// World position of the provided cell at height `y`.
    #[must_use]
    pub fn grid_to_world(&self, cell: CellCoord, y: f32) -> Vec3 {
        Vec3::new(
            self.spec.origin.x + cell.x() as f32 * self.spec.cell_size,
            y,
            self.spec.origin.z + cell.z() as f32 * self.spec.cell_size,
        )
    }

    /// World-space center of the grid at the origin's height.
    #[must_use]
    pub fn center_world_position(&self) -> Vec3 {
        let size = self.spec.cell_size;
        let half_extent = |cells: u32| cells as f32 * size / 2.0 - size / 2.0;
        self.spec.origin + Vec3::new(half_extent(self.width()), 0.0, half_extent(self.length()))
    }

    /// Raw occupancy flags indexed `z * width + x`.
    #[must_use]
    pub fn occupied_cells(&self) -> &[bool] {
        &self.occupied
    }

    /// Raw wall flags indexed `z * width + x`.
    #[must_use]
    pub fn wall_cells(&self) -> &[bool] {
        &self.walls
    }

    /// Renders the grid as text, one row per z with the highest z first.
    ///
    /// `#` marks a wall, `o` an occupied cell and `.` a free cell.
    #[must_use]
    pub fn debug_dump(&self) -> String {
        let width = self.width() as usize;
        let mut dump = String::with_capacity((width + 1) * self.length() as usize);
        for z in (0..self.length() as i32).rev() {
            for x in 0..self.width() as i32 {
                let cell = CellCoord::new(x, z);
                let glyph = if self.is_wall(cell) {
                    WALL_GLYPH
                } else if self.is_occupied(cell) {
                    OCCUPIED_GLYPH
                } else {
                    FREE_GLYPH
                };
                dump.push(glyph);
            }
            dump.push('\n');
        }
        dump
    }

    pub(crate) fn index(&self, cell: CellCoord) -> Option<usize> {
        let x = u32::try_from(cell.x()).ok()?;
        let z = u32::try_from(cell.z()).ok()?;
        if x < self.width() && z < self.length() {
            let width = usize::try_from(self.width()).ok()?;
            Some(usize::try_from(z).ok()? * width + usize::try_from(x).ok()?)
        } else {
            None
        }
    }
}
