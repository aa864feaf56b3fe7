//! Block shape masks and their rotated footprints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CellCoord, CellOffset, Rotation};

/// Number of cells along each edge of a shape mask.
pub const SHAPE_EDGE: usize = 5;

const CENTER: i32 = 2;
const SET_CELL: char = '#';
const CLEAR_CELL: char = '.';

/// Reasons a shape description may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ShapeError {
    /// The description contained more rows than the mask can hold.
    #[error("shape has {rows} rows, at most {} are supported", SHAPE_EDGE)]
    TooManyRows {
        /// Number of rows supplied.
        rows: usize,
    },
    /// A row contained more cells than the mask can hold.
    #[error("shape row {row} has {columns} cells, at most {} are supported", SHAPE_EDGE)]
    RowTooWide {
        /// Zero-based index of the offending row.
        row: usize,
        /// Number of cells found on the row.
        columns: usize,
    },
    /// A row contained a character other than `#` or `.`.
    #[error("shape row {row} contains unexpected character '{found}'")]
    UnexpectedCharacter {
        /// Zero-based index of the offending row.
        row: usize,
        /// Character that could not be interpreted.
        found: char,
    },
    /// The requested pivot lies outside the mask.
    #[error("pivot ({x}, {z}) lies outside the {edge}x{edge} mask", edge = SHAPE_EDGE)]
    PivotOutOfRange {
        /// Requested pivot column.
        x: i32,
        /// Requested pivot row.
        z: i32,
    },
}

/// Immutable 5×5 occupancy mask describing a block, anchored at a pivot cell.
///
/// Offsets are always derived from the base mask. Rotating never mutates the
/// shape; every call recomputes the rotated set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShapeGeometry {
    /// Mask rows indexed `[z][x]`.
    mask: [[bool; SHAPE_EDGE]; SHAPE_EDGE],
    pivot: CellCoord,
}

impl ShapeGeometry {
    /// Creates a shape from a `[z][x]` mask pivoting around the center cell.
    #[must_use]
    pub const fn from_mask(mask: [[bool; SHAPE_EDGE]; SHAPE_EDGE]) -> Self {
        Self {
            mask,
            pivot: CellCoord::new(CENTER, CENTER),
        }
    }

    /// Creates a shape from the flat serialized layout where `index = z * 5 + x`.
    #[must_use]
    pub fn from_flat(cells: &[bool; SHAPE_EDGE * SHAPE_EDGE]) -> Self {
        let mut mask = [[false; SHAPE_EDGE]; SHAPE_EDGE];
        for (index, set) in cells.iter().enumerate() {
            mask[index / SHAPE_EDGE][index % SHAPE_EDGE] = *set;
        }
        Self::from_mask(mask)
    }

    /// Parses a shape from text rows, `#` marking a set cell and `.` a clear one.
    ///
    /// The first row is `z = 0`. Short rows and missing rows are padded with
    /// clear cells.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, ShapeError> {
        if rows.len() > SHAPE_EDGE {
            return Err(ShapeError::TooManyRows { rows: rows.len() });
        }

        let mut mask = [[false; SHAPE_EDGE]; SHAPE_EDGE];
        for (z, row) in rows.iter().enumerate() {
            let row = row.as_ref().trim();
            let columns = row.chars().count();
            if columns > SHAPE_EDGE {
                return Err(ShapeError::RowTooWide { row: z, columns });
            }
            for (x, character) in row.chars().enumerate() {
                mask[z][x] = match character {
                    SET_CELL => true,
                    CLEAR_CELL => false,
                    found => return Err(ShapeError::UnexpectedCharacter { row: z, found }),
                };
            }
        }

        Ok(Self::from_mask(mask))
    }

    /// Shape occupying only its pivot cell.
    #[must_use]
    pub fn single_cell() -> Self {
        let mut mask = [[false; SHAPE_EDGE]; SHAPE_EDGE];
        mask[CENTER as usize][CENTER as usize] = true;
        Self::from_mask(mask)
    }

    /// Returns a copy of the shape anchored at a different pivot cell.
    pub fn with_pivot(self, pivot: CellCoord) -> Result<Self, ShapeError> {
        let edge = SHAPE_EDGE as i32;
        if !(0..edge).contains(&pivot.x()) || !(0..edge).contains(&pivot.z()) {
            return Err(ShapeError::PivotOutOfRange {
                x: pivot.x(),
                z: pivot.z(),
            });
        }
        Ok(Self { pivot, ..self })
    }

    /// Mask cell all offsets are expressed relative to.
    #[must_use]
    pub const fn pivot(&self) -> CellCoord {
        self.pivot
    }

    /// Number of set cells in the mask.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.mask.iter().flatten().filter(|set| **set).count()
    }

    /// Reports whether the mask has no set cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Flattens the mask into the serialized `z * 5 + x` layout.
    #[must_use]
    pub fn to_flat(&self) -> [bool; SHAPE_EDGE * SHAPE_EDGE] {
        let mut cells = [false; SHAPE_EDGE * SHAPE_EDGE];
        for (z, row) in self.mask.iter().enumerate() {
            for (x, set) in row.iter().enumerate() {
                cells[z * SHAPE_EDGE + x] = *set;
            }
        }
        cells
    }

    /// Offsets of every set cell relative to the pivot, in z-major scan order.
    #[must_use]
    pub fn occupied_offsets(&self) -> Vec<CellOffset> {
        let mut offsets = Vec::with_capacity(self.cell_count());
        for (z, row) in self.mask.iter().enumerate() {
            for (x, set) in row.iter().enumerate() {
                if *set {
                    offsets.push(CellOffset::new(
                        x as i32 - self.pivot.x(),
                        z as i32 - self.pivot.z(),
                    ));
                }
            }
        }
        offsets
    }

    /// Offsets rotated clockwise by the provided number of quarter turns.
    #[must_use]
    pub fn rotated_offsets(&self, rotation: Rotation) -> Vec<CellOffset> {
        self.occupied_offsets()
            .into_iter()
            .map(|offset| {
                (0..rotation.quarter_turns()).fold(offset, |offset, _| offset.rotated_clockwise())
            })
            .collect()
    }

    /// Grid cells covered when the pivot sits on `anchor` at the given rotation.
    #[must_use]
    pub fn footprint(&self, anchor: CellCoord, rotation: Rotation) -> Vec<CellCoord> {
        self.rotated_offsets(rotation)
            .into_iter()
            .map(|offset| anchor.offset_by(offset))
            .collect()
    }
}

impl Default for ShapeGeometry {
    fn default() -> Self {
        Self::single_cell()
    }
}
