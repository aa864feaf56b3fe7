//! Serializable snapshot of a grid's occupancy.

use glam::Vec3;
use gridlock_core::{GridSpec, GridSpecError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::GridOccupancy;

/// Persisted form of a [`GridOccupancy`].
///
/// `occupied` and `walls` are indexed `z * width + x`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridData {
    /// Number of cells along the X axis.
    pub width: u32,
    /// Number of cells along the Z axis.
    pub length: u32,
    /// Side length of a cell in world units.
    pub cell_size: f32,
    /// World position of cell `(0, 0)`.
    pub origin: Vec3,
    /// Occupancy flag of every cell.
    pub occupied: Vec<bool>,
    /// Wall flag of every cell.
    pub walls: Vec<bool>,
}

/// Errors raised while restoring a grid from [`GridData`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridDataError {
    /// The stored dimensions or scale are unusable.
    #[error("stored grid description is invalid")]
    Spec(#[from] GridSpecError),
    /// A flag array does not hold exactly `width * length` entries.
    #[error("{field} holds {found} entries but the grid has {expected} cells")]
    LengthMismatch {
        /// Name of the offending array.
        field: &'static str,
        /// Number of cells in the grid.
        expected: usize,
        /// Number of entries found.
        found: usize,
    },
}

impl GridOccupancy {
    /// Captures the grid in its persisted form.
    #[must_use]
    pub fn to_data(&self) -> GridData {
        GridData {
            width: self.spec.width,
            length: self.spec.length,
            cell_size: self.spec.cell_size,
            origin: self.spec.origin,
            occupied: self.occupied.clone(),
            walls: self.walls.clone(),
        }
    }

    /// Restores a grid from its persisted form.
    ///
    /// Every wall is marked occupied even if the stored flags disagree.
    pub fn from_data(data: GridData) -> Result<Self, GridDataError> {
        let spec = GridSpec::new(data.width, data.length, data.cell_size)
            .with_origin(data.origin);
        spec.validate()?;
        let expected = spec.cell_count();
        for (field, found) in [("occupied", data.occupied.len()), ("walls", data.walls.len())] {
            if found != expected {
                return Err(GridDataError::LengthMismatch {
                    field,
                    expected,
                    found,
                });
            }
        }

        let occupied = data
            .occupied
            .iter()
            .zip(&data.walls)
            .map(|(occupied, wall)| *occupied || *wall)
            .collect();
        Ok(Self {
            spec,
            occupied,
            walls: data.walls,
        })
    }
}
