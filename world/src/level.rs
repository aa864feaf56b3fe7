//! Serializable level layouts and their replay into a world.

use gridlock_core::{
    BlockColor, CellCoord, Command, Event, GateError, GridSpec, GridSpecError, PlacementError,
    Rotation, ShapeError, ShapeGeometry,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{apply, World};

/// Complete description of a level before play starts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelDefinition {
    /// Dimensions and world placement of the grid.
    pub grid: GridSpec,
    /// Cells that are walls.
    #[serde(default)]
    pub walls: Vec<CellCoord>,
    /// Walls off every cell reachable from the border after walls are placed.
    #[serde(default)]
    pub mask_exterior: bool,
    /// Gates in registration order.
    #[serde(default)]
    pub gates: Vec<GateDefinition>,
    /// Blocks in insertion order.
    #[serde(default)]
    pub blocks: Vec<BlockDefinition>,
}

/// Gate entry of a level definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateDefinition {
    /// Color accepted by the gate.
    pub color: BlockColor,
    /// Cells covered by the gate.
    pub cells: Vec<CellCoord>,
}

/// Block entry of a level definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDefinition {
    /// Shape rows, `#` for set cells and `.` for clear ones; the first row is `z = 0`.
    pub shape: Vec<String>,
    /// Pivot cell inside the 5×5 mask; the center when omitted.
    #[serde(default)]
    pub pivot: Option<CellCoord>,
    /// Color of the block.
    pub color: BlockColor,
    /// Grid cell the pivot is placed on.
    pub anchor: CellCoord,
    /// Orientation of the block.
    #[serde(default)]
    pub rotation: Rotation,
}

impl BlockDefinition {
    /// Parses the shape rows and applies the pivot.
    pub fn geometry(&self) -> Result<ShapeGeometry, ShapeError> {
        let shape = ShapeGeometry::from_rows(self.shape.as_slice())?;
        match self.pivot {
            Some(pivot) => shape.with_pivot(pivot),
            None => Ok(shape),
        }
    }
}

/// Errors raised while building a world from a level definition.
#[derive(Debug, Error, PartialEq)]
pub enum LevelError {
    /// The grid description is unusable.
    #[error("level grid is invalid")]
    Grid(#[source] GridSpecError),
    /// A block shape could not be parsed.
    #[error("block {index} has an invalid shape")]
    Shape {
        /// Position of the block in the definition.
        index: usize,
        /// Underlying parse failure.
        #[source]
        source: ShapeError,
    },
    /// The world refused a gate.
    #[error("gate {index} was rejected")]
    Gate {
        /// Position of the gate in the definition.
        index: usize,
        /// Reason reported by the world.
        #[source]
        reason: GateError,
    },
    /// The world refused a block.
    #[error("block {index} was rejected")]
    Block {
        /// Position of the block in the definition.
        index: usize,
        /// Reason reported by the world.
        #[source]
        reason: PlacementError,
    },
}

impl World {
    /// Builds a world in setup state by replaying a level definition as commands.
    ///
    /// Stops at the first gate or block the world rejects.
    pub fn from_level(level: &LevelDefinition) -> Result<Self, LevelError> {
        level.grid.validate().map_err(LevelError::Grid)?;
        let mut world = World::new();
        let mut events = Vec::new();

        apply(&mut world, Command::ConfigureGrid { spec: level.grid }, &mut events);
        if !level.walls.is_empty() {
            apply(
                &mut world,
                Command::PlaceWalls {
                    cells: level.walls.clone(),
                },
                &mut events,
            );
        }
        if level.mask_exterior {
            apply(&mut world, Command::MaskExterior, &mut events);
        }

        for (index, gate) in level.gates.iter().enumerate() {
            events.clear();
            apply(
                &mut world,
                Command::RegisterGate {
                    color: gate.color,
                    cells: gate.cells.clone(),
                },
                &mut events,
            );
            if let Some(reason) = events.iter().find_map(|event| match event {
                Event::GateRejected { reason, .. } => Some(*reason),
                _ => None,
            }) {
                return Err(LevelError::Gate { index, reason });
            }
        }

        for (index, block) in level.blocks.iter().enumerate() {
            let shape = block
                .geometry()
                .map_err(|source| LevelError::Shape { index, source })?;
            events.clear();
            apply(
                &mut world,
                Command::AddBlock {
                    shape,
                    color: block.color,
                    anchor: block.anchor,
                    rotation: block.rotation,
                },
                &mut events,
            );
            if let Some(reason) = events.iter().find_map(|event| match event {
                Event::BlockRejected { reason, .. } => Some(*reason),
                _ => None,
            }) {
                return Err(LevelError::Block { index, reason });
            }
        }

        Ok(world)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query;
    use gridlock_core::LevelState;

    fn block(rows: &[&str], color: BlockColor, anchor: (i32, i32)) -> BlockDefinition {
        BlockDefinition {
            shape: rows.iter().map(|row| (*row).to_owned()).collect(),
            pivot: None,
            color,
            anchor: CellCoord::new(anchor.0, anchor.1),
            rotation: Rotation::Deg0,
        }
    }

    fn level() -> LevelDefinition {
        LevelDefinition {
            grid: GridSpec::new(6, 6, 1.0),
            walls: vec![CellCoord::new(3, 3)],
            mask_exterior: false,
            gates: vec![GateDefinition {
                color: BlockColor::Red,
                cells: vec![CellCoord::new(0, 0)],
            }],
            blocks: vec![block(&["", "", "..#"], BlockColor::Red, (1, 1))],
        }
    }

    #[test]
    fn level_replays_into_setup_world() {
        let world = World::from_level(&level()).expect("valid level");

        assert_eq!(query::level_state(&world), LevelState::Setup);
        assert!(query::grid(&world).is_wall(CellCoord::new(3, 3)));
        assert_eq!(query::gates(&world).len(), 1);
        assert_eq!(query::block_view(&world).len(), 1);
        assert!(query::grid(&world).is_occupied(CellCoord::new(1, 1)));
    }

    #[test]
    fn overlapping_blocks_report_their_index() {
        let mut definition = level();
        definition
            .blocks
            .push(block(&["", "", "..#"], BlockColor::Blue, (1, 1)));

        assert_eq!(
            World::from_level(&definition).unwrap_err(),
            LevelError::Block {
                index: 1,
                reason: PlacementError::Occupied,
            }
        );
    }

    #[test]
    fn gate_on_wall_is_reported() {
        let mut definition = level();
        definition.gates.push(GateDefinition {
            color: BlockColor::Blue,
            cells: vec![CellCoord::new(3, 3)],
        });

        assert_eq!(
            World::from_level(&definition).unwrap_err(),
            LevelError::Gate {
                index: 1,
                reason: GateError::Wall,
            }
        );
    }

    #[test]
    fn zero_cell_size_is_reported() {
        let mut definition = level();
        definition.grid.cell_size = 0.0;

        assert_eq!(
            World::from_level(&definition).err(),
            Some(LevelError::Grid(GridSpecError::CellSize))
        );
    }

    #[test]
    fn malformed_shape_is_reported() {
        let mut definition = level();
        definition.blocks[0].shape = vec!["#?".to_owned()];

        assert!(matches!(
            World::from_level(&definition),
            Err(LevelError::Shape { index: 0, .. })
        ));
    }

    #[test]
    fn custom_pivot_is_applied() {
        let definition = BlockDefinition {
            pivot: Some(CellCoord::new(0, 0)),
            ..block(&["##"], BlockColor::Green, (0, 0))
        };
        let shape = definition.geometry().expect("valid shape");
        assert_eq!(
            shape.footprint(CellCoord::new(2, 2), Rotation::Deg0),
            vec![CellCoord::new(2, 2), CellCoord::new(3, 2)]
        );
    }
}
