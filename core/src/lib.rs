#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Gridlock placement engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then appends [`Event`] values to the caller's
//! buffer in the order they happened. Systems consume event streams, query
//! immutable snapshots, and respond exclusively with new command batches.

mod shape;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use shape::{ShapeError, ShapeGeometry, SHAPE_EDGE};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Sizes the grid and resets walls, gates, blocks and level progress.
    ConfigureGrid {
        /// Dimensions and world placement of the grid.
        spec: GridSpec,
    },
    /// Marks the provided cells as permanent walls. Only accepted during setup.
    PlaceWalls {
        /// Cells that become walls; out-of-bounds cells are ignored.
        cells: Vec<CellCoord>,
    },
    /// Turns every non-wall cell reachable from the grid border into a wall.
    MaskExterior,
    /// Requests creation of a colored gate over the provided cells.
    RegisterGate {
        /// Color a block must carry to pass through the gate.
        color: BlockColor,
        /// Cells covered by the gate opening.
        cells: Vec<CellCoord>,
    },
    /// Requests deletion of a gate by the level tool.
    RemoveGate {
        /// Identifier of the gate to delete.
        gate: GateId,
    },
    /// Requests that a block be added to the level with its pivot on `anchor`.
    AddBlock {
        /// Occupancy mask of the block.
        shape: ShapeGeometry,
        /// Color of the block.
        color: BlockColor,
        /// Grid cell the shape's pivot is placed on.
        anchor: CellCoord,
        /// Orientation of the block.
        rotation: Rotation,
    },
    /// Removes every block and frees all non-wall cells.
    ClearBlocks,
    /// Ends setup and starts play.
    StartLevel,
    /// Requests that a block move so that its pivot lands on `anchor`.
    MoveBlock {
        /// Identifier of the block being moved.
        block: BlockId,
        /// Grid cell the block's pivot should occupy.
        anchor: CellCoord,
    },
    /// Requests that a block fall through the gate under its footprint.
    PullThroughGate {
        /// Identifier of the block to pull.
        block: BlockId,
    },
    /// Acknowledges that the presentation finished a gate pull, destroying the block.
    CompleteRemoval {
        /// Identifier of the block that finished falling.
        block: BlockId,
    },
    /// Ends the level as failed, typically when the level timer runs out.
    FailLevel,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Confirms that the grid was (re)configured.
    GridConfigured {
        /// Dimensions and world placement now in effect.
        spec: GridSpec,
    },
    /// Reports that a grid description was refused and the world left untouched.
    GridRejected {
        /// Description that was refused.
        spec: GridSpec,
        /// Reason for the refusal.
        reason: GridSpecError,
    },
    /// Confirms that walls were placed.
    WallsPlaced {
        /// In-bounds cells that became walls.
        cells: Vec<CellCoord>,
    },
    /// Confirms that exterior cells were masked off as walls.
    ExteriorMasked {
        /// Number of cells that became walls.
        masked: usize,
    },
    /// Confirms that a gate was registered.
    GateRegistered {
        /// Identifier assigned to the gate by the world.
        gate: GateId,
        /// Color accepted by the gate.
        color: BlockColor,
        /// Cells covered by the gate.
        cells: Vec<CellCoord>,
    },
    /// Reports that a gate registration was rejected.
    GateRejected {
        /// Color requested for the gate.
        color: BlockColor,
        /// Specific reason the registration failed.
        reason: GateError,
    },
    /// Confirms that a gate was deleted.
    GateRemoved {
        /// Identifier of the deleted gate.
        gate: GateId,
        /// Cells the gate covered.
        cells: Vec<CellCoord>,
    },
    /// Reports that a gate deletion was rejected.
    GateRemovalRejected {
        /// Identifier of the gate targeted for deletion.
        gate: GateId,
        /// Specific reason the deletion failed.
        reason: GateError,
    },
    /// Confirms that a block was added to the level.
    BlockAdded {
        /// Identifier assigned to the block by the world.
        block: BlockId,
        /// Color of the block.
        color: BlockColor,
        /// Cells occupied by the block.
        cells: Vec<CellCoord>,
    },
    /// Reports that a block could not be added.
    BlockRejected {
        /// Color of the rejected block.
        color: BlockColor,
        /// Anchor requested for the block.
        anchor: CellCoord,
        /// Specific reason the block was rejected.
        reason: PlacementError,
    },
    /// Confirms that all blocks were removed during setup.
    BlocksCleared {
        /// Number of blocks that were removed.
        removed: usize,
    },
    /// Announces that play started.
    LevelStarted {
        /// Number of blocks that must be cleared to complete the level.
        blocks: usize,
    },
    /// Confirms that a block moved to a new footprint.
    BlockMoved {
        /// Identifier of the moved block.
        block: BlockId,
        /// Cells the block occupied before the move.
        from: Vec<CellCoord>,
        /// Cells the block occupies after the move.
        to: Vec<CellCoord>,
    },
    /// Reports that a move was rejected and the block stays where it was.
    BlockMoveRejected {
        /// Identifier of the block that failed to move.
        block: BlockId,
        /// Anchor requested for the move.
        anchor: CellCoord,
        /// Specific reason the move failed.
        reason: PlacementError,
    },
    /// Announces that a block started falling through a gate. Its cells are already free.
    BlockPulledThroughGate {
        /// Identifier of the falling block.
        block: BlockId,
        /// Gate the block fell through.
        gate: GateId,
        /// Cells vacated by the block.
        cells: Vec<CellCoord>,
    },
    /// Confirms that a block was destroyed after falling through a gate.
    BlockRemoved {
        /// Identifier of the destroyed block.
        block: BlockId,
        /// Number of blocks still in play.
        remaining: usize,
    },
    /// Announces that every block was cleared.
    LevelCompleted,
    /// Announces that the level was failed.
    LevelFailed,
}

/// Palette of colors shared by blocks and gates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlockColor {
    /// Red blocks and gates.
    Red,
    /// Orange blocks and gates.
    Orange,
    /// Yellow blocks and gates.
    Yellow,
    /// Blue blocks and gates.
    Blue,
    /// Cyan blocks and gates.
    Cyan,
    /// Green blocks and gates.
    Green,
    /// Purple blocks and gates.
    Purple,
    /// Pink blocks and gates.
    Pink,
    /// Teal blocks and gates.
    Teal,
}

impl BlockColor {
    /// Every palette entry in declaration order.
    pub const ALL: [BlockColor; 9] = [
        Self::Red,
        Self::Orange,
        Self::Yellow,
        Self::Blue,
        Self::Cyan,
        Self::Green,
        Self::Purple,
        Self::Pink,
        Self::Teal,
    ];
}

/// Clockwise orientation of a block in quarter turns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    /// Unrotated.
    #[default]
    Deg0,
    /// One clockwise quarter turn.
    Deg90,
    /// Half turn.
    Deg180,
    /// Three clockwise quarter turns.
    Deg270,
}

impl Rotation {
    /// Every rotation in increasing quarter-turn order.
    pub const ALL: [Rotation; 4] = [Self::Deg0, Self::Deg90, Self::Deg180, Self::Deg270];

    /// Creates a rotation from a quarter-turn count, wrapping modulo four.
    #[must_use]
    pub const fn from_quarter_turns(turns: u32) -> Self {
        match turns % 4 {
            0 => Self::Deg0,
            1 => Self::Deg90,
            2 => Self::Deg180,
            _ => Self::Deg270,
        }
    }

    /// Snaps a yaw angle in degrees to the nearest quarter turn.
    #[must_use]
    pub fn from_yaw_degrees(yaw: f32) -> Self {
        let turns = (yaw / 90.0).round() as i64;
        Self::from_quarter_turns(turns.rem_euclid(4) as u32)
    }

    /// Number of clockwise quarter turns, in `0..4`.
    #[must_use]
    pub const fn quarter_turns(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 1,
            Self::Deg180 => 2,
            Self::Deg270 => 3,
        }
    }
}

/// Unique identifier assigned to a block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(u32);

impl BlockId {
    /// Creates a new block identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a gate. Identifiers grow in registration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GateId(u32);

impl GateId {
    /// Creates a new gate identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell. Signed so footprints may extend past the grid edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    z: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Column index of the cell along the world X axis.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row index of the cell along the world Z axis.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Returns the cell displaced by `offset`, saturating at the integer range.
    #[must_use]
    pub const fn offset_by(self, offset: CellOffset) -> Self {
        Self {
            x: self.x.saturating_add(offset.dx()),
            z: self.z.saturating_add(offset.dz()),
        }
    }
}

/// Displacement between two cells, typically relative to a shape pivot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellOffset {
    dx: i32,
    dz: i32,
}

impl CellOffset {
    /// Creates a new offset.
    #[must_use]
    pub const fn new(dx: i32, dz: i32) -> Self {
        Self { dx, dz }
    }

    /// Displacement along the X axis.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.dx
    }

    /// Displacement along the Z axis.
    #[must_use]
    pub const fn dz(&self) -> i32 {
        self.dz
    }

    /// Rotates the offset a quarter turn clockwise: `(x, y) -> (y, -x)`.
    #[must_use]
    pub const fn rotated_clockwise(self) -> Self {
        Self {
            dx: self.dz,
            dz: -self.dx,
        }
    }
}

/// Dimensions and world placement of the occupancy grid.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of cells along the X axis.
    pub width: u32,
    /// Number of cells along the Z axis.
    pub length: u32,
    /// Side length of a cell in world units.
    pub cell_size: f32,
    /// World position of cell `(0, 0)`.
    pub origin: Vec3,
}

impl GridSpec {
    /// Creates a grid description anchored at the world origin.
    #[must_use]
    pub const fn new(width: u32, length: u32, cell_size: f32) -> Self {
        Self {
            width,
            length,
            cell_size,
            origin: Vec3::ZERO,
        }
    }

    /// Returns the description with a different world origin.
    #[must_use]
    pub const fn with_origin(self, origin: Vec3) -> Self {
        Self { origin, ..self }
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let count = u64::from(self.width) * u64::from(self.length);
        usize::try_from(count).unwrap_or(0)
    }

    /// Checks that the grid has cells and a usable world scale.
    pub fn validate(&self) -> Result<(), GridSpecError> {
        if self.width == 0 || self.length == 0 {
            return Err(GridSpecError::Empty);
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(GridSpecError::CellSize);
        }
        if !self.origin.is_finite() {
            return Err(GridSpecError::Origin);
        }
        Ok(())
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::new(10, 10, 1.0)
    }
}

/// Lifecycle stage of a block that is still tracked by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockPhase {
    /// The block rests on the grid and occupies its footprint.
    Resting,
    /// The block is falling through a gate; its cells are already free.
    Falling,
}

/// Progress of the current level.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelState {
    /// The level is being authored; walls, gates and blocks may change.
    #[default]
    Setup,
    /// The player is moving blocks.
    InProgress,
    /// Every block was cleared.
    Completed,
    /// The level ended without clearing every block.
    Failed,
}

/// Reasons a block placement or move may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// A footprint cell lies outside the grid.
    #[error("footprint leaves the grid")]
    OutOfBounds,
    /// A footprint cell is occupied by another block.
    #[error("footprint overlaps an occupied cell")]
    Occupied,
    /// A footprint cell is a wall.
    #[error("footprint overlaps a wall")]
    Wall,
    /// No block with the provided identifier exists.
    #[error("block does not exist")]
    UnknownBlock,
    /// The block is falling through a gate and can no longer move.
    #[error("block is falling through a gate")]
    BlockFalling,
    /// The level is not in a state that accepts the request.
    #[error("level state does not allow this placement")]
    InvalidState,
}

/// Reasons a grid description may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum GridSpecError {
    /// Width or length is zero.
    #[error("grid has no cells")]
    Empty,
    /// Cell size is zero, negative or not finite.
    #[error("cell size must be a positive finite number")]
    CellSize,
    /// Origin has a component that is not finite.
    #[error("grid origin must be finite")]
    Origin,
}

/// Reasons a gate registration or deletion may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum GateError {
    /// The gate would not cover any cell.
    #[error("gate covers no cells")]
    Empty,
    /// A requested cell lies outside the grid.
    #[error("gate cell lies outside the grid")]
    OutOfBounds,
    /// A requested cell is a wall.
    #[error("gate cell is a wall")]
    Wall,
    /// A requested cell already belongs to another gate.
    #[error("gate cell already belongs to another gate")]
    Overlap,
    /// No gate with the provided identifier exists.
    #[error("gate does not exist")]
    UnknownGate,
    /// Gates can only change while the level is being set up.
    #[error("gates can only change during setup")]
    InvalidState,
}

/// Immutable representation of a single block's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockSnapshot {
    /// Unique identifier assigned to the block.
    pub id: BlockId,
    /// Occupancy mask of the block.
    pub shape: ShapeGeometry,
    /// Color of the block.
    pub color: BlockColor,
    /// Orientation of the block.
    pub rotation: Rotation,
    /// Grid cell under the shape's pivot.
    pub anchor: CellCoord,
    /// Cells currently claimed by the block.
    pub cells: Vec<CellCoord>,
    /// Lifecycle stage of the block.
    pub phase: BlockPhase,
}

/// Read-only snapshot describing all blocks within the level.
#[derive(Clone, Debug, Default)]
pub struct BlockView {
    snapshots: Vec<BlockSnapshot>,
}

impl BlockView {
    /// Creates a new block view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<BlockSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured block snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockSnapshot> {
        self.snapshots.iter()
    }

    /// Finds the snapshot for the provided block.
    #[must_use]
    pub fn get(&self, block: BlockId) -> Option<&BlockSnapshot> {
        self.snapshots
            .binary_search_by_key(&block, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Number of captured blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
