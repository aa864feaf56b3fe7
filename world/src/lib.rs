#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Gridlock.

mod blocks;
mod gates;
mod grid;
mod grid_data;
mod level;
mod placement;

use gridlock_core::{
    BlockId, BlockPhase, CellCoord, Command, Event, GateError, GridSpec, LevelState, PlacementError,
};
use log::{debug, info, warn};

use blocks::BlockRegistry;

pub use gates::{Gate, GateRegistry};
pub use grid::GridOccupancy;
pub use grid_data::{GridData, GridDataError};
pub use level::{BlockDefinition, GateDefinition, LevelDefinition, LevelError};
pub use placement::{check_placement, is_valid_placement};

/// Represents the authoritative Gridlock world state.
#[derive(Debug)]
pub struct World {
    grid: GridOccupancy,
    gates: GateRegistry,
    blocks: BlockRegistry,
    level: LevelState,
}

impl World {
    /// Creates a world in setup state with the default grid.
    #[must_use]
    pub fn new() -> Self {
        Self::with_grid(GridSpec::default())
    }

    fn with_grid(spec: GridSpec) -> Self {
        Self {
            grid: GridOccupancy::new(spec),
            gates: GateRegistry::new(),
            blocks: BlockRegistry::new(),
            level: LevelState::Setup,
        }
    }

    fn is_authoring(&self) -> bool {
        self.level == LevelState::Setup
    }

    fn is_playing(&self) -> bool {
        self.level == LevelState::InProgress
    }

    /// Cells covered by gates or blocks, which must never become walls.
    fn is_claimed(&self, cell: CellCoord) -> bool {
        self.gates.gate_at(cell).is_some() || self.grid.is_occupied(cell)
    }

    fn place_walls(&mut self, cells: &[CellCoord]) -> Vec<CellCoord> {
        let free: Vec<CellCoord> = cells
            .iter()
            .copied()
            .filter(|cell| !self.is_claimed(*cell))
            .collect();
        self.grid.place_walls(&free)
    }

    fn move_block(&mut self, block: BlockId, anchor: CellCoord) -> Result<Event, PlacementError> {
        if !self.is_playing() {
            return Err(PlacementError::InvalidState);
        }
        let placed = self.blocks.get(block).ok_or(PlacementError::UnknownBlock)?;
        if placed.phase == BlockPhase::Falling {
            return Err(PlacementError::BlockFalling);
        }

        let targets = placed.footprint_at(anchor);
        check_placement(&self.grid, Some(placed.cells.as_slice()), &targets)?;

        let from = placed.cells.clone();
        self.grid.set_occupied(&from, false);
        self.grid.set_occupied(&targets, true);
        if let Some(placed) = self.blocks.get_mut(block) {
            placed.anchor = anchor;
            placed.cells = targets.clone();
        }

        Ok(Event::BlockMoved {
            block,
            from,
            to: targets,
        })
    }

    fn complete_if_cleared(&mut self, out_events: &mut Vec<Event>) {
        if self.is_playing() && self.blocks.is_empty() {
            self.level = LevelState::Completed;
            info!("level completed");
            out_events.push(Event::LevelCompleted);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ConfigureGrid { spec } => {
            if let Err(reason) = spec.validate() {
                warn!("grid rejected: {reason}");
                out_events.push(Event::GridRejected { spec, reason });
                return;
            }
            *world = World::with_grid(spec);
            debug!("grid configured to {}x{}", spec.width, spec.length);
            out_events.push(Event::GridConfigured { spec });
        }
        Command::PlaceWalls { cells } => {
            if !world.is_authoring() {
                warn!("ignoring wall placement outside of setup");
                return;
            }
            let placed = world.place_walls(&cells);
            out_events.push(Event::WallsPlaced { cells: placed });
        }
        Command::MaskExterior => {
            if !world.is_authoring() {
                warn!("ignoring exterior mask outside of setup");
                return;
            }
            let exterior = world.grid.exterior_cells();
            let masked = world.place_walls(&exterior).len();
            debug!("masked {masked} exterior cells");
            out_events.push(Event::ExteriorMasked { masked });
        }
        Command::RegisterGate { color, cells } => {
            let result = if world.is_authoring() {
                world.gates.register(color, &cells, &world.grid)
            } else {
                Err(GateError::InvalidState)
            };
            match result {
                Ok(gate) => {
                    let cells = world
                        .gates
                        .get(gate)
                        .map(|registered| registered.cells().to_vec())
                        .unwrap_or_default();
                    out_events.push(Event::GateRegistered { gate, color, cells });
                }
                Err(reason) => {
                    debug!("gate rejected: {reason}");
                    out_events.push(Event::GateRejected { color, reason });
                }
            }
        }
        Command::RemoveGate { gate } => {
            let result = if world.is_authoring() {
                world.gates.remove(gate).ok_or(GateError::UnknownGate)
            } else {
                Err(GateError::InvalidState)
            };
            match result {
                Ok(removed) => out_events.push(Event::GateRemoved {
                    gate,
                    cells: removed.cells().to_vec(),
                }),
                Err(reason) => out_events.push(Event::GateRemovalRejected { gate, reason }),
            }
        }
        Command::AddBlock {
            shape,
            color,
            anchor,
            rotation,
        } => {
            let cells = shape.footprint(anchor, rotation);
            let result = if world.is_authoring() {
                check_placement(&world.grid, None, &cells)
            } else {
                Err(PlacementError::InvalidState)
            };
            if let Err(reason) = result {
                debug!("block rejected at ({}, {}): {reason}", anchor.x(), anchor.z());
                out_events.push(Event::BlockRejected {
                    color,
                    anchor,
                    reason,
                });
                return;
            }

            let block = world.blocks.insert(shape, color, anchor, rotation);
            world.grid.set_occupied(&cells, true);
            out_events.push(Event::BlockAdded {
                block,
                color,
                cells,
            });
        }
        Command::ClearBlocks => {
            if !world.is_authoring() {
                warn!("ignoring block clear outside of setup");
                return;
            }
            let removed = world.blocks.clear();
            world.grid.clear_non_wall();
            out_events.push(Event::BlocksCleared { removed });
        }
        Command::StartLevel => {
            if !world.is_authoring() {
                warn!("ignoring level start in state {:?}", world.level);
                return;
            }
            world.level = LevelState::InProgress;
            let blocks = world.blocks.len();
            info!("level started with {blocks} blocks");
            out_events.push(Event::LevelStarted { blocks });
            world.complete_if_cleared(out_events);
        }
        Command::MoveBlock { block, anchor } => match world.move_block(block, anchor) {
            Ok(event) => out_events.push(event),
            Err(reason) => {
                debug!("move of block {} rejected: {reason}", block.get());
                out_events.push(Event::BlockMoveRejected {
                    block,
                    anchor,
                    reason,
                });
            }
        },
        Command::PullThroughGate { block } => {
            if !world.is_playing() {
                warn!("ignoring gate pull outside of play");
                return;
            }
            let Some(placed) = world.blocks.get(block) else {
                warn!("ignoring gate pull for unknown block {}", block.get());
                return;
            };
            if placed.phase == BlockPhase::Falling {
                return;
            }
            let Some(gate) = world.gates.can_block_pass(placed.color, &placed.cells) else {
                debug!("block {} cannot pass any gate", block.get());
                return;
            };

            let cells = placed.cells.clone();
            world.grid.set_occupied(&cells, false);
            if let Some(placed) = world.blocks.get_mut(block) {
                placed.phase = BlockPhase::Falling;
            }
            info!("block {} pulled through gate {}", block.get(), gate.get());
            out_events.push(Event::BlockPulledThroughGate { block, gate, cells });
        }
        Command::CompleteRemoval { block } => {
            let falling = world
                .blocks
                .get(block)
                .is_some_and(|placed| placed.phase == BlockPhase::Falling);
            if !falling {
                warn!("ignoring removal of block {} that is not falling", block.get());
                return;
            }
            let _ = world.blocks.remove(block);
            let remaining = world.blocks.len();
            out_events.push(Event::BlockRemoved { block, remaining });
            world.complete_if_cleared(out_events);
        }
        Command::FailLevel => {
            if !world.is_playing() {
                warn!("ignoring level failure in state {:?}", world.level);
                return;
            }
            world.level = LevelState::Failed;
            info!("level failed");
            out_events.push(Event::LevelFailed);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use gridlock_core::{
        BlockId, BlockSnapshot, BlockView, CellCoord, GateId, LevelState, PlacementError,
    };

    use super::{GateRegistry, GridOccupancy, World};

    /// Provides read-only access to the occupancy grid.
    #[must_use]
    pub fn grid(world: &World) -> &GridOccupancy {
        &world.grid
    }

    /// Provides read-only access to the registered gates.
    #[must_use]
    pub fn gates(world: &World) -> &GateRegistry {
        &world.gates
    }

    /// Reports the progress of the current level.
    #[must_use]
    pub fn level_state(world: &World) -> LevelState {
        world.level
    }

    /// Captures a read-only view of every tracked block, falling ones included.
    #[must_use]
    pub fn block_view(world: &World) -> BlockView {
        BlockView::from_snapshots(world.blocks.iter().map(|block| block.snapshot()).collect())
    }

    /// Captures the state of a single block.
    #[must_use]
    pub fn block(world: &World, block: BlockId) -> Option<BlockSnapshot> {
        world.blocks.get(block).map(|placed| placed.snapshot())
    }

    /// Cells the block would cover with its pivot on `anchor`.
    #[must_use]
    pub fn footprint_at(
        world: &World,
        block: BlockId,
        anchor: CellCoord,
    ) -> Option<Vec<CellCoord>> {
        world.blocks.get(block).map(|placed| placed.footprint_at(anchor))
    }

    /// Checks whether `targets` may be claimed by `block`, ignoring its own cells.
    ///
    /// Unknown blocks and `None` both check against the full occupancy.
    pub fn check_placement(
        world: &World,
        block: Option<BlockId>,
        targets: &[CellCoord],
    ) -> Result<(), PlacementError> {
        let own_cells = block
            .and_then(|block| world.blocks.get(block))
            .map(|placed| placed.cells.as_slice());
        super::check_placement(&world.grid, own_cells, targets)
    }

    /// Reports whether `targets` may be claimed by `block`, ignoring its own cells.
    #[must_use]
    pub fn is_valid_placement(
        world: &World,
        block: Option<BlockId>,
        targets: &[CellCoord],
    ) -> bool {
        check_placement(world, block, targets).is_ok()
    }

    /// Gate the block can currently fall through, if any.
    #[must_use]
    pub fn passable_gate(world: &World, block: BlockId) -> Option<GateId> {
        let placed = world.blocks.get(block)?;
        world.gates.can_block_pass(placed.color, &placed.cells)
    }
}
