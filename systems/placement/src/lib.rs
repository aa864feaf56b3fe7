#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Drag-and-drop placement controller that turns pointer motion into block moves.
//!
//! The controller never mutates the world while a drag is in flight. Feedback
//! and constrained motion are computed from read-only queries; only
//! [`PlacementController::commit`] submits a `MoveBlock` command, letting the
//! world re-validate and update occupancy in one step.

use glam::Vec3;
use gridlock_core::{BlockId, BlockPhase, CellCoord, CellOffset, Command, Event, LevelState};
use gridlock_world::{self as world, query, World};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

const DEFAULT_COLLISION_THRESHOLD: f32 = 0.9;
const DEFAULT_FAST_MOVE_FRACTION: f32 = 0.75;
const DEFAULT_SEARCH_ITERATIONS: u32 = 8;
const DEFAULT_DRAG_HEIGHT: f32 = 0.05;

const FAST_STEP_FRACTION: f32 = 0.5;
const SEARCH_START_LOOSE: f32 = 0.75;
const SEARCH_START_STRICT: f32 = 0.25;
const MAX_BOUNDARY_BACKOFF: f32 = 0.2;
const THRESHOLD_PROBE_MINIMUM: f32 = 0.5;

/// Tunables for drag behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Collision threshold in `0..=1`; above `0.5` blocks keep a margin from obstacles.
    pub collision_threshold: f32,
    /// Moves longer than this fraction of a cell are taken in half-cell steps.
    pub fast_move_fraction: f32,
    /// Iterations of the search that slides a blocked block up to the obstacle.
    pub search_iterations: u32,
    /// Height a dragged block is lifted above the grid.
    pub drag_height: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            collision_threshold: DEFAULT_COLLISION_THRESHOLD,
            fast_move_fraction: DEFAULT_FAST_MOVE_FRACTION,
            search_iterations: DEFAULT_SEARCH_ITERATIONS,
            drag_height: DEFAULT_DRAG_HEIGHT,
        }
    }
}

/// Validity report for a proposed drag position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DragFeedback {
    /// Cell the block's pivot would snap to.
    pub anchor: CellCoord,
    /// Cells the block would cover at that anchor.
    pub cells: Vec<CellCoord>,
    /// Whether the snapped footprint can be committed.
    pub valid: bool,
    /// Whether the footprint also keeps the configured margin from neighbours.
    pub smoothed_valid: bool,
}

#[derive(Clone, Debug)]
struct DragSession {
    block: BlockId,
    position: Vec3,
}

/// Drag state machine for a single pointer.
#[derive(Clone, Debug, Default)]
pub struct PlacementController {
    config: DragConfig,
    session: Option<DragSession>,
    rollback: Option<CellCoord>,
}

impl PlacementController {
    /// Creates an idle controller using the provided tunables.
    #[must_use]
    pub const fn new(config: DragConfig) -> Self {
        Self {
            config,
            session: None,
            rollback: None,
        }
    }

    /// Block being dragged, if any.
    #[must_use]
    pub fn active_block(&self) -> Option<BlockId> {
        self.session.as_ref().map(|session| session.block)
    }

    /// Current world position of the dragged block.
    #[must_use]
    pub fn position(&self) -> Option<Vec3> {
        self.session.as_ref().map(|session| session.position)
    }

    /// Starts dragging `block`, remembering its anchor as the rollback target.
    ///
    /// Refused while another drag is active, for unknown or falling blocks,
    /// and while the level is not in progress.
    pub fn begin_move(&mut self, world: &World, block: BlockId) -> bool {
        if self.session.is_some() {
            debug!("drag already active, ignoring begin for block {}", block.get());
            return false;
        }
        if query::level_state(world) != LevelState::InProgress {
            return false;
        }
        let Some(snapshot) = query::block(world, block) else {
            warn!("cannot drag unknown block {}", block.get());
            return false;
        };
        if snapshot.phase == BlockPhase::Falling {
            return false;
        }

        let grid = query::grid(world);
        let lift = grid.spec().origin.y + self.config.drag_height;
        self.session = Some(DragSession {
            block,
            position: grid.grid_to_world(snapshot.anchor, lift),
        });
        self.rollback = Some(snapshot.anchor);
        debug!("drag started for block {}", block.get());
        true
    }

    /// Moves the dragged block to `position` and reports whether it could land there.
    ///
    /// Returns `None` while idle.
    pub fn update_position(&mut self, world: &World, position: Vec3) -> Option<DragFeedback> {
        let Some(session) = self.session.as_mut() else {
            warn!("position update received while idle");
            return None;
        };
        session.position = position;
        let block = session.block;
        feedback(world, block, position, self.config.collision_threshold)
    }

    /// Drags the block by `delta`, sliding it up to obstacles instead of through them.
    ///
    /// Only the X and Z components are used. Returns the new position, or
    /// `None` while idle.
    pub fn drag_by(&mut self, world: &World, delta: Vec3) -> Option<Vec3> {
        let config = self.config;
        let session = self.session.as_mut()?;
        let probe = Probe {
            world,
            block: session.block,
            config,
        };

        let current = session.position;
        let desired = current + Vec3::new(delta.x, 0.0, delta.z);
        let distance = current.distance(desired);
        let cell_size = query::grid(world).spec().cell_size;

        let next = if distance > cell_size * config.fast_move_fraction {
            probe.stepped_move(current, desired, cell_size)
        } else {
            let horizontal = Vec3::new(desired.x, current.y, current.z);
            let horizontal = probe.reach(current, horizontal);
            let combined = Vec3::new(horizontal.x, current.y, desired.z);
            probe.reach(horizontal, combined)
        };

        session.position = next;
        Some(next)
    }

    /// Ends the drag by asking the world to move the block to the snapped position.
    ///
    /// Returns whether the world accepted the move. The controller is idle
    /// afterwards either way.
    pub fn commit(&mut self, world: &mut World, out_events: &mut Vec<Event>) -> bool {
        let Some(session) = self.session.take() else {
            warn!("commit received while idle");
            return false;
        };
        let anchor = query::grid(world).world_to_grid(session.position);
        let first_new = out_events.len();
        world::apply(
            world,
            Command::MoveBlock {
                block: session.block,
                anchor,
            },
            out_events,
        );
        out_events[first_new..].iter().any(|event| {
            matches!(event, Event::BlockMoved { block, .. } if *block == session.block)
        })
    }

    /// Abandons the drag without touching the world.
    pub fn cancel(&mut self) -> Option<BlockId> {
        self.session.take().map(|session| session.block)
    }

    /// World position of the anchor the most recent drag started from.
    #[must_use]
    pub fn revert_position(&self, world: &World, y: f32) -> Option<Vec3> {
        self.rollback
            .map(|anchor| query::grid(world).grid_to_world(anchor, y))
    }
}

struct Probe<'a> {
    world: &'a World,
    block: BlockId,
    config: DragConfig,
}

impl Probe<'_> {
    fn is_clear(&self, position: Vec3) -> bool {
        feedback(
            self.world,
            self.block,
            position,
            self.config.collision_threshold,
        )
        .is_some_and(|feedback| feedback.smoothed_valid)
    }

    fn stepped_move(&self, current: Vec3, desired: Vec3, cell_size: f32) -> Vec3 {
        let direction = (desired - current).normalize_or_zero();
        let step = cell_size * FAST_STEP_FRACTION;
        if !step.is_finite() || step <= 0.0 {
            return self.reach(current, desired);
        }
        let steps = (current.distance(desired) / step).ceil() as u32;

        let mut reached = current;
        for index in 1..=steps {
            let target = current + direction * step * index as f32;
            if self.is_clear(target) {
                reached = target;
            } else {
                return self.search(reached, target);
            }
        }
        reached
    }

    fn reach(&self, from: Vec3, to: Vec3) -> Vec3 {
        if self.is_clear(to) {
            to
        } else {
            self.search(from, to)
        }
    }

    /// Furthest clear point from `start` toward `end`, backed off by the threshold margin.
    fn search(&self, start: Vec3, end: Vec3) -> Vec3 {
        let threshold = self.config.collision_threshold;
        let direction = (end - start).normalize_or_zero();
        let distance = start.distance(end);

        let mut reached = start;
        let mut step = lerp(SEARCH_START_LOOSE, SEARCH_START_STRICT, threshold);
        for _ in 0..self.config.search_iterations {
            let candidate = reached + direction * step * distance;
            if self.is_clear(candidate) {
                reached = candidate;
            }
            step *= 0.5;
        }

        if threshold > THRESHOLD_PROBE_MINIMUM {
            let backoff = lerp(
                0.0,
                MAX_BOUNDARY_BACKOFF,
                (threshold - THRESHOLD_PROBE_MINIMUM) * 2.0,
            );
            reached -= direction * backoff * distance;
        }
        reached
    }
}

fn feedback(world: &World, block: BlockId, position: Vec3, threshold: f32) -> Option<DragFeedback> {
    let grid = query::grid(world);
    let exact = grid.exact_grid_position(position);
    let anchor = grid.world_to_grid(position);
    let cells = query::footprint_at(world, block, anchor)?;
    let valid = query::is_valid_placement(world, Some(block), &cells);
    let smoothed_valid = valid
        && threshold_probes(exact, threshold).into_iter().all(|offset| {
            query::footprint_at(world, block, anchor.offset_by(offset))
                .is_some_and(|shifted| query::is_valid_placement(world, Some(block), &shifted))
        });

    Some(DragFeedback {
        anchor,
        cells,
        valid,
        smoothed_valid,
    })
}

/// Neighbouring anchors to check when the exact position sits near a cell edge.
///
/// Only thresholds above one half probe. An axis qualifies when its distance
/// from the rounded cell exceeds `1 - threshold`; the diagonal is added when
/// both qualify.
fn threshold_probes(exact: (f32, f32), threshold: f32) -> Vec<CellOffset> {
    if threshold <= THRESHOLD_PROBE_MINIMUM {
        return Vec::new();
    }
    let margin = 1.0 - threshold;
    let lean = |value: f32| {
        let rounded = value.round();
        let side = if value > rounded { 1 } else { -1 };
        ((value - rounded).abs() > margin).then_some(side)
    };

    let mut probes = Vec::new();
    let (x, z) = (lean(exact.0), lean(exact.1));
    if let Some(dx) = x {
        probes.push(CellOffset::new(dx, 0));
    }
    if let Some(dz) = z {
        probes.push(CellOffset::new(0, dz));
    }
    if let (Some(dx), Some(dz)) = (x, z) {
        probes.push(CellOffset::new(dx, dz));
    }
    probes
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t.clamp(0.0, 1.0)
}
