#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that pulls blocks through matching gates once a placement lands.

use gridlock_core::{BlockId, BlockPhase, BlockView, Command, Event, GateId, LevelState};
use log::debug;

/// Gate re-check run after every successful placement.
#[derive(Debug, Clone)]
pub struct GatePulls {
    level: LevelState,
}

impl Default for GatePulls {
    fn default() -> Self {
        Self::new()
    }
}

impl GatePulls {
    /// Creates a new gate pull system that waits for the level to start.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            level: LevelState::Setup,
        }
    }

    /// Consumes world events and re-checks every resting block after a placement.
    ///
    /// Any `BlockMoved` event triggers the check, so blocks that were already
    /// lying on a matching gate fall as soon as another block lands. The
    /// `passable_gate` closure should mirror the semantics of the world's
    /// `query::passable_gate` helper. Commands are emitted in block identifier
    /// order, once per block.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        blocks: &BlockView,
        mut passable_gate: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(BlockId) -> Option<GateId>,
    {
        let mut placed = false;
        for event in events {
            match event {
                Event::LevelStarted { .. } => self.level = LevelState::InProgress,
                Event::LevelCompleted => self.level = LevelState::Completed,
                Event::LevelFailed => self.level = LevelState::Failed,
                Event::GridConfigured { .. } => self.level = LevelState::Setup,
                Event::BlockMoved { .. } => placed = true,
                _ => {}
            }
        }

        if !placed || self.level != LevelState::InProgress {
            return;
        }

        for snapshot in blocks.iter() {
            if snapshot.phase != BlockPhase::Resting {
                continue;
            }
            if let Some(gate) = passable_gate(snapshot.id) {
                debug!("block {} fits gate {}", snapshot.id.get(), gate.get());
                out.push(Command::PullThroughGate { block: snapshot.id });
            }
        }
    }
}
