use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use glam::Vec3;
use gridlock_core::{BlockId, Command, Event, LevelState};
use gridlock_system_gate_pulls::GatePulls;
use gridlock_system_placement::{DragConfig, PlacementController};
use gridlock_world::{self as world, query, LevelDefinition, World};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

/// Scripted pointer input replayed against a level.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Script {
    /// Drag tunables used by the placement controller.
    #[serde(default)]
    pub(crate) drag: DragConfig,
    /// Input steps in playback order.
    #[serde(default)]
    pub(crate) steps: Vec<Step>,
}

/// Single pointer action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub(crate) enum Step {
    /// Picks up a block.
    Grab {
        /// Identifier of the block.
        block: u32,
    },
    /// Teleports the held block to a world position.
    MoveTo {
        /// World X coordinate.
        x: f32,
        /// World Z coordinate.
        z: f32,
    },
    /// Drags the held block by a world offset.
    DragBy {
        /// Offset along X.
        dx: f32,
        /// Offset along Z.
        dz: f32,
    },
    /// Drops the held block.
    Release,
    /// Abandons the drag.
    Cancel,
    /// Gives up on the level.
    Fail,
}

/// Reads a script from a TOML file.
pub(crate) fn load_script(path: &Path) -> Result<Script> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("failed to parse script {}", path.display()))
}

/// Outcome of a replayed script.
#[derive(Debug)]
pub(crate) struct Report {
    /// Level state once the script finished.
    pub(crate) state: LevelState,
    /// Every event the world emitted after the level started.
    pub(crate) events: Vec<Event>,
    /// Final world, kept for inspection.
    pub(crate) world: World,
}

/// Drives a world through scripted drags, routing pulls and removals.
#[derive(Debug)]
pub(crate) struct Session {
    world: World,
    controller: PlacementController,
    gate_pulls: GatePulls,
    events: Vec<Event>,
}

impl Session {
    /// Builds the level and starts it.
    pub(crate) fn start(level: &LevelDefinition, drag: DragConfig) -> Result<Self> {
        let world = World::from_level(level).context("level could not be built")?;
        let mut session = Self {
            world,
            controller: PlacementController::new(drag),
            gate_pulls: GatePulls::new(),
            events: Vec::new(),
        };
        let mut events = Vec::new();
        world::apply(&mut session.world, Command::StartLevel, &mut events);
        if query::level_state(&session.world) == LevelState::Setup {
            bail!("level refused to start");
        }
        session.pump(events);
        Ok(session)
    }

    /// Applies one scripted step.
    pub(crate) fn step(&mut self, step: &Step) -> Result<()> {
        let mut events = Vec::new();
        match *step {
            Step::Grab { block } => {
                if !self.controller.begin_move(&self.world, BlockId::new(block)) {
                    bail!("block {block} cannot be grabbed");
                }
            }
            Step::MoveTo { x, z } => {
                let y = self.held_height()?;
                let Some(feedback) =
                    self.controller
                        .update_position(&self.world, Vec3::new(x, y, z))
                else {
                    bail!("move_to requires a grabbed block");
                };
                debug!(
                    "hovering over {:?}, valid: {}",
                    feedback.anchor, feedback.smoothed_valid
                );
            }
            Step::DragBy { dx, dz } => {
                let Some(position) = self
                    .controller
                    .drag_by(&self.world, Vec3::new(dx, 0.0, dz))
                else {
                    bail!("drag_by requires a grabbed block");
                };
                debug!("dragged to {position}");
            }
            Step::Release => {
                let y = self.held_height()?;
                if !self.controller.commit(&mut self.world, &mut events) {
                    if let Some(position) = self.controller.revert_position(&self.world, y) {
                        info!("move rejected, block returns to {position}");
                    }
                }
            }
            Step::Cancel => {
                if self.controller.cancel().is_none() {
                    warn!("cancel received while idle");
                }
            }
            Step::Fail => world::apply(&mut self.world, Command::FailLevel, &mut events),
        }
        self.pump(events);
        Ok(())
    }

    /// Replays every step of a script and reports the outcome.
    pub(crate) fn run(mut self, script: &Script) -> Result<Report> {
        for (index, step) in script.steps.iter().enumerate() {
            self.step(step)
                .with_context(|| format!("script step {index} failed"))?;
        }
        Ok(self.finish())
    }

    /// Stops the session.
    pub(crate) fn finish(self) -> Report {
        Report {
            state: query::level_state(&self.world),
            events: self.events,
            world: self.world,
        }
    }

    fn held_height(&self) -> Result<f32> {
        match self.controller.position() {
            Some(position) => Ok(position.y),
            None => bail!("no block is grabbed"),
        }
    }

    // Falls finish immediately since there is no animation to wait for.
    fn pump(&mut self, mut pending: Vec<Event>) {
        while !pending.is_empty() {
            let mut commands = Vec::new();
            let view = query::block_view(&self.world);
            let world_ref = &self.world;
            self.gate_pulls.handle(
                &pending,
                &view,
                |block| query::passable_gate(world_ref, block),
                &mut commands,
            );
            for event in &pending {
                if let Event::BlockPulledThroughGate { block, .. } = event {
                    commands.push(Command::CompleteRemoval { block: *block });
                }
            }

            let mut next = Vec::new();
            for command in commands {
                world::apply(&mut self.world, command, &mut next);
            }
            self.events.append(&mut pending);
            pending = next;
        }
    }
}
