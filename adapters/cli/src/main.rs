#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for loading, sharing and replaying Gridlock levels.

mod level_file;
mod level_transfer;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gridlock_core::BlockPhase;
use gridlock_world::{query, World};
use log::info;

use crate::session::Session;

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Replay a drag script against a level
    Play {
        /// Level file in TOML format
        #[arg(long)]
        level: PathBuf,
        /// Script file in TOML format
        #[arg(long)]
        script: PathBuf,
    },
    /// Print the grid, gates and blocks of a level
    Inspect {
        /// Level file in TOML format
        #[arg(long)]
        level: PathBuf,
    },
    /// Encode a level as a transfer string
    Export {
        /// Level file in TOML format
        #[arg(long)]
        level: PathBuf,
        /// Print the built occupancy grid as JSON instead
        #[arg(long)]
        grid_data: bool,
    },
    /// Decode a transfer string and print the level as TOML
    Import {
        /// Transfer string produced by `export`
        value: String,
    },
}

/// Entry point for the Gridlock command-line interface.
fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Mode::Play { level, script } => {
            let definition = level_file::load(&level)?;
            let script = session::load_script(&script)?;
            info!("replaying {} steps", script.steps.len());
            let report = Session::start(&definition, script.drag)?.run(&script)?;

            for event in &report.events {
                println!("{event:?}");
            }
            println!("state: {:?}", report.state);
            print!("{}", query::grid(&report.world).debug_dump());
        }
        Mode::Inspect { level } => {
            let definition = level_file::load(&level)?;
            let world = World::from_level(&definition)
                .with_context(|| format!("level {} could not be built", level.display()))?;
            print_summary(&world);
        }
        Mode::Export { level, grid_data } => {
            let definition = level_file::load(&level)?;
            if grid_data {
                let world = World::from_level(&definition)
                    .with_context(|| format!("level {} could not be built", level.display()))?;
                let data = query::grid(&world).to_data();
                let json =
                    serde_json::to_string_pretty(&data).context("failed to encode grid data")?;
                println!("{json}");
            } else {
                let encoded =
                    level_transfer::encode(&definition).context("failed to encode level")?;
                println!("{encoded}");
            }
        }
        Mode::Import { value } => {
            let definition =
                level_transfer::decode(&value).context("failed to decode transfer string")?;
            print!("{}", level_file::render(&definition)?);
        }
    }

    Ok(())
}

fn print_summary(world: &World) {
    let grid = query::grid(world);
    let spec = grid.spec();
    println!(
        "grid {}x{} (cell size {}, origin {})",
        spec.width, spec.length, spec.cell_size, spec.origin
    );
    print!("{}", grid.debug_dump());

    for gate in query::gates(world).iter() {
        println!(
            "gate {} {:?}: {:?}",
            gate.id().get(),
            gate.color(),
            gate.cells()
        );
    }
    for block in query::block_view(world).iter() {
        let phase = match block.phase {
            BlockPhase::Resting => "resting",
            BlockPhase::Falling => "falling",
        };
        println!(
            "block {} {:?} at {:?} ({:?}, {phase}): {:?}",
            block.id.get(),
            block.color,
            block.anchor,
            block.rotation,
            block.cells
        );
    }

    let ready = query::block_view(world)
        .iter()
        .filter(|block| query::passable_gate(world, block.id).is_some())
        .count();
    if ready > 0 {
        println!("{ready} block(s) already sit on a matching gate");
    }
}
