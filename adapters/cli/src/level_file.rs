use std::{fs, path::Path};

use anyhow::{Context, Result};
use gridlock_world::LevelDefinition;

/// Reads a level definition from a TOML file.
pub(crate) fn load(path: &Path) -> Result<LevelDefinition> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read level file {}", path.display()))?;
    parse(&contents).with_context(|| format!("failed to load level {}", path.display()))
}

/// Parses a level definition from TOML text.
pub(crate) fn parse(contents: &str) -> Result<LevelDefinition> {
    toml::from_str(contents).context("failed to parse level toml contents")
}

/// Renders a level definition as TOML text.
pub(crate) fn render(level: &LevelDefinition) -> Result<String> {
    toml::to_string_pretty(level).context("failed to render level as toml")
}
