//! Command tree files
//!
//! The root command is described at the top level of the file, the way a
//! `CommandSpec` serializes. `[[remote]]` tables attach an external program
//! as the suggestion source of a command.

use std::path::Path;

use anyhow::{Context, Result};
use commands::CommandSpec;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteSource {
    /// Command path, with or without the program name
    pub path: String,

    pub program: String,

    #[serde(default)]
    pub args: Vec<String>,

    /// Paths of commands completed from this source's cache
    #[serde(default)]
    pub children: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TreeFile {
    pub root: CommandSpec,
    pub remote: Vec<RemoteSource>,
}

impl TreeFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read command tree {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid command tree {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut table: toml::Table = toml::from_str(content)?;

        let remote = match table.remove("remote") {
            Some(value) => value.try_into().context("invalid [[remote]] entry")?,
            None => Vec::new(),
        };
        let root: CommandSpec = toml::Value::Table(table).try_into()?;

        Ok(Self { root, remote })
    }
}
