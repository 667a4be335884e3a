//! Run configuration: directories and per-solver timeouts, optionally
//! overridden by a `bridge_cruncher.toml` next to the binary's working
//! directory.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;

use crate::SolverKind;

pub const CONFIG_FILE: &str = "bridge_cruncher.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub visual_dir: PathBuf,
    pub timeouts: Timeouts,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            input_dir: PathBuf::from("Inputs"),
            output_dir: PathBuf::from("Outputs"),
            visual_dir: PathBuf::from("visualize"),
            timeouts: Timeouts::default(),
        }
    }
}

impl Config {
    /// Loads the config file if present, defaults otherwise.
    pub fn load() -> anyhow::Result<Config> {
        let path = Path::new(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {CONFIG_FILE}"))?;
        toml::from_str(&text).with_context(|| format!("failed to parse {CONFIG_FILE}"))
    }
}

/// Per-solver wall-clock budgets, in seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timeouts {
    pub pysat: u64,
    pub astar: u64,
    pub backtracking: u64,
    pub bruteforce: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts { pysat: 30, astar: 30, backtracking: 30, bruteforce: 60 }
    }
}

impl Timeouts {
    pub fn budget(&self, kind: SolverKind) -> Duration {
        let seconds = match kind {
            SolverKind::Cdcl => self.pysat,
            SolverKind::AStar => self.astar,
            SolverKind::Backtracking => self.backtracking,
            SolverKind::BruteForce => self.bruteforce,
        };
        Duration::from_secs(seconds)
    }
}
