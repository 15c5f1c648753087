//! Program settings, read from a TOML file. Every section and every field is
//! optional and falls back to its default.
//!
//! ```toml
//! [planner]
//! budget = 200
//! discount = 0.95
//!
//! [zone]
//! kind = "thermal"
//! strength = 2.0
//!
//! [simulation]
//! steps = 500
//! initial = { z = 150.0 }
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::glider::{GliderConfig, Zone};
use crate::mcts;
use crate::simulation::SimulationConfig;

/// Everything needed to fly one simulation.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Search parameters of the UCT pilot.
    pub planner: mcts::Config,
    /// Glider geometry.
    pub glider: GliderConfig,
    /// Wind field.
    pub zone: Zone,
    /// Outer control loop.
    pub simulation: SimulationConfig,
}

impl Settings {
    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Fails if the file can not be read or parsed.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("invalid settings in {}", path.display()))
    }

    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML, unknown keys or mistyped values.
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Checks that the settings can be used to run a simulation.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.planner
            .validate()
            .context("invalid planner configuration")?;
        anyhow::ensure!(
            self.simulation.safety_radius > 0.0,
            "safety radius must be positive, got {}",
            self.simulation.safety_radius
        );
        anyhow::ensure!(
            self.simulation.sub_time_step > 0.0
                && self.simulation.sub_time_step <= self.simulation.time_step,
            "simulation sub-step must be in (0, time step]"
        );
        anyhow::ensure!(
            self.glider.mass > 0.0 && self.glider.wingspan > 0.0 && self.glider.aspect_ratio > 0.0,
            "glider mass, wingspan and aspect ratio must be positive"
        );
        Ok(())
    }
}
