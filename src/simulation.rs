//! Outer control loop: at every step the pilot picks a command, the
//! trajectory is logged and the glider is advanced by the stepper.

use std::fmt;
use std::io::Write;

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::environment::{Model, TimeStep};
use crate::glider::{GliderModel, State, Violation};
use crate::pilot::Pilot;

/// Parameters of the outer control loop.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Maximum number of outer control steps.
    pub steps: u32,
    /// Distance from the origin beyond which the pilot recovers instead of
    /// planning.
    pub safety_radius: f64,
    /// Simulated time between two control decisions.
    pub time_step: f64,
    /// Integration sub-step of the outer loop.
    pub sub_time_step: f64,
    /// State of the glider at launch.
    pub initial: State,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            steps: 1000,
            safety_radius: 1200.0,
            time_step: 0.1,
            sub_time_step: 0.01,
            initial: State::default(),
        }
    }
}

/// Which policy produced the command of a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// The pilot's own policy.
    Nominal,
    /// The out of range policy.
    Recovery,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nominal => "nominal",
            Self::Recovery => "recovery",
        })
    }
}

/// Why the simulation ended.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    /// All steps were flown.
    Completed,
    /// The glider reached the ground.
    Landed,
    /// The glider left the validity domain of the model.
    OutOfModel(Violation),
}

/// Result of a simulation run.
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// Control steps flown.
    pub steps: u32,
    /// Steps flown with the out of range policy.
    pub recoveries: u32,
    /// Final state.
    pub state: State,
    /// Why the run ended.
    pub outcome: Outcome,
}

/// Flies a glider model with a pilot.
pub struct Simulation {
    model: GliderModel,
    config: SimulationConfig,
}

impl Simulation {
    /// Flies `model` as set up by `config`.
    #[must_use]
    pub const fn new(model: GliderModel, config: SimulationConfig) -> Self {
        Self { model, config }
    }

    const fn step(&self) -> TimeStep {
        TimeStep {
            width: self.config.time_step,
            sub_width: self.config.sub_time_step,
        }
    }

    /// Runs the control loop and writes one CSV trajectory row per step to
    /// `output`.
    ///
    /// # Errors
    ///
    /// Fails if the trajectory can not be written.
    pub fn run(&self, pilot: &mut impl Pilot, output: &mut impl Write) -> anyhow::Result<Summary> {
        writeln!(output, "{},mode", State::RECORD_HEADER)
            .context("failed to write trajectory header")?;

        let mut state = self.config.initial;
        let mut recoveries = 0;
        let mut steps = 0;
        let mut outcome = Outcome::Completed;
        info!(
            steps = self.config.steps,
            radius = self.config.safety_radius,
            "simulation started"
        );

        while steps < self.config.steps {
            let (command, mode) = if self.model.distance(&state) > self.config.safety_radius {
                recoveries += 1;
                (pilot.out_of_range(&state), Mode::Recovery)
            } else {
                (pilot.command(&state), Mode::Nominal)
            };
            writeln!(output, "{},{mode}", state.record())
                .context("failed to write trajectory row")?;
            debug!(t = state.t, %command, %mode, "control step");

            state = self.model.transition(&state, &command, self.step());
            steps += 1;

            if self.model.is_terminal(&state) {
                outcome = Outcome::Landed;
                break;
            }
            if let Err(violation) = self.model.glider().validate(&state) {
                warn!(t = state.t, %violation, "glider left the model validity domain");
                outcome = Outcome::OutOfModel(violation);
                break;
            }
            if steps % 100 == 0 {
                info!(
                    t = state.t,
                    x = state.x,
                    y = state.y,
                    z = state.z,
                    v = state.v,
                    recoveries,
                    "progress"
                );
            }
        }

        writeln!(output, "{},end", state.record()).context("failed to write trajectory row")?;
        output.flush().context("failed to flush trajectory")?;
        info!(steps, recoveries, outcome = ?outcome, z = state.z, "simulation finished");

        Ok(Summary {
            steps,
            recoveries,
            state,
            outcome,
        })
    }
}
