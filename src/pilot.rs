//! Pilots turn the current glider state into a command at every outer control
//! step.
//!
//! Each pilot has a nominal policy and an `out_of_range` policy that the
//! outer loop selects when the glider leaves the safe operating radius.

use rand::Rng;
use tracing::warn;

use crate::glider::{Command, GliderModel, State};
use crate::mcts::{Config, Planner};

/// Bank angle magnitude under which the fallback rule keeps turning.
pub const RECOVERY_BANK_THRESHOLD: f64 = 0.4;

/// Control policy of the glider.
pub trait Pilot {
    /// Command to apply in the safe operating envelope.
    fn command(&mut self, state: &State) -> Command;
    /// Command to apply outside of the safe operating radius.
    fn out_of_range(&mut self, state: &State) -> Command;
}

/// Deterministic rule steering the glider back toward the origin by turning.
///
/// Pitch and sideslip rates are zeroed. The bank angle is increased by the
/// angle rate magnitude as long as its magnitude is below the threshold and
/// held afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fallback {
    angle_rate_magnitude: f64,
    bank_threshold: f64,
}

impl Fallback {
    /// Turns with increments of `angle_rate_magnitude`.
    #[must_use]
    pub const fn new(angle_rate_magnitude: f64) -> Self {
        Self {
            angle_rate_magnitude,
            bank_threshold: RECOVERY_BANK_THRESHOLD,
        }
    }

    /// Recovery command at `state`.
    #[must_use]
    pub fn recover(&self, state: &State) -> Command {
        if state.sigma.abs() < self.bank_threshold {
            Command::bank(self.angle_rate_magnitude)
        } else {
            Command::bank(0.0)
        }
    }
}

/// Online UCT pilot: builds a search tree at every step.
pub struct UctPilot<R: Rng> {
    planner: Planner<GliderModel, R>,
    fallback: Fallback,
}

impl<R: Rng> UctPilot<R> {
    /// Plans over `model`, drawing from `rng`.
    #[must_use]
    pub fn new(model: GliderModel, config: Config, rng: R) -> Self {
        let fallback = Fallback::new(config.angle_rate_magnitude);
        Self {
            planner: Planner::new(model, config, rng),
            fallback,
        }
    }

    /// Runs the planner. `None` if no action could be extracted.
    pub fn plan(&mut self, state: &State) -> Option<Command> {
        self.planner.plan(state)
    }

    /// Fallback command, bypassing the search.
    #[must_use]
    pub fn recover(&self, state: &State) -> Command {
        self.fallback.recover(state)
    }
}

impl<R: Rng> Pilot for UctPilot<R> {
    fn command(&mut self, state: &State) -> Command {
        self.plan(state).unwrap_or_else(|| {
            warn!(t = state.t, z = state.z, "planner produced no action, recovering");
            self.recover(state)
        })
    }

    fn out_of_range(&mut self, state: &State) -> Command {
        self.recover(state)
    }
}

/// Hand-tuned pilot: a derivative controller on the elevation rate and
/// bang-bang bank levelling.
///
/// Inside the deadband around wings level the last bank command is kept.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeuristicPilot {
    angle_rate_magnitude: f64,
    /// Derivative gain, highly dependent on the glider configuration.
    kd: f64,
    /// Last bank increment.
    d_sigma: f64,
    fallback: Fallback,
}

impl HeuristicPilot {
    /// Levels the wings with increments of `angle_rate_magnitude`.
    #[must_use]
    pub const fn new(angle_rate_magnitude: f64) -> Self {
        Self {
            angle_rate_magnitude,
            kd: 1e-2,
            d_sigma: 0.0,
            fallback: Fallback::new(angle_rate_magnitude),
        }
    }
}

impl Pilot for HeuristicPilot {
    fn command(&mut self, state: &State) -> Command {
        let threshold = 0.5 * self.angle_rate_magnitude;
        if state.sigma > threshold {
            self.d_sigma = -self.angle_rate_magnitude;
        } else if state.sigma < -threshold {
            self.d_sigma = self.angle_rate_magnitude;
        }
        Command {
            d_alpha: -self.kd * state.gamma_dot,
            d_beta: 0.0,
            d_sigma: self.d_sigma,
        }
    }

    fn out_of_range(&mut self, state: &State) -> Command {
        self.fallback.recover(state)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::glider::{GliderConfig, Zone};

    fn banked(sigma: f64) -> State {
        State {
            sigma,
            ..State::default()
        }
    }

    #[test]
    fn fallback_turns_until_threshold() {
        let fallback = Fallback::new(0.01);
        assert_eq!(fallback.recover(&banked(0.3)), Command::bank(0.01));
        assert_eq!(fallback.recover(&banked(-0.3)), Command::bank(0.01));
        assert_eq!(fallback.recover(&banked(0.5)), Command::bank(0.0));
        assert_eq!(fallback.recover(&banked(-0.5)), Command::bank(0.0));
    }

    #[test]
    fn heuristic_levels_wings() {
        let mut pilot = HeuristicPilot::new(0.03);
        assert!(HeuristicPilot::new(0.03).command(&banked(0.01)).d_sigma.abs() < 1e-12);
        assert!(pilot.command(&banked(0.1)).d_sigma < 0.0);
        assert!(pilot.command(&banked(-0.1)).d_sigma > 0.0);
        let climbing = State {
            gamma_dot: 0.5,
            ..State::default()
        };
        assert!(pilot.command(&climbing).d_alpha < 0.0);
        assert_eq!(pilot.out_of_range(&banked(0.0)), Command::bank(0.03));
    }

    #[test]
    fn heuristic_holds_bank_in_deadband() {
        let mut pilot = HeuristicPilot::new(0.03);
        assert_eq!(pilot.command(&banked(0.1)), Command::bank(-0.03));
        assert_eq!(pilot.command(&banked(0.01)), Command::bank(-0.03));
        assert_eq!(pilot.command(&banked(-0.1)), Command::bank(0.03));
        assert_eq!(pilot.command(&banked(-0.01)), Command::bank(0.03));
    }

    #[test]
    fn uct_pilot_picks_an_action() {
        let config = Config::with_budget(30);
        let model = GliderModel::new(&GliderConfig::default(), Zone::default(), 0.01);
        let actions = [Command::bank(0.01), Command::bank(0.0), Command::bank(-0.01)];
        let mut pilot = UctPilot::new(model, config, ChaCha8Rng::seed_from_u64(3));
        let command = pilot.command(&State::default());
        assert!(actions.contains(&command));
    }

    #[test]
    fn uct_pilot_recovers_below_ground() {
        let model = GliderModel::new(&GliderConfig::default(), Zone::default(), 0.01);
        let mut pilot = UctPilot::new(model, Config::with_budget(5), ChaCha8Rng::seed_from_u64(3));
        let crashed = State {
            z: -1.0,
            ..State::default()
        };
        assert_eq!(pilot.plan(&crashed), None);
        assert_eq!(pilot.command(&crashed), Command::bank(0.01));
        assert_eq!(pilot.out_of_range(&banked(0.5)), Command::bank(0.0));
    }
}
