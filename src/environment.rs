//! Interface for the simulation model to abstract the glider dynamics from
//! the planner.
//!
//! The planner never looks inside a state or an action: everything it needs
//! to know about the world goes through [`Model`].

use std::fmt::Debug;

/// Outer and inner step widths of a single transition, in seconds of
/// simulated time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeStep {
    /// Simulated time covered by one transition.
    pub width: f64,
    /// Width of the integration sub-steps inside one transition.
    pub sub_width: f64,
}

impl TimeStep {
    /// Number of integration sub-steps needed to cover `width`.
    #[must_use]
    pub fn substeps(&self) -> usize {
        let count = (self.width / self.sub_width).ceil();
        if count.is_finite() && count > 0.0 {
            // Non-negative and finite, truncation is intended.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let count = count as usize;
            count
        } else {
            0
        }
    }
}

impl Default for TimeStep {
    fn default() -> Self {
        Self {
            width: 0.1,
            sub_width: 0.1,
        }
    }
}

/// Transition, reward and termination model of the controlled system.
///
/// States are value snapshots: the planner clones them into the nodes of its
/// tree and never aliases them. Actions are a small fixed discrete set
/// compared by equality.
pub trait Model {
    /// Snapshot of the simulated system.
    type State: Clone + Debug;
    /// Discrete control action.
    type Action: Copy + PartialEq + Debug;

    /// The fixed, ordered set of candidate actions.
    fn actions(&self) -> &[Self::Action];

    /// Applies `action` to `state` and advances the system by `step`.
    fn transition(&self, state: &Self::State, action: &Self::Action, step: TimeStep)
        -> Self::State;

    /// Immediate reward of moving from `state` to `next` with `action`.
    fn reward(&self, state: &Self::State, action: &Self::Action, next: &Self::State) -> f64;

    /// Whether the simulation stops at `state`.
    fn is_terminal(&self, state: &Self::State) -> bool;

    /// Planar distance of `state` from the reference origin.
    fn distance(&self, state: &Self::State) -> f64;
}
