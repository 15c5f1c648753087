//! The glider seen through the planning interface.

use arrayvec::ArrayVec;

use super::aircraft::{Glider, GliderConfig, GRAVITY};
use super::state::{Command, State};
use super::stepper;
use super::zone::Zone;
use crate::environment::{Model, TimeStep};

/// Glider flying through a zone, seen as a planning model.
///
/// The action set increases, holds or decreases the bank angle by a fixed
/// magnitude.
#[derive(Clone, Debug)]
pub struct GliderModel {
    glider: Glider,
    zone: Zone,
    actions: ArrayVec<Command, 3>,
}

impl GliderModel {
    /// Builds the model with bank actions of `angle_rate_magnitude`.
    #[must_use]
    pub fn new(config: &GliderConfig, zone: Zone, angle_rate_magnitude: f64) -> Self {
        Self {
            glider: Glider::new(config),
            zone,
            actions: ArrayVec::from([
                Command::bank(angle_rate_magnitude),
                Command::bank(0.0),
                Command::bank(-angle_rate_magnitude),
            ]),
        }
    }

    /// Aircraft used by the transitions.
    #[must_use]
    pub const fn glider(&self) -> &Glider {
        &self.glider
    }

    /// Wind field used by the transitions.
    #[must_use]
    pub const fn zone(&self) -> &Zone {
        &self.zone
    }
}

impl Model for GliderModel {
    type Action = Command;
    type State = State;

    fn actions(&self) -> &[Command] {
        &self.actions
    }

    fn transition(&self, state: &State, action: &Command, step: TimeStep) -> State {
        stepper::transition(&self.glider, &self.zone, state, action, step)
    }

    /// Rate of change of the specific total energy: climb rate plus the
    /// kinetic energy rate normalized by gravity, both taken at `state`.
    fn reward(&self, state: &State, _action: &Command, _next: &State) -> f64 {
        state.v.mul_add(state.v_dot / GRAVITY, state.z_dot)
    }

    fn is_terminal(&self, state: &State) -> bool {
        state.z < 0.0
    }

    fn distance(&self, state: &State) -> f64 {
        state.distance_to_center()
    }
}
