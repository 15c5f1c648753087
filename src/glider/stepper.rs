//! Explicit Euler integration of the glider dynamics.

use super::aircraft::Glider;
use super::state::{Command, State};
use super::zone::Zone;
use crate::environment::TimeStep;

/// Applies `command` to `state` and integrates the dynamics over
/// `step.width` seconds in sub-steps of `step.sub_width`.
///
/// The derivatives stored in the returned state are the ones used for the
/// last sub-step.
#[must_use]
pub fn transition(
    glider: &Glider,
    zone: &Zone,
    state: &State,
    command: &Command,
    step: TimeStep,
) -> State {
    let mut next = *state;
    next.apply(command);
    let dt = step.sub_width;
    for _ in 0..step.substeps() {
        glider.update_derivatives(zone, &mut next);
        next.x = next.x_dot.mul_add(dt, next.x);
        next.y = next.y_dot.mul_add(dt, next.y);
        next.z = next.z_dot.mul_add(dt, next.z);
        next.v = next.v_dot.mul_add(dt, next.v);
        next.gamma = next.gamma_dot.mul_add(dt, next.gamma);
        next.khi = next.khi_dot.mul_add(dt, next.khi);
        next.t += dt;
    }
    next
}
