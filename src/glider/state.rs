//! Glider state snapshots and control commands.

use std::fmt;

use serde::Deserialize;

/// Snapshot of the glider in the Earth frame.
///
/// `z` is the altitude (pointing up), `khi`, `gamma` and `sigma` form the
/// Euler sequence from the Earth frame to the velocity frame. Angles are in
/// radians, distances in meters and times in seconds.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct State {
    /// Position along the x-axis of the Earth frame.
    pub x: f64,
    /// Position along the y-axis of the Earth frame.
    pub y: f64,
    /// Altitude.
    pub z: f64,
    /// Ground speed.
    pub v: f64,
    /// Elevation angle.
    pub gamma: f64,
    /// Azimuth angle.
    pub khi: f64,
    /// Angle of attack.
    pub alpha: f64,
    /// Sideslip angle.
    pub beta: f64,
    /// Bank angle.
    pub sigma: f64,
    /// Time derivative of `x`.
    pub x_dot: f64,
    /// Time derivative of `y`.
    pub y_dot: f64,
    /// Climb rate.
    pub z_dot: f64,
    /// Time derivative of `v`.
    pub v_dot: f64,
    /// Time derivative of `gamma`.
    pub gamma_dot: f64,
    /// Time derivative of `khi`.
    pub khi_dot: f64,
    /// Simulation time.
    pub t: f64,
}

impl Default for State {
    /// Level flight at 100 m, 15 m/s, heading along the x-axis, close to
    /// trimmed angle of attack.
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 100.0,
            v: 15.0,
            gamma: 0.0,
            khi: 0.0,
            alpha: 0.1,
            beta: 0.0,
            sigma: 0.0,
            x_dot: 0.0,
            y_dot: 0.0,
            z_dot: 0.0,
            v_dot: 0.0,
            gamma_dot: 0.0,
            khi_dot: 0.0,
            t: 0.0,
        }
    }
}

impl State {
    /// Horizontal distance from the origin of the flight zone.
    #[must_use]
    pub fn distance_to_center(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Applies the angle increments of `command`.
    pub fn apply(&mut self, command: &Command) {
        self.alpha += command.d_alpha;
        self.beta += command.d_beta;
        self.sigma += command.d_sigma;
    }

    /// Header matching [`State::record`].
    pub const RECORD_HEADER: &'static str = "t,x,y,z,v,gamma,khi,alpha,beta,sigma";

    /// Comma-separated values of the logged quantities.
    #[must_use]
    pub fn record(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{}",
            self.t,
            self.x,
            self.y,
            self.z,
            self.v,
            self.gamma,
            self.khi,
            self.alpha,
            self.beta,
            self.sigma
        )
    }
}

/// Instantaneous increments applied to the control angles.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Command {
    /// Angle of attack increment.
    pub d_alpha: f64,
    /// Sideslip increment.
    pub d_beta: f64,
    /// Bank angle increment.
    pub d_sigma: f64,
}

impl Command {
    /// Changes only the bank angle.
    #[must_use]
    pub const fn bank(d_sigma: f64) -> Self {
        Self {
            d_alpha: 0.0,
            d_beta: 0.0,
            d_sigma,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dalpha {:+.4} dbeta {:+.4} dsigma {:+.4}",
            self.d_alpha, self.d_beta, self.d_sigma
        )
    }
}
