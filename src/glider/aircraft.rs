//! Point-mass flight dynamics of a small glider after Beeler, Moerder and Cox,
//! "A Flight Dynamics Model for a Small Glider in Ambient Winds"
//! (NASA/TM-2003-212665).
//!
//! The model is valid for wingspans in `[1.52, 3.55]` m, aspect ratios in
//! `[6, 16]` and masses in `[0.23, 5.44]` kg. The wind enters through the
//! air-relative speed and through the angle of attack, which grows by the
//! difference between the ground and the air-relative elevation angles.
//! Sideslip is taken relative to the body.

use std::f64::consts::PI;

use serde::Deserialize;
use thiserror::Error;

use super::state::State;
use super::zone::Zone;

/// Standard gravity.
pub const GRAVITY: f64 = 9.81;
/// Air density at sea level.
const AIR_DENSITY: f64 = 1.225;
/// Oswald efficiency number.
const OSWALD: f64 = 0.95;
const CD0: f64 = 0.01;
const CDL: f64 = 0.05;
const CL_MIN: f64 = 0.4;

/// Geometry of the glider.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GliderConfig {
    /// Mass in kg.
    pub mass: f64,
    /// Wing span in m.
    pub wingspan: f64,
    /// Wingspan squared over wing surface.
    pub aspect_ratio: f64,
    /// Largest admissible magnitude of the elevation and inclination angles.
    pub max_angle_magnitude: f64,
}

impl Default for GliderConfig {
    fn default() -> Self {
        Self {
            mass: 1.36,
            wingspan: 1.524,
            aspect_ratio: 16.0,
            max_angle_magnitude: PI / 4.0,
        }
    }
}

/// The state left the domain in which the model is meaningful.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum Violation {
    /// Altitude below ground.
    #[error("altitude z = {0:.3} m is below ground")]
    Altitude(f64),
    /// Elevation angle and the admissible magnitude.
    #[error("elevation angle gamma = {0:.3} rad exceeds {1:.3} rad")]
    Elevation(f64, f64),
    /// Inclination angle and the admissible magnitude.
    #[error("inclination angle gamma + alpha = {0:.3} rad exceeds {1:.3} rad")]
    Inclination(f64, f64),
}

/// Aerodynamic forces in the velocity frame, in newtons.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Forces {
    /// Normal to the air-relative velocity, in the symmetry plane.
    pub lift: f64,
    /// Opposed to the air-relative velocity.
    pub drag: f64,
    /// Lateral force from the sideslip.
    pub sideforce: f64,
}

/// Beeler glider with its derived aerodynamic coefficients.
#[derive(Clone, Debug)]
pub struct Glider {
    mass: f64,
    aspect_ratio: f64,
    max_angle_magnitude: f64,
    /// Wing surface.
    surface: f64,
    /// Vertical tail surface.
    tail_surface: f64,
    cl_alpha: f64,
    cc_beta: f64,
    alpha0: f64,
}

impl Glider {
    /// Derives the aerodynamic coefficients from the geometry.
    #[must_use]
    pub fn new(config: &GliderConfig) -> Self {
        let wingspan = config.wingspan;
        let aspect_ratio = config.aspect_ratio;
        let tail_aspect_ratio = 0.5 * aspect_ratio;
        let moment_arm = 0.28 * wingspan;
        let tail_volume = 0.02;
        let surface = wingspan * wingspan / aspect_ratio;
        let tail_surface = tail_volume * wingspan * surface / moment_arm;
        // Lift curve slope of 0.1 per degree.
        let a0 = 0.1 * (180.0 / PI);
        let cl_alpha = a0 / (1.0 + a0 / (PI * OSWALD * aspect_ratio));
        let cc_beta =
            (a0 / (1.0 + a0 / (PI * OSWALD * tail_aspect_ratio))) * (tail_surface / surface);
        Self {
            mass: config.mass,
            aspect_ratio,
            max_angle_magnitude: config.max_angle_magnitude,
            surface,
            tail_surface,
            cl_alpha,
            cc_beta,
            alpha0: (-2.5f64).to_radians(),
        }
    }

    /// Lift, drag and side force for `state` flying through `zone`.
    #[must_use]
    pub fn forces(&self, zone: &Zone, state: &State) -> Forces {
        let wind = zone.wind(state.x, state.y, state.z, state.t);
        let (sin_gamma, cos_gamma) = state.gamma.sin_cos();
        let (sin_khi, cos_khi) = state.khi.sin_cos();
        let air = [
            (state.v * cos_gamma).mul_add(cos_khi, -wind[0]),
            (state.v * cos_gamma).mul_add(sin_khi, -wind[1]),
            state.v.mul_add(sin_gamma, -wind[2]),
        ];
        let airspeed = air[0].hypot(air[1]).hypot(air[2]);
        let airspeed_squared = airspeed * airspeed;
        let pressure = 0.5 * AIR_DENSITY * airspeed_squared * self.surface;
        let gamma_air = if airspeed > 0.0 {
            (air[2] / airspeed).clamp(-1.0, 1.0).asin()
        } else {
            state.gamma
        };
        let alpha = state.alpha + state.gamma - gamma_air;

        let induced = PI * OSWALD * self.aspect_ratio;
        let cc = self.cc_beta * state.beta;
        let cl = self.cl_alpha * (alpha - self.alpha0);
        let cd = (cc * cc / induced).mul_add(
            self.surface / self.tail_surface,
            cl.mul_add(cl / induced, CDL.mul_add((cl - CL_MIN).powi(2), CD0)),
        );

        Forces {
            lift: pressure * cl,
            drag: pressure * cd,
            sideforce: pressure * cc,
        }
    }

    /// Fills in the time derivatives of `state`.
    pub fn update_derivatives(&self, zone: &Zone, state: &mut State) {
        let Forces {
            lift,
            drag,
            sideforce,
        } = self.forces(zone, state);
        let v = state.v;
        let (sin_gamma, cos_gamma) = state.gamma.sin_cos();
        let (sin_khi, cos_khi) = state.khi.sin_cos();
        let (sin_sigma, cos_sigma) = state.sigma.sin_cos();

        state.x_dot = v * cos_gamma * cos_khi;
        state.y_dot = v * cos_gamma * sin_khi;
        state.z_dot = v * sin_gamma;
        state.v_dot = (-GRAVITY).mul_add(sin_gamma, -drag / self.mass);
        state.gamma_dot = GRAVITY.mul_add(
            -cos_gamma,
            lift.mul_add(cos_sigma, sideforce * sin_sigma) / self.mass,
        ) / v;
        state.khi_dot =
            lift.mul_add(sin_sigma, -sideforce * cos_sigma) / (self.mass * v * cos_gamma);
    }

    /// Checks that `state` is within the validity domain of the model.
    ///
    /// # Errors
    ///
    /// Returns the first violated bound.
    pub fn validate(&self, state: &State) -> Result<(), Violation> {
        let limit = self.max_angle_magnitude;
        let inclination = state.alpha + state.gamma;
        if state.z < 0.0 {
            return Err(Violation::Altitude(state.z));
        }
        if state.gamma.abs() > limit {
            return Err(Violation::Elevation(state.gamma, limit));
        }
        if inclination.abs() > limit {
            return Err(Violation::Inclination(inclination, limit));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glider::zone::{FlatZone, ThermalZone};

    fn glider() -> Glider {
        Glider::new(&GliderConfig::default())
    }

    #[test]
    fn forces_in_still_air() {
        let forces = glider().forces(&Zone::Flat(FlatZone::default()), &State::default());
        // Close to the weight of the glider at the default angle of attack.
        assert!(forces.lift > 10.0 && forces.lift < 20.0, "{forces:?}");
        assert!(forces.drag > 0.0 && forces.drag < 1.0, "{forces:?}");
        assert!(forces.sideforce.abs() < 1e-12);
    }

    #[test]
    fn tailwind_reduces_lift() {
        let still = glider().forces(&Zone::Flat(FlatZone::default()), &State::default());
        let tailwind = glider().forces(
            &Zone::Flat(FlatZone {
                wind_x: 5.0,
                wind_y: 0.0,
            }),
            &State::default(),
        );
        assert!(tailwind.lift < still.lift);
    }

    #[test]
    fn updraft_increases_lift() {
        let state = State {
            x: 100.0,
            ..State::default()
        };
        let still = glider().forces(&Zone::Flat(FlatZone::default()), &state);
        let thermal = glider().forces(&Zone::Thermal(ThermalZone::default()), &state);
        assert!(thermal.lift > still.lift);
    }

    #[test]
    fn level_flight_derivatives() {
        let mut state = State::default();
        glider().update_derivatives(&Zone::Flat(FlatZone::default()), &mut state);
        assert!((state.x_dot - 15.0).abs() < 1e-12);
        assert!(state.y_dot.abs() < 1e-12);
        assert!(state.z_dot.abs() < 1e-12);
        // Drag slows the glider down.
        assert!(state.v_dot < 0.0);
        assert!(state.khi_dot.abs() < 1e-12);
    }

    #[test]
    fn banking_turns() {
        let mut state = State {
            sigma: 0.3,
            ..State::default()
        };
        glider().update_derivatives(&Zone::Flat(FlatZone::default()), &mut state);
        assert!(state.khi_dot > 0.0);
    }

    #[test]
    fn validity() {
        let glider = glider();
        assert_eq!(glider.validate(&State::default()), Ok(()));
        assert!(matches!(
            glider.validate(&State {
                z: -1.0,
                ..State::default()
            }),
            Err(Violation::Altitude(_))
        ));
        assert!(matches!(
            glider.validate(&State {
                gamma: -1.0,
                ..State::default()
            }),
            Err(Violation::Elevation(..))
        ));
        assert!(matches!(
            glider.validate(&State {
                gamma: 0.7,
                alpha: 0.2,
                ..State::default()
            }),
            Err(Violation::Inclination(..))
        ));
    }
}
