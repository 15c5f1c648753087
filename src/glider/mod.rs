//! Glider and atmosphere simulation used as the planning model.
//!
//! This is a compact reference implementation of the dynamics, not a
//! high-fidelity simulator: it is good enough to exercise the planner end
//! to end and to fly the glider from the command line.

pub mod aircraft;
pub mod model;
pub mod state;
pub mod stepper;
pub mod zone;

pub use aircraft::{Glider, GliderConfig, Violation};
pub use model::GliderModel;
pub use state::{Command, State};
pub use zone::{FlatZone, ThermalZone, Zone};
