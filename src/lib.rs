//! Online Monte Carlo Tree Search planner for autonomous thermal soaring.
//!
//! At every control step the [`pilot::UctPilot`] grows a fresh UCT search
//! tree from the current glider state through a generative [`mcts::Planner`]
//! and returns the most valuable first command. The [`glider`] module
//! provides the reference glider and atmosphere model the planner flies with
//! and [`simulation`] drives the outer control loop.

pub mod config;
pub mod environment;
pub mod glider;
pub mod mcts;
pub mod pilot;
pub mod simulation;

use shadow_rs::shadow;

shadow!(build);

/// Returns the full version that can be used to identify how the binary was
/// built in the first place.
#[must_use]
pub fn version() -> String {
    format!(
        "{} (commit {}, branch {})",
        build::PKG_VERSION,
        build::SHORT_COMMIT,
        build::BRANCH
    )
}

/// Returns whether the binary was built from a tree with uncommitted changes.
#[must_use]
pub fn is_dirty_build() -> bool {
    !shadow_rs::git_clean()
}
