//! Parameters of the UCT planner.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::environment::TimeStep;

/// Which statistic of a node is treated as its value during selection and
/// best action extraction.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValueEstimate {
    /// Raw sum of the discounted returns backed up through the node. This
    /// favours frequently visited branches.
    #[default]
    Sum,
    /// Sum of the discounted returns divided by the visit count.
    Mean,
}

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// No iterations allowed.
    #[error("computational budget must be positive")]
    EmptyBudget,
    /// Rollouts of zero steps.
    #[error("horizon must be positive")]
    EmptyHorizon,
    /// The root could never be expanded.
    #[error("tree depth limit must be positive")]
    EmptyDepth,
    /// A time limit of zero.
    #[error("time limit must be positive when set")]
    EmptyTimeLimit,
    /// Discount factor outside of `(0, 1]`.
    #[error("discount factor must be in (0, 1], got {0}")]
    Discount(f64),
    /// Negative or non-finite exploration constant.
    #[error("exploration constant must be finite and non-negative, got {0}")]
    Exploration(f64),
    /// Negative or non-finite action magnitude.
    #[error("angle rate magnitude must be finite and non-negative, got {0}")]
    AngleRate(f64),
    /// Sub-step not in `(0, width]`.
    #[error("time step {width} and sub-step {sub_width} must satisfy 0 < sub-step <= step")]
    TimeStep {
        /// Transition width.
        width: f64,
        /// Integration sub-step.
        sub_width: f64,
    },
}

/// Parameters for the UCT search.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Magnitude of the increment that an action applies to a control angle.
    pub angle_rate_magnitude: f64,
    /// Exploration constant of the UCT formula.
    pub exploration: f64,
    /// Simulated time covered by one transition.
    pub time_step: f64,
    /// Integration sub-step inside one transition.
    pub sub_time_step: f64,
    /// Per-step discount factor.
    pub discount: f64,
    /// Number of transitions in one rollout.
    pub horizon: u32,
    /// Number of tree policy, rollout and backup iterations per call.
    pub budget: u32,
    /// Nodes at this depth are not descended into any further.
    pub max_depth: u32,
    /// Optional wall-clock cap on a planning call, in milliseconds.
    pub time_limit_ms: Option<u64>,
    /// Node statistic used as its value.
    pub value_estimate: ValueEstimate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            angle_rate_magnitude: 0.01,
            exploration: 1.0,
            time_step: 0.1,
            sub_time_step: 0.1,
            discount: 0.9,
            horizon: 10,
            budget: 100,
            max_depth: 64,
            time_limit_ms: None,
            value_estimate: ValueEstimate::Sum,
        }
    }
}

impl Config {
    /// Creates a config with the specified computational budget.
    #[must_use]
    pub fn with_budget(budget: u32) -> Self {
        Self {
            budget,
            ..Self::default()
        }
    }

    /// Returns the transition step widths.
    #[must_use]
    pub const fn step(&self) -> TimeStep {
        TimeStep {
            width: self.time_step,
            sub_width: self.sub_time_step,
        }
    }

    /// Returns the wall-clock limit, if any.
    #[must_use]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_ms.map(Duration::from_millis)
    }

    /// Checks that the parameters make sense together.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.budget == 0 {
            return Err(ConfigError::EmptyBudget);
        }
        if self.horizon == 0 {
            return Err(ConfigError::EmptyHorizon);
        }
        if self.max_depth == 0 {
            return Err(ConfigError::EmptyDepth);
        }
        if self.time_limit_ms == Some(0) {
            return Err(ConfigError::EmptyTimeLimit);
        }
        if !(self.discount > 0.0 && self.discount <= 1.0) {
            return Err(ConfigError::Discount(self.discount));
        }
        if !(self.exploration.is_finite() && self.exploration >= 0.0) {
            return Err(ConfigError::Exploration(self.exploration));
        }
        if !(self.angle_rate_magnitude.is_finite() && self.angle_rate_magnitude >= 0.0) {
            return Err(ConfigError::AngleRate(self.angle_rate_magnitude));
        }
        if !(self.time_step.is_finite()
            && self.sub_time_step > 0.0
            && self.sub_time_step <= self.time_step)
        {
            return Err(ConfigError::TimeStep {
                width: self.time_step,
                sub_width: self.sub_time_step,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.horizon, 10);
        assert_eq!(config.budget, 100);
        assert_eq!(config.value_estimate, ValueEstimate::Sum);
        assert!(config.time_limit().is_none());
    }

    #[test]
    fn with_budget() {
        let config = Config::with_budget(7);
        assert_eq!(config.budget, 7);
        assert_eq!(config.horizon, Config::default().horizon);
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            Config::with_budget(0).validate(),
            Err(ConfigError::EmptyBudget)
        );
        let config = Config {
            discount: 1.5,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Discount(1.5)));
        let config = Config {
            discount: 0.0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Discount(0.0)));
        let config = Config {
            time_limit_ms: Some(0),
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyTimeLimit));
        let config = Config {
            sub_time_step: 0.2,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TimeStep { .. })
        ));
        let config = Config {
            exploration: f64::NAN,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Exploration(_))
        ));
    }

    #[test]
    fn deserialize() {
        let config: Config = toml::from_str(
            r#"
            budget = 250
            discount = 0.95
            value_estimate = "mean"
            time_limit_ms = 40
            "#,
        )
        .unwrap();
        assert_eq!(config.budget, 250);
        assert_eq!(config.value_estimate, ValueEstimate::Mean);
        assert_eq!(config.time_limit(), Some(Duration::from_millis(40)));
        assert_eq!(config.horizon, 10);
    }
}
