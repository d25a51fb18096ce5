//! Engine tuning configuration.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    DRIFT_CHANCE, DRIFT_COOLDOWN_TURNS, INITIAL_METRIC, METRIC_MAX, METRIC_MIN, PENALTY_BASE,
    PENALTY_RAMP_CAP, PENALTY_RAMP_PER_TURN, START_YEAR,
};

/// Tunable parameters of the turn simulation.
///
/// Defaults reproduce the shipped difficulty curve: penalties start at 1.4x
/// and ramp by 0.03x per turn up to 2.0x, drift events roll at 30% and then
/// rest for eight turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Year of the first turn.
    pub start_year: i32,
    /// Value every metric starts at.
    pub initial_metric: i32,
    /// Multiplier applied to negative metric deltas on the first turn.
    pub penalty_base: f64,
    /// Additional multiplier gained per elapsed turn.
    pub penalty_ramp_per_turn: f64,
    /// Upper bound on the ramp added on top of `penalty_base`.
    pub penalty_ramp_cap: f64,
    /// Probability that the first eligible drift event fires.
    pub drift_chance: f64,
    /// Turns a drift event stays suspended after firing.
    pub drift_cooldown_turns: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_year: START_YEAR,
            initial_metric: INITIAL_METRIC,
            penalty_base: PENALTY_BASE,
            penalty_ramp_per_turn: PENALTY_RAMP_PER_TURN,
            penalty_ramp_cap: PENALTY_RAMP_CAP,
            drift_chance: DRIFT_CHANCE,
            drift_cooldown_turns: DRIFT_COOLDOWN_TURNS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

impl EngineConfig {
    /// Load a configuration from JSON; missing fields fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let initial = f64::from(self.initial_metric);
        let metric_floor = f64::from(METRIC_MIN + 1);
        let metric_ceiling = f64::from(METRIC_MAX);
        if !(metric_floor..=metric_ceiling).contains(&initial) {
            return Err(ConfigError::RangeViolation {
                field: "initial_metric",
                min: metric_floor,
                max: metric_ceiling,
                value: initial,
            });
        }
        for (field, value) in [
            ("penalty_base", self.penalty_base),
            ("penalty_ramp_per_turn", self.penalty_ramp_per_turn),
            ("penalty_ramp_cap", self.penalty_ramp_cap),
            ("drift_chance", self.drift_chance),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { field });
            }
        }
        if self.penalty_base < 1.0 {
            return Err(ConfigError::MinViolation {
                field: "penalty_base",
                min: 1.0,
                value: self.penalty_base,
            });
        }
        if self.penalty_ramp_per_turn < 0.0 {
            return Err(ConfigError::MinViolation {
                field: "penalty_ramp_per_turn",
                min: 0.0,
                value: self.penalty_ramp_per_turn,
            });
        }
        if self.penalty_ramp_cap < 0.0 {
            return Err(ConfigError::MinViolation {
                field: "penalty_ramp_cap",
                min: 0.0,
                value: self.penalty_ramp_cap,
            });
        }
        if !(0.0..=1.0).contains(&self.drift_chance) {
            return Err(ConfigError::RangeViolation {
                field: "drift_chance",
                min: 0.0,
                max: 1.0,
                value: self.drift_chance,
            });
        }
        Ok(())
    }
}
