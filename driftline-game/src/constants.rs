//! Centralized balance and tuning constants for Driftline game logic.
//!
//! These values are the defaults behind [`crate::EngineConfig`] and
//! [`crate::ResultConfig`]. Keeping them together means the difficulty curve
//! only moves through reviewed code changes.

// Timeline -----------------------------------------------------------------
pub(crate) const START_YEAR: i32 = 2030;

// Metrics ------------------------------------------------------------------
pub(crate) const INITIAL_METRIC: i32 = 60;
pub const METRIC_MIN: i32 = 0;
pub const METRIC_MAX: i32 = 100;
pub const HIDDEN_WEIGHT_FLOOR: i32 = 0;

// Penalty curve ------------------------------------------------------------
pub(crate) const PENALTY_BASE: f64 = 1.4;
pub(crate) const PENALTY_RAMP_PER_TURN: f64 = 0.03;
pub(crate) const PENALTY_RAMP_CAP: f64 = 0.6;

// Drift events -------------------------------------------------------------
pub(crate) const DRIFT_CHANCE: f64 = 0.3;
pub(crate) const DRIFT_COOLDOWN_TURNS: u32 = 8;

// Scoring ------------------------------------------------------------------
pub(crate) const SCORE_EPOCH_YEAR: i32 = 2024;
pub(crate) const SCORE_POINTS_PER_YEAR: i32 = 100;
pub(crate) const SCORE_POINTS_PER_METRIC_POINT: i32 = 10;

// Random stream domain tags ------------------------------------------------
pub(crate) const STREAM_TAG_DECK: &[u8] = b"driftline.deck";
pub(crate) const STREAM_TAG_DRIFT: &[u8] = b"driftline.drift";
