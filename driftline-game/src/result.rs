//! End-of-run scoring and summary.
use serde::{Deserialize, Serialize};

use crate::channels::{Channel, Metric};
use crate::constants::{SCORE_EPOCH_YEAR, SCORE_POINTS_PER_METRIC_POINT, SCORE_POINTS_PER_YEAR};
use crate::numbers::floor_f64_to_i32;
use crate::state::{GameState, Metrics};

/// Scoring constants for the end screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultConfig {
    /// Year that counts as zero years survived.
    pub epoch_year: i32,
    pub points_per_year: i32,
    /// Points per point of mean metric value.
    pub points_per_metric_point: i32,
}

impl Default for ResultConfig {
    fn default() -> Self {
        Self {
            epoch_year: SCORE_EPOCH_YEAR,
            points_per_year: SCORE_POINTS_PER_YEAR,
            points_per_metric_point: SCORE_POINTS_PER_METRIC_POINT,
        }
    }
}

impl ResultConfig {
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Everything the result screen and leaderboard need about a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub final_year: i32,
    pub years_survived: i32,
    pub score: i32,
    pub metrics: Metrics,
    /// Metric that ended the run, `None` if it was stopped early.
    pub collapsed: Option<Metric>,
    pub reason: Option<String>,
    pub turns: u32,
    pub drift_events: u32,
}

impl RunSummary {
    #[must_use]
    pub fn from_state(state: &GameState, cfg: &ResultConfig, turns: u32, drift_events: u32) -> Self {
        let collapsed = state.metrics.collapsed();
        Self {
            final_year: state.year,
            years_survived: years_survived(state.year, cfg),
            score: score_run(state.year, &state.metrics, cfg),
            metrics: state.metrics,
            collapsed,
            reason: collapsed.map(collapse_reason),
            turns,
            drift_events,
        }
    }
}

#[must_use]
pub fn years_survived(year: i32, cfg: &ResultConfig) -> i32 {
    year.saturating_sub(cfg.epoch_year)
}

/// `floor(years * points_per_year + mean(metrics) * points_per_metric_point)`.
#[must_use]
pub fn score_run(year: i32, metrics: &Metrics, cfg: &ResultConfig) -> i32 {
    let years = f64::from(years_survived(year, cfg));
    let raw = years * f64::from(cfg.points_per_year)
        + metrics.mean() * f64::from(cfg.points_per_metric_point);
    floor_f64_to_i32(raw)
}

/// Player-facing game-over line.
#[must_use]
pub fn collapse_reason(metric: Metric) -> String {
    format!("Critical Failure: {} collapsed.", metric.key().to_uppercase())
}
