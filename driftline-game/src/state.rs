//! Mutable game state and the pure rules that move it forward one turn.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::channels::{Channel, HiddenWeight, Metric};
use crate::config::EngineConfig;
use crate::constants::{HIDDEN_WEIGHT_FLOOR, METRIC_MAX, METRIC_MIN};
use crate::data::Choice;
use crate::numbers::{floor_f64_to_i32, mean_i32};

/// The four visible society metrics, each kept within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Metrics {
    pub stability: i32,
    pub economy: i32,
    pub environment: i32,
    pub trust: i32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::uniform(crate::constants::INITIAL_METRIC)
    }
}

impl Metrics {
    /// Every metric set to `value`, clamped.
    #[must_use]
    pub const fn uniform(value: i32) -> Self {
        let value = if value < METRIC_MIN {
            METRIC_MIN
        } else if value > METRIC_MAX {
            METRIC_MAX
        } else {
            value
        };
        Self {
            stability: value,
            economy: value,
            environment: value,
            trust: value,
        }
    }

    #[must_use]
    pub const fn get(&self, metric: Metric) -> i32 {
        match metric {
            Metric::Stability => self.stability,
            Metric::Economy => self.economy,
            Metric::Environment => self.environment,
            Metric::Trust => self.trust,
        }
    }

    const fn slot_mut(&mut self, metric: Metric) -> &mut i32 {
        match metric {
            Metric::Stability => &mut self.stability,
            Metric::Economy => &mut self.economy,
            Metric::Environment => &mut self.environment,
            Metric::Trust => &mut self.trust,
        }
    }

    /// Set one metric, clamping into range.
    pub fn set(&mut self, metric: Metric, value: i32) {
        *self.slot_mut(metric) = value.clamp(METRIC_MIN, METRIC_MAX);
    }

    pub fn clamp(&mut self) {
        for metric in Metric::ALL {
            let value = self.get(*metric);
            self.set(*metric, value);
        }
    }

    /// First metric (canonical order) that has hit the floor.
    #[must_use]
    pub fn collapsed(&self) -> Option<Metric> {
        Metric::ALL
            .iter()
            .copied()
            .find(|metric| self.get(*metric) <= METRIC_MIN)
    }

    /// Values in canonical order.
    #[must_use]
    pub const fn values(&self) -> [i32; 4] {
        [self.stability, self.economy, self.environment, self.trust]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Metric, i32)> + '_ {
        Metric::ALL.iter().map(|metric| (*metric, self.get(*metric)))
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        mean_i32(&self.values())
    }

    /// Lowest metric and its value; ties resolve in canonical order.
    #[must_use]
    pub fn weakest(&self) -> (Metric, i32) {
        self.iter()
            .fold((Metric::Stability, i32::MAX), |lowest, entry| {
                if entry.1 < lowest.1 { entry } else { lowest }
            })
    }
}

/// Latent pressure accumulators; never negative, no ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct HiddenWeights {
    pub climate_risk: i32,
    pub tech_dependency: i32,
    pub social_unrest: i32,
}

impl HiddenWeights {
    #[must_use]
    pub const fn get(&self, weight: HiddenWeight) -> i32 {
        match weight {
            HiddenWeight::ClimateRisk => self.climate_risk,
            HiddenWeight::TechDependency => self.tech_dependency,
            HiddenWeight::SocialUnrest => self.social_unrest,
        }
    }

    /// Add a raw delta and floor the result.
    pub fn add(&mut self, weight: HiddenWeight, delta: i32) {
        let slot = match weight {
            HiddenWeight::ClimateRisk => &mut self.climate_risk,
            HiddenWeight::TechDependency => &mut self.tech_dependency,
            HiddenWeight::SocialUnrest => &mut self.social_unrest,
        };
        *slot = slot.saturating_add(delta).max(HIDDEN_WEIGHT_FLOOR);
    }

    pub fn iter(&self) -> impl Iterator<Item = (HiddenWeight, i32)> + '_ {
        HiddenWeight::ALL
            .iter()
            .map(|weight| (*weight, self.get(*weight)))
    }
}

/// Everything that changes during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub year: i32,
    pub metrics: Metrics,
    #[serde(default)]
    pub hidden_weights: HiddenWeights,
    /// Drift event id to remaining suspended turns.
    #[serde(default)]
    pub event_cooldowns: BTreeMap<String, u32>,
    #[serde(default)]
    pub last_turn_was_crisis: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl GameState {
    /// Fresh run snapshot for `config`.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            year: config.start_year,
            metrics: Metrics::uniform(config.initial_metric),
            hidden_weights: HiddenWeights::default(),
            event_cooldowns: BTreeMap::new(),
            last_turn_was_crisis: false,
        }
    }

    /// Turns resolved since the start year.
    #[must_use]
    pub fn turns_played(&self, config: &EngineConfig) -> i32 {
        self.year.saturating_sub(config.start_year).max(0)
    }

    /// Factor applied to negative metric deltas this turn.
    #[must_use]
    pub fn penalty_multiplier(&self, config: &EngineConfig) -> f64 {
        let ramp = f64::from(self.turns_played(config)) * config.penalty_ramp_per_turn;
        config.penalty_base + ramp.min(config.penalty_ramp_cap)
    }

    /// Resolve a choice: scaled metric impact, weight drift, year advance and
    /// cooldown tick. Returns the new metrics.
    pub fn apply_choice(&mut self, choice: &Choice, config: &EngineConfig) -> Metrics {
        let multiplier = self.penalty_multiplier(config);
        self.metrics = project_metrics(self.metrics, choice, multiplier);

        for (weight, delta) in choice.weight_mod.iter() {
            self.hidden_weights.add(weight, delta);
        }
        for (key, delta) in choice.impact.ignored().iter().chain(choice.weight_mod.ignored()) {
            log::debug!(
                "choice `{}` ignores unknown key `{key}` ({delta:+})",
                choice.label
            );
        }

        self.year = self.year.saturating_add(1);
        self.tick_cooldowns();
        self.metrics
    }

    /// Metrics `apply_choice` would produce, without mutating anything.
    #[must_use]
    pub fn preview_choice(&self, choice: &Choice, config: &EngineConfig) -> Metrics {
        project_metrics(self.metrics, choice, self.penalty_multiplier(config))
    }

    /// Count every active cooldown down by one turn.
    pub fn tick_cooldowns(&mut self) {
        for remaining in self.event_cooldowns.values_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }

    /// Remaining suspended turns for a drift event, 0 if it never fired.
    #[must_use]
    pub fn cooldown(&self, event_id: &str) -> u32 {
        self.event_cooldowns.get(event_id).copied().unwrap_or(0)
    }

    pub fn start_cooldown(&mut self, event_id: &str, turns: u32) {
        self.event_cooldowns.insert(event_id.to_string(), turns);
    }
}

/// Negative deltas are scaled and floored; gains apply as-is.
#[must_use]
pub fn scaled_delta(delta: i32, multiplier: f64) -> i32 {
    if delta < 0 {
        floor_f64_to_i32(f64::from(delta) * multiplier)
    } else {
        delta
    }
}

fn project_metrics(mut metrics: Metrics, choice: &Choice, multiplier: f64) -> Metrics {
    for (metric, delta) in choice.impact.iter() {
        let next = metrics
            .get(metric)
            .saturating_add(scaled_delta(delta, multiplier));
        metrics.set(metric, next);
    }
    metrics
}
