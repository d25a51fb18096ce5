//! Turn simulation engine.
//!
//! The engine owns a [`GameState`], borrows a [`Catalog`] and drives the turn
//! loop: check status, present a drift event or a drawn card, apply the
//! chosen option. Randomness comes from injected [`RngStreams`] so seeded
//! runs replay exactly.
use rand::{Rng, RngCore};
use thiserror::Error;

use crate::channels::Metric;
use crate::config::{ConfigError, EngineConfig};
use crate::data::{Catalog, CatalogError, Choice, DecisionCard, DriftEvent};
use crate::drift::first_eligible;
use crate::result::collapse_reason;
use crate::rng::{RngStreams, StreamRng};
use crate::state::{GameState, Metrics};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Outcome of the start-of-turn check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnStatus<'c> {
    /// A metric hit zero; the run is over until reset.
    GameOver { metric: Metric, reason: String },
    /// A drift event replaces this turn's card.
    DriftEvent(&'c DriftEvent),
    /// Draw a normal card.
    Continue,
}

impl TurnStatus<'_> {
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        matches!(self, Self::GameOver { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Engine<'c, R = StreamRng> {
    catalog: &'c Catalog,
    config: EngineConfig,
    state: GameState,
    streams: RngStreams<R>,
}

impl<'c> Engine<'c, StreamRng> {
    /// Default-tuned engine whose streams derive from `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog fails validation.
    pub fn seeded(catalog: &'c Catalog, seed: u64) -> Result<Self, EngineError> {
        Self::new(
            catalog,
            EngineConfig::default(),
            RngStreams::from_user_seed(seed),
        )
    }

    /// Default-tuned engine seeded from OS entropy.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog fails validation.
    pub fn from_entropy(catalog: &'c Catalog) -> Result<Self, EngineError> {
        let (seed, streams) = RngStreams::from_entropy();
        log::debug!("engine seeded from entropy with {seed}");
        Self::new(catalog, EngineConfig::default(), streams)
    }
}

impl<'c, R: RngCore> Engine<'c, R> {
    /// # Errors
    ///
    /// Returns an error if `config` is out of range or the catalog has no
    /// playable deck.
    pub fn new(
        catalog: &'c Catalog,
        config: EngineConfig,
        streams: RngStreams<R>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        catalog.validate()?;
        Ok(Self {
            catalog,
            state: GameState::new(&config),
            config,
            streams,
        })
    }

    /// Discard the run and start over. Random streams keep their position.
    pub fn reset(&mut self) {
        self.state = GameState::new(&self.config);
    }

    /// Resolve a choice and advance one year.
    pub fn apply_decision(&mut self, choice: &Choice) -> Metrics {
        self.state.apply_choice(choice, &self.config)
    }

    /// Decide what this turn presents.
    pub fn check_status(&mut self) -> TurnStatus<'c> {
        if let Some(metric) = self.state.metrics.collapsed() {
            let reason = collapse_reason(metric);
            log::info!("run over in {}: {reason}", self.state.year);
            return TurnStatus::GameOver { metric, reason };
        }

        if self.state.last_turn_was_crisis {
            return TurnStatus::Continue;
        }

        let catalog = self.catalog;
        let Some(event) = first_eligible(&catalog.drift_events, &self.state) else {
            return TurnStatus::Continue;
        };

        let fired = self.streams.drift.gen_bool(self.config.drift_chance);
        log::debug!(
            "drift roll for `{}` in {}: {}",
            event.id(),
            self.state.year,
            if fired { "fired" } else { "held" }
        );
        if !fired {
            return TurnStatus::Continue;
        }

        self.state.last_turn_was_crisis = true;
        self.state
            .start_cooldown(event.id(), self.config.drift_cooldown_turns);
        log::info!(
            "drift event `{}` ({}) fired in {}",
            event.id(),
            event.kind.as_str(),
            self.state.year
        );
        TurnStatus::DriftEvent(event)
    }

    /// Draw a normal card uniformly; repeats are allowed.
    pub fn next_card(&mut self) -> &'c DecisionCard {
        self.state.last_turn_was_crisis = false;
        let catalog = self.catalog;
        let cards = &catalog.cards;
        let card = &cards[self.streams.deck.gen_range(0..cards.len())];
        log::debug!("drew card `{}` for {}", card.id, self.state.year);
        card
    }

    #[must_use]
    pub const fn metrics(&self) -> Metrics {
        self.state.metrics
    }

    #[must_use]
    pub const fn year(&self) -> i32 {
        self.state.year
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub const fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    #[must_use]
    pub const fn streams(&self) -> &RngStreams<R> {
        &self.streams
    }

    /// Multiplier negative deltas receive if applied now.
    #[must_use]
    pub fn penalty_multiplier(&self) -> f64 {
        self.state.penalty_multiplier(&self.config)
    }

    /// Metrics a choice would produce, without applying it.
    #[must_use]
    pub fn preview(&self, choice: &Choice) -> Metrics {
        self.state.preview_choice(choice, &self.config)
    }
}
