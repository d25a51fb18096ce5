use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::{ChoiceSide, DecisionCard, DriftEvent, VisualEvent};
use crate::engine::{Engine, TurnStatus};
use crate::result::{ResultConfig, RunSummary};
use crate::rng::StreamRng;
use crate::state::Metrics;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no card is awaiting a decision")]
    NothingPresented,
    #[error("card `{0}` is still awaiting a decision")]
    AlreadyPresented(String),
    #[error("the run is over")]
    RunOver,
}

/// The card currently in front of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presented<'c> {
    Card(&'c DecisionCard),
    Drift(&'c DriftEvent),
}

impl<'c> Presented<'c> {
    #[must_use]
    pub const fn card(self) -> &'c DecisionCard {
        match self {
            Self::Card(card) => card,
            Self::Drift(event) => &event.card,
        }
    }

    #[must_use]
    pub const fn is_drift(self) -> bool {
        matches!(self, Self::Drift(_))
    }

    #[must_use]
    pub const fn visual_event(self) -> Option<VisualEvent> {
        match self {
            Self::Card(_) => None,
            Self::Drift(event) => event.visual_event,
        }
    }
}

/// What the player faces at the start of a turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnPrompt<'c> {
    Decide(Presented<'c>),
    GameOver(RunSummary),
}

/// One resolved turn on the decision path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Year the card was presented in.
    pub year: i32,
    pub card_id: String,
    pub side: ChoiceSide,
    pub drift: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_event: Option<VisualEvent>,
    /// Metrics after the choice resolved.
    pub metrics: Metrics,
}

/// High-level session wrapper enforcing one decision per presented card.
#[derive(Debug, Clone)]
pub struct Session<'c, R = StreamRng> {
    engine: Engine<'c, R>,
    results: ResultConfig,
    presented: Option<Presented<'c>>,
    history: Vec<TurnRecord>,
    drift_events: u32,
    finished: Option<RunSummary>,
}

impl<'c, R: RngCore> Session<'c, R> {
    #[must_use]
    pub fn new(engine: Engine<'c, R>) -> Self {
        Self {
            engine,
            results: ResultConfig::default(),
            presented: None,
            history: Vec::new(),
            drift_events: 0,
            finished: None,
        }
    }

    #[must_use]
    pub fn with_result_config(mut self, results: ResultConfig) -> Self {
        self.results = results;
        self
    }

    /// Start the next turn.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyPresented`] while a card still awaits a choice.
    pub fn next_turn(&mut self) -> Result<TurnPrompt<'c>, SessionError> {
        if let Some(summary) = &self.finished {
            return Ok(TurnPrompt::GameOver(summary.clone()));
        }
        if let Some(presented) = self.presented {
            return Err(SessionError::AlreadyPresented(presented.card().id.clone()));
        }

        let presented = match self.engine.check_status() {
            TurnStatus::GameOver { .. } => {
                let summary = self.summary();
                self.finished = Some(summary.clone());
                return Ok(TurnPrompt::GameOver(summary));
            }
            TurnStatus::DriftEvent(event) => {
                self.drift_events = self.drift_events.saturating_add(1);
                Presented::Drift(event)
            }
            TurnStatus::Continue => Presented::Card(self.engine.next_card()),
        };
        self.presented = Some(presented);
        Ok(TurnPrompt::Decide(presented))
    }

    /// Resolve the presented card with `side`.
    ///
    /// # Errors
    ///
    /// Returns an error if the run is over or no card is presented.
    pub fn choose(&mut self, side: ChoiceSide) -> Result<Metrics, SessionError> {
        if self.finished.is_some() {
            return Err(SessionError::RunOver);
        }
        let presented = self.presented.take().ok_or(SessionError::NothingPresented)?;
        let card = presented.card();
        let year = self.engine.year();
        let metrics = self.engine.apply_decision(card.choice(side));
        self.history.push(TurnRecord {
            year,
            card_id: card.id.clone(),
            side,
            drift: presented.is_drift(),
            visual_event: presented.visual_event(),
            metrics,
        });
        Ok(metrics)
    }

    /// Throw the run away and start again from the initial snapshot.
    pub fn restart(&mut self) {
        self.engine.reset();
        self.presented = None;
        self.history.clear();
        self.drift_events = 0;
        self.finished = None;
    }

    /// Decision path so far.
    #[must_use]
    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    #[must_use]
    pub const fn presented(&self) -> Option<Presented<'c>> {
        self.presented
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.finished.is_some()
    }

    /// Score the run as it stands.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        let turns = u32::try_from(self.history.len()).unwrap_or(u32::MAX);
        RunSummary::from_state(self.engine.state(), &self.results, turns, self.drift_events)
    }

    #[must_use]
    pub const fn engine(&self) -> &Engine<'c, R> {
        &self.engine
    }
}
