use std::collections::BTreeMap;
use std::hash::Hasher;

use anyhow::Result;
use driftline_game::{
    Catalog, ChoiceSide, Engine, EngineConfig, ResultConfig, RngStreams, RunSummary, Session,
    TurnPrompt, TurnRecord,
};
use serde::{Deserialize, Serialize};
use twox_hash::XxHash64;

use crate::logic::policy::{GameplayStrategy, PlayerPolicy};

/// Configuration shared by every playthrough in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub engine: EngineConfig,
    pub results: ResultConfig,
    pub max_turns: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            results: ResultConfig::default(),
            max_turns: 500,
        }
    }
}

impl SimulationConfig {
    #[must_use]
    pub const fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }
}

/// Snapshot of one resolved card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub year: i32,
    pub card_id: String,
    pub side: ChoiceSide,
    pub drift: bool,
    pub policy_name: String,
    pub rationale: Option<String>,
}

/// Outcome of a single automated run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playthrough {
    pub seed: u64,
    pub strategy: String,
    pub summary: RunSummary,
    /// `true` when the run reached game over rather than the turn limit.
    pub ended: bool,
    /// Hash of the serialized decision path; equal seeds must agree.
    pub fingerprint: u64,
    pub rng_draws: u64,
    pub violations: Vec<String>,
    #[serde(skip)]
    pub decisions: Vec<DecisionRecord>,
}

impl Playthrough {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Last few decisions, for failure messages.
    #[must_use]
    pub fn decision_tail(&self) -> String {
        if self.decisions.is_empty() {
            return "no decisions recorded".to_string();
        }
        self.decisions
            .iter()
            .rev()
            .take(3)
            .map(|entry| {
                let rationale = entry
                    .rationale
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .unwrap_or("-");
                format!(
                    "{} {}{} -> {} [{}] {}",
                    entry.year,
                    entry.card_id,
                    if entry.drift { " (drift)" } else { "" },
                    entry.side,
                    entry.policy_name,
                    rationale
                )
            })
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Play one seeded run to game over or the turn limit, checking engine
/// invariants after every decision.
///
/// # Errors
///
/// Returns an error if the engine rejects the configuration or the session
/// is driven out of order.
pub fn run_playthrough(
    catalog: &Catalog,
    config: &SimulationConfig,
    strategy: GameplayStrategy,
    seed: u64,
) -> Result<Playthrough> {
    let engine = Engine::new(
        catalog,
        config.engine.clone(),
        RngStreams::from_user_seed(seed),
    )?;
    let mut session = Session::new(engine).with_result_config(config.results.clone());
    let mut policy = strategy.create_policy(seed);
    let mut guard = InvariantGuard::new(config.engine.drift_cooldown_turns);
    let mut decisions = Vec::new();
    let mut final_summary = None;

    for turn in 0..config.max_turns {
        let presented = match session.next_turn()? {
            TurnPrompt::GameOver(summary) => {
                guard.check_game_over(&summary);
                final_summary = Some(summary);
                break;
            }
            TurnPrompt::Decide(presented) => presented,
        };

        let card = presented.card();
        let year = session.engine().year();
        let decision = policy.pick_side(session.engine().state(), session.engine().config(), card);
        let metrics = session.choose(decision.side)?;

        guard.check_turn(turn, &session, year, presented.is_drift(), &card.id);
        log::debug!(
            "seed {seed} {}: {} -> {} ({metrics:?})",
            policy.name(),
            card.id,
            decision.side
        );
        decisions.push(DecisionRecord {
            year,
            card_id: card.id.clone(),
            side: decision.side,
            drift: presented.is_drift(),
            policy_name: policy.name().to_string(),
            rationale: decision.rationale,
        });
    }

    let ended = final_summary.is_some();
    let summary = final_summary.unwrap_or_else(|| session.summary());
    Ok(Playthrough {
        seed,
        strategy: strategy.label().to_string(),
        summary,
        ended,
        fingerprint: fingerprint(session.history()),
        rng_draws: session.engine().streams().draws(),
        violations: guard.into_violations(),
        decisions,
    })
}

/// Stable hash of a decision path.
#[must_use]
pub fn fingerprint(history: &[TurnRecord]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    for record in history {
        hasher.write(record.card_id.as_bytes());
        hasher.write(record.side.as_str().as_bytes());
        hasher.write(&record.year.to_le_bytes());
        for value in record.metrics.values() {
            hasher.write(&value.to_le_bytes());
        }
    }
    hasher.finish()
}

struct InvariantGuard {
    cooldown_turns: u32,
    previous_drift: bool,
    last_fired: BTreeMap<String, usize>,
    violations: Vec<String>,
}

impl InvariantGuard {
    const fn new(cooldown_turns: u32) -> Self {
        Self {
            cooldown_turns,
            previous_drift: false,
            last_fired: BTreeMap::new(),
            violations: Vec::new(),
        }
    }

    fn check_turn<R: rand::RngCore>(
        &mut self,
        turn: usize,
        session: &Session<'_, R>,
        presented_year: i32,
        drift: bool,
        card_id: &str,
    ) {
        let state = session.engine().state();
        if state.year != presented_year + 1 {
            self.violations.push(format!(
                "year moved from {presented_year} to {} in one decision",
                state.year
            ));
        }
        for (metric, value) in state.metrics.iter() {
            if !(0..=100).contains(&value) {
                self.violations
                    .push(format!("{metric} out of range ({value}) in {}", state.year));
            }
        }
        for (weight, value) in state.hidden_weights.iter() {
            if value < 0 {
                self.violations
                    .push(format!("{weight} went negative ({value}) in {}", state.year));
            }
        }
        if drift {
            if self.previous_drift {
                self.violations
                    .push(format!("back-to-back drift events ending with `{card_id}`"));
            }
            if let Some(&last) = self.last_fired.get(card_id) {
                let gap = turn - last;
                if u32::try_from(gap).unwrap_or(u32::MAX) < self.cooldown_turns {
                    self.violations.push(format!(
                        "`{card_id}` fired again after {gap} turns (cooldown {})",
                        self.cooldown_turns
                    ));
                }
            }
            self.last_fired.insert(card_id.to_string(), turn);
        }
        self.previous_drift = drift;
    }

    fn check_game_over(&mut self, summary: &RunSummary) {
        match summary.collapsed {
            Some(metric) if summary.metrics.get(metric) > 0 => self.violations.push(format!(
                "game over names {metric} but it sits at {}",
                summary.metrics.get(metric)
            )),
            None => self
                .violations
                .push("game over without a collapsed metric".to_string()),
            Some(_) => {}
        }
    }

    fn into_violations(self) -> Vec<String> {
        self.violations
    }
}
