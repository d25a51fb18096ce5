use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use driftline_game::{Channel, ChoiceSide, DecisionCard, EngineConfig, GameState, HiddenWeight};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub side: ChoiceSide,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub const fn new(side: ChoiceSide, rationale: Option<String>) -> Self {
        Self { side, rationale }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select a side for the presented card.
    fn pick_side(
        &mut self,
        state: &GameState,
        config: &EngineConfig,
        card: &DecisionCard,
    ) -> PolicyDecision;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    Random,
    Cautious,
    Greedy,
    Steward,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Random, Self::Cautious, Self::Greedy, Self::Steward];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Random => "Random",
            Self::Cautious => "Cautious",
            Self::Greedy => "Greedy",
            Self::Steward => "Steward",
        }
    }

    /// CLI key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Cautious => "cautious",
            Self::Greedy => "greedy",
            Self::Steward => "steward",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Random => "coin flip on every card",
            Self::Cautious => "protect the weakest metric",
            Self::Greedy => "maximize the metric total this turn",
            Self::Steward => "keep hidden pressure low, then maximize the total",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Random => Box::new(RandomPolicy::new(seed)),
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Greedy => Box::new(GreedyPolicy),
            Self::Steward => Box::new(StewardPolicy),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GameplayStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

/// Parse CLI strategy tokens; `all` expands to every strategy.
pub fn resolve_strategies(tokens: &[String]) -> Result<Vec<GameplayStrategy>> {
    let mut strategies = Vec::new();
    for token in tokens {
        if token.eq_ignore_ascii_case("all") {
            for strategy in GameplayStrategy::ALL {
                if !strategies.contains(&strategy) {
                    strategies.push(strategy);
                }
            }
            continue;
        }
        let Ok(strategy) = token.parse::<GameplayStrategy>() else {
            bail!("Unknown strategy: {token}");
        };
        if !strategies.contains(&strategy) {
            strategies.push(strategy);
        }
    }
    if strategies.is_empty() {
        strategies.extend(GameplayStrategy::ALL);
    }
    Ok(strategies)
}

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

struct CautiousPolicy;
struct GreedyPolicy;
struct StewardPolicy;

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_side(
        &mut self,
        _state: &GameState,
        _config: &EngineConfig,
        _card: &DecisionCard,
    ) -> PolicyDecision {
        let side = if self.rng.gen_bool(0.5) {
            ChoiceSide::A
        } else {
            ChoiceSide::B
        };
        PolicyDecision::new(side, None)
    }
}

impl PlayerPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "Cautious"
    }

    fn pick_side(
        &mut self,
        state: &GameState,
        config: &EngineConfig,
        card: &DecisionCard,
    ) -> PolicyDecision {
        let (side, floor) = best_side(|side| {
            state
                .preview_choice(card.choice(side), config)
                .weakest()
                .1
        });
        PolicyDecision::new(side, Some(format!("floor {floor}")))
    }
}

impl PlayerPolicy for GreedyPolicy {
    fn name(&self) -> &'static str {
        "Greedy"
    }

    fn pick_side(
        &mut self,
        state: &GameState,
        config: &EngineConfig,
        card: &DecisionCard,
    ) -> PolicyDecision {
        let (side, total) = best_side(|side| {
            state
                .preview_choice(card.choice(side), config)
                .values()
                .iter()
                .sum()
        });
        PolicyDecision::new(side, Some(format!("total {total}")))
    }
}

impl PlayerPolicy for StewardPolicy {
    fn name(&self) -> &'static str {
        "Steward"
    }

    fn pick_side(
        &mut self,
        state: &GameState,
        config: &EngineConfig,
        card: &DecisionCard,
    ) -> PolicyDecision {
        // Pressure is weighted against the hidden weight that is already closest to a trigger.
        let hottest = HiddenWeight::ALL
            .iter()
            .copied()
            .max_by_key(|weight| state.hidden_weights.get(*weight))
            .unwrap_or(HiddenWeight::ClimateRisk);
        let (side, score) = best_side(|side| {
            let choice = card.choice(side);
            let pressure = choice.weight_mod.net() + choice.weight_mod.get(hottest).unwrap_or(0);
            let total: i32 = state.preview_choice(choice, config).values().iter().sum();
            total - pressure * 2
        });
        PolicyDecision::new(side, Some(format!("score {score} (watching {hottest})")))
    }
}

/// Highest-scoring side; ties go to A.
fn best_side(mut score: impl FnMut(ChoiceSide) -> i32) -> (ChoiceSide, i32) {
    let a = score(ChoiceSide::A);
    let b = score(ChoiceSide::B);
    if b > a { (ChoiceSide::B, b) } else { (ChoiceSide::A, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftline_game::{Choice, Deltas, Metric};

    fn card(a: Choice, b: Choice) -> DecisionCard {
        DecisionCard {
            id: "test".to_string(),
            title: "Test".to_string(),
            theme: String::new(),
            description: String::new(),
            choice_a: a,
            choice_b: b,
        }
    }

    fn pick(strategy: GameplayStrategy, state: &GameState, card: &DecisionCard) -> ChoiceSide {
        strategy
            .create_policy(1)
            .pick_side(state, &EngineConfig::default(), card)
            .side
    }

    #[test]
    fn cautious_protects_the_weakest_metric() {
        let mut state = GameState::default();
        state.metrics.trust = 15;
        let risky = Choice::new("risky").with_impact(
            Deltas::new()
                .with(Metric::Economy, 30)
                .with(Metric::Trust, -10),
        );
        let safe = Choice::new("safe").with_impact(Deltas::new().with(Metric::Trust, 2));
        let card = card(risky, safe);
        assert_eq!(pick(GameplayStrategy::Cautious, &state, &card), ChoiceSide::B);
        assert_eq!(pick(GameplayStrategy::Greedy, &state, &card), ChoiceSide::A);
    }

    #[test]
    fn steward_avoids_hidden_pressure() {
        let state = GameState::default();
        let polluting = Choice::new("coal")
            .with_impact(Deltas::new().with(Metric::Economy, 5))
            .with_weight_mod(Deltas::new().with(HiddenWeight::ClimateRisk, 20));
        let clean = Choice::new("solar").with_impact(Deltas::new().with(Metric::Economy, 2));
        let card = card(polluting, clean);
        assert_eq!(pick(GameplayStrategy::Steward, &state, &card), ChoiceSide::B);
        assert_eq!(pick(GameplayStrategy::Greedy, &state, &card), ChoiceSide::A);
    }

    #[test]
    fn random_policy_is_seeded() {
        let state = GameState::default();
        let card = card(Choice::new("a"), Choice::new("b"));
        let config = EngineConfig::default();
        let mut first = GameplayStrategy::Random.create_policy(9);
        let mut second = GameplayStrategy::Random.create_policy(9);
        for _ in 0..32 {
            assert_eq!(
                first.pick_side(&state, &config, &card),
                second.pick_side(&state, &config, &card)
            );
        }
    }

    #[test]
    fn strategy_tokens_resolve() {
        let all = resolve_strategies(&["all".to_string()]).unwrap();
        assert_eq!(all, GameplayStrategy::ALL.to_vec());
        let some = resolve_strategies(&["Greedy".to_string(), "greedy".to_string()]).unwrap();
        assert_eq!(some, vec![GameplayStrategy::Greedy]);
        assert!(resolve_strategies(&["reckless".to_string()]).is_err());
        assert_eq!(resolve_strategies(&[]).unwrap().len(), 4);
        assert_eq!(GameplayStrategy::Steward.to_string(), "Steward");
    }
}
