//! Drift event eligibility.
use crate::data::{DriftEvent, Trigger};
use crate::state::GameState;

impl Trigger {
    /// Whether the trigger condition holds for `state`.
    #[must_use]
    pub fn is_met(&self, state: &GameState) -> bool {
        match self {
            Self::Threshold { weight, at_least } => state.hidden_weights.get(*weight) >= *at_least,
            Self::Conditions(bounds) => bounds
                .iter()
                .all(|(metric, range)| range.contains(state.metrics.get(*metric))),
        }
    }
}

impl DriftEvent {
    /// Off cooldown and triggered.
    #[must_use]
    pub fn is_eligible(&self, state: &GameState) -> bool {
        state.cooldown(self.id()) == 0 && self.trigger.is_met(state)
    }
}

/// Every eligible event, in declaration order.
pub fn eligible_events<'c>(
    events: &'c [DriftEvent],
    state: &'c GameState,
) -> impl Iterator<Item = &'c DriftEvent> + 'c {
    events.iter().filter(move |event| event.is_eligible(state))
}

/// The single event that gets to roll this turn, if any.
#[must_use]
pub fn first_eligible<'c>(events: &'c [DriftEvent], state: &GameState) -> Option<&'c DriftEvent> {
    events.iter().find(|event| event.is_eligible(state))
}
