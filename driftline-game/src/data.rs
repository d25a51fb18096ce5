//! Content catalog: decision cards and drift events.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::convert::Infallible;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

use crate::channels::{Deltas, HiddenWeight, Metric};

/// One of the two options on a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub impact: Deltas<Metric>,
    #[serde(default)]
    pub weight_mod: Deltas<HiddenWeight>,
}

impl Choice {
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            text: String::new(),
            impact: Deltas::new(),
            weight_mod: Deltas::new(),
        }
    }

    #[must_use]
    pub fn with_impact(mut self, impact: Deltas<Metric>) -> Self {
        self.impact = impact;
        self
    }

    #[must_use]
    pub fn with_weight_mod(mut self, weight_mod: Deltas<HiddenWeight>) -> Self {
        self.weight_mod = weight_mod;
        self
    }
}

/// Which of a card's two options was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceSide {
    A,
    B,
}

impl ChoiceSide {
    pub const BOTH: [Self; 2] = [Self::A, Self::B];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "a",
            Self::B => "b",
        }
    }
}

impl fmt::Display for ChoiceSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A two-choice scenario drawn on a normal turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionCard {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub theme: String,
    pub description: String,
    pub choice_a: Choice,
    pub choice_b: Choice,
}

impl DecisionCard {
    #[must_use]
    pub const fn choice(&self, side: ChoiceSide) -> &Choice {
        match side {
            ChoiceSide::A => &self.choice_a,
            ChoiceSide::B => &self.choice_b,
        }
    }
}

/// Broad family of a drift event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Reality-decay events fed by hidden weights.
    #[default]
    Drift,
    /// Positive opportunities that surface when a metric is low.
    Recovery,
    /// Disasters that surface when a metric is very low.
    Crisis,
}

impl EventKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Drift => "drift",
            Self::Recovery => "recovery",
            Self::Crisis => "crisis",
        }
    }
}

/// Cosmetic hint for the renderer; no simulation effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualEvent {
    Blackout,
    AcidRain,
    Glitch,
    Heatwave,
}

impl VisualEvent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blackout => "blackout",
            Self::AcidRain => "acid_rain",
            Self::Glitch => "glitch",
            Self::Heatwave => "heatwave",
        }
    }
}

/// Inclusive bounds on one metric; a missing side is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MetricBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i32>,
}

impl MetricBounds {
    #[must_use]
    pub fn contains(&self, value: i32) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// When a drift event becomes eligible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Eligible once the hidden weight reaches `at_least`.
    Threshold { weight: HiddenWeight, at_least: i32 },
    /// Eligible while every listed metric sits inside its bounds.
    Conditions(BTreeMap<Metric, MetricBounds>),
}

/// A special card that replaces the normal draw when triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftEvent {
    #[serde(flatten)]
    pub card: DecisionCard,
    #[serde(default)]
    pub kind: EventKind,
    pub trigger: Trigger,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_event: Option<VisualEvent>,
}

impl DriftEvent {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.card.id
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON is invalid: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("catalog has no decision cards")]
    EmptyDeck,
    #[error("catalog id `{0}` is used more than once")]
    DuplicateId(String),
}

/// Ordered pools of decision cards and drift events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Catalog {
    pub cards: Vec<DecisionCard>,
    #[serde(default)]
    pub drift_events: Vec<DriftEvent>,
}

impl Catalog {
    /// Build and validate a catalog from in-memory entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the deck is empty or an id repeats.
    pub fn new(cards: Vec<DecisionCard>, drift_events: Vec<DriftEvent>) -> Result<Self, CatalogError> {
        let catalog = Self {
            cards,
            drift_events,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse and validate catalog JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, the deck is empty, or an id repeats.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// The shipped catalog, parsed once per process.
    ///
    /// # Panics
    ///
    /// Panics if the embedded asset is invalid, which is a build defect.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            let catalog = Self::from_json(include_str!("../assets/catalog.json"))
                .expect("valid built-in catalog");
            for (id, key) in catalog.ignored_keys() {
                log::warn!("catalog entry `{id}` carries unknown impact key `{key}`; it will be ignored");
            }
            catalog
        })
    }

    /// Check structural rules the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns an error if the deck is empty or an id repeats.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.cards.is_empty() {
            return Err(CatalogError::EmptyDeck);
        }
        let mut seen = HashSet::new();
        let ids = self
            .cards
            .iter()
            .map(|card| card.id.as_str())
            .chain(self.drift_events.iter().map(DriftEvent::id));
        for id in ids {
            if !seen.insert(id) {
                return Err(CatalogError::DuplicateId(id.to_string()));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn card(&self, id: &str) -> Option<&DecisionCard> {
        self.cards.iter().find(|card| card.id == id)
    }

    #[must_use]
    pub fn drift_event(&self, id: &str) -> Option<&DriftEvent> {
        self.drift_events.iter().find(|event| event.id() == id)
    }

    /// `(entry id, key)` for every impact or weight key the lenient merge dropped.
    #[must_use]
    pub fn ignored_keys(&self) -> Vec<(String, String)> {
        self.cards
            .iter()
            .chain(self.drift_events.iter().map(|event| &event.card))
            .flat_map(|card| {
                [&card.choice_a, &card.choice_b]
                    .into_iter()
                    .flat_map(|choice| {
                        choice
                            .impact
                            .ignored()
                            .iter()
                            .chain(choice.weight_mod.ignored())
                    })
                    .map(|(key, _)| (card.id.clone(), key.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Source of catalog content; platform layers provide their own.
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the catalog the engine should play with.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_catalog(&self) -> Result<Catalog, Self::Error>;
}

/// Loader for the catalog embedded in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalog;

impl CatalogLoader for BuiltinCatalog {
    type Error = Infallible;

    fn load_catalog(&self) -> Result<Catalog, Self::Error> {
        Ok(Catalog::builtin().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINI: &str = r#"{
        "cards": [
            {
                "id": "grid",
                "title": "Grid Overload",
                "description": "The grid is melting.",
                "choice_a": {
                    "label": "Emergency Coal",
                    "impact": {"economy": 5, "environment": -15},
                    "weight_mod": {"climate_risk": 20}
                },
                "choice_b": {
                    "label": "Rolling Blackouts",
                    "impact": {"economy": -10, "luck": 3}
                }
            }
        ],
        "drift_events": [
            {
                "id": "storm",
                "title": "Chronal Storm",
                "description": "Snow in July.",
                "kind": "drift",
                "trigger": {"threshold": {"weight": "climate_risk", "at_least": 45}},
                "visual_event": "acid_rain",
                "choice_a": {"label": "Anchor", "impact": {"economy": -25}},
                "choice_b": {"label": "Adapt", "impact": {"trust": -20}}
            },
            {
                "id": "theocracy",
                "title": "Algorithmic Theocracy",
                "description": "The code is holy.",
                "trigger": {"conditions": {"economy": {"min": 90}, "trust": {"max": 25}}},
                "choice_a": {"label": "Decompile"},
                "choice_b": {"label": "Join"}
            }
        ]
    }"#;

    #[test]
    fn parses_cards_and_both_trigger_shapes() {
        let catalog = Catalog::from_json(MINI).unwrap();
        assert_eq!(catalog.cards.len(), 1);
        let grid = catalog.card("grid").unwrap();
        assert_eq!(grid.choice(ChoiceSide::A).impact.get(Metric::Environment), Some(-15));
        assert_eq!(
            grid.choice(ChoiceSide::A).weight_mod.get(HiddenWeight::ClimateRisk),
            Some(20)
        );

        let storm = catalog.drift_event("storm").unwrap();
        assert_eq!(storm.visual_event, Some(VisualEvent::AcidRain));
        assert_eq!(
            storm.trigger,
            Trigger::Threshold {
                weight: HiddenWeight::ClimateRisk,
                at_least: 45
            }
        );

        let theocracy = catalog.drift_event("theocracy").unwrap();
        assert_eq!(theocracy.kind, EventKind::Drift);
        let Trigger::Conditions(conditions) = &theocracy.trigger else {
            panic!("expected condition trigger");
        };
        assert_eq!(conditions[&Metric::Economy].min, Some(90));
        assert_eq!(conditions[&Metric::Trust].max, Some(25));
        assert!(theocracy.card.choice_a.impact.is_empty());
    }

    #[test]
    fn reports_ignored_keys() {
        let catalog = Catalog::from_json(MINI).unwrap();
        assert_eq!(
            catalog.ignored_keys(),
            vec![("grid".to_string(), "luck".to_string())]
        );
    }

    #[test]
    fn rejects_duplicates_and_empty_decks() {
        let catalog = Catalog::from_json(MINI).unwrap();
        let mut cards = catalog.cards.clone();
        cards.push(cards[0].clone());
        assert!(matches!(
            Catalog::new(cards, Vec::new()),
            Err(CatalogError::DuplicateId(id)) if id == "grid"
        ));
        assert!(matches!(
            Catalog::new(Vec::new(), catalog.drift_events),
            Err(CatalogError::EmptyDeck)
        ));
        assert!(matches!(
            Catalog::from_json("{\"cards\": 3}"),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn bounds_treat_missing_sides_as_open() {
        let open = MetricBounds::default();
        assert!(open.contains(0) && open.contains(100));
        let band = MetricBounds {
            min: Some(10),
            max: Some(20),
        };
        assert!(band.contains(10) && band.contains(20));
        assert!(!band.contains(9) && !band.contains(21));
    }

    #[test]
    fn builtin_catalog_matches_shipped_content() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.cards.len(), 29);
        assert_eq!(catalog.drift_events.len(), 13);
        assert_eq!(catalog.drift_events[0].id(), "drift_chronal");
        assert_eq!(catalog.drift_events[12].id(), "event_heatwave");
        assert_eq!(
            catalog.ignored_keys(),
            vec![("corp_coin".to_string(), "economy".to_string())]
        );
        let loaded = BuiltinCatalog.load_catalog().unwrap();
        assert_eq!(&loaded, catalog);
    }
}
