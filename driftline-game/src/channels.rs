//! Metric and hidden-weight channels plus the lenient delta maps keyed by them.
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Closed set of named channels a delta map can address.
pub trait Channel: Copy + Ord + fmt::Debug + 'static {
    /// Every channel in canonical order.
    const ALL: &'static [Self];

    /// Stable content key (`snake_case`).
    fn key(self) -> &'static str;

    /// Resolve a content key, `None` when the key names no channel.
    #[must_use]
    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|channel| channel.key() == key)
    }
}

/// Player-visible health channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Stability,
    Economy,
    Environment,
    Trust,
}

impl Channel for Metric {
    const ALL: &'static [Self] = &[
        Self::Stability,
        Self::Economy,
        Self::Environment,
        Self::Trust,
    ];

    fn key(self) -> &'static str {
        match self {
            Self::Stability => "stability",
            Self::Economy => "economy",
            Self::Environment => "environment",
            Self::Trust => "trust",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or(())
    }
}

/// Latent pressure accumulators the player never sees directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenWeight {
    ClimateRisk,
    TechDependency,
    SocialUnrest,
}

impl Channel for HiddenWeight {
    const ALL: &'static [Self] = &[Self::ClimateRisk, Self::TechDependency, Self::SocialUnrest];

    fn key(self) -> &'static str {
        match self {
            Self::ClimateRisk => "climate_risk",
            Self::TechDependency => "tech_dependency",
            Self::SocialUnrest => "social_unrest",
        }
    }
}

impl fmt::Display for HiddenWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for HiddenWeight {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or(())
    }
}

/// Raw entries whose keys named no channel; kept only for diagnostics.
pub type IgnoredDeltas = SmallVec<[(String, i32); 2]>;

/// Signed deltas keyed by channel.
///
/// Built leniently: keys that resolve to a channel land in the typed map,
/// anything else is parked in [`Deltas::ignored`] and never applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deltas<C: Channel> {
    known: BTreeMap<C, i32>,
    ignored: IgnoredDeltas,
}

impl<C: Channel> Default for Deltas<C> {
    fn default() -> Self {
        Self {
            known: BTreeMap::new(),
            ignored: IgnoredDeltas::new(),
        }
    }
}

impl<C: Channel> Deltas<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge raw `(key, delta)` pairs; a repeated key keeps the last value.
    #[must_use]
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, i32)>,
        K: AsRef<str>,
    {
        let mut deltas = Self::default();
        for (key, delta) in pairs {
            let key = key.as_ref();
            if let Some(channel) = C::from_key(key) {
                deltas.known.insert(channel, delta);
            } else if let Some(slot) = deltas.ignored.iter_mut().find(|(k, _)| k == key) {
                slot.1 = delta;
            } else {
                deltas.ignored.push((key.to_string(), delta));
            }
        }
        deltas
    }

    /// Builder-style insert for a typed channel.
    #[must_use]
    pub fn with(mut self, channel: C, delta: i32) -> Self {
        self.known.insert(channel, delta);
        self
    }

    #[must_use]
    pub fn get(&self, channel: C) -> Option<i32> {
        self.known.get(&channel).copied()
    }

    /// Recognised deltas in channel order.
    pub fn iter(&self) -> impl Iterator<Item = (C, i32)> + '_ {
        self.known.iter().map(|(channel, delta)| (*channel, *delta))
    }

    /// Entries dropped by the lenient merge.
    #[must_use]
    pub fn ignored(&self) -> &[(String, i32)] {
        &self.ignored
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Sum of all recognised deltas.
    #[must_use]
    pub fn net(&self) -> i32 {
        self.known.values().copied().sum()
    }
}

impl<C: Channel> Serialize for Deltas<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut raw: BTreeMap<&str, i32> = self
            .ignored
            .iter()
            .map(|(key, delta)| (key.as_str(), *delta))
            .collect();
        for (channel, delta) in &self.known {
            raw.insert(channel.key(), *delta);
        }
        raw.serialize(serializer)
    }
}

impl<'de, C: Channel> Deserialize<'de> for Deltas<C> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, i32>::deserialize(deserializer)?;
        Ok(Self::from_pairs(raw))
    }
}
