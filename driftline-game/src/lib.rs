//! Driftline Game Engine
//!
//! Platform-agnostic core for Driftline, a narrative decision game about
//! steering a society through the decades. This crate holds the content
//! catalog, the turn simulation and scoring without UI or platform
//! dependencies.

pub mod channels;
pub mod config;
pub mod constants;
pub mod data;
pub mod drift;
pub mod engine;
pub mod numbers;
pub mod result;
pub mod rng;
pub mod session;
pub mod state;

// Re-export commonly used types
pub use channels::{Channel, Deltas, HiddenWeight, Metric};
pub use config::{ConfigError, EngineConfig};
pub use data::{
    BuiltinCatalog, Catalog, CatalogError, CatalogLoader, Choice, ChoiceSide, DecisionCard,
    DriftEvent, EventKind, MetricBounds, Trigger, VisualEvent,
};
pub use drift::{eligible_events, first_eligible};
pub use engine::{Engine, EngineError, TurnStatus};
pub use result::{ResultConfig, RunSummary, collapse_reason, score_run, years_survived};
pub use rng::{CountingRng, RngStreams, ScriptedRng, StreamRng};
pub use session::{Presented, Session, SessionError, TurnPrompt, TurnRecord};
pub use state::{GameState, HiddenWeights, Metrics};
