use std::hash::Hasher;

use driftline_game::{
    BuiltinCatalog, Catalog, CatalogLoader, ChoiceSide, Engine, EngineConfig, Metrics, RngStreams,
    RunSummary, Session, TurnPrompt, TurnRecord,
};
use twox_hash::XxHash64;

const MAX_TURNS: usize = 400;

fn history_hash(history: &[TurnRecord]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(serde_json::to_string(history).unwrap().as_bytes());
    hasher.finish()
}

fn assert_in_range(metrics: &Metrics) {
    for (metric, value) in metrics.iter() {
        assert!((0..=100).contains(&value), "{metric} out of range: {value}");
    }
}

/// Plays until collapse, alternating sides by turn parity.
fn play(session: &mut Session<'_>) -> RunSummary {
    for turn in 0..MAX_TURNS {
        match session.next_turn().unwrap() {
            TurnPrompt::GameOver(summary) => return summary,
            TurnPrompt::Decide(_) => {
                let side = if turn % 2 == 0 { ChoiceSide::A } else { ChoiceSide::B };
                let metrics = session.choose(side).unwrap();
                assert_in_range(&metrics);
            }
        }
    }
    panic!("run did not end within {MAX_TURNS} turns");
}

#[test]
fn seeded_runs_replay_exactly() {
    let catalog = Catalog::builtin();
    for seed in [1_u64, 1337, 0xDEAD_BEEF] {
        let mut first = Session::new(Engine::seeded(catalog, seed).unwrap());
        let mut second = Session::new(Engine::seeded(catalog, seed).unwrap());
        let a = play(&mut first);
        let b = play(&mut second);
        assert_eq!(a, b, "seed {seed}");
        assert_eq!(
            history_hash(first.history()),
            history_hash(second.history()),
            "seed {seed}"
        );
    }
}

#[test]
fn campaign_records_a_consistent_path() {
    let catalog = Catalog::builtin();
    let mut session = Session::new(Engine::seeded(catalog, 0x00C0_FFEE).unwrap());
    let summary = play(&mut session);
    let history = session.history();

    assert!(summary.collapsed.is_some());
    assert!(summary.reason.as_deref().unwrap().starts_with("Critical Failure: "));
    assert_eq!(summary.turns as usize, history.len());
    assert_eq!(summary.final_year, 2030 + i32::try_from(history.len()).unwrap());
    assert_eq!(summary.years_survived, summary.final_year - 2024);

    let mut previous_drift = false;
    for (index, record) in history.iter().enumerate() {
        assert_eq!(record.year, 2030 + i32::try_from(index).unwrap());
        if record.drift {
            assert!(!previous_drift, "back-to-back drift at {}", record.year);
            assert!(catalog.drift_event(&record.card_id).is_some());
        } else {
            assert!(catalog.card(&record.card_id).is_some());
            assert!(record.visual_event.is_none());
        }
        previous_drift = record.drift;
    }
    let drift_turns = history.iter().filter(|record| record.drift).count();
    assert_eq!(summary.drift_events as usize, drift_turns);
}

#[test]
fn restart_begins_a_fresh_run_on_the_same_streams() {
    let catalog = Catalog::builtin();
    let mut session = Session::new(Engine::seeded(catalog, 7).unwrap());
    play(&mut session);
    session.restart();

    assert!(session.history().is_empty());
    assert_eq!(session.engine().year(), 2030);
    assert_eq!(session.engine().metrics(), Metrics::uniform(60));
    let summary = play(&mut session);
    assert!(summary.turns > 0);
}

#[test]
fn custom_streams_and_loader_share_the_engine_api() {
    let catalog = BuiltinCatalog.load_catalog().unwrap();
    let config = EngineConfig {
        drift_chance: 1.0,
        ..EngineConfig::default()
    };
    let engine = Engine::new(&catalog, config, RngStreams::from_user_seed(5)).unwrap();
    let mut session = Session::new(engine);
    let summary = play(&mut session);
    assert_eq!(summary.metrics, session.engine().metrics());
    assert!(session.engine().streams().draws() > 0);
}
