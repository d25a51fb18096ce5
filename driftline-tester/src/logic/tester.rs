use anyhow::Result;
use colored::Colorize;
use driftline_game::Catalog;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{Playthrough, SimulationConfig, run_playthrough};

/// Aggregated balance statistics for one strategy across every seed and iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyReport {
    pub strategy: String,
    pub passed: bool,
    pub runs: usize,
    /// Runs that hit the turn limit instead of collapsing.
    pub survived_limit: usize,
    pub mean_years: f64,
    pub min_years: i32,
    pub max_years: i32,
    pub mean_score: f64,
    pub best_score: i32,
    pub drift_events_per_run: f64,
    /// Collapsed metric key to number of runs it ended.
    pub collapses: BTreeMap<String, usize>,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
}

impl StrategyReport {
    #[must_use]
    pub fn from_runs(
        strategy: GameplayStrategy,
        runs: &[Playthrough],
        durations: &[Duration],
    ) -> Self {
        let mut failures = Vec::new();
        let mut collapses = BTreeMap::new();
        for run in runs {
            if let Some(metric) = run.summary.collapsed {
                *collapses.entry(metric.to_string()).or_insert(0) += 1;
            }
            for violation in &run.violations {
                failures.push(format!(
                    "seed {} ({}): {violation} | {}",
                    run.seed,
                    run.strategy,
                    run.decision_tail()
                ));
            }
        }

        let years: Vec<i32> = runs.iter().map(|run| run.summary.years_survived).collect();
        let scores: Vec<i32> = runs.iter().map(|run| run.summary.score).collect();
        let drift_total: u32 = runs.iter().map(|run| run.summary.drift_events).sum();

        let average_duration = if durations.is_empty() {
            Duration::ZERO
        } else {
            durations.iter().sum::<Duration>() / u32::try_from(durations.len()).unwrap_or(1)
        };

        Self {
            strategy: strategy.label().to_string(),
            passed: failures.is_empty(),
            runs: runs.len(),
            survived_limit: runs.iter().filter(|run| !run.ended).count(),
            mean_years: driftline_game::numbers::mean_i32(&years),
            min_years: years.iter().copied().min().unwrap_or(0),
            max_years: years.iter().copied().max().unwrap_or(0),
            mean_score: driftline_game::numbers::mean_i32(&scores),
            best_score: scores.iter().copied().max().unwrap_or(0),
            drift_events_per_run: per_run(drift_total, runs.len()),
            collapses,
            failures,
            average_duration,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn per_run(total: u32, runs: usize) -> f64 {
    if runs == 0 {
        0.0
    } else {
        f64::from(total) / runs as f64
    }
}

/// Runs batches of seeded playthroughs over one catalog.
pub struct BalanceTester<'c> {
    catalog: &'c Catalog,
    config: SimulationConfig,
    verbose: bool,
}

impl<'c> BalanceTester<'c> {
    #[must_use]
    pub const fn new(catalog: &'c Catalog, config: SimulationConfig, verbose: bool) -> Self {
        Self {
            catalog,
            config,
            verbose,
        }
    }

    /// Play `iterations` runs per seed; iteration `i` uses `seed + i`.
    ///
    /// # Errors
    ///
    /// Returns an error if a playthrough cannot be set up.
    pub fn run_strategy(
        &self,
        strategy: GameplayStrategy,
        seeds: &[u64],
        iterations: usize,
    ) -> Result<StrategyReport> {
        if self.verbose {
            println!(
                "🧪 Testing strategy: {} ({} seeds x {iterations})",
                strategy.label().bright_white(),
                seeds.len()
            );
        }

        let mut runs = Vec::with_capacity(seeds.len() * iterations);
        let mut durations = Vec::with_capacity(seeds.len() * iterations);
        for &seed in seeds {
            for i in 0..iterations {
                let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
                let start_time = Instant::now();
                let run = run_playthrough(self.catalog, &self.config, strategy, iteration_seed)?;
                durations.push(start_time.elapsed());

                if self.verbose {
                    let status = if run.passed() {
                        "✅".to_string()
                    } else {
                        "❌".red().to_string()
                    };
                    println!(
                        "  {status} seed {iteration_seed}: {} years, score {}, {}",
                        run.summary.years_survived,
                        run.summary.score,
                        run.summary.reason.as_deref().unwrap_or("turn limit reached")
                    );
                }
                runs.push(run);
            }
        }

        Ok(StrategyReport::from_runs(strategy, &runs, &durations))
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}
