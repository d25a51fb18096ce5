mod logic;
mod util;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use driftline_game::{Catalog, EngineConfig, ResultConfig};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use logic::{
    BalanceTester, GameplayStrategy, SimulationConfig, StrategyReport, resolve_seed_inputs,
    resolve_strategies,
};
use util::{load_json, read_text, split_csv};

#[derive(Debug, Parser)]
#[command(name = "driftline-tester", version)]
#[command(about = "Automated balance and invariant runs for the Driftline simulation engine")]
struct Args {
    /// Seeds to run (comma-separated integers or ranges such as 1..50)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Runs per seed; iteration i plays seed + i
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Strategies to run (comma-separated, or "all")
    #[arg(long, default_value = "all")]
    strategies: String,

    /// List all available strategies and exit
    #[arg(long)]
    list_strategies: bool,

    /// Stop a run after this many decisions
    #[arg(long, default_value_t = 500)]
    max_turns: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Catalog JSON to play instead of the built-in one
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Engine tuning overrides (JSON)
    #[arg(long)]
    engine_config: Option<PathBuf>,

    /// Scoring overrides (JSON)
    #[arg(long)]
    result_config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_strategies(&args)? {
        return Ok(());
    }

    announce_banner();

    let start_time = Instant::now();
    let seeds = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let strategies = resolve_strategies(&split_csv(&args.strategies))?;
    let custom_catalog = args.catalog.as_deref().map(load_catalog).transpose()?;
    let catalog = custom_catalog.as_ref().unwrap_or_else(|| Catalog::builtin());
    let config = build_simulation_config(&args)?;

    let tester = BalanceTester::new(catalog, config, args.verbose);
    let reports = strategies
        .iter()
        .map(|strategy| tester.run_strategy(*strategy, &seeds, args.iterations))
        .collect::<Result<Vec<_>>>()?;

    write_reports(&args, &reports, start_time)?;

    if reports.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_strategies(args: &Args) -> Result<bool> {
    if !args.list_strategies {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available strategies:")?;
    for strategy in GameplayStrategy::ALL {
        writeln!(
            output_target.writer(),
            "  {:12} - {}",
            strategy.key(),
            strategy.description()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn announce_banner() {
    println!("{}", "🌀 Driftline Balance Tester".bright_cyan().bold());
    println!("{}", "===========================".cyan());
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    let text = read_text(path)?;
    let catalog = Catalog::from_json(&text)
        .with_context(|| format!("invalid catalog {}", path.display()))?;
    for (id, key) in catalog.ignored_keys() {
        log::warn!("catalog entry `{id}` carries unknown impact key `{key}`; it will be ignored");
    }
    Ok(catalog)
}

fn build_simulation_config(args: &Args) -> Result<SimulationConfig> {
    let engine = match &args.engine_config {
        Some(path) => load_json::<EngineConfig>(path)?,
        None => EngineConfig::default(),
    };
    engine
        .validate()
        .context("engine config failed validation")?;
    let results = match &args.result_config {
        Some(path) => load_json::<ResultConfig>(path)?,
        None => ResultConfig::default(),
    };
    Ok(SimulationConfig {
        engine,
        results,
        max_turns: args.max_turns,
    })
}

fn write_reports(args: &Args, reports: &[StrategyReport], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(output_target.writer(), reports)?,
        "markdown" => logic::reports::generate_markdown_report(output_target.writer(), reports)?,
        _ => logic::reports::generate_console_report(
            output_target.writer(),
            reports,
            start_time.elapsed(),
        )?,
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            seeds: "1337".to_string(),
            iterations: 1,
            strategies: "all".to_string(),
            list_strategies: false,
            max_turns: 500,
            report: "console".to_string(),
            output: None,
            catalog: None,
            engine_config: None,
            result_config: None,
            verbose: false,
        }
    }

    #[test]
    fn cli_parses_documented_flags() {
        let args = Args::try_parse_from([
            "driftline-tester",
            "--seeds",
            "1..5,9",
            "--strategies",
            "greedy,steward",
            "--report",
            "markdown",
            "--max-turns",
            "40",
            "--engine-config",
            "engine.json",
        ])
        .unwrap();
        assert_eq!(args.seeds, "1..5,9");
        assert_eq!(args.max_turns, 40);
        assert_eq!(args.report, "markdown");
        assert_eq!(args.engine_config, Some(PathBuf::from("engine.json")));
        assert!(Args::try_parse_from(["driftline-tester", "--report", "csv"]).is_err());
    }

    #[test]
    fn invalid_engine_config_is_rejected() {
        let path = std::env::temp_dir().join(format!("driftline-engine-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"drift_chance": 2.0}"#).unwrap();
        let args = Args {
            engine_config: Some(path.clone()),
            ..base_args()
        };
        let err = build_simulation_config(&args).unwrap_err();
        assert!(format!("{err:#}").contains("drift_chance"));
        let _ = std::fs::remove_file(path);

        let config = build_simulation_config(&base_args()).unwrap();
        assert_eq!(config.max_turns, 500);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn custom_catalog_loads_and_validates() {
        let dir = std::env::temp_dir().join(format!("driftline-catalog-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let good = dir.join("good.json");
        std::fs::write(
            &good,
            r#"{"cards": [{"id": "c", "title": "C", "description": "",
                "choice_a": {"label": "a"}, "choice_b": {"label": "b"}}]}"#,
        )
        .unwrap();
        assert_eq!(load_catalog(&good).unwrap().cards.len(), 1);

        let empty = dir.join("empty.json");
        std::fs::write(&empty, r#"{"cards": []}"#).unwrap();
        let err = load_catalog(&empty).unwrap_err();
        assert!(format!("{err:#}").contains("no decision cards"));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn file_output_target_writes() {
        let path = std::env::temp_dir().join(format!("driftline-out-{}.txt", std::process::id()));
        let mut target = OutputTarget::new(Some(path.clone())).unwrap();
        writeln!(target.writer(), "hello").unwrap();
        target.flush_inner().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello\n");
        let _ = std::fs::remove_file(path);
    }
}
