use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::StrategyReport;

fn format_collapses(report: &StrategyReport) -> String {
    if report.collapses.is_empty() {
        return "none".to_string();
    }
    report
        .collapses
        .iter()
        .map(|(metric, count)| format!("{metric} {count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn generate_console_report(
    out: &mut dyn Write,
    reports: &[StrategyReport],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Balance Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==========================".cyan())?;

    let total_runs: usize = reports.iter().map(|r| r.runs).sum();
    let failed = reports.iter().filter(|r| !r.passed).count();
    writeln!(out, "Strategies: {}", reports.len())?;
    writeln!(out, "Runs: {total_runs}")?;
    writeln!(out, "Failed strategies: {}", failed.to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for report in reports {
        let status = if report.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "{} {}", status, report.strategy.bold())?;
        writeln!(
            out,
            "   Years survived: mean {:.1} (min {}, max {})",
            report.mean_years, report.min_years, report.max_years
        )?;
        writeln!(
            out,
            "   Score: mean {:.1}, best {}",
            report.mean_score, report.best_score
        )?;
        writeln!(out, "   Drift events per run: {:.2}", report.drift_events_per_run)?;
        writeln!(out, "   Collapses: {}", format_collapses(report))?;
        if report.survived_limit > 0 {
            writeln!(
                out,
                "   Reached turn limit: {}",
                report.survived_limit.to_string().yellow()
            )?;
        }
        writeln!(out, "   Average time: {:?}", report.average_duration)?;

        if !report.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &report.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    if let Some(best) = reports
        .iter()
        .max_by(|a, b| a.mean_score.total_cmp(&b.mean_score))
    {
        writeln!(out, "{}", "🏆 Strongest Strategy".bright_yellow().bold())?;
        writeln!(out, "{}", "====================".yellow())?;
        writeln!(
            out,
            "{} ({:.1} mean score)",
            best.strategy.green(),
            best.mean_score
        )?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, reports: &[StrategyReport]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(reports)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, reports: &[StrategyReport]) -> Result<()> {
    writeln!(out, "# Driftline Balance Results\n")?;

    if reports.is_empty() {
        writeln!(out, "_No strategies executed._")?;
        return Ok(());
    }

    writeln!(
        out,
        "| Strategy | Status | Runs | Mean years | Min | Max | Mean score | Best | Drift/run |"
    )?;
    writeln!(out, "|---|---|---|---|---|---|---|---|---|")?;
    for report in reports {
        let status = if report.passed { "✅" } else { "❌" };
        writeln!(
            out,
            "| {} | {} | {} | {:.1} | {} | {} | {:.1} | {} | {:.2} |",
            report.strategy,
            status,
            report.runs,
            report.mean_years,
            report.min_years,
            report.max_years,
            report.mean_score,
            report.best_score,
            report.drift_events_per_run
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Collapses\n")?;
    for report in reports {
        writeln!(out, "- **{}**: {}", report.strategy, format_collapses(report))?;
    }

    let failing: Vec<&StrategyReport> = reports.iter().filter(|r| !r.passed).collect();
    if !failing.is_empty() {
        writeln!(out, "\n## Failures\n")?;
        for report in failing {
            writeln!(out, "### {}\n", report.strategy)?;
            for failure in &report.failures {
                writeln!(out, "- {failure}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::GameplayStrategy;

    fn sample(strategy: GameplayStrategy, failures: Vec<String>) -> StrategyReport {
        let mut report = StrategyReport::from_runs(strategy, &[], &[]);
        report.runs = 4;
        report.mean_score = 812.5;
        report.collapses.insert("economy".to_string(), 3);
        report.passed = failures.is_empty();
        report.failures = failures;
        report
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn markdown_lists_strategies_and_failures() {
        let reports = vec![
            sample(GameplayStrategy::Greedy, Vec::new()),
            sample(GameplayStrategy::Random, vec!["seed 4: bad".to_string()]),
        ];
        let text = render(|out| generate_markdown_report(out, &reports));
        assert!(text.contains("| Greedy | ✅ | 4 |"));
        assert!(text.contains("- **Random**: economy 3"));
        assert!(text.contains("## Failures"));
        assert!(text.contains("- seed 4: bad"));
    }

    #[test]
    fn json_is_an_array_of_reports() {
        let reports = vec![sample(GameplayStrategy::Steward, Vec::new())];
        let text = render(|out| generate_json_report(out, &reports));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["strategy"], "Steward");
        assert_eq!(value[0]["collapses"]["economy"], 3);
    }

    #[test]
    fn console_names_the_strongest_strategy() {
        let mut weak = sample(GameplayStrategy::Cautious, Vec::new());
        weak.mean_score = 100.0;
        let reports = vec![weak, sample(GameplayStrategy::Greedy, Vec::new())];
        let text = render(|out| generate_console_report(out, &reports, Duration::from_millis(5)));
        assert!(text.contains("Strongest Strategy"));
        assert!(text.contains("Greedy (812.5 mean score)"));
        assert!(text.contains("Collapses: economy 3"));
    }
}
