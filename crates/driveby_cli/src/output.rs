use anyhow::{Context, Result};
use colored::*;
use driveby_core::{
    FunctionalPhase, PerformancePhase, PerformanceResult, RuleDetail, RuleResult, Severity,
    ValidationReport,
};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const JSON_REPORT_FILE: &str = "validation-report.json";
pub const MARKDOWN_REPORT_FILE: &str = "validation-report.md";

pub fn print_validation_report(report: &ValidationReport, format: &str) -> Result<()> {
    match format {
        "json" => print_json_report(report)?,
        "markdown" | "md" => print!("{}", render_markdown(report)),
        _ => print_text_report(report),
    }
    Ok(())
}

/// Writes the JSON and Markdown renderings into `dir`, creating it if needed.
pub fn save_report(report: &ValidationReport, dir: &Path) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let json_path = dir.join(JSON_REPORT_FILE);
    fs::write(&json_path, render_json(report)?)
        .with_context(|| format!("Failed to write to file: {}", json_path.display()))?;

    let markdown_path = dir.join(MARKDOWN_REPORT_FILE);
    fs::write(&markdown_path, render_markdown(report))
        .with_context(|| format!("Failed to write to file: {}", markdown_path.display()))?;

    Ok((json_path, markdown_path))
}

fn ms(duration: Duration) -> String {
    format!("{:.1}ms", duration.as_secs_f64() * 1000.0)
}

fn severity_label(severity: Severity) -> ColoredString {
    match severity {
        Severity::Critical => "critical".red(),
        Severity::Warning => "warning".yellow(),
        Severity::Info => "info".blue(),
    }
}

fn print_text_report(report: &ValidationReport) {
    println!("\n{}", "═".repeat(60));
    println!("{}", "  VALIDATION REPORT".bold());
    println!("{}", "═".repeat(60));

    println!(
        "\n{} v{} ({})",
        report.title.bold(),
        report.version,
        report.source
    );
    println!("Final state: {}", report.final_state);

    println!("\n{}", "Checks:".bold());
    for check in report.all_checks() {
        print_check(&check);
    }

    if !report.auto_fixes.is_empty() {
        println!("\n{}", "Auto-fixes:".bold());
        for fix in &report.auto_fixes {
            if fix.success {
                println!("  {} {}: {}", "✓".green(), fix.rule_id, fix.message);
                for change in &fix.changes {
                    println!("      - {}", change);
                }
            } else {
                println!(
                    "  {} {}: {} ({})",
                    "✗".red(),
                    fix.rule_id,
                    fix.message,
                    fix.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    println!("\n{}", "Functional testing:".bold());
    match &report.functional {
        FunctionalPhase::Ran { outcomes, stats } => {
            for outcome in outcomes {
                let status = outcome
                    .status_code
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let label = if outcome.outcome == driveby_core::Outcome::Success {
                    outcome.outcome.to_string().green()
                } else {
                    outcome.outcome.to_string().red()
                };
                println!(
                    "  {:<7} {:<40} {:<13} {:>4} {:>10}",
                    outcome.method.to_string(),
                    outcome.path,
                    label,
                    status,
                    ms(outcome.latency)
                );
                for error in &outcome.errors {
                    println!("      {}", error.dimmed());
                }
            }
            println!(
                "  {} tested, latency min {} / avg {} / max {}",
                stats.tested,
                ms(stats.min_latency),
                ms(stats.avg_latency),
                ms(stats.max_latency)
            );
        }
        FunctionalPhase::NotRun { reason } => println!("  Not run: {}", reason),
    }

    println!("\n{}", "Performance testing:".bold());
    match &report.performance {
        PerformancePhase::Ran(result) => print_performance(result),
        PerformancePhase::Skipped { reason } => println!("  Skipped: {}", reason),
    }

    let summary = &report.summary;
    println!("\n{}", "Summary:".bold());
    println!(
        "  Checks:   {} total, {} passed, {} failed",
        summary.total_checks, summary.passed_checks, summary.failed_checks
    );
    println!(
        "  Failing:  {} critical, {} warning(s), {} info",
        summary.critical_issues, summary.warnings, summary.info
    );
    if !summary.failing_categories.is_empty() {
        println!("  Categories needing work: {}", summary.failing_categories.join(", "));
    }

    if report.is_failure() {
        println!(
            "\n{} {}",
            "✗".red().bold(),
            "Validation FAILED".red().bold()
        );
    } else {
        println!(
            "\n{} {}",
            "✓".green().bold(),
            "Validation PASSED".green().bold()
        );
    }
    println!("{}", "═".repeat(60));
}

fn print_check(check: &RuleResult) {
    let fixed = if check.fixed { " (auto-fixed)" } else { "" };
    if check.passed {
        println!(
            "  {} {} {}{}",
            "✓".green().bold(),
            check.check.id,
            check.check.name,
            fixed.cyan()
        );
    } else {
        println!(
            "  {} {} {} [{}]: {}",
            "✗".red().bold(),
            check.check.id,
            check.check.name,
            severity_label(check.check.severity),
            check.message
        );
    }

    for offender in check.detail.offenders() {
        println!("      - {}", offender);
    }
    if let RuleDetail::Error(error) = &check.detail {
        println!("      - {}", error.red());
    }
    for note in &check.notes {
        println!("      {} {}", "note:".blue(), note);
    }
    if !check.passed {
        if let Some(fix) = &check.suggested_fix {
            println!("      {} {}", "fix:".cyan(), fix);
        }
    }
}

fn print_performance(result: &PerformanceResult) {
    let metrics = &result.metrics;
    println!("  Targets:      {}", result.targets);
    println!(
        "  Requests:     {} ({} ok, {} errors)",
        metrics.total_requests, metrics.success_count, metrics.error_count
    );
    println!("  Success rate: {:.2}%", metrics.success_rate() * 100.0);
    println!(
        "  Latency:      p50 {} / p95 {} / p99 {} / max {}",
        ms(metrics.latency_p50),
        ms(metrics.latency_p95),
        ms(metrics.latency_p99),
        ms(metrics.latency_max)
    );
    println!("  Throughput:   {:.1} req/s", metrics.throughput);
    if metrics.cancelled {
        println!("  {}", "Cut short by cancellation".yellow());
    }
    for violation in &result.evaluation.violations {
        println!("  {} {}", "✗".red(), violation);
    }
}

fn render_json(report: &ValidationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")
}

fn print_json_report(report: &ValidationReport) -> Result<()> {
    println!("{}", render_json(report)?);
    Ok(())
}

/// Escapes a value for use inside a Markdown table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

pub fn render_markdown(report: &ValidationReport) -> String {
    let mut md = String::new();
    let summary = &report.summary;

    // Writing to a String cannot fail
    let _ = writeln!(md, "# Validation Report: {} v{}\n", report.title, report.version);
    let _ = writeln!(md, "- **Source:** {}", report.source);
    let _ = writeln!(md, "- **Started:** {}", report.started_at.to_rfc3339());
    let _ = writeln!(md, "- **Finished:** {}", report.finished_at.to_rfc3339());
    let _ = writeln!(md, "- **Final state:** {}", report.final_state);
    let _ = writeln!(
        md,
        "- **Result:** {}\n",
        if report.is_failure() { "FAILED" } else { "PASSED" }
    );

    let _ = writeln!(md, "## Summary\n");
    let _ = writeln!(md, "| Checks | Passed | Failed | Critical | Warnings | Info |");
    let _ = writeln!(md, "|---|---|---|---|---|---|");
    let _ = writeln!(
        md,
        "| {} | {} | {} | {} | {} | {} |\n",
        summary.total_checks,
        summary.passed_checks,
        summary.failed_checks,
        summary.critical_issues,
        summary.warnings,
        summary.info
    );

    let checks = report.all_checks();
    let _ = writeln!(md, "## Checks\n");
    let _ = writeln!(md, "| ID | Name | Category | Severity | Status | Message |");
    let _ = writeln!(md, "|---|---|---|---|---|---|");
    for check in &checks {
        let status = match (check.passed, check.fixed) {
            (true, true) => "✅ fixed",
            (true, false) => "✅ pass",
            (false, _) => "❌ fail",
        };
        let _ = writeln!(
            md,
            "| {} | {} | {} | {} | {} | {} |",
            check.check.id,
            cell(&check.check.name),
            cell(&check.check.category),
            check.check.severity,
            status,
            cell(&check.message)
        );
    }
    md.push('\n');

    for check in checks.iter().filter(|check| !check.passed) {
        let _ = writeln!(md, "### {} {}\n", check.check.id, check.check.name);
        for offender in check.detail.offenders() {
            let _ = writeln!(md, "- {}", offender);
        }
        if let RuleDetail::Error(error) = &check.detail {
            let _ = writeln!(md, "- Error: {}", error);
        }
        for note in &check.notes {
            let _ = writeln!(md, "- _Note:_ {}", note);
        }
        if let Some(fix) = &check.suggested_fix {
            let _ = writeln!(md, "\n**Suggested fix:** {}", fix);
        }
        md.push('\n');
    }

    if !report.auto_fixes.is_empty() {
        let _ = writeln!(md, "## Auto-fixes\n");
        for fix in &report.auto_fixes {
            let mark = if fix.success { "✅" } else { "❌" };
            let _ = writeln!(md, "- {} **{}**: {}", mark, fix.rule_id, fix.message);
            for change in &fix.changes {
                let _ = writeln!(md, "  - {}", change);
            }
            if let Some(error) = &fix.error {
                let _ = writeln!(md, "  - Error: {}", error);
            }
        }
        md.push('\n');
    }

    let _ = writeln!(md, "## Functional Testing\n");
    match &report.functional {
        FunctionalPhase::Ran { outcomes, .. } => {
            let _ = writeln!(md, "| Method | Path | Outcome | Status | Latency |");
            let _ = writeln!(md, "|---|---|---|---|---|");
            for outcome in outcomes {
                let status = outcome
                    .status_code
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let _ = writeln!(
                    md,
                    "| {} | `{}` | {} | {} | {} |",
                    outcome.method,
                    outcome.path,
                    outcome.outcome,
                    status,
                    ms(outcome.latency)
                );
            }
        }
        FunctionalPhase::NotRun { reason } => {
            let _ = writeln!(md, "_Not run: {}_", reason);
        }
    }
    md.push('\n');

    let _ = writeln!(md, "## Performance Testing\n");
    match &report.performance {
        PerformancePhase::Ran(result) => {
            let metrics = &result.metrics;
            let _ = writeln!(md, "| Metric | Value |");
            let _ = writeln!(md, "|---|---|");
            let _ = writeln!(md, "| Targets | {} |", result.targets);
            let _ = writeln!(md, "| Requests | {} |", metrics.total_requests);
            let _ = writeln!(md, "| Success rate | {:.2}% |", metrics.success_rate() * 100.0);
            let _ = writeln!(md, "| p50 latency | {} |", ms(metrics.latency_p50));
            let _ = writeln!(md, "| p95 latency | {} |", ms(metrics.latency_p95));
            let _ = writeln!(md, "| p99 latency | {} |", ms(metrics.latency_p99));
            let _ = writeln!(md, "| Throughput | {:.1} req/s |", metrics.throughput);
            for violation in &result.evaluation.violations {
                let _ = writeln!(md, "\n- ❌ {}", violation);
            }
        }
        PerformancePhase::Skipped { reason } => {
            let _ = writeln!(md, "_Skipped: {}_", reason);
        }
    }

    md
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}
