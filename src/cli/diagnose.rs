//! Diagnose command - run diagnostics on a script or beat map

use super::{compendium_path, require_compendium, ProviderArgs};
use crate::compendium::load_compendium;
use crate::config::UserConfig;
use crate::context::DiagnosticContext;
use crate::diagnostics::{create_diagnostic_runner, percent, DiagnosticThresholds};
use crate::models::{DiagnosticIssue, DiagnosticReport, Severity};
use crate::parsers::load_input;
use crate::reporters::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// Issues printed per single-diagnostic run
const MAX_PRINTED_ISSUES: usize = 5;

#[derive(Subcommand, Debug)]
pub enum DiagnoseCommand {
    /// Run the full diagnostic battery
    #[command(after_help = "\
Examples:
  narratological diagnose all script.txt                      Text report
  narratological diagnose all beats.json --format markdown -o notes.md
  narratological diagnose all beats.json --study pixar        Only the pixar study
  narratological diagnose all beats.json --fail-on critical   Exit 1 on critical issues")]
    All {
        /// Script file or beat map JSON
        input: PathBuf,

        /// Output format: text, json, markdown (or md)
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json", "markdown", "md"])]
        format: String,

        /// Write the report to a file (or into a directory) instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Skip framework (study) diagnostics
        #[arg(long)]
        no_framework: bool,

        /// Studies to check (repeatable; default: pixar, bergman, tarantino)
        #[arg(long = "study")]
        studies: Vec<String>,

        /// Override the script title
        #[arg(long)]
        title: Option<String>,

        /// Exit with code 1 if issues at this severity or higher exist
        #[arg(long, value_parser = ["critical", "warning"])]
        fail_on: Option<String>,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Causal binding: BUT/THEREFORE versus AND THEN
    Causal {
        /// Script file or beat map JSON
        input: PathBuf,

        /// Causal binding ratio that counts as good
        #[arg(long, short = 't', default_value = "0.80")]
        target: f64,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Reorderability: could scenes be shuffled without consequence?
    Reorder {
        /// Script file or beat map JSON
        input: PathBuf,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Necessity: could any scene be cut without loss?
    Necessity {
        /// Script file or beat map JSON
        input: PathBuf,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Information economy: redundant exposition and missing setups (LLM)
    Economy {
        /// Script file or beat map JSON
        input: PathBuf,

        #[command(flatten)]
        provider: ProviderArgs,
    },

    /// Run one study's diagnostic questions
    Framework {
        /// Script file or beat map JSON
        input: PathBuf,

        /// Study to evaluate against
        study_id: String,

        #[command(flatten)]
        provider: ProviderArgs,
    },
}

pub fn run(command: DiagnoseCommand, compendium: Option<&Path>, config: &UserConfig) -> Result<()> {
    match command {
        DiagnoseCommand::All {
            input,
            format,
            output,
            no_framework,
            studies,
            title,
            fail_on,
            provider,
        } => run_all(
            &input,
            &format,
            output.as_deref(),
            !no_framework,
            studies,
            title.as_deref(),
            fail_on.as_deref(),
            &provider,
            compendium,
            config,
        ),
        DiagnoseCommand::Causal {
            input,
            target,
            provider,
        } => {
            let ctx = load_context(&input, None)?;
            let thresholds = DiagnosticThresholds {
                causal_binding_good: target,
                ..config.thresholds.clone()
            };
            let runner = create_diagnostic_runner(provider.build(config)?, None, Some(thresholds));
            println!(
                "\n{} target {} causal binding",
                style("Causal Binding").bold(),
                percent(target)
            );
            let (score, issues) = runner.run_causal(&ctx);
            print_result("Causal Binding", Some(score), &issues, true);
            println!("\n{}", style("Interpretation:").bold());
            println!("  {} contradiction or obstacle that changes direction", style("BUT").green());
            println!("  {} direct consequence of the previous action", style("THEREFORE").green());
            println!("  {} sequential but not causally connected", style("AND THEN").red());
            println!("  {} parallel action (valid for subplots)", style("MEANWHILE").yellow());
            Ok(())
        }
        DiagnoseCommand::Reorder { input, provider } => {
            let ctx = load_context(&input, None)?;
            let runner = create_diagnostic_runner(provider.build(config)?, None, Some(config.thresholds.clone()));
            let (score, issues) = runner.run_reorderability(&ctx);
            print_result("Reorderability", Some(score), &issues, false);
            println!("\n{}", style("Interpretation:").bold());
            println!("  Strong narratives have scenes that MUST be in order.");
            println!("  {} excellent, {} some loose scenes, {} weak causal structure",
                style("<15%").green(), style("15-30%").yellow(), style(">30%").red());
            Ok(())
        }
        DiagnoseCommand::Necessity { input, provider } => {
            let ctx = load_context(&input, None)?;
            let runner = create_diagnostic_runner(provider.build(config)?, None, Some(config.thresholds.clone()));
            let (score, issues) = runner.run_necessity(&ctx);
            print_result("Necessity", Some(score), &issues, true);
            println!("\n{}", style("Interpretation:").bold());
            println!("  Every scene should advance plot, character, or theme.");
            println!("  {} all scenes necessary, {} some could be cut, {} significant redundancy",
                style(">85%").green(), style("70-85%").yellow(), style("<70%").red());
            Ok(())
        }
        DiagnoseCommand::Economy { input, provider } => {
            let ctx = load_context(&input, None)?;
            let runner = create_diagnostic_runner(provider.build(config)?, None, Some(config.thresholds.clone()));
            let (score, issues) = runner.run_information_economy(&ctx);
            print_result("Information Economy", score, &issues, true);
            Ok(())
        }
        DiagnoseCommand::Framework {
            input,
            study_id,
            provider,
        } => run_framework(&input, &study_id, &provider, compendium, config),
    }
}

fn load_context(input: &Path, title: Option<&str>) -> Result<DiagnosticContext> {
    let (_, ctx) = load_input(input, title)?;
    if ctx.scenes().is_empty() {
        warn!("No scenes found in {}", input.display());
    }
    Ok(ctx)
}

#[allow(clippy::too_many_arguments)]
fn run_all(
    input: &Path,
    format: &str,
    output: Option<&Path>,
    include_framework: bool,
    studies: Vec<String>,
    title: Option<&str>,
    fail_on: Option<&str>,
    provider: &ProviderArgs,
    compendium: Option<&Path>,
    config: &UserConfig,
) -> Result<()> {
    let format: OutputFormat = format.parse()?;
    let ctx = load_context(input, title)?.with_active_studies(studies);

    let compendium = match compendium_path(compendium, config) {
        Some(path) if include_framework => Some(Arc::new(load_compendium(&path)?)),
        _ => None,
    };
    let runner = create_diagnostic_runner(
        provider.build(config)?,
        compendium,
        Some(config.thresholds.clone()),
    );

    let report = runner.run_all(&ctx, include_framework);
    let rendered = reporters::render(&report, format)?;

    match output {
        Some(output) => {
            let path = report_path(output, input, format);
            std::fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!(
                "{} Report written to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
        None => print!("{rendered}"),
    }

    check_fail_threshold(fail_on, &report);
    Ok(())
}

/// Where `-o` writes: a directory gets `<input stem>-report.<ext>`, a path
/// without an extension gets the format's extension
fn report_path(output: &Path, input: &Path, format: OutputFormat) -> PathBuf {
    let extension = reporters::file_extension(format);
    if output.is_dir() {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "narrative".to_string());
        output.join(format!("{stem}-report.{extension}"))
    } else if output.extension().is_none() {
        output.with_extension(extension)
    } else {
        output.to_path_buf()
    }
}

fn run_framework(
    input: &Path,
    study_id: &str,
    provider: &ProviderArgs,
    compendium: Option<&Path>,
    config: &UserConfig,
) -> Result<()> {
    let compendium = require_compendium(compendium, config)?;
    let study = super::studies::find_study(&compendium, study_id)?;

    println!(
        "\n{} {} - {} ({} diagnostic questions)",
        style(format!("Framework: {study_id}")).bold(),
        study.creator,
        study.work,
        study.diagnostic_questions.len()
    );
    for q in study.diagnostic_questions.iter().take(10) {
        println!("  {} {}", style(&q.id).cyan(), q.question);
    }

    let ctx = load_context(input, None)?.with_active_studies([study_id]);
    let runner = create_diagnostic_runner(
        provider.build(config)?,
        Some(Arc::new(compendium.clone())),
        Some(config.thresholds.clone()),
    );
    let issues = runner.run_framework(&ctx, &[study_id.to_string()]);

    println!("\n{}", style("Framework Analysis Results:").bold());
    if issues.is_empty() {
        println!("  {}", style("No issues found.").green());
    }
    for issue in &issues {
        print_issue(issue);
    }
    Ok(())
}

fn score_style(score: f64, higher_is_better: bool) -> console::StyledObject<String> {
    let text = format!("{:.1}%", score * 100.0);
    let (good, fair) = if higher_is_better {
        (score >= 0.80, score >= 0.60)
    } else {
        (score <= 0.15, score <= 0.30)
    };
    if good {
        style(text).green()
    } else if fair {
        style(text).yellow()
    } else {
        style(text).red()
    }
}

fn severity_style(severity: Severity) -> console::StyledObject<String> {
    let label = severity.to_string();
    match severity {
        Severity::Critical => style(label).red(),
        Severity::Warning => style(label).yellow(),
        Severity::Suggestion => style(label).cyan(),
        Severity::Info => style(label).dim(),
    }
}

fn print_issue(issue: &DiagnosticIssue) {
    println!("  {}: {}", severity_style(issue.severity), issue.description);
    if let Some(rec) = &issue.recommendation {
        println!("    {}", style(format!("Recommendation: {rec}")).dim());
    }
}

fn print_result(name: &str, score: Option<f64>, issues: &[DiagnosticIssue], higher_is_better: bool) {
    match score {
        Some(score) => println!(
            "\n{} {}",
            style(format!("{name}:")).bold(),
            score_style(score, higher_is_better)
        ),
        None => println!("\n{} {}", style(format!("{name}:")).bold(), style("unknown").dim()),
    }
    for issue in issues.iter().take(MAX_PRINTED_ISSUES) {
        print_issue(issue);
    }
    if issues.len() > MAX_PRINTED_ISSUES {
        println!(
            "  {}",
            style(format!("...and {} more", issues.len() - MAX_PRINTED_ISSUES)).dim()
        );
    }
}

/// Exit 1 when the report has issues at or above `fail_on`
fn check_fail_threshold(fail_on: Option<&str>, report: &DiagnosticReport) {
    if let Some(threshold) = fail_on {
        let should_fail = match threshold.to_lowercase().as_str() {
            "critical" => report.critical_count > 0,
            "warning" => report.critical_count > 0 || report.warning_count > 0,
            _ => false,
        };
        if should_fail {
            eprintln!("Failing due to --fail-on={} threshold", threshold);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_style_buckets() {
        // Colors are stripped when stdout is not a terminal, so only the text is checked
        assert!(score_style(0.9, true).to_string().contains("90.0%"));
        assert!(score_style(0.1, false).to_string().contains("10.0%"));
    }

    #[test]
    fn test_report_path_fills_in_name_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        let input = Path::new("drafts/beats.json");

        assert_eq!(
            report_path(dir.path(), input, OutputFormat::Markdown),
            dir.path().join("beats-report.md")
        );
        assert_eq!(
            report_path(&dir.path().join("notes"), input, OutputFormat::Text),
            dir.path().join("notes.txt")
        );
        assert_eq!(
            report_path(&dir.path().join("out.json"), input, OutputFormat::Markdown),
            dir.path().join("out.json")
        );
    }

    #[test]
    fn test_load_context_missing_file() {
        let err = load_context(Path::new("/definitely/not/here.json"), None).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
