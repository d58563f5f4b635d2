//! Bebop scenario simulator.
//!
//! Loads a page scenario, runs it through the bootstrap queue against an
//! in-memory ad tag and reports every call the page caused.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use error_stack::{Report, ResultExt};

mod error;
mod runner;
mod scenario;

use error::SimError;
use runner::{run_scenario, Outcome};
use scenario::Scenario;

#[derive(Parser)]
#[command(name = "bebop-sim")]
#[command(about = "Runs an ad slot scenario against an in-memory ad tag")]
#[command(version)]
struct Cli {
    /// Path to the TOML scenario file
    #[arg(long, short, env = "BEBOP_SCENARIO")]
    file: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Ignore `BEBOP__` environment overrides
    #[arg(long)]
    ignore_env: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum, Debug)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logger(if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });

    if let Err(report) = run(&cli) {
        log::error!("{report:?}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Report<SimError>> {
    let content = fs::read_to_string(&cli.file).change_context(SimError::Io {
        message: cli.file.display().to_string(),
    })?;
    log::debug!("Loading scenario from: {}", cli.file.display());

    let scenario = if cli.ignore_env {
        Scenario::from_file_only(&content)?
    } else {
        Scenario::from_toml(&content)?
    };
    let outcome = run_scenario(&scenario)?;

    let stdout = io::stdout();
    write_outcome(&mut stdout.lock(), &outcome, cli.format)
}

fn write_outcome(
    out: &mut impl Write,
    outcome: &Outcome,
    format: OutputFormat,
) -> Result<(), Report<SimError>> {
    let output_error = || SimError::Output {
        message: "Failed to write outcome".to_string(),
    };

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, outcome).change_context_lazy(output_error)?;
            writeln!(out).change_context_lazy(output_error)?;
        }
        OutputFormat::Text => {
            let category = outcome.category.as_deref().unwrap_or("none");
            writeln!(out, "category: {category}").change_context_lazy(output_error)?;
            for call in &outcome.calls {
                let line = serde_json::to_string(call).change_context_lazy(output_error)?;
                writeln!(out, "tag       {line}").change_context_lazy(output_error)?;
            }
            for call in &outcome.headertag_calls {
                let line = serde_json::to_string(call).change_context_lazy(output_error)?;
                writeln!(out, "headertag {line}").change_context_lazy(output_error)?;
            }
            for slot in &outcome.slots {
                let sizes: Vec<String> = slot.sizes.iter().map(ToString::to_string).collect();
                writeln!(
                    out,
                    "slot {} ({}): active={} defined={} sizes=[{}]",
                    slot.div_id,
                    slot.ad_unit_path,
                    slot.active,
                    slot.defined,
                    sizes.join(", ")
                )
                .change_context_lazy(output_error)?;
            }
            for failure in &outcome.failures {
                writeln!(out, "failure: {failure}").change_context_lazy(output_error)?;
            }
        }
    }
    Ok(())
}

fn init_logger(level: log::LevelFilter) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()
        .expect("Failed to initialize logger");
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = include_str!("../scenarios/homepage.toml");

    #[test]
    fn test_cli_parses_arguments() {
        let cli = Cli::try_parse_from(["bebop-sim", "--file", "page.toml", "--format", "json", "-v"])
            .expect("should parse arguments");
        assert_eq!(cli.file, PathBuf::from("page.toml"));
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(cli.verbose);
        assert!(!cli.ignore_env);
    }

    #[test]
    fn test_sample_scenario_runs_cleanly() {
        let scenario = Scenario::from_file_only(SCENARIO).expect("should parse sample scenario");
        let outcome = run_scenario(&scenario).expect("should run sample scenario");
        assert!(
            outcome.failures.is_empty(),
            "should not fail: {:?}",
            outcome.failures
        );
        assert!(!outcome.calls.is_empty());
    }

    #[test]
    fn test_text_output_lists_calls_and_slots() {
        let scenario = Scenario::from_file_only(SCENARIO).expect("should parse sample scenario");
        let outcome = run_scenario(&scenario).expect("should run sample scenario");

        let mut buffer = Vec::new();
        write_outcome(&mut buffer, &outcome, OutputFormat::Text).expect("should write outcome");
        let text = String::from_utf8(buffer).expect("should be utf-8");
        assert!(text.starts_with("category: "));
        assert!(text.contains(r#"tag       {"call":"define_slot""#));
        assert!(text.contains("slot leaderboard (/6355419/home/leaderboard)"));
    }

    #[test]
    fn test_json_output_is_parseable() {
        let scenario = Scenario::from_file_only(SCENARIO).expect("should parse sample scenario");
        let outcome = run_scenario(&scenario).expect("should run sample scenario");

        let mut buffer = Vec::new();
        write_outcome(&mut buffer, &outcome, OutputFormat::Json).expect("should write outcome");
        let value: serde_json::Value =
            serde_json::from_slice(&buffer).expect("should write valid JSON");
        assert!(value["calls"].is_array());
        assert_eq!(value["category"], "large");
    }
}
