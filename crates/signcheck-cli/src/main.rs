use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use signcheck_core::config::RulesConfig;
use signcheck_core::report::Status;
use signcheck_rules::{Validator, METHODS};

#[derive(Debug, Parser)]
#[command(name = "signcheck")]
#[command(about = "Structural validation for channel-letter sign artwork files.")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate an artwork file against the rules for a sign method.
    Validate {
        /// Input artwork file (.ai, .pdf, .eps, or .svg).
        input: PathBuf,
        /// Sign manufacturing method to validate against.
        #[arg(long)]
        method: String,
        /// JSON rules configuration; built-in defaults apply when omitted.
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Write the JSON report here instead of stdout.
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// List the sign methods this build can validate.
    Methods,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.cmd {
        Command::Validate { input, method, rules, report } => {
            validate(&input, &method, rules.as_deref(), report.as_deref())
        }
        Command::Methods => {
            for method in METHODS {
                println!("{method}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn validate(
    input: &Path,
    method: &str,
    rules: Option<&Path>,
    report: Option<&Path>,
) -> Result<ExitCode> {
    ensure_input_file(input)?;

    let config = match rules {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("read rules: {path:?}"))?;
            RulesConfig::from_json(&text).with_context(|| format!("parse rules: {path:?}"))?
        }
        None => RulesConfig::default(),
    };

    let validator = Validator::new(config);
    let result = validator.validate_file(input, method);

    let json = serde_json::to_string_pretty(&result).context("serialize report")?;
    if let Some(path) = report {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        std::fs::write(path, &json).with_context(|| format!("write report: {path:?}"))?;
    } else {
        println!("{json}");
    }

    eprintln!(
        "{}: {} ({} error(s), {} warning(s))",
        input.display(),
        status_word(result.status),
        result.error_count(),
        result.warning_count()
    );

    Ok(match result.status {
        Status::Passed | Status::Warning => ExitCode::SUCCESS,
        Status::Failed => ExitCode::from(1),
        Status::Error => ExitCode::from(2),
    })
}

fn status_word(status: Status) -> &'static str {
    match status {
        Status::Passed => "passed",
        Status::Warning => "passed with warnings",
        Status::Failed => "failed",
        Status::Error => "error",
    }
}

fn ensure_input_file(input: &Path) -> Result<()> {
    match std::fs::metadata(input) {
        Ok(meta) => {
            if meta.is_file() {
                Ok(())
            } else {
                bail!("input is not a file: {input:?}");
            }
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            bail!("input not found: {input:?} (cwd: {cwd:?}).");
        }
        Err(err) => Err(err).with_context(|| format!("stat input: {input:?}")),
    }
}
