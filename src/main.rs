use anyhow::{Context, Result};
use clap::Parser;
use evidence_bundle::checklist::{self, policy_violations, render_markdown};
use evidence_bundle::{build, load_bundle_summary, verify};
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{BuildArgs, ChecklistArgs, Command, RootArgs, SummaryArgs, VerifyArgs};

fn main() -> ExitCode {
    init_tracing();
    let args = RootArgs::parse();

    let outcome = match args.command {
        Command::Build(args) => cmd_build(&args),
        Command::Verify(args) => cmd_verify(&args),
        Command::Summary(args) => cmd_summary(&args),
        Command::Checklist(args) => cmd_checklist(&args),
        Command::Templates => cmd_templates(),
    };
    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{text}");
    Ok(())
}

fn cmd_build(args: &BuildArgs) -> Result<ExitCode> {
    let manifest = build(&args.campaign_run, &args.output_dir, &args.to_options())?;
    print_json(&manifest)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_verify(args: &VerifyArgs) -> Result<ExitCode> {
    let result = verify(&args.bundle_dir);
    if args.json {
        print_json(&result)?;
    } else {
        println!("verify: {}", if result.ok { "ok" } else { "failed" });
        println!("checked_files: {}", result.checked_files);
        if !result.warnings.is_empty() {
            println!("warnings:");
            for warning in &result.warnings {
                println!("  - {warning}");
            }
        }
        if !result.errors.is_empty() {
            println!("errors:");
            for error in &result.errors {
                println!("  - {error}");
            }
        }
    }
    Ok(if result.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_summary(args: &SummaryArgs) -> Result<ExitCode> {
    let summary = load_bundle_summary(&args.bundle_dir)?;
    print_json(&summary)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_checklist(args: &ChecklistArgs) -> Result<ExitCode> {
    let report = checklist::evaluate(&args.bundle_dir, &args.template)?;
    print_json(&report)?;

    if let Some(path) = &args.output_json {
        let text = serde_json::to_string_pretty(&report).context("serialize checklist report")?;
        write_output(path, &format!("{text}\n"))?;
    }
    if let Some(path) = &args.output_markdown {
        write_output(path, &render_markdown(&report))?;
    }

    let reports = [report];
    match policy_violations(&reports, args.strict, args.require_no_manual_review) {
        Some(message) => {
            tracing::warn!(%message, "checklist gate failed");
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}

fn cmd_templates() -> Result<ExitCode> {
    for name in checklist::available_templates() {
        println!("{name}");
    }
    Ok(ExitCode::SUCCESS)
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create {}", parent.display()))?;
    }
    std::fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}
