//! Allotment CLI - validate a scheduling problem statement.

use allotment::prelude::*;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::process::ExitCode;

/// Options of the `validate` command.
#[derive(Debug, Default)]
struct ValidateArgs {
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    extended: bool,
    json: bool,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("allotment");

    let verbose = args.iter().any(|arg| arg == "--verbose" || arg == "-v");
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let Some(command) = args.get(1) else {
        print_usage(program);
        return ExitCode::from(2);
    };

    match command.as_str() {
        "validate" => match parse_validate_args(&args[2..]).and_then(|opts| run_validate(&opts)) {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::from(1),
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::from(2)
            }
        },
        "stages" => {
            let extended = args[2..].iter().any(|arg| arg == "--extended");
            list_stages(extended);
            ExitCode::SUCCESS
        }
        "help" | "--help" | "-h" => {
            print_usage(program);
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage(program);
            ExitCode::from(2)
        }
    }
}

fn print_usage(program: &str) {
    println!("Allotment v{} - scheduling problem validation", allotment::VERSION);
    println!();
    println!("Usage: {} <command> [options]", program);
    println!();
    println!("Commands:");
    println!("  validate <dataset.json> [options]  Validate clients, workers, tasks and rules");
    println!("  stages [--extended]                List validation stages in run order");
    println!("  help                               Show this help message");
    println!();
    println!("Validate options:");
    println!("  --config <file.toml>  Load validation options (phase_count, parallel, extended_checks)");
    println!("  --extended            Also run rule integrity and feasibility checks");
    println!("  --json                Print findings as JSON");
    println!("  --verbose, -v         Log each stage (RUST_LOG overrides)");
    println!();
    println!("Exit status: 0 when consistent, 1 when findings exist, 2 on input or config errors.");
}

fn parse_validate_args(args: &[String]) -> Result<ValidateArgs> {
    let mut opts = ValidateArgs::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let Some(path) = args.get(i + 1) else {
                    bail!("--config needs a file path");
                };
                opts.config = Some(PathBuf::from(path));
                i += 2;
            }
            "--extended" => {
                opts.extended = true;
                i += 1;
            }
            "--json" => {
                opts.json = true;
                i += 1;
            }
            "--verbose" | "-v" => i += 1,
            other if other.starts_with('-') => bail!("Unknown option: {}", other),
            path => {
                if opts.input.is_some() {
                    bail!("Only one dataset file can be validated at a time");
                }
                opts.input = Some(PathBuf::from(path));
                i += 1;
            }
        }
    }

    if opts.input.is_none() {
        bail!("Please specify a dataset file");
    }
    Ok(opts)
}

/// Returns whether the dataset is free of findings.
fn run_validate(opts: &ValidateArgs) -> Result<bool> {
    let Some(input) = &opts.input else {
        bail!("Please specify a dataset file");
    };

    let mut options = match &opts.config {
        Some(path) => ValidationOptions::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ValidationOptions::default(),
    };
    if opts.extended {
        options = options.with_extended_checks(true);
    }

    let dataset =
        Dataset::from_file(input).with_context(|| format!("loading dataset {}", input.display()))?;

    let pipeline = ValidationPipeline::from_options(options);
    let report = pipeline.validate(&dataset);

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&report.errors)?);
    } else {
        println!("{}", report.summary());
        for line in report.detailed_errors() {
            println!("{}", line);
        }
        println!();
        println!("Completed in {}ms", report.duration_ms);
    }

    Ok(report.is_valid())
}

fn list_stages(extended: bool) {
    let pipeline = if extended {
        ValidationPipeline::extended_pipeline()
    } else {
        ValidationPipeline::default_pipeline()
    };

    println!("Validation stages ({} total):", pipeline.stage_names().len());
    for (i, name) in pipeline.stage_names().iter().enumerate() {
        println!("  {:>2}. {}", i + 1, name);
    }
}
