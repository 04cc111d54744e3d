//! skipaware - skip-aware test execution engine
//!
//! Runs the built-in self-check suites through the engine and manages the
//! restart ledger, stored runs and configuration.
//!
//! ## Usage
//!
//! ```bash
//! # Run everything
//! skipaware run
//!
//! # Stop at the first failure, then resume after fixing it
//! skipaware run -x
//! skipaware run -x --restart
//!
//! # Select by tags or by name
//! skipaware run -m "not slow" -k packing
//!
//! # Post-mortem debugging of failures
//! skipaware run --pdb -v
//!
//! # List cases with their tags
//! skipaware list --detailed
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::io;
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, info, warn};

use skipaware::cli::{self, Args, Command};
use skipaware::config::{print_env_help, ConfigFile, EnvConfig};
use skipaware::executor::{
    AllOf, PatternSelector, ResumeSelector, RunError, Runner, Selector, TagSelector,
};
use skipaware::models::{Cancelled, RunOptions, Verbosity};
use skipaware::output::{OutputFormat, ResultFormatter};
use skipaware::results::{
    export_run, start_interactive_mode, ExportFormat, RestartLedger, ResultCollector,
    ResultsStorage, StoredRun,
};
use skipaware::suites;
use skipaware::tags::TagExpr;
use skipaware::utils::{init_logger, LogLevel, Stopwatch};

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let env = EnvConfig::load();

    let config_path = args.config.clone().or_else(|| env.config_file.clone());
    let config = match &config_path {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::load_default()?,
    };

    let level = args
        .log_level
        .clone()
        .or_else(|| env.log_level.clone())
        .unwrap_or_else(|| config.app.log_level.clone());
    init_logger(LogLevel::from_str(&level).unwrap_or_default());

    match args.command {
        Command::Run(run_args) => run_suites(run_args, &config, &env),
        Command::List(list_args) => {
            list_cases(list_args)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Ledger(ledger_args) => {
            manage_ledger(ledger_args, &config, &env)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Results(results_args) => {
            show_results(results_args, &config)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config(config_args) => {
            manage_config(config_args, config_path.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Config file, then profile, then environment, then flags
fn resolve_options(
    args: &cli::RunArgs,
    config: &ConfigFile,
    env: &EnvConfig,
) -> Result<RunOptions> {
    let mut options = config.app.run_options();

    if let Some(name) = args.profile.as_ref().or(env.profile.as_ref()) {
        let profile = config.profile(name).ok_or_else(|| {
            anyhow!(
                "Unknown profile: {name} (available: {})",
                config.profile_names().join(", ")
            )
        })?;
        debug!("Applying profile {}", profile.name);
        options = profile.apply(options);
    }

    options = env.apply(options);

    if args.quiet {
        options.verbosity = Verbosity::Quiet;
    } else if args.verbose > 0 {
        options.verbosity = Verbosity::from_level(args.verbose + 1);
    }
    if args.exit_first {
        options.exit_first = true;
    }
    if args.pdb {
        options.pdb_mode = true;
    }
    if let Some(expr) = &args.tag_match {
        options.tag_match = Some(expr.clone());
    }
    if let Some(pattern) = &args.pattern {
        options.pattern = Some(pattern.clone());
    }
    if args.restart {
        options.restart = true;
    }
    if let Some(path) = &args.restart_file {
        options.restart_file = path.into();
    }

    Ok(options)
}

fn build_selector(options: &RunOptions) -> Result<AllOf> {
    let mut selector = AllOf::new();

    if let Some(expr) = &options.tag_match {
        let tags = TagSelector::new(expr)
            .with_context(|| format!("Invalid tag expression: {expr}"))?;
        selector = selector.with(tags);
    }
    if let Some(pattern) = &options.pattern {
        selector = selector.with(PatternSelector::new(pattern.clone()));
    }
    if options.restart {
        let ledger = RestartLedger::new(options.restart_file.clone());
        let resume =
            ResumeSelector::from_ledger(&ledger).context("Failed to read restart ledger")?;
        info!("Resuming, {} case(s) already succeeded", resume.len());
        selector = selector.with(resume);
    }

    Ok(selector)
}

fn exit_code(cancelled: Option<Cancelled>, successful: bool) -> ExitCode {
    match cancelled {
        Some(Cancelled::Interrupt) => ExitCode::from(130),
        Some(Cancelled::Exit(code)) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        None if successful => ExitCode::SUCCESS,
        None => ExitCode::from(1),
    }
}

fn run_suites(args: cli::RunArgs, config: &ConfigFile, env: &EnvConfig) -> Result<ExitCode> {
    let mut stopwatch = Stopwatch::new();
    let options = resolve_options(&args, config, env)?;

    let format_name = args
        .format
        .clone()
        .or_else(|| env.format.clone())
        .unwrap_or_else(|| config.app.format.clone());
    let format = OutputFormat::from_str(&format_name)
        .ok_or_else(|| anyhow!("Unknown report format: {format_name}"))?;

    let mut cases = if args.suite.is_empty() {
        suites::all_cases()
    } else {
        suites::cases_for(&args.suite).ok_or_else(|| {
            anyhow!(
                "Unknown suite in {} (available: {})",
                args.suite.join(","),
                suites::suite_names().join(", ")
            )
        })?
    };

    let selector = build_selector(&options)?;
    if options.exit_first && !options.restart {
        RestartLedger::new(options.restart_file.clone())
            .clear()
            .context("Failed to reset restart ledger")?;
    }
    stopwatch.lap("setup");

    let mut runner = Runner::new(options.clone());
    let mut result = ResultCollector::new(&options);
    let outcome = runner.run_all(&mut cases, &mut result, Some(&selector as &dyn Selector));
    let cancelled = match outcome {
        Ok(_) => None,
        Err(RunError::Cancelled(reason)) => {
            warn!("Run cancelled: {reason}");
            Some(reason)
        }
        Err(e) => return Err(e).context("Run aborted"),
    };
    stopwatch.lap("run");

    let summary = result.summary();
    let mut formatter = ResultFormatter::new(format);
    if args.no_color {
        formatter = formatter.no_color();
    }
    println!("{}", formatter.format_report(&result, &summary).trim_end());

    if result.pdb_mode() && cancelled.is_none() {
        start_interactive_mode(&mut result, &mut io::stdin().lock(), &mut io::stdout())
            .context("Debugging session failed")?;
    }

    if args.export.is_some() || args.save {
        let run = StoredRun::new(&summary, &result, &options);

        if let Some(path) = &args.export {
            let path = Path::new(path);
            let export_format = ExportFormat::from_extension(path).unwrap_or(ExportFormat::Json);
            export_run(&run, path, export_format)?;
            println!("Run exported to: {}", path.display());
        }
        if args.save {
            let saved = results_storage(config).save(&run)?;
            println!("Run saved to: {}", saved.display());
        }
    }
    stopwatch.lap("report");
    debug!("Timings: {}", stopwatch.format());

    Ok(exit_code(cancelled, summary.was_successful()))
}

fn list_cases(args: cli::ListArgs) -> Result<()> {
    let expr = args
        .tag_match
        .as_deref()
        .map(TagExpr::parse)
        .transpose()
        .context("Invalid tag expression")?;

    for (name, build) in suites::SUITES {
        let cases: Vec<_> = build()
            .into_iter()
            .filter(|case| expr.as_ref().map_or(true, |e| case.info.tags.matches_expr(e)))
            .collect();
        if cases.is_empty() {
            continue;
        }

        println!("\n{name} ({} case(s))", cases.len());
        println!("{:-<70}", "");
        for case in &cases {
            let kind = if case.is_generative() { "generative" } else { "plain" };
            if args.detailed {
                let tags: Vec<&str> = case.info.tags.iter().collect();
                println!("  {}", case.info.id);
                println!("    {} [{}] {}", kind, tags.join(", "), case.info.default_description());
                if let Some(reason) = case.info.skip_reason() {
                    println!("    skipped: {reason}");
                }
            } else {
                println!("  {}", case.info.id);
            }
        }
    }
    println!();

    Ok(())
}

fn manage_ledger(args: cli::LedgerArgs, config: &ConfigFile, env: &EnvConfig) -> Result<()> {
    let path = args
        .restart_file
        .map(Into::into)
        .or_else(|| env.restart_file.clone())
        .unwrap_or_else(|| config.app.restart_file.clone());
    let ledger = RestartLedger::new(path);

    match args.action {
        cli::LedgerAction::Show => {
            let entries = ledger.entries()?;
            if entries.is_empty() {
                println!("Restart ledger {} is empty.", ledger.path().display());
            } else {
                println!("{} ({} case(s)):", ledger.path().display(), entries.len());
                for entry in entries {
                    println!("  {entry}");
                }
            }
        }
        cli::LedgerAction::Clear => {
            ledger.clear()?;
            println!("Cleared restart ledger {}", ledger.path().display());
        }
    }

    Ok(())
}

fn results_storage(config: &ConfigFile) -> ResultsStorage {
    config
        .app
        .results_dir
        .clone()
        .map(ResultsStorage::new)
        .unwrap_or_else(ResultsStorage::default_dir)
}

fn show_results(args: cli::ResultsArgs, config: &ConfigFile) -> Result<()> {
    let storage = results_storage(config);

    let selected = match (&args.id, args.latest) {
        (Some(id), _) => Some(storage.load(id)?),
        (None, true) => storage.latest()?,
        (None, false) => None,
    };

    let Some(run) = selected else {
        let runs = storage.list_runs()?;
        if runs.is_empty() {
            println!("No stored runs in {}.", storage.base_dir().display());
            println!("Store one with: skipaware run --save");
            return Ok(());
        }

        println!(
            "{:<22} {:>5} {:>5} {:>5} {:>5} {:>5}  Status",
            "Run", "Run", "Pass", "Fail", "Err", "Skip"
        );
        println!("{:-<70}", "");
        for run in &runs {
            println!(
                "{:<22} {:>5} {:>5} {:>5} {:>5} {:>5}  {}",
                run.id,
                run.tests_run,
                run.successes,
                run.failures,
                run.errors,
                run.skipped,
                if run.was_successful() { "OK" } else { "FAILED" }
            );
        }
        println!("\nUse --latest or --id <run> for details.");
        return Ok(());
    };

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        println!("Run {} ({})", run.id, run.started_at.format("%Y-%m-%d %H:%M:%S"));
        println!(
            "Ran {} test(s) in {}ms: {} passed, {} failure(s), {} error(s), {} skipped",
            run.tests_run, run.duration_ms, run.successes, run.failures, run.errors, run.skipped
        );
        for fault in &run.faults {
            println!("\n{}: {}", fault.flavour, fault.description);
            println!("{}", fault.traceback);
        }
    }

    if let Some(path) = &args.export {
        let path = Path::new(path);
        let format = ExportFormat::from_extension(path).unwrap_or(ExportFormat::Json);
        storage.export(&run, path, format)?;
        println!("\nRun exported to: {}", path.display());
    }

    Ok(())
}

fn manage_config(args: cli::ConfigArgs, explicit: Option<&str>) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            let path = Path::new(&output);
            if path.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {output}. Use --force to overwrite."
                );
            }

            ConfigFile::example().save(path)?;
            println!("Configuration file created: {output}");
        }

        cli::ConfigAction::Show { env, format } => {
            if env {
                EnvConfig::load().print_summary();
            } else {
                let config = match explicit {
                    Some(path) => ConfigFile::load(path)?,
                    None => ConfigFile::load_default()?,
                };
                let output = if format == "json" {
                    serde_json::to_string_pretty(&config)?
                } else {
                    serde_yaml::to_string(&config)?
                };
                println!("{output}");
            }
        }

        cli::ConfigAction::Validate { file } => {
            let path = file
                .or_else(|| explicit.map(String::from))
                .or_else(|| ConfigFile::find().map(|p| p.to_string_lossy().to_string()))
                .unwrap_or_else(|| "./skipaware.yaml".to_string());

            match ConfigFile::load(&path) {
                Ok(_) => println!("Configuration file is valid: {path}"),
                Err(e) => {
                    println!("Configuration file is invalid: {path}");
                    println!("  Error: {e:#}");
                    return Err(e);
                }
            }
        }

        cli::ConfigAction::Profiles { detailed } => {
            let config = match explicit {
                Some(path) => ConfigFile::load(path)?,
                None => ConfigFile::load_default()?,
            };
            println!("Run Profiles:");
            println!("{:-<60}", "");
            for name in config.profile_names() {
                let Some(profile) = config.profile(&name) else {
                    continue;
                };
                if detailed {
                    println!("{}", serde_yaml::to_string(&profile)?);
                } else {
                    println!("  {:12} - {}", profile.name, profile.description);
                }
            }
        }

        cli::ConfigAction::Env => print_env_help(),
    }

    Ok(())
}
