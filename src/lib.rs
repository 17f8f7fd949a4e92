// src/lib.rs

pub mod cli;
pub mod cloud;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod experiment;
pub mod jobs;
pub mod kernel;
pub mod logging;
pub mod policy;
pub mod report;
pub mod storage;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::ExperimentConfig;
use crate::config::loader::load_and_validate;
use crate::experiment::Experiment;

pub use crate::experiment::{ExperimentResult, ExperimentSettings};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - experiment config loading and validation
/// - DAG loading (paths relative to the config file)
/// - the simulation run and its summary
/// - the post-run deadline check
pub fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading experiment config {:?}", config_path))?;

    let root_dir = config_root_dir(&config_path);
    let experiment = Experiment::from_config(&cfg, &root_dir)
        .with_context(|| format!("loading DAGs relative to {:?}", root_dir))?;

    if args.dry_run {
        print_dry_run(&cfg, &experiment);
        return Ok(());
    }

    info!(config = ?config_path, "starting simulation");
    let result = experiment.simulate_unchecked()?;
    report::print_summary(&result, args.verbose);

    // Deadline misses are reported after the summary, as a failed run.
    result.ensure_deadline()?;
    Ok(())
}

/// Directory DAG paths are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "demos/experiment.toml"),
///   we use that directory.
/// - If it's just a bare filename like "experiment.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print policies, VM plan and admitted DAGs.
fn print_dry_run(cfg: &ExperimentConfig, experiment: &Experiment) {
    let settings = experiment.settings();
    println!("wfsim dry-run: {}", settings.label);
    println!("  experiment.budget = {}", settings.budget);
    println!("  experiment.deadline = {}", settings.deadline);
    println!("  experiment.scheduler = {:?}", settings.scheduler);
    println!("  experiment.provisioner = {:?}", settings.provisioner);
    match settings.planned_vms() {
        Some(n) => println!("  static VM count = {n}"),
        None => println!("  initial VMs = {}", settings.initial_vms),
    }
    println!(
        "  vm: rate {} price {} per {}s (= {:.4}/h)",
        settings.vm.processing_rate,
        settings.vm.price,
        settings.vm.billing_unit,
        settings.vm.price_per_hour()
    );
    println!("  storage = {:?}", settings.storage);
    println!();

    println!("dags ({} entries, {} instances):", cfg.dag.len(), experiment.dags().len());
    for entry in cfg.dag.iter() {
        println!("  - {}", entry.path.display());
        println!("      priority: {}", entry.priority);
        if entry.copies > 1 {
            println!("      copies: {}", entry.copies);
        }
        if entry.submit_at > 0.0 {
            println!("      submit_at: {}", entry.submit_at);
        }
    }
    for admission in experiment.dags().iter() {
        debug!(
            dag = admission.dag.name(),
            tasks = admission.dag.num_tasks(),
            "planned admission"
        );
    }

    debug!("dry-run complete (no simulation)");
}
