// tests/experiment_config.rs

mod common;
use crate::common::builders::{DagDescriptionBuilder, ExperimentConfigBuilder, TaskBuilder};
use crate::common::fixtures::chain;
use crate::common::{TestResult, init_tracing};

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use wfsim::cli::CliArgs;
use wfsim::config::{load_and_validate, load_dag, load_from_path};
use wfsim::errors::WfsimError;
use wfsim::experiment::Experiment;
use wfsim::ExperimentSettings;
use wfsim::storage::TransferModel;
use wfsim::types::{ProvisionerKind, SchedulerKind};

const DIAMOND_TOML: &str = r#"
[task.a]
size = 10
outputs = [{ name = "a.out", size = 2442 }]

[task.b]
size = 5
after = ["a"]
inputs = [{ name = "a.out", size = 2442 }]

[task.c]
size = 20
after = ["a"]
inputs = [{ name = "a.out", size = 2442 }]

[task.d]
size = 1
after = ["b", "c"]
"#;

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(&path, contents).expect("write file");
    path
}

/// One VM for the whole run (budget well under one billing unit).
fn single_vm(deadline: f64) -> ExperimentSettings {
    ExperimentSettings {
        budget: 0.05,
        deadline,
        ..ExperimentSettings::default()
    }
}

#[test]
fn full_experiment_file_is_loaded_and_simulated() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    write(dir.path(), "dags/diamond.toml", DIAMOND_TOML);
    let config_path = write(
        dir.path(),
        "experiment.toml",
        r#"
[experiment]
label = "diamonds"
budget = 20
deadline = 3600
scheduler = "priority"
provisioner = "static"

[vm]
price = 2.0
provisioning_delay = 5

[storage]
mode = "bandwidth"
bandwidth = 1000
latency = 0.1

[[dag]]
path = "dags/diamond.toml"
priority = 1
copies = 2

[[dag]]
path = "dags/diamond.toml"
submit_at = 100
"#,
    );

    let cfg = load_and_validate(&config_path)?;
    assert_eq!(cfg.experiment.label, "diamonds");
    assert_eq!(cfg.experiment.scheduler, SchedulerKind::Priority);
    assert_eq!(cfg.vm.billing_unit, 3600.0);
    assert_eq!(cfg.vm.initial_vms, 1);
    assert_eq!(cfg.dag[1].copies, 1);
    assert_eq!(
        cfg.transfer_model(),
        TransferModel::Bandwidth {
            bandwidth: 1000.0,
            latency: 0.1
        }
    );

    let settings = cfg.settings();
    // 20 / 1h / 2.0 per hour
    assert_eq!(settings.planned_vms(), Some(10));

    let experiment = Experiment::from_config(&cfg, dir.path())?;
    assert_eq!(experiment.dags().len(), 3);
    assert_eq!(experiment.dags()[0].dag.name(), "diamond");
    assert_eq!(experiment.dags()[2].submit_at, 100.0);

    let result = experiment.simulate()?;
    assert_eq!(result.label, "diamonds");
    assert_eq!(result.dags_completed, 3);
    assert_eq!(result.jobs_completed, 12);
    Ok(())
}

#[test]
fn minimal_file_uses_defaults() -> TestResult {
    let dir = tempdir()?;
    let path = write(dir.path(), "experiment.toml", "[[dag]]\npath = \"x.toml\"\n");

    let cfg = load_and_validate(&path)?;
    assert_eq!(cfg.experiment.budget, 100.0);
    assert_eq!(cfg.experiment.deadline, 36000.0);
    assert_eq!(cfg.experiment.scheduler, SchedulerKind::Fifo);
    assert_eq!(cfg.experiment.provisioner, ProvisionerKind::Static);
    assert_eq!(cfg.transfer_model(), TransferModel::Void);
    assert_eq!(cfg.vm_spec().price_per_hour(), 1.0);
    Ok(())
}

#[test]
fn invalid_values_are_rejected() -> TestResult {
    let cases = [
        ExperimentConfigBuilder::new().deadline(0.0).dag("a.toml", 0, 1),
        ExperimentConfigBuilder::new().budget(-1.0).dag("a.toml", 0, 1),
        ExperimentConfigBuilder::new().price(0.0, 3600.0).dag("a.toml", 0, 1),
        ExperimentConfigBuilder::new().processing_rate(f64::NAN).dag("a.toml", 0, 1),
        ExperimentConfigBuilder::new().bandwidth(0.0, 0.0).dag("a.toml", 0, 1),
        ExperimentConfigBuilder::new().dag("a.toml", 0, 0),
        ExperimentConfigBuilder::new().dag_at("a.toml", 0, 1, -5.0),
        ExperimentConfigBuilder::new(),
    ];

    for builder in cases {
        let raw = builder.raw();
        let err = wfsim::config::ExperimentConfig::try_from(raw).expect_err("must be rejected");
        assert!(matches!(err, WfsimError::ConfigError(_)), "unexpected: {err}");
    }
    Ok(())
}

#[test]
fn unknown_policy_name_is_a_parse_error() -> TestResult {
    let dir = tempdir()?;
    let path = write(
        dir.path(),
        "experiment.toml",
        "[experiment]\nscheduler = \"random\"\n\n[[dag]]\npath = \"x.toml\"\n",
    );

    let err = load_from_path(&path).expect_err("unknown scheduler");
    assert!(matches!(err, WfsimError::TomlError(_)));
    Ok(())
}

#[test]
fn dag_name_defaults_to_file_stem() -> TestResult {
    let dir = tempdir()?;
    let path = write(dir.path(), "montage-25.toml", DIAMOND_TOML);

    let dag = load_dag(&path)?;
    assert_eq!(dag.name(), "montage-25");
    assert_eq!(dag.num_tasks(), 4);
    assert_eq!(dag.roots().len(), 1);
    let d = dag.index_of("d").expect("d exists");
    assert_eq!(dag.parents(d).len(), 2);
    Ok(())
}

#[test]
fn cyclic_dag_is_rejected() -> TestResult {
    let dir = tempdir()?;
    let path = write(
        dir.path(),
        "loop.toml",
        "[task.a]\nsize = 1\nafter = [\"c\"]\n\n[task.b]\nsize = 1\nafter = [\"a\"]\n\n[task.c]\nsize = 1\nafter = [\"b\"]\n",
    );

    let err = load_dag(&path).expect_err("cycle");
    match err {
        WfsimError::DagCycle(msg) => assert!(msg.contains("loop"), "message: {msg}"),
        other => panic!("unexpected error: {other}"),
    }
    Ok(())
}

#[test]
fn malformed_dags_are_rejected() {
    let unknown = DagDescriptionBuilder::new("unknown")
        .with_task("a", TaskBuilder::new(1.0).after("ghost").build())
        .try_build();
    assert!(matches!(unknown, Err(WfsimError::ConfigError(_))));

    let selfish = DagDescriptionBuilder::new("self")
        .with_task("a", TaskBuilder::new(1.0).after("a").build())
        .try_build();
    assert!(matches!(selfish, Err(WfsimError::ConfigError(_))));

    let negative = DagDescriptionBuilder::new("negative")
        .with_task("a", TaskBuilder::new(-1.0).build())
        .try_build();
    assert!(matches!(negative, Err(WfsimError::ConfigError(_))));

    let empty = DagDescriptionBuilder::new("empty").try_build();
    assert!(matches!(empty, Err(WfsimError::ConfigError(_))));
}

#[test]
fn finishing_exactly_at_the_deadline_is_on_time() -> TestResult {
    init_tracing();

    let mut experiment = Experiment::new(single_vm(300.0));
    experiment.add_dag(chain(3, 100.0), 0);
    let result = experiment.simulate()?;

    assert_eq!(result.planned_vms, Some(1));
    assert_eq!(result.actual_finish_time, 300.0);
    assert!(result.deadline_met());
    Ok(())
}

#[test]
fn finishing_after_the_deadline_is_an_error() -> TestResult {
    init_tracing();

    let mut experiment = Experiment::new(single_vm(299.0));
    experiment.add_dag(chain(3, 100.0), 0);

    let err = experiment.simulate().expect_err("deadline missed");
    match err {
        WfsimError::DeadlineExceeded {
            finish_time,
            deadline,
        } => {
            assert_eq!(finish_time, 300.0);
            assert_eq!(deadline, 299.0);
        }
        other => panic!("unexpected error: {other}"),
    }

    // The unchecked run still reports the full outcome.
    let result = experiment.simulate_unchecked()?;
    assert!(result.all_dags_completed());
    assert!(!result.deadline_met());
    Ok(())
}

#[test]
fn exceeding_the_budget_is_reported_not_fatal() -> TestResult {
    init_tracing();

    let mut experiment = Experiment::new(single_vm(300.0));
    experiment.add_dag(chain(3, 100.0), 0);
    let result = experiment.simulate()?;

    assert_eq!(result.cost, 1.0);
    assert!(result.budget_exceeded());
    assert!(result.deadline_met());
    Ok(())
}

#[test]
fn no_affordable_vm_means_the_deadline_is_missed() -> TestResult {
    init_tracing();

    let mut settings = single_vm(3600.0);
    settings.budget = 0.0;
    let mut experiment = Experiment::new(settings);
    experiment.add_dag(chain(2, 1.0), 0);

    let result = experiment.simulate_unchecked()?;
    assert_eq!(result.planned_vms, Some(0));
    assert_eq!(result.dags_admitted, 1);
    assert_eq!(result.dags_completed, 0);
    assert_eq!(result.cost, 0.0);

    let err = result.ensure_deadline().expect_err("nothing finished");
    assert!(matches!(
        err,
        WfsimError::DeadlineExceeded { finish_time, .. } if finish_time.is_infinite()
    ));
    Ok(())
}

#[test]
fn cli_run_succeeds_in_dry_run_and_fails_on_missed_deadline() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    write(dir.path(), "dags/diamond.toml", DIAMOND_TOML);
    let ok = write(
        dir.path(),
        "ok.toml",
        "[[dag]]\npath = \"dags/diamond.toml\"\n",
    );
    let late = write(
        dir.path(),
        "late.toml",
        "[experiment]\nbudget = 0.01\ndeadline = 10\n\n[[dag]]\npath = \"dags/diamond.toml\"\n",
    );

    let args = |path: &Path, dry_run: bool| CliArgs {
        config: path.to_string_lossy().into_owned(),
        log_level: None,
        dry_run,
        verbose: false,
    };

    wfsim::run(args(&ok, true))?;
    wfsim::run(args(&ok, false))?;
    wfsim::run(args(&late, true))?;
    assert!(wfsim::run(args(&late, false)).is_err());
    assert!(wfsim::run(args(&dir.path().join("missing.toml"), true)).is_err());
    Ok(())
}
