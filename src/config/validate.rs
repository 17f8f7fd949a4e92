// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ExperimentConfig, RawExperimentConfig};
use crate::dag::{Dag, DagDescription};
use crate::errors::{Result, WfsimError};
use crate::types::StorageMode;

impl TryFrom<RawExperimentConfig> for ExperimentConfig {
    type Error = crate::errors::WfsimError;

    fn try_from(raw: RawExperimentConfig) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ExperimentConfig::new_unchecked(
            raw.experiment,
            raw.vm,
            raw.storage,
            raw.dag,
        ))
    }
}

impl TryFrom<DagDescription> for Dag {
    type Error = crate::errors::WfsimError;

    fn try_from(desc: DagDescription) -> std::result::Result<Self, Self::Error> {
        validate_dag_description(&desc)?;
        Ok(Dag::from_validated(desc))
    }
}

fn validate_raw_config(cfg: &RawExperimentConfig) -> Result<()> {
    validate_experiment_section(cfg)?;
    validate_vm_section(cfg)?;
    validate_storage_section(cfg)?;
    validate_dag_entries(cfg)?;
    Ok(())
}

fn config_error(msg: impl Into<String>) -> WfsimError {
    WfsimError::ConfigError(msg.into())
}

fn validate_experiment_section(cfg: &RawExperimentConfig) -> Result<()> {
    let exp = &cfg.experiment;
    if !exp.budget.is_finite() || exp.budget < 0.0 {
        return Err(config_error(format!(
            "[experiment].budget must be a finite value >= 0 (got {})",
            exp.budget
        )));
    }
    if !exp.deadline.is_finite() || exp.deadline <= 0.0 {
        return Err(config_error(format!(
            "[experiment].deadline must be a finite value > 0 (got {})",
            exp.deadline
        )));
    }
    Ok(())
}

fn validate_vm_section(cfg: &RawExperimentConfig) -> Result<()> {
    let vm = &cfg.vm;
    for (field, value) in [
        ("processing_rate", vm.processing_rate),
        ("price", vm.price),
        ("billing_unit", vm.billing_unit),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(config_error(format!(
                "[vm].{field} must be a finite value > 0 (got {value})"
            )));
        }
    }
    for (field, value) in [
        ("provisioning_delay", vm.provisioning_delay),
        ("deprovisioning_delay", vm.deprovisioning_delay),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(config_error(format!(
                "[vm].{field} must be a finite value >= 0 (got {value})"
            )));
        }
    }
    Ok(())
}

fn validate_storage_section(cfg: &RawExperimentConfig) -> Result<()> {
    let storage = &cfg.storage;
    if storage.mode != StorageMode::Bandwidth {
        return Ok(());
    }
    if !storage.bandwidth.is_finite() || storage.bandwidth <= 0.0 {
        return Err(config_error(format!(
            "[storage].bandwidth must be > 0 in bandwidth mode (got {})",
            storage.bandwidth
        )));
    }
    if !storage.latency.is_finite() || storage.latency < 0.0 {
        return Err(config_error(format!(
            "[storage].latency must be >= 0 (got {})",
            storage.latency
        )));
    }
    Ok(())
}

fn validate_dag_entries(cfg: &RawExperimentConfig) -> Result<()> {
    if cfg.dag.is_empty() {
        return Err(config_error(
            "config must contain at least one [[dag]] entry",
        ));
    }
    for entry in cfg.dag.iter() {
        if entry.copies == 0 {
            return Err(config_error(format!(
                "dag '{}': copies must be >= 1",
                entry.path.display()
            )));
        }
        if !entry.submit_at.is_finite() || entry.submit_at < 0.0 {
            return Err(config_error(format!(
                "dag '{}': submit_at must be a finite value >= 0 (got {})",
                entry.path.display(),
                entry.submit_at
            )));
        }
    }
    Ok(())
}

fn validate_dag_description(desc: &DagDescription) -> Result<()> {
    ensure_has_tasks(desc)?;
    validate_task_sizes(desc)?;
    validate_task_dependencies(desc)?;
    validate_acyclic(desc)?;
    Ok(())
}

fn ensure_has_tasks(desc: &DagDescription) -> Result<()> {
    if desc.task.is_empty() {
        return Err(config_error(format!(
            "DAG '{}' must contain at least one [task.<id>] section",
            desc.name
        )));
    }
    Ok(())
}

fn validate_task_sizes(desc: &DagDescription) -> Result<()> {
    for (id, task) in desc.task.iter() {
        if !task.size.is_finite() || task.size < 0.0 {
            return Err(config_error(format!(
                "task '{}' has invalid size {} (must be finite and >= 0)",
                id, task.size
            )));
        }
    }
    Ok(())
}

fn validate_task_dependencies(desc: &DagDescription) -> Result<()> {
    for (id, task) in desc.task.iter() {
        for dep in task.after.iter() {
            if !desc.task.contains_key(dep) {
                return Err(config_error(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    id, dep
                )));
            }
            if dep == id {
                return Err(config_error(format!(
                    "task '{}' cannot depend on itself in `after`",
                    id
                )));
            }
        }
    }
    Ok(())
}

fn validate_acyclic(desc: &DagDescription) -> Result<()> {
    // Edge direction: dep -> task.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for id in desc.task.keys() {
        graph.add_node(id.as_str());
    }

    for (id, task) in desc.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), id.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(WfsimError::DagCycle(format!(
            "cycle detected in DAG '{}' involving task '{}'",
            desc.name,
            cycle.node_id()
        ))),
    }
}
