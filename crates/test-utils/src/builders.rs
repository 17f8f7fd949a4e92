#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use wfsim::config::{DagEntry, ExperimentConfig, RawExperimentConfig};
use wfsim::dag::{Dag, DagDescription, DagFile, TaskDescription};
use wfsim::errors::Result;
use wfsim::types::{ProvisionerKind, SchedulerKind, StorageMode};

/// Builder for `DagDescription` / `Dag` to simplify test setup.
pub struct DagDescriptionBuilder {
    desc: DagDescription,
}

impl DagDescriptionBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            desc: DagDescription {
                name: name.to_string(),
                task: Default::default(),
            },
        }
    }

    pub fn with_task(mut self, id: &str, task: TaskDescription) -> Self {
        self.desc.task.insert(id.to_string(), task);
        self
    }

    pub fn description(self) -> DagDescription {
        self.desc
    }

    pub fn try_build(self) -> Result<Dag> {
        Dag::try_from(self.desc)
    }

    pub fn build(self) -> Arc<Dag> {
        Arc::new(self.try_build().expect("Failed to build valid DAG from builder"))
    }
}

/// Builder for `TaskDescription`.
pub struct TaskBuilder {
    task: TaskDescription,
}

impl TaskBuilder {
    pub fn new(size: f64) -> Self {
        Self {
            task: TaskDescription {
                size,
                after: vec![],
                inputs: vec![],
                outputs: vec![],
            },
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn input(mut self, name: &str, size: u64) -> Self {
        self.task.inputs.push(DagFile::new(name, size));
        self
    }

    pub fn output(mut self, name: &str, size: u64) -> Self {
        self.task.outputs.push(DagFile::new(name, size));
        self
    }

    pub fn build(self) -> TaskDescription {
        self.task
    }
}

/// Builder for `ExperimentConfig`.
pub struct ExperimentConfigBuilder {
    config: RawExperimentConfig,
}

impl ExperimentConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RawExperimentConfig::default(),
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.config.experiment.label = label.to_string();
        self
    }

    pub fn budget(mut self, budget: f64) -> Self {
        self.config.experiment.budget = budget;
        self
    }

    pub fn deadline(mut self, deadline: f64) -> Self {
        self.config.experiment.deadline = deadline;
        self
    }

    pub fn scheduler(mut self, kind: SchedulerKind) -> Self {
        self.config.experiment.scheduler = kind;
        self
    }

    pub fn provisioner(mut self, kind: ProvisionerKind) -> Self {
        self.config.experiment.provisioner = kind;
        self
    }

    pub fn price(mut self, price: f64, billing_unit: f64) -> Self {
        self.config.vm.price = price;
        self.config.vm.billing_unit = billing_unit;
        self
    }

    pub fn processing_rate(mut self, rate: f64) -> Self {
        self.config.vm.processing_rate = rate;
        self
    }

    pub fn initial_vms(mut self, n: usize) -> Self {
        self.config.vm.initial_vms = n;
        self
    }

    pub fn bandwidth(mut self, bandwidth: f64, latency: f64) -> Self {
        self.config.storage.mode = StorageMode::Bandwidth;
        self.config.storage.bandwidth = bandwidth;
        self.config.storage.latency = latency;
        self
    }

    pub fn dag(self, path: &str, priority: i32, copies: usize) -> Self {
        self.dag_at(path, priority, copies, 0.0)
    }

    pub fn dag_at(mut self, path: &str, priority: i32, copies: usize, submit_at: f64) -> Self {
        self.config.dag.push(DagEntry {
            path: PathBuf::from(path),
            priority,
            copies,
            submit_at,
        });
        self
    }

    pub fn raw(self) -> RawExperimentConfig {
        self.config
    }

    pub fn build(self) -> ExperimentConfig {
        ExperimentConfig::try_from(self.config)
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ExperimentConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
