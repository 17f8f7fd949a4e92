// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::cloud::VmSpec;
use crate::experiment::ExperimentSettings;
use crate::storage::TransferModel;
use crate::types::{ProvisionerKind, SchedulerKind, StorageMode};

/// Experiment configuration as read from a TOML file, before validation.
///
/// ```toml
/// [experiment]
/// label = "ensemble"
/// budget = 100.0
/// deadline = 36000.0
/// scheduler = "priority"
/// provisioner = "static"
///
/// [vm]
/// price = 1.0
/// billing_unit = 3600.0
///
/// [storage]
/// mode = "bandwidth"
/// bandwidth = 1.0e7
///
/// [[dag]]
/// path = "dags/chain.toml"
/// priority = 0
/// copies = 1
/// ```
///
/// All sections except `[[dag]]` are optional and have defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExperimentConfig {
    #[serde(default)]
    pub experiment: ExperimentSection,

    #[serde(default)]
    pub vm: VmSection,

    #[serde(default)]
    pub storage: StorageSection,

    /// DAGs admitted into the ensemble, from `[[dag]]`.
    #[serde(default)]
    pub dag: Vec<DagEntry>,
}

/// Validated experiment configuration.
///
/// Construct via `ExperimentConfig::try_from(raw)`, which runs validation.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    pub experiment: ExperimentSection,
    pub vm: VmSection,
    pub storage: StorageSection,
    pub dag: Vec<DagEntry>,
}

impl ExperimentConfig {
    /// Build a config from parts that have already been validated.
    pub(crate) fn new_unchecked(
        experiment: ExperimentSection,
        vm: VmSection,
        storage: StorageSection,
        dag: Vec<DagEntry>,
    ) -> Self {
        Self {
            experiment,
            vm,
            storage,
            dag,
        }
    }

    pub fn vm_spec(&self) -> VmSpec {
        VmSpec {
            processing_rate: self.vm.processing_rate,
            price: self.vm.price,
            billing_unit: self.vm.billing_unit,
            provisioning_delay: self.vm.provisioning_delay,
            deprovisioning_delay: self.vm.deprovisioning_delay,
        }
    }

    pub fn transfer_model(&self) -> TransferModel {
        match self.storage.mode {
            StorageMode::Void => TransferModel::Void,
            StorageMode::Bandwidth => TransferModel::Bandwidth {
                bandwidth: self.storage.bandwidth,
                latency: self.storage.latency,
            },
        }
    }

    /// Run parameters without the DAG list.
    pub fn settings(&self) -> ExperimentSettings {
        ExperimentSettings {
            label: self.experiment.label.clone(),
            budget: self.experiment.budget,
            deadline: self.experiment.deadline,
            scheduler: self.experiment.scheduler,
            provisioner: self.experiment.provisioner,
            vm: self.vm_spec(),
            initial_vms: self.vm.initial_vms,
            storage: self.transfer_model(),
        }
    }
}

/// `[experiment]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ExperimentSection {
    /// Label used in reports.
    #[serde(default = "default_label")]
    pub label: String,

    /// Currency units available for VM billing.
    #[serde(default = "default_budget")]
    pub budget: f64,

    /// Seconds of simulated time.
    #[serde(default = "default_deadline")]
    pub deadline: f64,

    #[serde(default)]
    pub scheduler: SchedulerKind,

    #[serde(default)]
    pub provisioner: ProvisionerKind,
}

fn default_label() -> String {
    "experiment".to_string()
}

fn default_budget() -> f64 {
    100.0
}

fn default_deadline() -> f64 {
    36000.0
}

impl Default for ExperimentSection {
    fn default() -> Self {
        Self {
            label: default_label(),
            budget: default_budget(),
            deadline: default_deadline(),
            scheduler: SchedulerKind::default(),
            provisioner: ProvisionerKind::default(),
        }
    }
}

/// `[vm]` section: the single VM type of the run.
#[derive(Debug, Clone, Deserialize)]
pub struct VmSection {
    #[serde(default = "default_one")]
    pub processing_rate: f64,

    /// Price per started billing unit.
    #[serde(default = "default_one")]
    pub price: f64,

    #[serde(default = "default_billing_unit")]
    pub billing_unit: f64,

    #[serde(default)]
    pub provisioning_delay: f64,

    #[serde(default)]
    pub deprovisioning_delay: f64,

    /// VMs launched at start by the aggressive provisioner.
    #[serde(default = "default_initial_vms")]
    pub initial_vms: usize,
}

fn default_one() -> f64 {
    1.0
}

fn default_billing_unit() -> f64 {
    3600.0
}

fn default_initial_vms() -> usize {
    1
}

impl Default for VmSection {
    fn default() -> Self {
        Self {
            processing_rate: default_one(),
            price: default_one(),
            billing_unit: default_billing_unit(),
            provisioning_delay: 0.0,
            deprovisioning_delay: 0.0,
            initial_vms: default_initial_vms(),
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    #[serde(default)]
    pub mode: StorageMode,

    /// Bytes per second, bandwidth mode only.
    #[serde(default = "default_bandwidth")]
    pub bandwidth: f64,

    /// Seconds added to every transfer, bandwidth mode only.
    #[serde(default)]
    pub latency: f64,
}

fn default_bandwidth() -> f64 {
    1.0e7
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            mode: StorageMode::default(),
            bandwidth: default_bandwidth(),
            latency: 0.0,
        }
    }
}

/// `[[dag]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct DagEntry {
    /// DAG description file, relative to the config file's directory.
    pub path: PathBuf,

    /// Lower is more urgent.
    #[serde(default)]
    pub priority: i32,

    /// Number of instances of this DAG admitted into the ensemble.
    #[serde(default = "default_copies")]
    pub copies: usize,

    /// Simulated admission time in seconds.
    #[serde(default)]
    pub submit_at: f64,
}

fn default_copies() -> usize {
    1
}
