#![allow(dead_code)]

pub use wfsim_test_utils::{builders, fixtures, init_tracing, probe};

use wfsim::ExperimentSettings;
use wfsim::cloud::VmSpec;
use wfsim::types::{ProvisionerKind, SchedulerKind};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Settings whose static policy plans exactly `vms` VMs: one price unit per
/// hour, deadline of ten hours and a budget sized to match.
pub fn static_settings(vms: usize, scheduler: SchedulerKind) -> ExperimentSettings {
    let deadline = 36000.0;
    ExperimentSettings {
        label: format!("static-{vms}"),
        budget: vms as f64 * deadline / 3600.0,
        deadline,
        scheduler,
        provisioner: ProvisionerKind::Static,
        vm: VmSpec {
            price: 1.0,
            billing_unit: 3600.0,
            ..VmSpec::default()
        },
        ..ExperimentSettings::default()
    }
}

pub fn aggressive_settings(initial_vms: usize) -> ExperimentSettings {
    ExperimentSettings {
        label: "aggressive".to_string(),
        provisioner: ProvisionerKind::Aggressive,
        initial_vms,
        ..ExperimentSettings::default()
    }
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
