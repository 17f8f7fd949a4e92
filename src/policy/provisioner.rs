// src/policy/provisioner.rs

use std::collections::BTreeSet;

use crate::cloud::VmId;
use crate::kernel::SimTime;
use crate::types::ProvisionerKind;

/// Snapshot of supply and demand taken before a scheduling pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Demand {
    pub eligible_jobs: usize,
    pub free_vms: usize,
    /// VMs requested but not yet running.
    pub pending_vms: usize,
}

/// VM launches and terminations a provisioning pass asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningPlan {
    pub launch: usize,
    pub terminate: Vec<VmId>,
}

impl ProvisioningPlan {
    pub fn is_empty(&self) -> bool {
        self.launch == 0 && self.terminate.is_empty()
    }
}

/// VM count the static policy launches at time 0:
/// `ceil(budget / (deadline / 3600) / price_per_hour)`.
///
/// Degenerate inputs (zero deadline or price) give 0 rather than an
/// unbounded count.
pub fn static_vm_count(budget: f64, deadline: SimTime, price_per_hour: f64) -> usize {
    let hours = deadline / 3600.0;
    let count = (budget / hours / price_per_hour).ceil();
    if !count.is_finite() || count <= 0.0 {
        return 0;
    }
    count as usize
}

/// VM supply policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioner {
    /// Everything is decided up front; no decisions during the run.
    StaticBudget { planned: usize },
    /// Grow by one VM while demand exceeds supply; drop every free VM as
    /// soon as supply exceeds demand.
    AggressiveAutoscale { initial_vms: usize },
}

impl Provisioner {
    /// `initial_vms` is only used by the aggressive policy.
    pub fn new(
        kind: ProvisionerKind,
        budget: f64,
        deadline: SimTime,
        price_per_hour: f64,
        initial_vms: usize,
    ) -> Self {
        match kind {
            ProvisionerKind::Static => Provisioner::StaticBudget {
                planned: static_vm_count(budget, deadline, price_per_hour),
            },
            ProvisionerKind::Aggressive => Provisioner::AggressiveAutoscale { initial_vms },
        }
    }

    pub fn kind(&self) -> ProvisionerKind {
        match self {
            Provisioner::StaticBudget { .. } => ProvisionerKind::Static,
            Provisioner::AggressiveAutoscale { .. } => ProvisionerKind::Aggressive,
        }
    }

    /// VMs launched when the engine starts.
    pub fn initial_vms(&self) -> usize {
        match *self {
            Provisioner::StaticBudget { planned } => planned,
            Provisioner::AggressiveAutoscale { initial_vms } => initial_vms,
        }
    }

    /// VM count computed by the static policy, if that is the policy.
    pub fn planned_vms(&self) -> Option<usize> {
        match *self {
            Provisioner::StaticBudget { planned } => Some(planned),
            Provisioner::AggressiveAutoscale { .. } => None,
        }
    }

    /// Decide launches/terminations for one pass. `free` is the current
    /// free-VM set; only VMs from it are ever proposed for termination.
    pub fn provision_vms(&self, demand: Demand, free: &BTreeSet<VmId>) -> ProvisioningPlan {
        match self {
            Provisioner::StaticBudget { .. } => ProvisioningPlan::default(),
            Provisioner::AggressiveAutoscale { .. } => {
                if demand.eligible_jobs > demand.free_vms + demand.pending_vms {
                    ProvisioningPlan {
                        launch: 1,
                        terminate: Vec::new(),
                    }
                } else if demand.eligible_jobs < demand.free_vms {
                    ProvisioningPlan {
                        launch: 0,
                        terminate: free.iter().copied().collect(),
                    }
                } else {
                    ProvisioningPlan::default()
                }
            }
        }
    }
}
