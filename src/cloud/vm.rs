// src/cloud/vm.rs

//! VM records, lifecycle state machine and billing.

use std::fmt;

use crate::errors::{Result, WfsimError};
use crate::jobs::JobId;
use crate::kernel::{EntityId, SimTime};

/// Handle of a VM record in the [`World`](crate::kernel::World).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VmId(pub usize);

impl fmt::Display for VmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vm-{}", self.0)
    }
}

/// Lifecycle of a leased VM.
///
/// `Created -> Provisioning -> Running -> Terminating -> Terminated`, with a
/// shortcut `Provisioning -> Terminating` for launches torn down before they
/// complete. There are no transitions back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VmState {
    /// Record exists; the cloud has not seen the launch request yet.
    Created,
    Provisioning,
    Running,
    Terminating,
    Terminated,
}

impl VmState {
    fn can_advance_to(self, next: VmState) -> bool {
        use VmState::*;
        matches!(
            (self, next),
            (Created, Provisioning)
                | (Provisioning, Running)
                | (Provisioning, Terminating)
                | (Running, Terminating)
                | (Terminating, Terminated)
        )
    }
}

/// Static characteristics of a VM type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VmSpec {
    /// Work units executed per second.
    pub processing_rate: f64,
    /// Price charged per started billing unit.
    pub price: f64,
    /// Billing granularity in seconds.
    pub billing_unit: SimTime,
    pub provisioning_delay: SimTime,
    pub deprovisioning_delay: SimTime,
}

impl Default for VmSpec {
    fn default() -> Self {
        Self {
            processing_rate: 1.0,
            price: 1.0,
            billing_unit: 3600.0,
            provisioning_delay: 0.0,
            deprovisioning_delay: 0.0,
        }
    }
}

impl VmSpec {
    /// Price of one hour of runtime.
    pub fn price_per_hour(&self) -> f64 {
        self.price * 3600.0 / self.billing_unit
    }

    /// Execution time of `size` work units on this VM type.
    pub fn execution_time(&self, size: f64) -> SimTime {
        size / self.processing_rate
    }
}

/// Cost of running a VM for `runtime` seconds: every started billing unit
/// is charged in full. A non-positive runtime costs nothing.
pub fn billed_cost(runtime: SimTime, billing_unit: SimTime, price: f64) -> f64 {
    if runtime <= 0.0 {
        return 0.0;
    }
    (runtime / billing_unit).ceil() * price
}

/// One leased compute resource.
#[derive(Debug, Clone)]
pub struct Vm {
    id: VmId,
    spec: VmSpec,
    state: VmState,
    entity: Option<EntityId>,
    owner: Option<EntityId>,
    running_job: Option<JobId>,
    launch_time: Option<SimTime>,
    terminate_time: Option<SimTime>,
    cost: f64,
    jobs_executed: usize,
}

impl Vm {
    pub fn new(id: VmId, spec: VmSpec) -> Self {
        Self {
            id,
            spec,
            state: VmState::Created,
            entity: None,
            owner: None,
            running_job: None,
            launch_time: None,
            terminate_time: None,
            cost: 0.0,
            jobs_executed: 0,
        }
    }

    pub fn id(&self) -> VmId {
        self.id
    }

    pub fn spec(&self) -> &VmSpec {
        &self.spec
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    /// Entity simulating this VM's execution slot, once launched.
    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    /// Entity that requested the launch; lifecycle replies go there.
    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub fn running_job(&self) -> Option<JobId> {
        self.running_job
    }

    pub fn launch_time(&self) -> Option<SimTime> {
        self.launch_time
    }

    pub fn terminate_time(&self) -> Option<SimTime> {
        self.terminate_time
    }

    /// Finalized billing; zero until the VM starts terminating.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn jobs_executed(&self) -> usize {
        self.jobs_executed
    }

    /// Running with an empty execution slot.
    pub fn is_free(&self) -> bool {
        self.state == VmState::Running && self.running_job.is_none()
    }

    pub fn is_busy(&self) -> bool {
        self.running_job.is_some()
    }

    /// Billable runtime; zero for VMs that never reached `Running`.
    pub fn runtime(&self) -> SimTime {
        match (self.launch_time, self.terminate_time) {
            (Some(launch), Some(terminate)) => terminate - launch,
            _ => 0.0,
        }
    }

    fn advance(&mut self, next: VmState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            return Err(WfsimError::transition(self.id.to_string(), self.state, next));
        }
        self.state = next;
        Ok(())
    }

    pub(crate) fn begin_provisioning(&mut self, owner: EntityId, entity: EntityId) -> Result<()> {
        self.advance(VmState::Provisioning)?;
        self.owner = Some(owner);
        self.entity = Some(entity);
        Ok(())
    }

    pub(crate) fn mark_running(&mut self, now: SimTime) -> Result<()> {
        self.advance(VmState::Running)?;
        self.launch_time = Some(now);
        Ok(())
    }

    /// Enter `Terminating` and fix the VM's cost.
    pub(crate) fn begin_terminating(&mut self, now: SimTime) -> Result<()> {
        self.advance(VmState::Terminating)?;
        self.terminate_time = Some(now);
        self.cost = billed_cost(self.runtime(), self.spec.billing_unit, self.spec.price);
        Ok(())
    }

    pub(crate) fn mark_terminated(&mut self) -> Result<()> {
        self.advance(VmState::Terminated)
    }

    /// Occupy the execution slot with `job`. Any second `accept` before
    /// the slot is released is [`WfsimError::VmAlreadyBusy`], even for the same job.
    pub fn accept(&mut self, job: JobId) -> Result<()> {
        if self.running_job.is_some() {
            return Err(WfsimError::VmAlreadyBusy { vm: self.id, job });
        }
        if self.state != VmState::Running {
            return Err(WfsimError::transition(
                format!("{} slot", self.id),
                self.state,
                "Busy",
            ));
        }
        self.running_job = Some(job);
        Ok(())
    }

    /// Free the execution slot, returning the job that occupied it.
    pub(crate) fn release(&mut self) -> Option<JobId> {
        let job = self.running_job.take();
        if job.is_some() {
            self.jobs_executed += 1;
        }
        job
    }
}
