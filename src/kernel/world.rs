// src/kernel/world.rs

//! Arena of VM and job records.
//!
//! Entities refer to VMs and jobs through [`VmId`] / [`JobId`] handles into
//! this table instead of holding references to each other. Records are
//! never removed, so a handle stays valid for the whole run and terminal
//! records remain available for reporting.

use std::sync::Arc;

use crate::cloud::{Vm, VmId, VmSpec, VmState};
use crate::dag::{Dag, TaskIdx};
use crate::errors::{Result, WfsimError};
use crate::jobs::{Job, JobId, JobState, WorkflowId};

#[derive(Debug, Default)]
pub struct World {
    vms: Vec<Vm>,
    jobs: Vec<Job>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a VM record in the `Created` state.
    pub fn add_vm(&mut self, spec: &VmSpec) -> VmId {
        let id = VmId(self.vms.len());
        self.vms.push(Vm::new(id, *spec));
        id
    }

    /// Create a job record in the `Created` state for one task of `dag`.
    pub fn add_job(
        &mut self,
        workflow: WorkflowId,
        dag: Arc<Dag>,
        task: TaskIdx,
        priority: i32,
    ) -> JobId {
        let id = JobId(self.jobs.len());
        self.jobs.push(Job::new(id, workflow, dag, task, priority));
        id
    }

    pub fn vm(&self, id: VmId) -> Result<&Vm> {
        self.vms.get(id.0).ok_or(WfsimError::UnknownVm(id))
    }

    pub fn vm_mut(&mut self, id: VmId) -> Result<&mut Vm> {
        self.vms.get_mut(id.0).ok_or(WfsimError::UnknownVm(id))
    }

    pub fn job(&self, id: JobId) -> Result<&Job> {
        self.jobs.get(id.0).ok_or(WfsimError::UnknownJob(id))
    }

    pub fn job_mut(&mut self, id: JobId) -> Result<&mut Job> {
        self.jobs.get_mut(id.0).ok_or(WfsimError::UnknownJob(id))
    }

    pub fn vms(&self) -> impl Iterator<Item = &Vm> {
        self.vms.iter()
    }

    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter()
    }

    pub fn num_vms(&self) -> usize {
        self.vms.len()
    }

    pub fn num_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Jobs that reached `SUCCESS`.
    pub fn completed_jobs(&self) -> impl Iterator<Item = &Job> {
        self.jobs.iter().filter(|j| j.state() == JobState::Success)
    }

    /// VMs that reached `TERMINATED`.
    pub fn terminated_vms(&self) -> impl Iterator<Item = &Vm> {
        self.vms.iter().filter(|vm| vm.state() == VmState::Terminated)
    }

    /// Count of VMs per lifecycle bucket.
    pub fn vm_census(&self) -> VmCensus {
        let mut census = VmCensus::default();
        for vm in &self.vms {
            match vm.state() {
                VmState::Created => census.created += 1,
                VmState::Provisioning => census.provisioning += 1,
                VmState::Running if vm.running_job().is_some() => census.busy += 1,
                VmState::Running => census.free += 1,
                VmState::Terminating => census.terminating += 1,
                VmState::Terminated => census.terminated += 1,
            }
        }
        census
    }
}

/// Partition of VM records by lifecycle state and slot occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VmCensus {
    pub created: usize,
    pub provisioning: usize,
    pub free: usize,
    pub busy: usize,
    pub terminating: usize,
    pub terminated: usize,
}

impl VmCensus {
    /// VMs whose launch request has been accepted by the cloud.
    pub fn launched(&self) -> usize {
        self.provisioning + self.free + self.busy + self.terminating + self.terminated
    }
}
