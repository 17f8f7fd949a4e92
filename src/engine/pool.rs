// src/engine/pool.rs

use std::collections::BTreeSet;

use crate::cloud::VmId;
use crate::errors::{Result, WfsimError};
use crate::jobs::JobId;

/// The engine's view of the VMs it requested.
///
/// Every VM is in exactly one set at a time. Sets are ordered so that
/// scheduling passes see VMs in a consistent order.
#[derive(Debug, Default, Clone)]
pub struct VmPool {
    pending: BTreeSet<VmId>,
    free: BTreeSet<VmId>,
    busy: BTreeSet<VmId>,
    terminating: BTreeSet<VmId>,
    terminated: BTreeSet<VmId>,
}

impl VmPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// A launch request was sent for `vm`.
    pub fn requested(&mut self, vm: VmId) {
        self.pending.insert(vm);
    }

    /// `VM_LAUNCHED` arrived for `vm`.
    pub fn launched(&mut self, vm: VmId) {
        if self.pending.remove(&vm) {
            self.free.insert(vm);
        }
    }

    /// Move `vm` from free to busy for `job`.
    pub fn occupy(&mut self, vm: VmId, job: JobId) -> Result<()> {
        if self.free.remove(&vm) {
            self.busy.insert(vm);
            return Ok(());
        }
        if self.busy.contains(&vm) {
            return Err(WfsimError::VmAlreadyBusy { vm, job });
        }
        Err(WfsimError::transition(vm.to_string(), "not free", "Busy"))
    }

    /// `vm`'s job finished.
    pub fn release(&mut self, vm: VmId) {
        if self.busy.remove(&vm) {
            self.free.insert(vm);
        }
    }

    /// A termination was requested; the VM is no longer schedulable.
    pub fn mark_terminating(&mut self, vm: VmId) {
        self.pending.remove(&vm);
        self.free.remove(&vm);
        self.busy.remove(&vm);
        self.terminating.insert(vm);
    }

    /// `VM_TERMINATED` arrived for `vm`. Also covers VMs the cloud tore down
    /// on its own (drain).
    pub fn terminated(&mut self, vm: VmId) {
        self.pending.remove(&vm);
        self.free.remove(&vm);
        self.busy.remove(&vm);
        self.terminating.remove(&vm);
        self.terminated.insert(vm);
    }

    pub fn free(&self) -> &BTreeSet<VmId> {
        &self.free
    }

    pub fn busy(&self) -> &BTreeSet<VmId> {
        &self.busy
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn busy_count(&self) -> usize {
        self.busy.len()
    }

    pub fn terminating_count(&self) -> usize {
        self.terminating.len()
    }

    pub fn terminated_count(&self) -> usize {
        self.terminated.len()
    }

    /// Every VM ever requested.
    pub fn total(&self) -> usize {
        self.pending.len()
            + self.free.len()
            + self.busy.len()
            + self.terminating.len()
            + self.terminated.len()
    }
}
