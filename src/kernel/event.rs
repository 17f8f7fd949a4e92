// src/kernel/event.rs

//! Workflow event protocol.
//!
//! Every message exchanged between entities is a [`WorkflowEvent`]. Each
//! variant carries a stable integer tag (see [`tags`]) which is what gets
//! reported when an entity receives something it does not handle.

use std::sync::Arc;

use crate::cloud::VmId;
use crate::dag::Dag;
use crate::engine::DagJob;
use crate::errors::WfsimError;
use crate::jobs::JobId;
use crate::kernel::{EntityId, SimTime};
use crate::storage::TransferDirection;

/// Integer tags of the event protocol.
pub mod tags {
    pub const VM_LAUNCH: i32 = 1;
    pub const VM_LAUNCHED: i32 = 2;
    pub const VM_TERMINATE: i32 = 3;
    pub const VM_TERMINATED: i32 = 4;
    pub const JOB_SUBMIT: i32 = 5;
    pub const JOB_STARTED: i32 = 6;
    pub const JOB_FINISHED: i32 = 7;
    pub const STORAGE_BEFORE_TASK_START: i32 = 8;
    pub const STORAGE_ALL_BEFORE_TRANSFERS_COMPLETED: i32 = 9;
    pub const STORAGE_AFTER_TASK_COMPLETED: i32 = 10;
    pub const STORAGE_ALL_AFTER_TRANSFERS_COMPLETED: i32 = 11;

    pub const VM_PROVISIONED: i32 = 20;
    pub const VM_DEPROVISIONED: i32 = 21;
    pub const JOB_EXECUTION_COMPLETED: i32 = 22;
    pub const STORAGE_TRANSFER_COMPLETED: i32 = 23;

    pub const DAG_SUBMIT: i32 = 30;
    pub const DAG_STARTED: i32 = 31;
    pub const DAG_FINISHED: i32 = 32;
}

/// Payload of a simulation event.
#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    /// Request the cloud to provision a VM.
    VmLaunch(VmId),
    /// Cloud -> requester: the VM is running.
    VmLaunched(VmId),
    /// Request the cloud to tear down a VM.
    VmTerminate(VmId),
    /// Cloud -> requester: the VM is terminated.
    VmTerminated(VmId),
    /// Scheduler -> VM: execute this job.
    JobSubmit(JobId),
    /// VM -> requester: execution began.
    JobStarted(JobId),
    /// VM -> requester: execution completed and outputs are staged.
    JobFinished(JobId),
    StorageBeforeTaskStart(JobId),
    StorageAllBeforeTransfersCompleted(JobId),
    StorageAfterTaskCompleted(JobId),
    StorageAllAfterTransfersCompleted(JobId),

    /// Cloud self-event: provisioning delay elapsed.
    VmProvisioned(VmId),
    /// Cloud self-event: deprovisioning delay elapsed.
    VmDeprovisioned(VmId),
    /// VM self-event: computation of the job is done.
    JobExecutionCompleted(JobId),
    /// Storage self-event: one file transfer of a job is done.
    StorageTransferCompleted {
        job: JobId,
        direction: TransferDirection,
    },

    /// Ensemble -> engine: admit this DAG.
    DagSubmit { dag: Arc<Dag>, priority: i32 },
    /// Engine -> ensemble: the DAG was admitted.
    DagStarted(DagJob),
    /// Engine -> ensemble: every job of the DAG reached SUCCESS.
    DagFinished(DagJob),

    /// An opaque tag outside the protocol.
    Custom(i32),
}

impl WorkflowEvent {
    pub fn tag(&self) -> i32 {
        use WorkflowEvent::*;
        match self {
            VmLaunch(_) => tags::VM_LAUNCH,
            VmLaunched(_) => tags::VM_LAUNCHED,
            VmTerminate(_) => tags::VM_TERMINATE,
            VmTerminated(_) => tags::VM_TERMINATED,
            JobSubmit(_) => tags::JOB_SUBMIT,
            JobStarted(_) => tags::JOB_STARTED,
            JobFinished(_) => tags::JOB_FINISHED,
            StorageBeforeTaskStart(_) => tags::STORAGE_BEFORE_TASK_START,
            StorageAllBeforeTransfersCompleted(_) => tags::STORAGE_ALL_BEFORE_TRANSFERS_COMPLETED,
            StorageAfterTaskCompleted(_) => tags::STORAGE_AFTER_TASK_COMPLETED,
            StorageAllAfterTransfersCompleted(_) => tags::STORAGE_ALL_AFTER_TRANSFERS_COMPLETED,
            VmProvisioned(_) => tags::VM_PROVISIONED,
            VmDeprovisioned(_) => tags::VM_DEPROVISIONED,
            JobExecutionCompleted(_) => tags::JOB_EXECUTION_COMPLETED,
            StorageTransferCompleted { .. } => tags::STORAGE_TRANSFER_COMPLETED,
            DagSubmit { .. } => tags::DAG_SUBMIT,
            DagStarted(_) => tags::DAG_STARTED,
            DagFinished(_) => tags::DAG_FINISHED,
            Custom(tag) => *tag,
        }
    }

    /// Protocol name of the event, used in logs.
    pub fn name(&self) -> &'static str {
        use WorkflowEvent::*;
        match self {
            VmLaunch(_) => "VM_LAUNCH",
            VmLaunched(_) => "VM_LAUNCHED",
            VmTerminate(_) => "VM_TERMINATE",
            VmTerminated(_) => "VM_TERMINATED",
            JobSubmit(_) => "JOB_SUBMIT",
            JobStarted(_) => "JOB_STARTED",
            JobFinished(_) => "JOB_FINISHED",
            StorageBeforeTaskStart(_) => "STORAGE_BEFORE_TASK_START",
            StorageAllBeforeTransfersCompleted(_) => "STORAGE_ALL_BEFORE_TRANSFERS_COMPLETED",
            StorageAfterTaskCompleted(_) => "STORAGE_AFTER_TASK_COMPLETED",
            StorageAllAfterTransfersCompleted(_) => "STORAGE_ALL_AFTER_TRANSFERS_COMPLETED",
            VmProvisioned(_) => "VM_PROVISIONED",
            VmDeprovisioned(_) => "VM_DEPROVISIONED",
            JobExecutionCompleted(_) => "JOB_EXECUTION_COMPLETED",
            StorageTransferCompleted { .. } => "STORAGE_TRANSFER_COMPLETED",
            DagSubmit { .. } => "DAG_SUBMIT",
            DagStarted(_) => "DAG_STARTED",
            DagFinished(_) => "DAG_FINISHED",
            Custom(_) => "CUSTOM",
        }
    }

    /// Build the fatal error for an entity that does not handle this event.
    pub fn unknown_to(&self, entity: &str) -> WfsimError {
        WfsimError::UnknownWorkflowEvent {
            entity: entity.to_string(),
            tag: self.tag(),
        }
    }
}

/// An event as stored in the queue and delivered to its target.
#[derive(Debug, Clone)]
pub struct Event {
    /// Absolute delivery time.
    pub time: SimTime,
    /// Insertion sequence number; breaks ties between equal times.
    pub seq: u64,
    pub source: EntityId,
    pub target: EntityId,
    pub payload: WorkflowEvent,
}
