// src/cloud/vm_entity.rs

use std::any::Any;

use tracing::{debug, info};

use crate::cloud::VmId;
use crate::errors::{Result, WfsimError};
use crate::jobs::JobState;
use crate::kernel::{Entity, EntityId, Event, SimContext, WorkflowEvent};

/// Execution slot of one VM.
///
/// A submitted job walks through: stage inputs via the storage manager,
/// compute for `size / processing_rate` seconds, stage outputs, then report
/// `JOB_FINISHED` to whoever submitted it.
#[derive(Debug)]
pub struct VmEntity {
    vm: VmId,
    name: String,
    storage: EntityId,
    submitter: Option<EntityId>,
}

impl VmEntity {
    pub fn new(vm: VmId, storage: EntityId) -> Self {
        Self {
            vm,
            name: vm.to_string(),
            storage,
            submitter: None,
        }
    }

    pub fn vm(&self) -> VmId {
        self.vm
    }

    fn submitter(&self) -> Result<EntityId> {
        self.submitter.ok_or_else(|| {
            WfsimError::Other(anyhow::anyhow!("{} has no job submitter", self.vm))
        })
    }
}

impl Entity for VmEntity {
    fn name(&self) -> &str {
        &self.name
    }

    fn process_event(&mut self, event: Event, ctx: &mut SimContext<'_>) -> Result<()> {
        match event.payload {
            WorkflowEvent::JobSubmit(job) => {
                // Only jobs the engine already marked Submitted on this VM are
                // accepted; anything else is rejected here, before staging.
                let record = ctx.world().job(job)?;
                if record.state() != JobState::Submitted || record.vm() != Some(self.vm) {
                    return Err(WfsimError::transition(
                        format!("{job} on {}", self.vm),
                        record.state(),
                        JobState::Submitted,
                    ));
                }
                ctx.world_mut().vm_mut(self.vm)?.accept(job)?;
                self.submitter = Some(event.source);
                debug!(vm = %self.vm, job = %job, "job accepted; staging inputs");
                ctx.send_now(self.storage, WorkflowEvent::StorageBeforeTaskStart(job));
            }
            WorkflowEvent::StorageAllBeforeTransfersCompleted(job) => {
                let now = ctx.now();
                let rate = ctx.world().vm(self.vm)?.spec().processing_rate;
                let record = ctx.world_mut().job_mut(job)?;
                record.start(now)?;
                let duration = record.task().size / rate;
                info!(vm = %self.vm, job = %job, duration, "job started");

                let submitter = self.submitter()?;
                ctx.send_now(submitter, WorkflowEvent::JobStarted(job));
                ctx.schedule_self(duration, WorkflowEvent::JobExecutionCompleted(job))?;
            }
            WorkflowEvent::JobExecutionCompleted(job) => {
                debug!(vm = %self.vm, job = %job, "execution done; staging outputs");
                ctx.send_now(self.storage, WorkflowEvent::StorageAfterTaskCompleted(job));
            }
            WorkflowEvent::StorageAllAfterTransfersCompleted(job) => {
                let now = ctx.now();
                ctx.world_mut().job_mut(job)?.finish(now)?;
                ctx.world_mut().vm_mut(self.vm)?.release();
                info!(vm = %self.vm, job = %job, "job finished");

                let submitter = self.submitter()?;
                ctx.send_now(submitter, WorkflowEvent::JobFinished(job));
            }
            other => return Err(other.unknown_to(&self.name)),
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
