// src/storage/manager.rs

use std::any::Any;
use std::collections::HashMap;

use tracing::debug;

use crate::errors::{Result, WfsimError};
use crate::jobs::JobId;
use crate::kernel::{Entity, EntityId, Event, SimContext, WorkflowEvent};
use crate::storage::{TransferDirection, TransferModel};

#[derive(Debug)]
struct PendingTransfers {
    remaining: usize,
    reply_to: EntityId,
}

/// Running totals of staged files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub files_in: usize,
    pub bytes_in: u64,
    pub files_out: usize,
    pub bytes_out: u64,
}

/// Entity implementing the before/after-task file-transfer protocol.
///
/// On `STORAGE_BEFORE_TASK_START` one transfer per input file is started;
/// when the last of them completes, `STORAGE_ALL_BEFORE_TRANSFERS_COMPLETED`
/// goes back to the requester (the job's VM). Output files follow the same
/// pattern on `STORAGE_AFTER_TASK_COMPLETED`. A job without files is
/// answered at the request time.
#[derive(Debug, Default)]
pub struct StorageManager {
    model: TransferModel,
    pending: HashMap<(JobId, TransferDirection), PendingTransfers>,
    stats: TransferStats,
}

impl StorageManager {
    pub fn new(model: TransferModel) -> Self {
        Self {
            model,
            pending: HashMap::new(),
            stats: TransferStats::default(),
        }
    }

    pub fn model(&self) -> TransferModel {
        self.model
    }

    pub fn stats(&self) -> TransferStats {
        self.stats
    }

    /// Jobs with transfers still in flight.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    fn request(
        &mut self,
        job: JobId,
        direction: TransferDirection,
        reply_to: EntityId,
        ctx: &mut SimContext<'_>,
    ) -> Result<()> {
        if self.pending.contains_key(&(job, direction)) {
            return Err(WfsimError::Other(anyhow::anyhow!(
                "duplicate {direction:?} transfer request for {job}"
            )));
        }

        let task = ctx.world().job(job)?.task();
        let files = match direction {
            TransferDirection::Input => &task.inputs,
            TransferDirection::Output => &task.outputs,
        };
        let durations: Vec<_> = files
            .iter()
            .map(|f| (f.size, self.model.transfer_time(f)))
            .collect();

        if durations.is_empty() {
            debug!(job = %job, ?direction, "no files to stage");
            ctx.send_now(reply_to, all_completed(job, direction));
            return Ok(());
        }

        for (size, duration) in &durations {
            match direction {
                TransferDirection::Input => {
                    self.stats.files_in += 1;
                    self.stats.bytes_in += size;
                }
                TransferDirection::Output => {
                    self.stats.files_out += 1;
                    self.stats.bytes_out += size;
                }
            }
            ctx.schedule_self(*duration, WorkflowEvent::StorageTransferCompleted { job, direction })?;
        }

        debug!(job = %job, ?direction, files = durations.len(), "transfers started");
        self.pending.insert(
            (job, direction),
            PendingTransfers {
                remaining: durations.len(),
                reply_to,
            },
        );
        Ok(())
    }

    fn transfer_completed(
        &mut self,
        job: JobId,
        direction: TransferDirection,
        ctx: &mut SimContext<'_>,
    ) -> Result<()> {
        let entry = self.pending.get_mut(&(job, direction)).ok_or_else(|| {
            WfsimError::Other(anyhow::anyhow!(
                "transfer completion for {job} ({direction:?}) without a pending request"
            ))
        })?;
        entry.remaining -= 1;
        if entry.remaining > 0 {
            return Ok(());
        }

        let reply_to = entry.reply_to;
        self.pending.remove(&(job, direction));
        debug!(job = %job, ?direction, "all transfers completed");
        ctx.send_now(reply_to, all_completed(job, direction));
        Ok(())
    }
}

fn all_completed(job: JobId, direction: TransferDirection) -> WorkflowEvent {
    match direction {
        TransferDirection::Input => WorkflowEvent::StorageAllBeforeTransfersCompleted(job),
        TransferDirection::Output => WorkflowEvent::StorageAllAfterTransfersCompleted(job),
    }
}

impl Entity for StorageManager {
    fn name(&self) -> &str {
        "storage"
    }

    fn process_event(&mut self, event: Event, ctx: &mut SimContext<'_>) -> Result<()> {
        match event.payload {
            WorkflowEvent::StorageBeforeTaskStart(job) => {
                self.request(job, TransferDirection::Input, event.source, ctx)
            }
            WorkflowEvent::StorageAfterTaskCompleted(job) => {
                self.request(job, TransferDirection::Output, event.source, ctx)
            }
            WorkflowEvent::StorageTransferCompleted { job, direction } => {
                self.transfer_completed(job, direction, ctx)
            }
            other => Err(other.unknown_to(self.name())),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
