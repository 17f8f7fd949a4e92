// src/policy/scheduler.rs

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, VecDeque};

use crate::cloud::VmId;
use crate::jobs::JobId;
use crate::types::SchedulerKind;

/// One job-to-VM pairing decided by a scheduling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment {
    pub job: JobId,
    pub vm: VmId,
}

/// Eligible-job queue plus the policy used to drain it.
///
/// The scheduler only decides pairings; the engine applies them (job and
/// VM state changes, `JOB_SUBMIT`).
#[derive(Debug, Clone)]
pub enum Scheduler {
    /// Jobs in the order they became eligible.
    Fifo(VecDeque<JobId>),
    /// Jobs by ascending priority number, then ascending job id.
    Priority(BinaryHeap<Reverse<(i32, JobId)>>),
}

impl Scheduler {
    pub fn new(kind: SchedulerKind) -> Self {
        match kind {
            SchedulerKind::Fifo => Scheduler::Fifo(VecDeque::new()),
            SchedulerKind::Priority => Scheduler::Priority(BinaryHeap::new()),
        }
    }

    pub fn kind(&self) -> SchedulerKind {
        match self {
            Scheduler::Fifo(_) => SchedulerKind::Fifo,
            Scheduler::Priority(_) => SchedulerKind::Priority,
        }
    }

    /// Add a job that just became eligible.
    pub fn enqueue(&mut self, job: JobId, priority: i32) {
        match self {
            Scheduler::Fifo(queue) => queue.push_back(job),
            Scheduler::Priority(heap) => heap.push(Reverse((priority, job))),
        }
    }

    /// Number of eligible jobs not yet dispatched.
    pub fn eligible_len(&self) -> usize {
        match self {
            Scheduler::Fifo(queue) => queue.len(),
            Scheduler::Priority(heap) => heap.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.eligible_len() == 0
    }

    /// Eligible jobs in dispatch order.
    pub fn eligible_jobs(&self) -> Vec<JobId> {
        match self {
            Scheduler::Fifo(queue) => queue.iter().copied().collect(),
            Scheduler::Priority(heap) => {
                let mut entries: Vec<(i32, JobId)> = heap.iter().map(|r| r.0).collect();
                entries.sort();
                entries.into_iter().map(|(_, job)| job).collect()
            }
        }
    }

    fn pop(&mut self) -> Option<JobId> {
        match self {
            Scheduler::Fifo(queue) => queue.pop_front(),
            Scheduler::Priority(heap) => heap.pop().map(|Reverse((_, job))| job),
        }
    }

    /// Pair eligible jobs with `free_vms` (ascending VM id) until either
    /// side is exhausted. Returns immediately when either side is empty.
    pub fn schedule_jobs(&mut self, free_vms: &BTreeSet<VmId>) -> Vec<Assignment> {
        if self.is_empty() || free_vms.is_empty() {
            return Vec::new();
        }

        let mut assignments = Vec::with_capacity(free_vms.len().min(self.eligible_len()));
        for &vm in free_vms {
            let Some(job) = self.pop() else {
                break;
            };
            assignments.push(Assignment { job, vm });
        }
        assignments
    }
}
