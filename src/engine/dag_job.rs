// src/engine/dag_job.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::dag::Dag;
use crate::jobs::{JobId, WorkflowId};
use crate::kernel::SimTime;

/// One DAG instance inside an ensemble run.
///
/// Finished the instant its last job reaches `Success`.
#[derive(Debug, Clone)]
pub struct DagJob {
    pub workflow: WorkflowId,
    pub dag: Arc<Dag>,
    pub priority: i32,
    pub jobs: Vec<JobId>,
    pub completed: BTreeSet<JobId>,
    pub admit_time: SimTime,
    pub finish_time: Option<SimTime>,
}

impl DagJob {
    pub fn new(
        workflow: WorkflowId,
        dag: Arc<Dag>,
        priority: i32,
        jobs: Vec<JobId>,
        admit_time: SimTime,
    ) -> Self {
        // An empty DAG has nothing to wait for.
        let finish_time = jobs.is_empty().then_some(admit_time);
        Self {
            workflow,
            dag,
            priority,
            jobs,
            completed: BTreeSet::new(),
            admit_time,
            finish_time,
        }
    }

    pub fn name(&self) -> &str {
        self.dag.name()
    }

    pub fn is_finished(&self) -> bool {
        self.completed.len() == self.jobs.len()
    }

    /// Record a completed job; returns `true` when this completion finished
    /// the DAG.
    pub fn job_completed(&mut self, job: JobId, now: SimTime) -> bool {
        if !self.completed.insert(job) {
            return false;
        }
        if self.is_finished() {
            self.finish_time = Some(now);
            return true;
        }
        false
    }
}
