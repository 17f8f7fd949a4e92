// src/jobs/job.rs

use std::fmt;
use std::sync::Arc;

use crate::cloud::VmId;
use crate::dag::{Dag, Task, TaskIdx};
use crate::errors::{Result, WfsimError};
use crate::jobs::WorkflowId;
use crate::kernel::SimTime;

/// Handle of a job record in the [`World`](crate::kernel::World).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub usize);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Execution state of a job: `Created -> Submitted -> Running -> Success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Instantiated with its DAG; not yet assigned to a VM.
    Created,
    /// Assigned to a VM by the scheduler.
    Submitted,
    /// Inputs are staged and the VM is computing.
    Running,
    /// Computation and output staging are done.
    Success,
}

/// Runtime instance of one task of one admitted DAG.
///
/// Records are never destroyed; they stay in the world for reporting.
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    workflow: WorkflowId,
    dag: Arc<Dag>,
    task: TaskIdx,
    priority: i32,
    state: JobState,
    vm: Option<VmId>,
    eligible_time: Option<SimTime>,
    submit_time: Option<SimTime>,
    start_time: Option<SimTime>,
    finish_time: Option<SimTime>,
}

impl Job {
    pub fn new(id: JobId, workflow: WorkflowId, dag: Arc<Dag>, task: TaskIdx, priority: i32) -> Self {
        Self {
            id,
            workflow,
            dag,
            task,
            priority,
            state: JobState::Created,
            vm: None,
            eligible_time: None,
            submit_time: None,
            start_time: None,
            finish_time: None,
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn workflow(&self) -> WorkflowId {
        self.workflow
    }

    pub fn dag(&self) -> &Arc<Dag> {
        &self.dag
    }

    pub fn task_idx(&self) -> TaskIdx {
        self.task
    }

    pub fn task(&self) -> &Task {
        self.dag.task_at(self.task)
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// VM the job was assigned to; `None` until submitted.
    pub fn vm(&self) -> Option<VmId> {
        self.vm
    }

    /// Instant every parent job had reached `Success`.
    pub fn eligible_time(&self) -> Option<SimTime> {
        self.eligible_time
    }

    pub fn submit_time(&self) -> Option<SimTime> {
        self.submit_time
    }

    pub fn start_time(&self) -> Option<SimTime> {
        self.start_time
    }

    pub fn finish_time(&self) -> Option<SimTime> {
        self.finish_time
    }

    /// Time from start of execution to success (includes output staging).
    pub fn duration(&self) -> Option<SimTime> {
        Some(self.finish_time? - self.start_time?)
    }

    fn transition(&mut self, from: JobState, to: JobState) -> Result<()> {
        if self.state != from {
            return Err(WfsimError::transition(self.id.to_string(), self.state, to));
        }
        self.state = to;
        Ok(())
    }

    pub(crate) fn mark_eligible(&mut self, now: SimTime) {
        self.eligible_time.get_or_insert(now);
    }

    pub(crate) fn submit(&mut self, vm: VmId, now: SimTime) -> Result<()> {
        self.transition(JobState::Created, JobState::Submitted)?;
        self.vm = Some(vm);
        self.submit_time = Some(now);
        Ok(())
    }

    pub(crate) fn start(&mut self, now: SimTime) -> Result<()> {
        self.transition(JobState::Submitted, JobState::Running)?;
        self.start_time = Some(now);
        Ok(())
    }

    pub(crate) fn finish(&mut self, now: SimTime) -> Result<()> {
        self.transition(JobState::Running, JobState::Success)?;
        self.finish_time = Some(now);
        Ok(())
    }
}
