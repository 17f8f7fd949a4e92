// src/jobs/tracker.rs

//! Per-workflow eligibility tracking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::dag::{Dag, TaskIdx};
use crate::errors::{Result, WfsimError};
use crate::jobs::JobId;
use crate::kernel::{SimTime, World};

/// One admitted DAG instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkflowId(pub usize);

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wf-{}", self.0)
    }
}

#[derive(Debug)]
struct Workflow {
    dag: Arc<Dag>,
    /// Job of each task, indexed by `TaskIdx`.
    jobs: Vec<JobId>,
    completed: Vec<bool>,
    remaining: usize,
}

/// Maps tasks to jobs per workflow and decides when a job becomes eligible.
///
/// Lookups are scoped to the workflow instance because task ids repeat
/// across copies of the same DAG.
#[derive(Debug, Default)]
pub struct EligibilityTracker {
    workflows: Vec<Workflow>,
    by_job: HashMap<JobId, (WorkflowId, TaskIdx)>,
}

impl EligibilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instantiate one job per task of `dag` and return the workflow id and
    /// the jobs of the root tasks, which are eligible immediately.
    pub fn admit(
        &mut self,
        dag: Arc<Dag>,
        priority: i32,
        world: &mut World,
        now: SimTime,
    ) -> (WorkflowId, Vec<JobId>) {
        let workflow = WorkflowId(self.workflows.len());

        let jobs: Vec<JobId> = (0..dag.num_tasks())
            .map(|i| {
                let job = world.add_job(workflow, dag.clone(), TaskIdx(i), priority);
                self.by_job.insert(job, (workflow, TaskIdx(i)));
                job
            })
            .collect();

        let mut eligible = Vec::new();
        for root in dag.roots() {
            let job = jobs[root.0];
            if let Ok(record) = world.job_mut(job) {
                record.mark_eligible(now);
            }
            eligible.push(job);
        }

        debug!(
            workflow = %workflow,
            dag = dag.name(),
            jobs = jobs.len(),
            roots = eligible.len(),
            "workflow admitted"
        );

        self.workflows.push(Workflow {
            remaining: jobs.len(),
            completed: vec![false; jobs.len()],
            jobs,
            dag,
        });

        (workflow, eligible)
    }

    /// Record that `job` reached `Success` and return the children that
    /// became eligible as a result.
    ///
    /// A child is eligible once every one of its parents has completed
    /// within the same workflow. Completing the same job twice is an error.
    pub fn complete(&mut self, job: JobId, world: &mut World, now: SimTime) -> Result<Vec<JobId>> {
        let (workflow, task) = *self.by_job.get(&job).ok_or(WfsimError::UnknownJob(job))?;
        let wf = &mut self.workflows[workflow.0];

        if wf.completed[task.0] {
            return Err(WfsimError::transition(job.to_string(), "Success", "Success"));
        }
        wf.completed[task.0] = true;
        wf.remaining -= 1;

        let mut eligible = Vec::new();
        for &child in wf.dag.children(task) {
            let ready = wf
                .dag
                .parents(child)
                .iter()
                .all(|parent| wf.completed[parent.0]);
            if ready {
                let child_job = wf.jobs[child.0];
                world.job_mut(child_job)?.mark_eligible(now);
                eligible.push(child_job);
            }
        }

        Ok(eligible)
    }

    pub fn num_workflows(&self) -> usize {
        self.workflows.len()
    }

    /// Jobs of a workflow, in task order.
    pub fn jobs_of(&self, workflow: WorkflowId) -> &[JobId] {
        self.workflows
            .get(workflow.0)
            .map(|wf| wf.jobs.as_slice())
            .unwrap_or(&[])
    }

    /// Job instantiated for task `task_id` in `workflow`.
    pub fn job_for(&self, workflow: WorkflowId, task_id: &str) -> Result<JobId> {
        let wf = self
            .workflows
            .get(workflow.0)
            .ok_or_else(|| WfsimError::TaskNotFound(format!("{workflow}/{task_id}")))?;
        let idx = wf
            .dag
            .index_of(task_id)
            .ok_or_else(|| WfsimError::TaskNotFound(format!("{workflow}/{task_id}")))?;
        Ok(wf.jobs[idx.0])
    }

    pub fn workflow_of(&self, job: JobId) -> Option<WorkflowId> {
        self.by_job.get(&job).map(|(wf, _)| *wf)
    }

    /// Every job of the workflow has completed.
    pub fn is_complete(&self, workflow: WorkflowId) -> bool {
        self.workflows
            .get(workflow.0)
            .is_some_and(|wf| wf.remaining == 0)
    }

    pub fn remaining(&self, workflow: WorkflowId) -> usize {
        self.workflows.get(workflow.0).map_or(0, |wf| wf.remaining)
    }
}
