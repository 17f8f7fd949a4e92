// src/engine/workflow_engine.rs

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cloud::{VmId, VmSpec};
use crate::dag::Dag;
use crate::engine::listeners::JobListener;
use crate::engine::{DagJob, VmPool};
use crate::errors::{Result, WfsimError};
use crate::jobs::{EligibilityTracker, JobId, WorkflowId};
use crate::kernel::{Entity, EntityId, Event, SimContext, SimTime, WorkflowEvent};
use crate::policy::{Assignment, Demand, Provisioner, Scheduler};

/// Budget, deadline and VM type of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub budget: f64,
    /// Seconds of simulated time.
    pub deadline: SimTime,
    pub vm_spec: VmSpec,
}

/// Command produced by a scheduling pass, applied right after planning.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    /// Create a VM record and ask the cloud to launch it.
    LaunchVm,
    /// Ask the cloud to tear a free VM down.
    TerminateVm(VmId),
    /// Hand a job to a VM.
    SubmitJob(Assignment),
}

/// Entity coordinating the scheduler and provisioner for every admitted
/// DAG, and keeping the budget/cost books of the run.
pub struct WorkflowEngine {
    cloud: EntityId,
    settings: EngineSettings,
    scheduler: Scheduler,
    provisioner: Provisioner,
    tracker: EligibilityTracker,
    pool: VmPool,
    dag_jobs: Vec<DagJob>,
    submitters: Vec<EntityId>,
    listeners: Vec<Box<dyn JobListener>>,
    cost: f64,
    jobs_finished: usize,
    passes: usize,
}

impl fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("settings", &self.settings)
            .field("scheduler", &self.scheduler.kind())
            .field("provisioner", &self.provisioner)
            .field("pool", &self.pool)
            .field("dags", &self.dag_jobs.len())
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

impl WorkflowEngine {
    pub fn new(
        cloud: EntityId,
        settings: EngineSettings,
        scheduler: Scheduler,
        provisioner: Provisioner,
    ) -> Self {
        Self {
            cloud,
            settings,
            scheduler,
            provisioner,
            tracker: EligibilityTracker::new(),
            pool: VmPool::new(),
            dag_jobs: Vec::new(),
            submitters: Vec::new(),
            listeners: Vec::new(),
            cost: 0.0,
            jobs_finished: 0,
            passes: 0,
        }
    }

    pub fn add_listener(&mut self, listener: impl JobListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Sum of finalized VM billing reported back by the cloud.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Every admitted DAG instance, in admission order.
    pub fn all_dags(&self) -> &[DagJob] {
        &self.dag_jobs
    }

    pub fn dag_job(&self, workflow: WorkflowId) -> Option<&DagJob> {
        self.dag_jobs.get(workflow.0)
    }

    /// Latest finish time over the finished DAGs.
    pub fn actual_finish_time(&self) -> Option<SimTime> {
        self.dag_jobs
            .iter()
            .filter_map(|d| d.finish_time)
            .max_by(|a, b| a.total_cmp(b))
    }

    pub fn all_dags_finished(&self) -> bool {
        self.dag_jobs.iter().all(DagJob::is_finished)
    }

    pub fn jobs_finished(&self) -> usize {
        self.jobs_finished
    }

    pub fn scheduling_passes(&self) -> usize {
        self.passes
    }

    pub fn pool(&self) -> &VmPool {
        &self.pool
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn provisioner(&self) -> &Provisioner {
        &self.provisioner
    }

    pub fn tracker(&self) -> &EligibilityTracker {
        &self.tracker
    }

    fn admit(
        &mut self,
        dag: Arc<Dag>,
        priority: i32,
        submitter: EntityId,
        ctx: &mut SimContext<'_>,
    ) -> Result<()> {
        let now = ctx.now();
        let (workflow, roots) = self.tracker.admit(dag.clone(), priority, ctx.world_mut(), now);
        for &job in &roots {
            self.scheduler.enqueue(job, priority);
        }

        let jobs = self.tracker.jobs_of(workflow).to_vec();
        let dag_job = DagJob::new(workflow, dag, priority, jobs, now);
        info!(
            workflow = %workflow,
            dag = dag_job.name(),
            priority,
            jobs = dag_job.jobs.len(),
            "DAG admitted"
        );

        ctx.send_now(submitter, WorkflowEvent::DagStarted(dag_job.clone()));
        if dag_job.is_finished() {
            ctx.send_now(submitter, WorkflowEvent::DagFinished(dag_job.clone()));
        }
        self.dag_jobs.push(dag_job);
        self.submitters.push(submitter);

        self.schedule_pass(ctx)
    }

    fn job_finished(&mut self, job: JobId, ctx: &mut SimContext<'_>) -> Result<()> {
        let now = ctx.now();
        let record = ctx.world().job(job)?;
        let vm = record.vm().ok_or_else(|| {
            WfsimError::Other(anyhow::anyhow!("{job} finished without an assigned VM"))
        })?;
        let priority = record.priority();
        for listener in self.listeners.iter_mut() {
            listener.job_finished(record, now);
        }

        self.pool.release(vm);
        self.jobs_finished += 1;

        let eligible = self.tracker.complete(job, ctx.world_mut(), now)?;
        debug!(job = %job, newly_eligible = eligible.len(), "job completed");
        for child in eligible {
            self.scheduler.enqueue(child, priority);
        }

        let workflow = self
            .tracker
            .workflow_of(job)
            .ok_or(WfsimError::UnknownJob(job))?;
        if let Some(dag_job) = self.dag_jobs.get_mut(workflow.0) {
            if dag_job.job_completed(job, now) {
                info!(workflow = %workflow, dag = dag_job.name(), time = now, "DAG finished");
                let snapshot = dag_job.clone();
                ctx.send_now(self.submitters[workflow.0], WorkflowEvent::DagFinished(snapshot));
            }
        }

        self.schedule_pass(ctx)
    }

    /// Decide launches, terminations and assignments for the current state.
    ///
    /// Terminated VMs leave the free set here, so they are never assigned
    /// in the same pass.
    pub fn plan_pass(&mut self) -> Vec<EngineCommand> {
        let demand = Demand {
            eligible_jobs: self.scheduler.eligible_len(),
            free_vms: self.pool.free_count(),
            pending_vms: self.pool.pending_count(),
        };
        let plan = self.provisioner.provision_vms(demand, self.pool.free());

        let mut commands = Vec::new();
        commands.extend(std::iter::repeat_n(EngineCommand::LaunchVm, plan.launch));
        for vm in plan.terminate {
            self.pool.mark_terminating(vm);
            commands.push(EngineCommand::TerminateVm(vm));
        }

        commands.extend(
            self.scheduler
                .schedule_jobs(self.pool.free())
                .into_iter()
                .map(EngineCommand::SubmitJob),
        );
        commands
    }

    fn schedule_pass(&mut self, ctx: &mut SimContext<'_>) -> Result<()> {
        self.passes += 1;
        let commands = self.plan_pass();
        for command in commands {
            self.apply(command, ctx)?;
        }
        Ok(())
    }

    fn apply(&mut self, command: EngineCommand, ctx: &mut SimContext<'_>) -> Result<()> {
        match command {
            EngineCommand::LaunchVm => self.launch_vm(ctx),
            EngineCommand::TerminateVm(vm) => {
                debug!(vm = %vm, "requesting VM termination");
                ctx.send_now(self.cloud, WorkflowEvent::VmTerminate(vm));
            }
            EngineCommand::SubmitJob(Assignment { job, vm }) => {
                let now = ctx.now();
                self.pool.occupy(vm, job)?;
                ctx.world_mut().job_mut(job)?.submit(vm, now)?;
                let entity = ctx.world().vm(vm)?.entity().ok_or(WfsimError::UnknownVm(vm))?;
                debug!(job = %job, vm = %vm, "job submitted");
                ctx.send_now(entity, WorkflowEvent::JobSubmit(job));
            }
        }
        Ok(())
    }

    fn launch_vm(&mut self, ctx: &mut SimContext<'_>) {
        let spec = self.settings.vm_spec;
        let vm = ctx.world_mut().add_vm(&spec);
        self.pool.requested(vm);
        debug!(vm = %vm, "requesting VM launch");
        ctx.send_now(self.cloud, WorkflowEvent::VmLaunch(vm));
    }
}

impl Entity for WorkflowEngine {
    fn name(&self) -> &str {
        "workflow-engine"
    }

    /// Launch the provisioner's initial VMs at time 0.
    fn start(&mut self, ctx: &mut SimContext<'_>) -> Result<()> {
        let initial = self.provisioner.initial_vms();
        info!(
            vms = initial,
            budget = self.settings.budget,
            deadline = self.settings.deadline,
            "launching initial VMs"
        );
        for _ in 0..initial {
            self.launch_vm(ctx);
        }
        Ok(())
    }

    fn process_event(&mut self, event: Event, ctx: &mut SimContext<'_>) -> Result<()> {
        match event.payload {
            WorkflowEvent::DagSubmit { dag, priority } => self.admit(dag, priority, event.source, ctx),
            WorkflowEvent::VmLaunched(vm) => {
                self.pool.launched(vm);
                self.schedule_pass(ctx)
            }
            WorkflowEvent::VmTerminated(vm) => {
                self.pool.terminated(vm);
                self.cost += ctx.world().vm(vm)?.cost();
                Ok(())
            }
            WorkflowEvent::JobStarted(job) => {
                let now = ctx.now();
                let record = ctx.world().job(job)?;
                for listener in self.listeners.iter_mut() {
                    listener.job_started(record, now);
                }
                Ok(())
            }
            WorkflowEvent::JobFinished(job) => self.job_finished(job, ctx),
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
