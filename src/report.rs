// src/report.rs

//! Lifecycle log, terminal job/VM records and the text summary printed by
//! the binary.

use std::fmt;

use crate::cloud::{Vm, VmId, VmListener};
use crate::engine::{DagJob, DagJobListener, JobListener};
use crate::experiment::ExperimentResult;
use crate::jobs::{Job, JobId, WorkflowId};
use crate::kernel::{SimTime, World};

/// One observed lifecycle milestone.
#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    VmLaunched { vm: VmId, time: SimTime },
    VmTerminated { vm: VmId, time: SimTime, cost: f64 },
    JobStarted { job: JobId, vm: Option<VmId>, time: SimTime },
    JobFinished { job: JobId, time: SimTime },
    DagStarted { workflow: WorkflowId, dag: String, time: SimTime },
    DagFinished { workflow: WorkflowId, dag: String, time: SimTime },
}

/// Observer recording every VM, job and DAG milestone in order.
#[derive(Debug, Clone, Default)]
pub struct WorkflowLog {
    entries: Vec<LogEntry>,
}

impl WorkflowLog {
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn dag_started_count(&self, workflow: WorkflowId) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, LogEntry::DagStarted { workflow: w, .. } if *w == workflow))
            .count()
    }

    pub fn dag_finished_count(&self, workflow: WorkflowId) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, LogEntry::DagFinished { workflow: w, .. } if *w == workflow))
            .count()
    }

    pub fn jobs_finished(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, LogEntry::JobFinished { .. }))
            .count()
    }

    /// Sum of the costs reported at VM termination.
    pub fn billed_cost(&self) -> f64 {
        self.entries
            .iter()
            .filter_map(|e| match e {
                LogEntry::VmTerminated { cost, .. } => Some(*cost),
                _ => None,
            })
            .sum()
    }
}

impl VmListener for WorkflowLog {
    fn vm_launched(&mut self, vm: &Vm, now: SimTime) {
        self.entries.push(LogEntry::VmLaunched { vm: vm.id(), time: now });
    }

    fn vm_terminated(&mut self, vm: &Vm, now: SimTime) {
        self.entries.push(LogEntry::VmTerminated {
            vm: vm.id(),
            time: now,
            cost: vm.cost(),
        });
    }
}

impl JobListener for WorkflowLog {
    fn job_started(&mut self, job: &Job, now: SimTime) {
        self.entries.push(LogEntry::JobStarted {
            job: job.id(),
            vm: job.vm(),
            time: now,
        });
    }

    fn job_finished(&mut self, job: &Job, now: SimTime) {
        self.entries.push(LogEntry::JobFinished { job: job.id(), time: now });
    }
}

impl DagJobListener for WorkflowLog {
    fn dag_started(&mut self, dag: &DagJob, now: SimTime) {
        self.entries.push(LogEntry::DagStarted {
            workflow: dag.workflow,
            dag: dag.name().to_string(),
            time: now,
        });
    }

    fn dag_finished(&mut self, dag: &DagJob, now: SimTime) {
        self.entries.push(LogEntry::DagFinished {
            workflow: dag.workflow,
            dag: dag.name().to_string(),
            time: now,
        });
    }
}

/// A job that reached `Success`.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: JobId,
    pub workflow: WorkflowId,
    pub dag: String,
    pub task: String,
    pub priority: i32,
    pub vm: Option<VmId>,
    pub eligible_time: Option<SimTime>,
    pub submit_time: Option<SimTime>,
    pub start_time: Option<SimTime>,
    pub finish_time: Option<SimTime>,
}

/// A VM that reached `Terminated`.
#[derive(Debug, Clone, PartialEq)]
pub struct VmRecord {
    pub id: VmId,
    pub launch_time: Option<SimTime>,
    pub terminate_time: Option<SimTime>,
    pub runtime: SimTime,
    pub cost: f64,
    pub jobs_executed: usize,
}

/// Terminal collections of a run: completed jobs and terminated VMs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationReport {
    pub label: String,
    pub jobs: Vec<JobRecord>,
    pub vms: Vec<VmRecord>,
}

impl SimulationReport {
    pub fn from_world(label: &str, world: &World) -> Self {
        let jobs = world
            .completed_jobs()
            .map(|job| JobRecord {
                id: job.id(),
                workflow: job.workflow(),
                dag: job.dag().name().to_string(),
                task: job.task().id.clone(),
                priority: job.priority(),
                vm: job.vm(),
                eligible_time: job.eligible_time(),
                submit_time: job.submit_time(),
                start_time: job.start_time(),
                finish_time: job.finish_time(),
            })
            .collect();

        let vms = world
            .terminated_vms()
            .map(|vm| VmRecord {
                id: vm.id(),
                launch_time: vm.launch_time(),
                terminate_time: vm.terminate_time(),
                runtime: vm.runtime(),
                cost: vm.cost(),
                jobs_executed: vm.jobs_executed(),
            })
            .collect();

        Self {
            label: label.to_string(),
            jobs,
            vms,
        }
    }

    pub fn total_cost(&self) -> f64 {
        self.vms.iter().map(|vm| vm.cost).sum()
    }
}

fn fmt_time(t: Option<SimTime>) -> String {
    t.map_or_else(|| "-".to_string(), |t| format!("{t:.2}"))
}

/// Human-readable summary of an experiment; `verbose` appends the per-VM
/// and per-job tables.
pub struct Summary<'a> {
    pub result: &'a ExperimentResult,
    pub verbose: bool,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        writeln!(f, "wfsim experiment '{}'", result.label)?;
        writeln!(
            f,
            "  dags completed   : {}/{}",
            result.dags_completed, result.dags_admitted
        )?;
        writeln!(f, "  jobs completed   : {}", result.jobs_completed)?;
        writeln!(f, "  vms launched     : {}", result.vms_launched)?;
        if let Some(planned) = result.planned_vms {
            writeln!(f, "  vms planned      : {planned}")?;
        }
        writeln!(
            f,
            "  cost             : {:.2} (budget {:.2}){}",
            result.cost,
            result.budget,
            if result.budget_exceeded() { " EXCEEDED" } else { "" }
        )?;
        writeln!(
            f,
            "  finish time      : {:.2} (deadline {:.2}){}",
            result.actual_finish_time,
            result.deadline,
            if result.deadline_met() { "" } else { " EXCEEDED" }
        )?;
        writeln!(
            f,
            "  transfers        : {} in ({} B), {} out ({} B)",
            result.transfers.files_in,
            result.transfers.bytes_in,
            result.transfers.files_out,
            result.transfers.bytes_out
        )?;
        writeln!(f, "  events processed : {}", result.events_processed)?;
        writeln!(f, "  trace digest     : {}", result.trace_digest)?;

        if !self.verbose {
            return Ok(());
        }

        writeln!(f)?;
        writeln!(f, "vms ({}):", result.report.vms.len())?;
        for vm in result.report.vms.iter() {
            writeln!(
                f,
                "  {:<8} launch {:>10} terminate {:>10} jobs {:>5} cost {:.2}",
                vm.id.to_string(),
                fmt_time(vm.launch_time),
                fmt_time(vm.terminate_time),
                vm.jobs_executed,
                vm.cost
            )?;
        }
        writeln!(f, "jobs ({}):", result.report.jobs.len())?;
        for job in result.report.jobs.iter() {
            writeln!(
                f,
                "  {:<10} {}/{} on {} start {} finish {}",
                job.id.to_string(),
                job.dag,
                job.task,
                job.vm.map_or_else(|| "-".to_string(), |vm| vm.to_string()),
                fmt_time(job.start_time),
                fmt_time(job.finish_time)
            )?;
        }
        Ok(())
    }
}

pub fn render_summary(result: &ExperimentResult, verbose: bool) -> String {
    Summary { result, verbose }.to_string()
}

/// Print the [`Summary`] to stdout.
pub fn print_summary(result: &ExperimentResult, verbose: bool) {
    print!("{}", Summary { result, verbose });
}
