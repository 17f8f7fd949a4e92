// tests/scheduling_policies.rs

mod common;
use crate::common::fixtures::independent;
use crate::common::{TestResult, init_tracing, static_settings};

use std::collections::BTreeSet;

use wfsim::cloud::VmId;
use wfsim::experiment::Experiment;
use wfsim::jobs::{JobId, WorkflowId};
use wfsim::policy::{Assignment, Demand, Provisioner, Scheduler, static_vm_count};
use wfsim::report::JobRecord;
use wfsim::types::{ProvisionerKind, SchedulerKind};

fn vms(ids: &[usize]) -> BTreeSet<VmId> {
    ids.iter().map(|&i| VmId(i)).collect()
}

fn aggressive() -> Provisioner {
    Provisioner::new(ProvisionerKind::Aggressive, 100.0, 36000.0, 1.0, 1)
}

#[test]
fn fifo_dispatches_in_eligibility_order() {
    let mut scheduler = Scheduler::new(SchedulerKind::Fifo);
    for (job, priority) in [(4, 0), (1, 9), (3, -2)] {
        scheduler.enqueue(JobId(job), priority);
    }

    let assignments = scheduler.schedule_jobs(&vms(&[7, 2]));
    assert_eq!(
        assignments,
        vec![
            Assignment { job: JobId(4), vm: VmId(2) },
            Assignment { job: JobId(1), vm: VmId(7) },
        ]
    );
    assert_eq!(scheduler.eligible_jobs(), vec![JobId(3)]);
}

#[test]
fn priority_dispatches_lowest_number_first_then_job_id() {
    let mut scheduler = Scheduler::new(SchedulerKind::Priority);
    for (job, priority) in [(4, 1), (1, 5), (3, 1), (8, 0)] {
        scheduler.enqueue(JobId(job), priority);
    }
    assert_eq!(
        scheduler.eligible_jobs(),
        vec![JobId(8), JobId(3), JobId(4), JobId(1)]
    );

    let jobs: Vec<JobId> = scheduler
        .schedule_jobs(&vms(&[0, 1, 2]))
        .into_iter()
        .map(|a| a.job)
        .collect();
    assert_eq!(jobs, vec![JobId(8), JobId(3), JobId(4)]);
    assert_eq!(scheduler.eligible_len(), 1);
}

#[test]
fn scheduling_with_either_side_empty_changes_nothing() {
    let mut scheduler = Scheduler::new(SchedulerKind::Priority);
    assert!(scheduler.schedule_jobs(&vms(&[0, 1])).is_empty());

    scheduler.enqueue(JobId(0), 0);
    scheduler.enqueue(JobId(1), 0);
    assert!(scheduler.schedule_jobs(&BTreeSet::new()).is_empty());
    assert_eq!(scheduler.eligible_len(), 2);
    assert_eq!(scheduler.kind(), SchedulerKind::Priority);
}

#[test]
fn static_vm_count_follows_budget_over_deadline() {
    assert_eq!(static_vm_count(100.0, 36000.0, 1.0), 10);
    assert_eq!(static_vm_count(50.0, 7200.0, 1.0), 25);
    assert_eq!(static_vm_count(10.0, 3600.0, 3.0), 4);
    assert_eq!(static_vm_count(0.0, 3600.0, 1.0), 0);
    assert_eq!(static_vm_count(10.0, 0.0, 1.0), 0);
    assert_eq!(static_vm_count(10.0, 3600.0, 0.0), 0);
}

#[test]
fn static_provisioner_never_changes_the_fleet() {
    let provisioner = Provisioner::new(ProvisionerKind::Static, 100.0, 36000.0, 1.0, 99);
    assert_eq!(provisioner.planned_vms(), Some(10));
    assert_eq!(provisioner.initial_vms(), 10);

    for demand in [
        Demand { eligible_jobs: 50, free_vms: 0, pending_vms: 0 },
        Demand { eligible_jobs: 0, free_vms: 5, pending_vms: 0 },
    ] {
        assert!(provisioner.provision_vms(demand, &vms(&[0, 1, 2, 3, 4])).is_empty());
    }
}

#[test]
fn aggressive_launches_one_vm_while_demand_exceeds_supply() {
    let p = aggressive();
    assert_eq!(p.planned_vms(), None);
    assert_eq!(p.initial_vms(), 1);

    let plan = p.provision_vms(
        Demand { eligible_jobs: 3, free_vms: 1, pending_vms: 1 },
        &vms(&[0]),
    );
    assert_eq!(plan.launch, 1);
    assert!(plan.terminate.is_empty());

    // Pending launches count as supply.
    let plan = p.provision_vms(
        Demand { eligible_jobs: 2, free_vms: 1, pending_vms: 1 },
        &vms(&[0]),
    );
    assert!(plan.is_empty());
}

#[test]
fn aggressive_terminates_every_free_vm_when_idle() {
    let p = aggressive();

    let plan = p.provision_vms(
        Demand { eligible_jobs: 0, free_vms: 2, pending_vms: 0 },
        &vms(&[3, 5]),
    );
    assert_eq!(plan.launch, 0);
    assert_eq!(plan.terminate, vec![VmId(3), VmId(5)]);

    let plan = p.provision_vms(
        Demand { eligible_jobs: 1, free_vms: 1, pending_vms: 0 },
        &vms(&[3]),
    );
    assert!(plan.is_empty());
}

fn submit_times(jobs: &[JobRecord], workflow: WorkflowId) -> Vec<f64> {
    jobs.iter()
        .filter(|j| j.workflow == workflow)
        .map(|j| j.submit_time.expect("submitted"))
        .collect()
}

fn run_two_workflows(kind: SchedulerKind) -> Result<Vec<JobRecord>, wfsim::errors::WfsimError> {
    let mut experiment = Experiment::new(static_settings(2, kind));
    // Admitted first, but with the larger priority number.
    experiment.add_dag(independent(4, 10.0), 1);
    experiment.add_dag(independent(4, 10.0), 0);
    Ok(experiment.simulate()?.report.jobs)
}

#[test]
fn priority_policy_serves_the_urgent_workflow_first() -> TestResult {
    init_tracing();

    let jobs = run_two_workflows(SchedulerKind::Priority)?;
    let late = submit_times(&jobs, WorkflowId(0));
    let urgent = submit_times(&jobs, WorkflowId(1));

    let urgent_last = urgent.iter().copied().fold(f64::MIN, f64::max);
    let late_first = late.iter().copied().fold(f64::MAX, f64::min);
    assert!(urgent_last <= late_first, "urgent {urgent:?} late {late:?}");
    assert!(jobs.iter().filter(|j| j.workflow == WorkflowId(1)).all(|j| j.priority == 0));
    Ok(())
}

#[test]
fn fifo_policy_serves_workflows_in_admission_order() -> TestResult {
    init_tracing();

    let jobs = run_two_workflows(SchedulerKind::Fifo)?;
    let first = submit_times(&jobs, WorkflowId(0));
    let second = submit_times(&jobs, WorkflowId(1));

    let first_last = first.iter().copied().fold(f64::MIN, f64::max);
    let second_first = second.iter().copied().fold(f64::MAX, f64::min);
    assert!(first_last <= second_first, "first {first:?} second {second:?}");
    Ok(())
}
