// tests/eligibility.rs

mod common;
use crate::common::fixtures::{chain, cybershake_100, diamond};
use crate::common::{TestResult, init_tracing, static_settings};

use std::collections::HashMap;

use wfsim::experiment::Experiment;
use wfsim::jobs::{EligibilityTracker, JobId, JobState, WorkflowId};
use wfsim::kernel::World;
use wfsim::types::SchedulerKind;

fn ids(tracker: &EligibilityTracker, wf: WorkflowId, tasks: &[&str]) -> Vec<JobId> {
    tasks
        .iter()
        .map(|t| tracker.job_for(wf, t).expect("task exists"))
        .collect()
}

#[test]
fn diamond_releases_children_when_all_parents_complete() -> TestResult {
    init_tracing();

    let mut world = World::new();
    let mut tracker = EligibilityTracker::new();
    let (wf, roots) = tracker.admit(diamond(), 0, &mut world, 0.0);

    assert_eq!(roots, ids(&tracker, wf, &["a"]));
    assert_eq!(world.job(roots[0])?.eligible_time(), Some(0.0));
    assert_eq!(tracker.remaining(wf), 4);

    let a = tracker.job_for(wf, "a")?;
    let released = tracker.complete(a, &mut world, 10.0)?;
    assert_eq!(released, ids(&tracker, wf, &["b", "c"]));

    let b = tracker.job_for(wf, "b")?;
    assert!(tracker.complete(b, &mut world, 15.0)?.is_empty());

    let d = tracker.job_for(wf, "d")?;
    assert_eq!(world.job(d)?.eligible_time(), None);

    let c = tracker.job_for(wf, "c")?;
    assert_eq!(tracker.complete(c, &mut world, 30.0)?, vec![d]);
    assert_eq!(world.job(d)?.eligible_time(), Some(30.0));

    assert!(!tracker.is_complete(wf));
    tracker.complete(d, &mut world, 31.0)?;
    assert!(tracker.is_complete(wf));
    Ok(())
}

#[test]
fn copies_of_a_dag_are_tracked_independently() -> TestResult {
    init_tracing();

    let mut world = World::new();
    let mut tracker = EligibilityTracker::new();
    let dag = chain(2, 1.0);
    let (first, _) = tracker.admit(dag.clone(), 0, &mut world, 0.0);
    let (second, _) = tracker.admit(dag, 3, &mut world, 0.0);

    assert_ne!(first, second);
    assert_eq!(tracker.num_workflows(), 2);
    assert_eq!(world.num_jobs(), 4);

    let head = tracker.job_for(first, "t000")?;
    let released = tracker.complete(head, &mut world, 1.0)?;
    assert_eq!(released, ids(&tracker, first, &["t001"]));

    let other_tail = tracker.job_for(second, "t001")?;
    assert_eq!(world.job(other_tail)?.eligible_time(), None);
    assert_eq!(world.job(other_tail)?.priority(), 3);
    assert_eq!(tracker.workflow_of(other_tail), Some(second));
    Ok(())
}

#[test]
fn completing_a_job_twice_is_rejected() -> TestResult {
    init_tracing();

    let mut world = World::new();
    let mut tracker = EligibilityTracker::new();
    let (wf, roots) = tracker.admit(chain(3, 1.0), 0, &mut world, 0.0);

    tracker.complete(roots[0], &mut world, 1.0)?;
    assert!(tracker.complete(roots[0], &mut world, 2.0).is_err());
    assert_eq!(tracker.remaining(wf), 2);
    assert!(tracker.job_for(wf, "missing").is_err());
    Ok(())
}

#[test]
fn children_become_eligible_at_the_last_parent_finish() -> TestResult {
    init_tracing();

    let mut experiment = Experiment::new(static_settings(2, SchedulerKind::Fifo));
    experiment.add_dag(diamond(), 0);
    let result = experiment.simulate()?;

    let by_task: HashMap<&str, _> = result
        .report
        .jobs
        .iter()
        .map(|j| (j.task.as_str(), j))
        .collect();
    assert_eq!(by_task.len(), 4);

    let b_done = by_task["b"].finish_time.expect("b finished");
    let c_done = by_task["c"].finish_time.expect("c finished");
    let d = by_task["d"];
    assert_eq!(d.eligible_time, Some(b_done.max(c_done)));
    assert!(d.submit_time >= d.eligible_time);
    assert_eq!(by_task["a"].eligible_time, Some(0.0));
    Ok(())
}

#[test]
fn every_job_of_a_layered_dag_succeeds() -> TestResult {
    init_tracing();

    let mut experiment = Experiment::new(static_settings(4, SchedulerKind::Fifo));
    experiment.add_dag(cybershake_100(), 0);
    let result = experiment.simulate()?;

    assert_eq!(result.jobs_completed, 100);
    assert_eq!(result.report.jobs.len(), 100);
    for job in &result.report.jobs {
        let eligible = job.eligible_time.expect("completed jobs were eligible");
        let submit = job.submit_time.expect("completed jobs were submitted");
        let start = job.start_time.expect("completed jobs were started");
        let finish = job.finish_time.expect("completed jobs finished");
        assert!(eligible <= submit && submit <= start && start <= finish);
    }
    Ok(())
}

#[test]
fn admitted_jobs_start_in_created_state() -> TestResult {
    init_tracing();

    let mut world = World::new();
    let mut tracker = EligibilityTracker::new();
    let (wf, _) = tracker.admit(chain(2, 1.0), 0, &mut world, 0.0);
    for job in tracker.jobs_of(wf) {
        assert_eq!(world.job(*job)?.state(), JobState::Created);
    }
    Ok(())
}
