use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use proptest::prelude::*;
use wfsim::dag::Dag;
use wfsim::experiment::{Experiment, ExperimentSettings};
use wfsim::types::SchedulerKind;
use wfsim_test_utils::builders::{DagDescriptionBuilder, TaskBuilder};

// Strategy for random acyclic DAGs: task N may only depend on tasks 0..N-1.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Arc<Dag>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        let deps = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..3),
            num_tasks,
        );
        let sizes = proptest::collection::vec(1u32..50, num_tasks);

        (deps, sizes).prop_map(move |(raw_deps, sizes)| {
            let mut builder = DagDescriptionBuilder::new("random");
            for (i, (potential, size)) in raw_deps.into_iter().zip(sizes).enumerate() {
                let mut task = TaskBuilder::new(f64::from(size));
                let valid: BTreeSet<usize> = if i == 0 {
                    BTreeSet::new()
                } else {
                    potential.into_iter().map(|d| d % i).collect()
                };
                for dep in valid {
                    task = task.after(&format!("task_{dep:02}"));
                }
                builder = builder.with_task(&format!("task_{i:02}"), task.build());
            }
            builder.build()
        })
    })
}

fn settings(vms: usize, scheduler: SchedulerKind) -> ExperimentSettings {
    ExperimentSettings {
        budget: vms as f64 * 10.0,
        deadline: 36000.0,
        scheduler,
        ..ExperimentSettings::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_job_runs_once_after_all_its_parents(
        dag in dag_strategy(12),
        vms in 1usize..4,
        copies in 1usize..3,
        priority_first in any::<bool>(),
    ) {
        let kind = if priority_first { SchedulerKind::Priority } else { SchedulerKind::Fifo };
        let mut experiment = Experiment::new(settings(vms, kind));
        for copy in 0..copies {
            experiment.add_dag(dag.clone(), copy as i32);
        }
        let result = experiment.simulate_unchecked().unwrap();

        prop_assert_eq!(result.jobs_completed, dag.num_tasks() * copies);
        prop_assert_eq!(result.dags_completed, copies);
        prop_assert_eq!(result.vms_launched, vms);

        let finish: HashMap<(usize, &str), f64> = result
            .report
            .jobs
            .iter()
            .map(|j| ((j.workflow.0, j.task.as_str()), j.finish_time.unwrap()))
            .collect();

        for job in &result.report.jobs {
            let idx = dag.index_of(&job.task).unwrap();
            let parents = dag.parents(idx);
            let expected = parents
                .iter()
                .map(|p| finish[&(job.workflow.0, dag.task_at(*p).id.as_str())])
                .fold(0.0_f64, f64::max);

            prop_assert_eq!(job.eligible_time, Some(expected));
            prop_assert!(job.submit_time.unwrap() >= expected);
        }
    }
}
