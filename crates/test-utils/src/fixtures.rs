//! Synthetic DAGs used across the integration tests.

use std::sync::Arc;

use wfsim::dag::Dag;

use crate::builders::{DagDescriptionBuilder, TaskBuilder};

/// `n` tasks of `size` work units, each depending on the previous one.
pub fn chain(n: usize, size: f64) -> Arc<Dag> {
    let mut builder = DagDescriptionBuilder::new("chain");
    for i in 0..n {
        let mut task = TaskBuilder::new(size);
        if i > 0 {
            task = task.after(&format!("t{:03}", i - 1));
        }
        builder = builder.with_task(&format!("t{i:03}"), task.build());
    }
    builder.build()
}

/// `a -> {b, c} -> d`, where `c` takes longer than `b`.
pub fn diamond() -> Arc<Dag> {
    DagDescriptionBuilder::new("diamond")
        .with_task("a", TaskBuilder::new(10.0).output("a.out", 2442).build())
        .with_task(
            "b",
            TaskBuilder::new(5.0).after("a").input("a.out", 2442).build(),
        )
        .with_task(
            "c",
            TaskBuilder::new(20.0).after("a").input("a.out", 2442).build(),
        )
        .with_task("d", TaskBuilder::new(1.0).after("b").after("c").build())
        .build()
}

/// `n` independent tasks.
pub fn independent(n: usize, size: f64) -> Arc<Dag> {
    let mut builder = DagDescriptionBuilder::new("independent");
    for i in 0..n {
        builder = builder.with_task(&format!("t{i:03}"), TaskBuilder::new(size).build());
    }
    builder.build()
}

/// 100-task layered DAG shaped like a CyberShake workflow:
/// 2 `ExtractSGT`, 48 `SeismogramSynthesis` (each after one extract),
/// 48 `PeakValCalc` (each after one synthesis), `ZipSeis` after every
/// synthesis and `ZipPSA` after every peak calculation.
pub fn cybershake_100() -> Arc<Dag> {
    const WIDTH: usize = 48;

    let mut builder = DagDescriptionBuilder::new("cybershake-100");

    for e in 0..2 {
        builder = builder.with_task(
            &extract(e),
            TaskBuilder::new(110.0 + 10.0 * e as f64)
                .input(&format!("sgt_{e}"), 327879)
                .output(&format!("subsgt_{e}"), 163939)
                .build(),
        );
    }

    let mut zip_seis = TaskBuilder::new(5.0);
    let mut zip_psa = TaskBuilder::new(4.0);
    for j in 0..WIDTH {
        let seis = format!("seis_{j:02}");
        let peak = format!("peak_{j:02}");

        builder = builder.with_task(
            &synthesis(j),
            TaskBuilder::new(30.0 + 5.0 * (j % 7) as f64)
                .after(&extract(j % 2))
                .input(&format!("subsgt_{}", j % 2), 163939)
                .output(&seis, 24000)
                .build(),
        );
        builder = builder.with_task(
            &peak_val(j),
            TaskBuilder::new(1.0 + 0.5 * (j % 3) as f64)
                .after(&synthesis(j))
                .input(&seis, 24000)
                .output(&peak, 216)
                .build(),
        );

        zip_seis = zip_seis.after(&synthesis(j)).input(&seis, 24000);
        zip_psa = zip_psa.after(&peak_val(j)).input(&peak, 216);
    }

    builder
        .with_task("ZipSeis", zip_seis.output("seis.zip", 2442).build())
        .with_task("ZipPSA", zip_psa.output("psa.zip", 2442).build())
        .build()
}

fn extract(i: usize) -> String {
    format!("ExtractSGT_{i:02}")
}

fn synthesis(i: usize) -> String {
    format!("SeismogramSynthesis_{i:02}")
}

fn peak_val(i: usize) -> String {
    format!("PeakValCalc_{i:02}")
}
