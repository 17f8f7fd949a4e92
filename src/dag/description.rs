// src/dag/description.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::dag::DagFile;

/// DAG description as read from a TOML file.
///
/// ```toml
/// name = "diamond"
///
/// [task.a]
/// size = 10.0
/// outputs = [{ name = "a.out", size = 2442 }]
///
/// [task.b]
/// size = 5.0
/// after = ["a"]
/// inputs = [{ name = "a.out", size = 2442 }]
/// ```
///
/// Convert into a [`Dag`](crate::dag::Dag) with `Dag::try_from`, which
/// validates dependencies and acyclicity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DagDescription {
    /// Defaults to the file stem when loaded from disk.
    #[serde(default)]
    pub name: String,

    /// All tasks from `[task.<id>]`.
    #[serde(default)]
    pub task: BTreeMap<String, TaskDescription>,
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskDescription {
    /// Work units; execution time is `size / processing_rate`.
    pub size: f64,

    /// Dependency list: this task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<String>,

    #[serde(default)]
    pub inputs: Vec<DagFile>,

    #[serde(default)]
    pub outputs: Vec<DagFile>,
}
