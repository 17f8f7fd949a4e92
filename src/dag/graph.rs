// src/dag/graph.rs

use std::collections::HashMap;

use serde::Deserialize;

use crate::dag::description::DagDescription;

/// A named, sized artifact consumed or produced by a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct DagFile {
    pub name: String,
    /// Size in bytes.
    pub size: u64,
}

impl DagFile {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Position of a task inside its [`Dag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskIdx(pub usize);

/// A unit of work in a DAG. Immutable once the DAG is built.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    /// Execution size in abstract work units.
    pub size: f64,
    pub inputs: Vec<DagFile>,
    pub outputs: Vec<DagFile>,
    /// Direct dependencies (tasks listed in `after`).
    pub parents: Vec<TaskIdx>,
    /// Direct dependents.
    pub children: Vec<TaskIdx>,
}

/// Immutable task graph.
///
/// Tasks are stored sorted by id so that iteration order, and therefore job
/// numbering, is deterministic. Task ids are unique within one DAG only;
/// several copies of the same DAG can run in one ensemble.
#[derive(Debug, Clone)]
pub struct Dag {
    name: String,
    tasks: Vec<Task>,
    index: HashMap<String, TaskIdx>,
}

impl Dag {
    /// Build the graph from a description that already passed validation
    /// (known `after` references, no cycles).
    pub(crate) fn from_validated(desc: DagDescription) -> Self {
        let index: HashMap<String, TaskIdx> = desc
            .task
            .keys()
            .enumerate()
            .map(|(i, id)| (id.clone(), TaskIdx(i)))
            .collect();

        // First pass: tasks with their parent lists.
        let mut tasks: Vec<Task> = desc
            .task
            .into_iter()
            .map(|(id, t)| {
                let mut parents: Vec<TaskIdx> = t
                    .after
                    .iter()
                    .filter_map(|dep| index.get(dep).copied())
                    .collect();
                parents.sort();
                parents.dedup();
                Task {
                    id,
                    size: t.size,
                    inputs: t.inputs,
                    outputs: t.outputs,
                    parents,
                    children: Vec::new(),
                }
            })
            .collect();

        // Second pass: children from parents.
        for i in 0..tasks.len() {
            let parents = tasks[i].parents.clone();
            for parent in parents {
                tasks[parent.0].children.push(TaskIdx(i));
            }
        }

        Self {
            name: desc.name,
            tasks,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Look a task up by id.
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.index.get(id).map(|idx| &self.tasks[idx.0])
    }

    pub fn index_of(&self, id: &str) -> Option<TaskIdx> {
        self.index.get(id).copied()
    }

    /// Task at a position handed out by this DAG.
    pub fn task_at(&self, idx: TaskIdx) -> &Task {
        &self.tasks[idx.0]
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Tasks with no dependencies.
    pub fn roots(&self) -> Vec<TaskIdx> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.parents.is_empty())
            .map(|(i, _)| TaskIdx(i))
            .collect()
    }

    pub fn parents(&self, idx: TaskIdx) -> &[TaskIdx] {
        &self.tasks[idx.0].parents
    }

    pub fn children(&self, idx: TaskIdx) -> &[TaskIdx] {
        &self.tasks[idx.0].children
    }

    /// Sum of all task sizes.
    pub fn total_size(&self) -> f64 {
        self.tasks.iter().map(|t| t.size).sum()
    }
}
