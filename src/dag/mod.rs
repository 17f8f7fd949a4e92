// src/dag/mod.rs

//! Workflow DAG model.
//!
//! - [`graph`] holds the immutable task graph ([`Dag`], [`Task`],
//!   [`DagFile`]).
//! - [`description`] is the serde model of DAG description files; it is
//!   validated into a [`Dag`] by `config::validate`.

pub mod description;
pub mod graph;

pub use description::{DagDescription, TaskDescription};
pub use graph::{Dag, DagFile, Task, TaskIdx};
