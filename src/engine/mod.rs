// src/engine/mod.rs

//! Orchestration of workflow runs.
//!
//! - [`workflow_engine`] is the entity that reacts to DAG admissions, VM
//!   lifecycle replies and job completions by running a provisioning pass
//!   followed by a scheduling pass. Each pass is planned as a list of
//!   [`EngineCommand`]s and then applied.
//! - [`pool`] keeps the engine's partition of requested VMs.
//! - [`dag_job`] tracks completion of one admitted DAG.
//! - [`ensemble`] admits a list of DAGs (at time 0 or later) and notifies
//!   DAG listeners exactly once per DAG.
//! - [`listeners`] defines the job and DAG observer traits.

pub mod dag_job;
pub mod ensemble;
pub mod listeners;
pub mod pool;
pub mod workflow_engine;

pub use dag_job::DagJob;
pub use ensemble::{DagAdmission, EnsembleManager};
pub use listeners::{DagJobListener, JobListener};
pub use pool::VmPool;
pub use workflow_engine::{EngineCommand, EngineSettings, WorkflowEngine};
