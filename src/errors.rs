// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Protocol and invariant violations abort a simulation run; `StaleVm` is
//! the one condition the cloud resolves locally (see `cloud::Cloud`).

use thiserror::Error;

use crate::cloud::VmId;
use crate::jobs::JobId;
use crate::kernel::{EntityId, SimTime};

#[derive(Error, Debug)]
pub enum WfsimError {
    #[error("entity '{entity}' received unknown workflow event (tag {tag})")]
    UnknownWorkflowEvent { entity: String, tag: i32 },

    #[error("invalid event time: delay {delay} must be finite and non-negative")]
    InvalidEventTime { delay: f64 },

    #[error("VM {vm} is already busy; cannot accept job {job}")]
    VmAlreadyBusy { vm: VmId, job: JobId },

    #[error("VM {0} is already terminated")]
    StaleVm(VmId),

    #[error("Exceeded deadline: finished at {finish_time}, deadline {deadline}")]
    DeadlineExceeded { finish_time: SimTime, deadline: SimTime },

    #[error("no entity registered under id {0}")]
    UnknownEntity(EntityId),

    #[error("unknown VM handle {0}")]
    UnknownVm(VmId),

    #[error("unknown job handle {0}")]
    UnknownJob(JobId),

    #[error("invalid transition for {subject}: {from} -> {to}")]
    InvalidTransition {
        subject: String,
        from: String,
        to: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WfsimError {
    /// Shorthand for building an [`WfsimError::InvalidTransition`].
    pub fn transition(
        subject: impl Into<String>,
        from: impl std::fmt::Debug,
        to: impl std::fmt::Debug,
    ) -> Self {
        WfsimError::InvalidTransition {
            subject: subject.into(),
            from: format!("{from:?}"),
            to: format!("{to:?}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, WfsimError>;
