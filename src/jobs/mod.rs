// src/jobs/mod.rs

//! Runtime jobs and DAG-driven eligibility.

pub mod job;
pub mod tracker;

pub use job::{Job, JobId, JobState};
pub use tracker::{EligibilityTracker, WorkflowId};
