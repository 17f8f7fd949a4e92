// src/policy/mod.rs

//! Scheduling and provisioning policies.
//!
//! Both are plain data + decision functions: they return what should happen
//! ([`Assignment`]s, a [`ProvisioningPlan`]) and the workflow engine applies
//! it. A run selects one [`Scheduler`] and one [`Provisioner`] at
//! construction.

pub mod provisioner;
pub mod scheduler;

pub use provisioner::{Demand, Provisioner, ProvisioningPlan, static_vm_count};
pub use scheduler::{Assignment, Scheduler};
