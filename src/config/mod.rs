// src/config/mod.rs

//! Experiment configuration: TOML model, loading and validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_dag, load_from_path};
pub use model::{
    DagEntry, ExperimentConfig, ExperimentSection, RawExperimentConfig, StorageSection,
    VmSection,
};
