// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ExperimentConfig, RawExperimentConfig};
use crate::dag::{Dag, DagDescription};
use crate::errors::Result;

/// Load an experiment file and return the raw `RawExperimentConfig`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawExperimentConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawExperimentConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load an experiment file from path and validate it.
///
/// DAG files referenced by `[[dag]]` are not read here; see [`load_dag`].
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ExperimentConfig> {
    let raw_config = load_from_path(&path)?;
    let config = ExperimentConfig::try_from(raw_config)?;
    Ok(config)
}

/// Load and validate a DAG description file.
///
/// A missing `name` defaults to the file stem.
pub fn load_dag(path: impl AsRef<Path>) -> Result<Dag> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let mut desc: DagDescription = toml::from_str(&contents)?;

    if desc.name.is_empty() {
        desc.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dag".to_string());
    }

    Dag::try_from(desc)
}

/// Resolve a `[[dag]].path` against the directory holding the config file.
pub fn resolve_dag_path(config_dir: &Path, dag_path: &Path) -> PathBuf {
    if dag_path.is_absolute() {
        dag_path.to_path_buf()
    } else {
        config_dir.join(dag_path)
    }
}
