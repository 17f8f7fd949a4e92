use serde::Deserialize;

/// Job-to-VM assignment policy.
///
/// - `Fifo`: jobs are dispatched in the order they became eligible.
/// - `Priority`: jobs are dispatched by ascending priority number (lower is
///   more urgent), ties broken by job id. Used for ensembles where several
///   DAGs with different priorities share one VM pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    Fifo,
    Priority,
}

impl Default for SchedulerKind {
    fn default() -> Self {
        SchedulerKind::Fifo
    }
}

/// VM supply policy.
///
/// - `Static`: the VM count is computed once from budget, deadline and
///   price; every VM is launched at time 0.
/// - `Aggressive`: one VM is launched whenever eligible jobs outnumber free
///   and pending VMs; every free VM is torn down as soon as free VMs
///   outnumber eligible jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisionerKind {
    Static,
    Aggressive,
}

impl Default for ProvisionerKind {
    fn default() -> Self {
        ProvisionerKind::Static
    }
}

/// How file transfers are timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Every transfer completes instantly.
    Void,
    /// Transfers take `latency + size / bandwidth` seconds.
    Bandwidth,
}

impl Default for StorageMode {
    fn default() -> Self {
        StorageMode::Void
    }
}
