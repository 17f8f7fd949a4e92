// src/storage/transfer.rs

use crate::dag::DagFile;
use crate::kernel::SimTime;

/// Which side of task execution a transfer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferDirection {
    /// Input files staged before the task starts.
    Input,
    /// Output files staged after the task completes.
    Output,
}

/// Timing model for individual file transfers.
///
/// Transfers of one job run independently of each other and of other jobs;
/// there is no bandwidth contention.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TransferModel {
    /// Every transfer completes instantly.
    #[default]
    Void,
    /// `latency + size / bandwidth` seconds; `bandwidth` in bytes/second.
    Bandwidth { bandwidth: f64, latency: SimTime },
}

impl TransferModel {
    /// Duration of one file transfer. Monotonic in file size.
    pub fn transfer_time(&self, file: &DagFile) -> SimTime {
        match *self {
            TransferModel::Void => 0.0,
            TransferModel::Bandwidth { bandwidth, latency } => {
                latency + file.size as f64 / bandwidth
            }
        }
    }
}
