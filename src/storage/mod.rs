// src/storage/mod.rs

//! File staging around task execution.

pub mod manager;
pub mod transfer;

pub use manager::{StorageManager, TransferStats};
pub use transfer::{TransferDirection, TransferModel};
