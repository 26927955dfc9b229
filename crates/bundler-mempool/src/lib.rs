//! Per-sender FIFO admission queues, reputation-gated intake, and bundle
//! extraction with code-hash recheck (§4.5).

pub mod manager;
pub mod types;

pub use manager::MempoolManager;
pub use types::{MempoolConfig, PooledUserOperation, Sender};
