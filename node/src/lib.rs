pub mod config;
pub mod worker;

pub use config::{Mode, NodeConfig};
pub use worker::{PassDigest, WorkerSummary, run_worker};
