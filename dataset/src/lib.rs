pub mod catalog;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod order;
pub mod partition;
pub mod record;
pub mod seed;
pub mod shuffle;
pub mod stream;
pub mod writer;

pub use catalog::ShardCatalog;
pub use config::WorkerContext;
pub use error::{ConfigErr, DatasetErr, Result, ShardLoadErr, ShardLoadErrKind};
pub use loader::{SafetensorsLoader, ShardLoader};
pub use metrics::StreamMetrics;
pub use order::global_order;
pub use partition::partition_range;
pub use record::{Record, Shard};
pub use shuffle::LocalShuffler;
pub use stream::{RatingsDataset, ShardStream, StreamState};
pub use writer::{shard_file_name, write_shard};
