use std::{env, io, num::NonZeroUsize, path::PathBuf, str::FromStr};

use dataset::WorkerContext;

const SHARD_DIR: &str = "SHARD_DIR";
const SEED: &str = "SEED";
const NUM_WORKERS: &str = "NUM_WORKERS";
const WORKER_ID: &str = "WORKER_ID";
const EPOCHS: &str = "EPOCHS";

/// Which partitions this process streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No worker context: one consumer owns the whole catalog.
    Single,
    /// One worker of a multi-process deployment.
    Worker(WorkerContext),
    /// Every worker of the partitioning, concurrently in this process.
    AllWorkers(NonZeroUsize),
}

impl Mode {
    /// The worker contexts to run, one per concurrent worker.
    pub fn contexts(self) -> Vec<Option<WorkerContext>> {
        match self {
            Mode::Single => vec![None],
            Mode::Worker(ctx) => vec![Some(ctx)],
            Mode::AllWorkers(n) => (0..n.get())
                .filter_map(|id| WorkerContext::new(id, n.get()).ok())
                .map(Some)
                .collect(),
        }
    }
}

/// Immutable settings for a node run.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub shard_dir: PathBuf,
    pub seed: u64,
    pub mode: Mode,
    pub epochs: NonZeroUsize,
}

impl NodeConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> io::Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup.
    ///
    /// # Args
    /// * `var` - Returns the value of a variable, `None` if unset.
    ///
    /// # Returns
    /// An `InvalidInput` io error naming the offending variable.
    pub fn from_vars<F>(var: F) -> io::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let shard_dir = var(SHARD_DIR)
            .map(PathBuf::from)
            .ok_or_else(|| invalid(format!("{SHARD_DIR} is not set")))?;

        let seed: u64 = parse(&var, SEED)?.unwrap_or(0);
        let epochs = parse(&var, EPOCHS)?.unwrap_or(NonZeroUsize::MIN);
        let num_workers: Option<usize> = parse(&var, NUM_WORKERS)?;
        let worker_id: Option<usize> = parse(&var, WORKER_ID)?;

        let mode = match (num_workers, worker_id) {
            (None, None) => Mode::Single,
            (None, Some(_)) => return Err(invalid(format!("{WORKER_ID} requires {NUM_WORKERS}"))),
            (Some(n), Some(id)) => {
                Mode::Worker(WorkerContext::new(id, n).map_err(|e| invalid(e.to_string()))?)
            }
            (Some(n), None) => Mode::AllWorkers(
                NonZeroUsize::new(n).ok_or_else(|| invalid(format!("{NUM_WORKERS} must be > 0")))?,
            ),
        };

        Ok(Self {
            shard_dir,
            seed,
            mode,
            epochs,
        })
    }
}

fn parse<F, T>(var: &F, key: &str) -> io::Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| invalid(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}
