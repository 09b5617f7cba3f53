use std::{
    error::Error,
    fmt, io,
    path::{Path, PathBuf},
};

use safetensors::{Dtype, SafeTensorError};

/// The dataset module's result type.
pub type Result<T> = std::result::Result<T, DatasetErr>;

/// Invalid construction parameters, caught before any shard is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigErr {
    ZeroWorkers,
    WorkerIdOutOfRange { worker_id: usize, num_workers: usize },
}

impl fmt::Display for ConfigErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigErr::ZeroWorkers => write!(f, "worker count must be at least 1"),
            ConfigErr::WorkerIdOutOfRange {
                worker_id,
                num_workers,
            } => write!(
                f,
                "worker id {worker_id} out of range for {num_workers} workers"
            ),
        }
    }
}

impl Error for ConfigErr {}

/// Why a shard could not be materialized.
#[derive(Debug)]
pub enum ShardLoadErrKind {
    Io(io::Error),
    Format(SafeTensorError),
    MissingTensor(&'static str),
    UnsupportedDtype {
        tensor: &'static str,
        dtype: Dtype,
    },
    BadShape {
        tensor: &'static str,
        shape: Vec<usize>,
    },
    NegativeIndex {
        tensor: &'static str,
        position: usize,
    },
    LengthMismatch {
        tensor: &'static str,
        got: usize,
        expected: usize,
    },
    UnsupportedVersion(String),
}

/// A shard failed to load. Fatal for the current pass of the worker that hit it.
#[derive(Debug)]
pub struct ShardLoadErr {
    path: PathBuf,
    kind: ShardLoadErrKind,
}

impl ShardLoadErr {
    pub fn new(path: impl Into<PathBuf>, kind: ShardLoadErrKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// The shard that failed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &ShardLoadErrKind {
        &self.kind
    }
}

impl fmt::Display for ShardLoadErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path.display();

        match &self.kind {
            ShardLoadErrKind::Io(e) => write!(f, "failed to read shard {path}: {e}"),
            ShardLoadErrKind::Format(e) => write!(f, "malformed shard {path}: {e}"),
            ShardLoadErrKind::MissingTensor(name) => {
                write!(f, "shard {path} has no `{name}` tensor")
            }
            ShardLoadErrKind::UnsupportedDtype { tensor, dtype } => {
                write!(f, "shard {path}: `{tensor}` has unsupported dtype {dtype:?}")
            }
            ShardLoadErrKind::BadShape { tensor, shape } => {
                write!(f, "shard {path}: `{tensor}` must be 1-D, got shape {shape:?}")
            }
            ShardLoadErrKind::NegativeIndex { tensor, position } => {
                write!(f, "shard {path}: `{tensor}` is negative at position {position}")
            }
            ShardLoadErrKind::LengthMismatch {
                tensor,
                got,
                expected,
            } => write!(
                f,
                "shard {path}: `{tensor}` has {got} entries, expected {expected}"
            ),
            ShardLoadErrKind::UnsupportedVersion(version) => {
                write!(f, "shard {path}: unsupported format version {version:?}")
            }
        }
    }
}

impl Error for ShardLoadErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            ShardLoadErrKind::Io(e) => Some(e),
            ShardLoadErrKind::Format(e) => Some(e),
            _ => None,
        }
    }
}

/// All errors that can occur in the dataset crate.
#[derive(Debug)]
pub enum DatasetErr {
    Config(ConfigErr),
    ShardLoad(ShardLoadErr),
    Io(io::Error),
}

impl fmt::Display for DatasetErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetErr::Config(e) => write!(f, "invalid config: {e}"),
            DatasetErr::ShardLoad(e) => write!(f, "{e}"),
            DatasetErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for DatasetErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DatasetErr::Config(e) => Some(e),
            DatasetErr::ShardLoad(e) => Some(e),
            DatasetErr::Io(e) => Some(e),
        }
    }
}

impl From<ConfigErr> for DatasetErr {
    fn from(value: ConfigErr) -> Self {
        Self::Config(value)
    }
}

impl From<ShardLoadErr> for DatasetErr {
    fn from(value: ShardLoadErr) -> Self {
        Self::ShardLoad(value)
    }
}

impl From<io::Error> for DatasetErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<DatasetErr> for io::Error {
    fn from(value: DatasetErr) -> Self {
        match value {
            DatasetErr::Io(e) => e,
            DatasetErr::Config(e) => io::Error::new(io::ErrorKind::InvalidInput, e),
            DatasetErr::ShardLoad(e) => io::Error::new(io::ErrorKind::InvalidData, e),
        }
    }
}
