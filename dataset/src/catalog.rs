use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::order::global_order;

/// File extension of shard files.
pub const SHARD_EXTENSION: &str = "safetensors";

/// The ordered list of shards known before any of them is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardCatalog {
    shards: Vec<PathBuf>,
}

impl ShardCatalog {
    pub fn new(shards: Vec<PathBuf>) -> Self {
        Self { shards }
    }

    /// Lists every shard file in `dir`.
    ///
    /// Directory enumeration order is platform dependent, so the paths are sorted by
    /// file name: every worker must start from the same catalog.
    pub fn from_dir(dir: impl AsRef<Path>) -> io::Result<Self> {
        let mut shards = Vec::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_shard = path.extension().is_some_and(|ext| ext == SHARD_EXTENSION);

            if is_shard && path.is_file() {
                shards.push(path);
            }
        }

        shards.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(Self { shards })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    #[inline]
    pub fn get(&self, idx: usize) -> Option<&Path> {
        self.shards.get(idx).map(PathBuf::as_path)
    }

    #[inline]
    pub fn as_slice(&self) -> &[PathBuf] {
        &self.shards
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.shards.iter().map(PathBuf::as_path)
    }

    /// The catalog in global order for `seed`, each shard paired with its position in
    /// that order.
    pub fn ordered(&self, seed: u64) -> Vec<(usize, &Path)> {
        global_order(self.len(), seed)
            .into_iter()
            .map(|idx| self.shards[idx].as_path())
            .enumerate()
            .collect()
    }
}

impl FromIterator<PathBuf> for ShardCatalog {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
