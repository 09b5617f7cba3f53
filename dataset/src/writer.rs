use std::{collections::HashMap, fs, io, path::Path};

use safetensors::{Dtype, serialize, tensor::TensorView};

use crate::{
    catalog::SHARD_EXTENSION,
    loader::{FORMAT_VERSION, FORMAT_VERSION_KEY, ITEM_IDX, SCORE, USER_IDX},
    record::Shard,
};

/// Fixed-width file name for the `i`-th shard, so lexical and numeric order agree.
pub fn shard_file_name(i: usize) -> String {
    format!("ratings{i:012}.{SHARD_EXTENSION}")
}

/// Encodes a shard as a safetensors buffer.
///
/// Indices are stored as `I64`, scores as `F32`.
pub fn encode(shard: &Shard) -> io::Result<Vec<u8>> {
    let user_idx = signed(shard.user_idx())?;
    let item_idx = signed(shard.item_idx())?;
    let len = shard.len();

    let tensors = [
        (USER_IDX, view(Dtype::I64, len, bytemuck::cast_slice(&user_idx))?),
        (ITEM_IDX, view(Dtype::I64, len, bytemuck::cast_slice(&item_idx))?),
        (SCORE, view(Dtype::F32, len, bytemuck::cast_slice(shard.score()))?),
    ];

    let metadata = Some(HashMap::from([(
        FORMAT_VERSION_KEY.to_string(),
        FORMAT_VERSION.to_string(),
    )]));

    serialize(tensors, &metadata).map_err(io::Error::other)
}

/// Writes a shard to `path`, replacing any previous file.
pub fn write_shard(path: impl AsRef<Path>, shard: &Shard) -> io::Result<()> {
    fs::write(path, encode(shard)?)
}

fn view(dtype: Dtype, len: usize, data: &[u8]) -> io::Result<TensorView<'_>> {
    TensorView::new(dtype, vec![len], data).map_err(io::Error::other)
}

fn signed(values: &[u64]) -> io::Result<Vec<i64>> {
    values
        .iter()
        .map(|&v| {
            i64::try_from(v).map_err(|_| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("index {v} does not fit in an I64 tensor"),
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{SafetensorsLoader, ShardLoader};
    use tempfile::TempDir;

    #[test]
    fn file_names_are_fixed_width() {
        assert_eq!(shard_file_name(3), "ratings000000000003.safetensors");
        assert!(shard_file_name(9) < shard_file_name(10));
    }

    #[test]
    fn written_shard_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(shard_file_name(0));
        let shard = Shard::new(vec![4, 0, 2], vec![1, 1, 9], vec![10.0, 3.5, 7.0]).unwrap();

        write_shard(&path, &shard).unwrap();
        assert_eq!(SafetensorsLoader.load(&path).unwrap(), shard);
    }

    #[test]
    fn empty_shard_round_trips() {
        let shard = Shard::default();
        let bytes = encode(&shard).unwrap();
        assert!(crate::loader::decode(&bytes).unwrap().is_empty());
    }

    #[test]
    fn rejects_huge_indices() {
        let shard = Shard::new(vec![u64::MAX], vec![0], vec![1.0]).unwrap();
        let err = encode(&shard).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
