use std::{fs, path::Path};

use bytemuck::allocation::pod_collect_to_vec;
use log::debug;
use safetensors::{Dtype, SafeTensorError, SafeTensors, tensor::TensorView};

use crate::{
    error::{ShardLoadErr, ShardLoadErrKind},
    record::Shard,
};

/// Tensor holding the user index column.
pub const USER_IDX: &str = "user_idx";
/// Tensor holding the item index column.
pub const ITEM_IDX: &str = "item_idx";
/// Tensor holding the score column.
pub const SCORE: &str = "score";

/// Metadata key declaring the shard format version.
pub const FORMAT_VERSION_KEY: &str = "format_version";
/// The only shard format version this crate reads and writes.
pub const FORMAT_VERSION: &str = "1";

/// Materializes one shard into memory.
///
/// Loading is all or nothing: either every column of the shard comes back, or an
/// error does and the shard contributes no records.
pub trait ShardLoader {
    fn load(&self, path: &Path) -> Result<Shard, ShardLoadErr>;
}

impl<F> ShardLoader for F
where
    F: Fn(&Path) -> Result<Shard, ShardLoadErr>,
{
    fn load(&self, path: &Path) -> Result<Shard, ShardLoadErr> {
        self(path)
    }
}

/// Reads shards stored as safetensors files.
///
/// The file is read in full and closed before decoding, so no handle outlives a
/// `load` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetensorsLoader;

impl ShardLoader for SafetensorsLoader {
    fn load(&self, path: &Path) -> Result<Shard, ShardLoadErr> {
        let fail = |kind| ShardLoadErr::new(path, kind);

        let bytes = fs::read(path).map_err(|e| fail(ShardLoadErrKind::Io(e)))?;
        let shard = decode(&bytes).map_err(fail)?;

        debug!(records = shard.len(); "loaded shard {}", path.display());
        Ok(shard)
    }
}

/// Decodes a shard from the raw bytes of a safetensors file.
pub fn decode(bytes: &[u8]) -> Result<Shard, ShardLoadErrKind> {
    let (_, metadata) = SafeTensors::read_metadata(bytes).map_err(ShardLoadErrKind::Format)?;
    if let Some(version) = metadata
        .metadata()
        .as_ref()
        .and_then(|meta| meta.get(FORMAT_VERSION_KEY))
    {
        if version != FORMAT_VERSION {
            return Err(ShardLoadErrKind::UnsupportedVersion(version.clone()));
        }
    }

    let tensors = SafeTensors::deserialize(bytes).map_err(ShardLoadErrKind::Format)?;

    let user_idx = index_column(&tensor(&tensors, USER_IDX)?, USER_IDX)?;
    let item_idx = index_column(&tensor(&tensors, ITEM_IDX)?, ITEM_IDX)?;
    let score = score_column(&tensor(&tensors, SCORE)?, SCORE)?;

    Shard::new(user_idx, item_idx, score).map_err(|e| ShardLoadErrKind::LengthMismatch {
        tensor: e.column,
        got: e.got,
        expected: e.expected,
    })
}

fn tensor<'a>(
    tensors: &'a SafeTensors<'a>,
    name: &'static str,
) -> Result<TensorView<'a>, ShardLoadErrKind> {
    let view = tensors.tensor(name).map_err(|e| match e {
        SafeTensorError::TensorNotFound(_) => ShardLoadErrKind::MissingTensor(name),
        e => ShardLoadErrKind::Format(e),
    })?;

    if view.shape().len() != 1 {
        return Err(ShardLoadErrKind::BadShape {
            tensor: name,
            shape: view.shape().to_vec(),
        });
    }

    Ok(view)
}

fn index_column(view: &TensorView<'_>, name: &'static str) -> Result<Vec<u64>, ShardLoadErrKind> {
    let data = view.data();

    match view.dtype() {
        Dtype::U64 => Ok(pod_collect_to_vec::<u8, u64>(data)),
        Dtype::U32 => Ok(pod_collect_to_vec::<u8, u32>(data)
            .into_iter()
            .map(u64::from)
            .collect()),
        Dtype::I64 => unsigned(pod_collect_to_vec::<u8, i64>(data), name),
        Dtype::I32 => unsigned(
            pod_collect_to_vec::<u8, i32>(data)
                .into_iter()
                .map(i64::from)
                .collect(),
            name,
        ),
        dtype => Err(ShardLoadErrKind::UnsupportedDtype {
            tensor: name,
            dtype,
        }),
    }
}

fn unsigned(values: Vec<i64>, name: &'static str) -> Result<Vec<u64>, ShardLoadErrKind> {
    values
        .into_iter()
        .enumerate()
        .map(|(position, v)| {
            u64::try_from(v).map_err(|_| ShardLoadErrKind::NegativeIndex {
                tensor: name,
                position,
            })
        })
        .collect()
}

fn score_column(view: &TensorView<'_>, name: &'static str) -> Result<Vec<f32>, ShardLoadErrKind> {
    let data = view.data();

    match view.dtype() {
        Dtype::F32 => Ok(pod_collect_to_vec::<u8, f32>(data)),
        Dtype::F64 => Ok(pod_collect_to_vec::<u8, f64>(data)
            .into_iter()
            .map(|v| v as f32)
            .collect()),
        dtype => Err(ShardLoadErrKind::UnsupportedDtype {
            tensor: name,
            dtype,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use safetensors::serialize;

    use super::*;
    use crate::writer::encode;

    fn view<'a>(dtype: Dtype, len: usize, data: &'a [u8]) -> TensorView<'a> {
        TensorView::new(dtype, vec![len], data).unwrap()
    }

    #[test]
    fn decodes_written_shard() {
        let shard = Shard::new(vec![0, 5], vec![3, 1], vec![8.0, 6.5]).unwrap();
        let bytes = encode(&shard).unwrap();
        assert_eq!(decode(&bytes).unwrap(), shard);
    }

    #[test]
    fn accepts_narrow_and_wide_dtypes() {
        let users: Vec<u32> = vec![1, 2];
        let items: Vec<i32> = vec![3, 4];
        let scores: Vec<f64> = vec![0.5, 1.5];

        let bytes = serialize(
            [
                (USER_IDX, view(Dtype::U32, 2, bytemuck::cast_slice(&users))),
                (ITEM_IDX, view(Dtype::I32, 2, bytemuck::cast_slice(&items))),
                (SCORE, view(Dtype::F64, 2, bytemuck::cast_slice(&scores))),
            ],
            &None,
        )
        .unwrap();

        let shard = decode(&bytes).unwrap();
        assert_eq!(shard.user_idx(), &[1, 2]);
        assert_eq!(shard.item_idx(), &[3, 4]);
        assert_eq!(shard.score(), &[0.5, 1.5]);
    }

    #[test]
    fn missing_tensor() {
        let ids: Vec<i64> = vec![1];
        let bytes = serialize(
            [
                (USER_IDX, view(Dtype::I64, 1, bytemuck::cast_slice(&ids))),
                (ITEM_IDX, view(Dtype::I64, 1, bytemuck::cast_slice(&ids))),
            ],
            &None,
        )
        .unwrap();

        assert!(matches!(
            decode(&bytes),
            Err(ShardLoadErrKind::MissingTensor(SCORE))
        ));
    }

    #[test]
    fn length_mismatch() {
        let users: Vec<i64> = vec![1, 2, 3];
        let items: Vec<i64> = vec![1, 2, 3];
        let scores: Vec<f32> = vec![1.0, 2.0];

        let bytes = serialize(
            [
                (USER_IDX, view(Dtype::I64, 3, bytemuck::cast_slice(&users))),
                (ITEM_IDX, view(Dtype::I64, 3, bytemuck::cast_slice(&items))),
                (SCORE, view(Dtype::F32, 2, bytemuck::cast_slice(&scores))),
            ],
            &None,
        )
        .unwrap();

        assert!(matches!(
            decode(&bytes),
            Err(ShardLoadErrKind::LengthMismatch {
                tensor: SCORE,
                got: 2,
                expected: 3
            })
        ));
    }

    #[test]
    fn negative_index() {
        let users: Vec<i64> = vec![1, -4];
        let scores: Vec<f32> = vec![1.0, 2.0];

        let bytes = serialize(
            [
                (USER_IDX, view(Dtype::I64, 2, bytemuck::cast_slice(&users))),
                (ITEM_IDX, view(Dtype::I64, 2, bytemuck::cast_slice(&users))),
                (SCORE, view(Dtype::F32, 2, bytemuck::cast_slice(&scores))),
            ],
            &None,
        )
        .unwrap();

        assert!(matches!(
            decode(&bytes),
            Err(ShardLoadErrKind::NegativeIndex {
                tensor: USER_IDX,
                position: 1
            })
        ));
    }

    #[test]
    fn rejects_float_indices_and_matrices() {
        let floats: Vec<f32> = vec![1.0, 2.0];
        let ids: Vec<i64> = vec![1, 2];

        let bytes = serialize(
            [
                (USER_IDX, view(Dtype::F32, 2, bytemuck::cast_slice(&floats))),
                (ITEM_IDX, view(Dtype::I64, 2, bytemuck::cast_slice(&ids))),
                (SCORE, view(Dtype::F32, 2, bytemuck::cast_slice(&floats))),
            ],
            &None,
        )
        .unwrap();
        assert!(matches!(
            decode(&bytes),
            Err(ShardLoadErrKind::UnsupportedDtype { tensor: USER_IDX, .. })
        ));

        let matrix = TensorView::new(Dtype::I64, vec![1, 2], bytemuck::cast_slice(&ids)).unwrap();
        let bytes = serialize(
            [
                (USER_IDX, matrix),
                (ITEM_IDX, view(Dtype::I64, 2, bytemuck::cast_slice(&ids))),
                (SCORE, view(Dtype::F32, 2, bytemuck::cast_slice(&floats))),
            ],
            &None,
        )
        .unwrap();
        assert!(matches!(
            decode(&bytes),
            Err(ShardLoadErrKind::BadShape { tensor: USER_IDX, .. })
        ));
    }

    #[test]
    fn rejects_unknown_format_version() {
        let ids: Vec<i64> = vec![1];
        let scores: Vec<f32> = vec![1.0];
        let metadata = Some(HashMap::from([(
            FORMAT_VERSION_KEY.to_string(),
            "2".to_string(),
        )]));

        let bytes = serialize(
            [
                (USER_IDX, view(Dtype::I64, 1, bytemuck::cast_slice(&ids))),
                (ITEM_IDX, view(Dtype::I64, 1, bytemuck::cast_slice(&ids))),
                (SCORE, view(Dtype::F32, 1, bytemuck::cast_slice(&scores))),
            ],
            &metadata,
        )
        .unwrap();

        assert!(matches!(
            decode(&bytes),
            Err(ShardLoadErrKind::UnsupportedVersion(v)) if v == "2"
        ));
    }

    #[test]
    fn garbage_bytes() {
        assert!(matches!(
            decode(b"definitely not a shard"),
            Err(ShardLoadErrKind::Format(_))
        ));
    }

    #[test]
    fn missing_file_keeps_path() {
        let err = SafetensorsLoader
            .load(Path::new("/nonexistent/shard.safetensors"))
            .unwrap_err();

        assert_eq!(err.path(), Path::new("/nonexistent/shard.safetensors"));
        assert!(matches!(err.kind(), ShardLoadErrKind::Io(_)));
    }
}
