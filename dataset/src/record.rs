/// A single rating: who rated what, and how.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub user_idx: u64,
    pub item_idx: u64,
    pub score: f32,
}

/// The contents of one loaded shard, as three parallel columns.
///
/// Indices come out of the external id-mapping stage and are not range checked here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shard {
    user_idx: Vec<u64>,
    item_idx: Vec<u64>,
    score: Vec<f32>,
}

/// The column that disagreed with `user_idx` on length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMismatch {
    pub column: &'static str,
    pub got: usize,
    pub expected: usize,
}

impl Shard {
    /// Creates a new shard from owned columns.
    ///
    /// # Returns
    /// The first column whose length differs from `user_idx`, if any.
    pub fn new(
        user_idx: Vec<u64>,
        item_idx: Vec<u64>,
        score: Vec<f32>,
    ) -> Result<Self, ColumnMismatch> {
        let expected = user_idx.len();

        if item_idx.len() != expected {
            return Err(ColumnMismatch {
                column: "item_idx",
                got: item_idx.len(),
                expected,
            });
        }

        if score.len() != expected {
            return Err(ColumnMismatch {
                column: "score",
                got: score.len(),
                expected,
            });
        }

        Ok(Self {
            user_idx,
            item_idx,
            score,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.user_idx.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.user_idx.is_empty()
    }

    /// Returns the record at `idx` (panics if out of bounds).
    #[inline]
    pub fn record(&self, idx: usize) -> Record {
        Record {
            user_idx: self.user_idx[idx],
            item_idx: self.item_idx[idx],
            score: self.score[idx],
        }
    }

    #[inline]
    pub fn user_idx(&self) -> &[u64] {
        &self.user_idx
    }

    #[inline]
    pub fn item_idx(&self) -> &[u64] {
        &self.item_idx
    }

    #[inline]
    pub fn score(&self) -> &[f32] {
        &self.score
    }
}

impl FromIterator<Record> for Shard {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut shard = Shard::default();

        for Record {
            user_idx,
            item_idx,
            score,
        } in iter
        {
            shard.user_idx.push(user_idx);
            shard.item_idx.push(item_idx);
            shard.score.push(score);
        }

        shard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_basic() {
        let shard = Shard::new(vec![1, 2], vec![10, 20], vec![7.5, 9.0]).unwrap();
        assert_eq!(shard.len(), 2);
        assert_eq!(
            shard.record(1),
            Record {
                user_idx: 2,
                item_idx: 20,
                score: 9.0
            }
        );
    }

    #[test]
    fn shard_rejects_ragged_columns() {
        let err = Shard::new(vec![1, 2], vec![10], vec![7.5, 9.0]).unwrap_err();
        assert_eq!(
            err,
            ColumnMismatch {
                column: "item_idx",
                got: 1,
                expected: 2
            }
        );

        let err = Shard::new(vec![1], vec![10], vec![]).unwrap_err();
        assert_eq!(err.column, "score");
    }

    #[test]
    fn collect_records() {
        let shard: Shard = (0..3)
            .map(|i| Record {
                user_idx: i,
                item_idx: i + 100,
                score: i as f32,
            })
            .collect();

        assert_eq!(shard.user_idx(), &[0, 1, 2]);
        assert_eq!(shard.item_idx(), &[100, 101, 102]);
        assert_eq!(shard.score(), &[0.0, 1.0, 2.0]);
    }
}
