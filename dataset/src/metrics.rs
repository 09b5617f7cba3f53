use std::time::Duration;

/// Counters for one streaming pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct StreamMetrics {
    pub load_time: Duration,

    pub shards_loaded: u64,
    pub records_emitted: u64,
}

impl StreamMetrics {
    #[inline]
    pub fn add_load(&mut self, elapsed: Duration) {
        self.shards_loaded += 1;
        self.load_time += elapsed;
    }

    #[inline]
    pub fn bump_records(&mut self) {
        self.records_emitted += 1;
    }

    /// Adds the counters of another pass to these.
    pub fn merge(&mut self, other: &StreamMetrics) {
        self.load_time += other.load_time;
        self.shards_loaded += other.shards_loaded;
        self.records_emitted += other.records_emitted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_adds_counters() {
        let mut total = StreamMetrics::default();
        let mut pass = StreamMetrics::default();
        pass.add_load(Duration::from_millis(3));
        pass.bump_records();
        pass.bump_records();

        total.merge(&pass);
        total.merge(&pass);

        assert_eq!(total.shards_loaded, 2);
        assert_eq!(total.records_emitted, 4);
        assert_eq!(total.load_time, Duration::from_millis(6));
    }
}
