//! Chunk planning: partitioning a known object size into byte ranges.
//!
//! Planning is a pure function of `(total_size, chunk_size)` and is tested
//! independently of any networking. The produced ranges are contiguous,
//! non-overlapping, strictly increasing, and cover `[0, total_size)`
//! exactly.

/// A single byte range of the remote object, downloaded independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpec {
    /// Position of this chunk within the plan (0-indexed).
    pub index: usize,
    /// First byte of the range (inclusive).
    pub start: u64,
    /// Last byte of the range (inclusive).
    pub end: u64,
}

impl ChunkSpec {
    /// Number of bytes this chunk covers.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false; a planned chunk covers at least one byte.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The `Range` header value requesting exactly this chunk.
    #[must_use]
    pub fn range_header(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Ordered, gap-free partition of `[0, total_size)` into chunk ranges.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    chunks: Vec<ChunkSpec>,
    total_size: u64,
}

impl ChunkPlan {
    /// The planned chunks in ascending range order.
    #[must_use]
    pub fn chunks(&self) -> &[ChunkSpec] {
        &self.chunks
    }

    /// Total object size this plan covers.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Number of chunks in the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Always false; plans are built from a positive total size.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Partitions `total_size` bytes into `ceil(total_size / chunk_size)` ranges.
///
/// The last chunk ends at `total_size - 1` and may be shorter than
/// `chunk_size`; all others are exactly `chunk_size` long.
///
/// # Panics
///
/// Panics if `total_size` or `chunk_size` is zero. Callers validate both at
/// configuration time.
#[must_use]
pub fn plan_chunks(total_size: u64, chunk_size: u64) -> ChunkPlan {
    assert!(total_size > 0, "total_size must be positive");
    assert!(chunk_size > 0, "chunk_size must be positive");

    let count = total_size.div_ceil(chunk_size);
    let mut chunks = Vec::with_capacity(usize::try_from(count).unwrap_or(0));
    for i in 0..count {
        let start = i * chunk_size;
        let end = ((i + 1) * chunk_size - 1).min(total_size - 1);
        chunks.push(ChunkSpec {
            index: usize::try_from(i).unwrap_or(usize::MAX),
            start,
            end,
        });
    }

    ChunkPlan { chunks, total_size }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Checks the plan invariants: count, contiguity, coverage, ordering.
    fn assert_plan_invariants(total_size: u64, chunk_size: u64) {
        let plan = plan_chunks(total_size, chunk_size);

        let expected_count = total_size.div_ceil(chunk_size);
        assert_eq!(plan.len() as u64, expected_count, "chunk count");

        assert_eq!(plan.chunks()[0].start, 0, "first chunk starts at 0");
        assert_eq!(
            plan.chunks().last().unwrap().end,
            total_size - 1,
            "last chunk ends at total_size - 1"
        );

        let mut covered = 0u64;
        for (i, chunk) in plan.chunks().iter().enumerate() {
            assert_eq!(chunk.index, i, "index matches position");
            assert!(chunk.start <= chunk.end, "range is non-degenerate");
            if i > 0 {
                assert_eq!(
                    chunk.start,
                    plan.chunks()[i - 1].end + 1,
                    "ranges are contiguous"
                );
            }
            covered += chunk.len();
        }
        assert_eq!(covered, total_size, "lengths sum to total size");
    }

    #[test]
    fn test_plan_with_remainder() {
        // 12 MB at 5 MB chunks -> 5 MB, 5 MB, 2 MB
        let mb = 1024 * 1024;
        let plan = plan_chunks(12 * mb, 5 * mb);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.chunks()[0].len(), 5 * mb);
        assert_eq!(plan.chunks()[1].len(), 5 * mb);
        assert_eq!(plan.chunks()[2].len(), 2 * mb);
        assert_plan_invariants(12 * mb, 5 * mb);
    }

    #[test]
    fn test_plan_exact_multiple() {
        let plan = plan_chunks(1000, 250);
        assert_eq!(plan.len(), 4);
        assert!(plan.chunks().iter().all(|c| c.len() == 250));
        assert_plan_invariants(1000, 250);
    }

    #[test]
    fn test_plan_single_chunk_when_size_below_chunk() {
        let plan = plan_chunks(100, 4096);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.chunks()[0].start, 0);
        assert_eq!(plan.chunks()[0].end, 99);
    }

    #[test]
    fn test_plan_one_byte_object() {
        let plan = plan_chunks(1, 1);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.chunks()[0].len(), 1);
    }

    #[test]
    fn test_plan_chunk_size_one() {
        assert_plan_invariants(7, 1);
    }

    #[test]
    fn test_plan_invariants_across_sizes() {
        for total in [1, 2, 99, 100, 101, 4095, 4096, 4097, 1_000_000] {
            for chunk in [1, 7, 100, 4096, 1 << 20] {
                assert_plan_invariants(total, chunk);
            }
        }
    }

    #[test]
    fn test_range_header_format() {
        let plan = plan_chunks(1000, 400);
        assert_eq!(plan.chunks()[0].range_header(), "bytes=0-399");
        assert_eq!(plan.chunks()[2].range_header(), "bytes=800-999");
    }

    #[test]
    #[should_panic(expected = "total_size must be positive")]
    fn test_plan_rejects_zero_total() {
        let _ = plan_chunks(0, 100);
    }

    #[test]
    #[should_panic(expected = "chunk_size must be positive")]
    fn test_plan_rejects_zero_chunk_size() {
        let _ = plan_chunks(100, 0);
    }
}
