use crate::error::DownloadError;
use crate::state::ByteRange;

/// Splits `total_size` bytes into `worker_count` contiguous ranges.
///
/// Every slice is `total_size / worker_count` bytes except the last, whose
/// end is pinned at `total_size` so the truncation remainder and the final
/// byte are always requested. Servers clamp an end past the resource length,
/// so the response decides how many bytes the last chunk actually holds.
pub fn plan(total_size: u64, worker_count: usize) -> Result<Vec<ByteRange>, DownloadError> {
    if total_size == 0 {
        return Err(DownloadError::InvalidPlan("total size is zero".into()));
    }
    if worker_count < 1 {
        return Err(DownloadError::InvalidPlan("worker count must be at least 1".into()));
    }

    let slice_size = total_size / worker_count as u64;
    if slice_size == 0 {
        return Err(DownloadError::InvalidPlan(format!(
            "{} workers for {} bytes leaves empty slices",
            worker_count, total_size
        )));
    }

    let mut ranges = Vec::with_capacity(worker_count);
    for i in 0..worker_count {
        let start = i as u64 * slice_size;
        let end = if i == worker_count - 1 {
            total_size
        } else {
            start + slice_size - 1
        };
        ranges.push(ByteRange { start, end });
    }

    Ok(ranges)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_workers_over_a_thousand_bytes() {
        let ranges = plan(1000, 4).unwrap();
        let bounds: Vec<(u64, u64)> = ranges.iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(bounds, vec![(0, 249), (250, 499), (500, 749), (750, 1000)]);
    }

    #[test]
    fn single_worker_spans_everything() {
        let ranges = plan(4096, 1).unwrap();
        assert_eq!(ranges, vec![ByteRange { start: 0, end: 4096 }]);
    }

    #[test]
    fn rejects_zero_size_and_zero_workers() {
        assert!(matches!(plan(0, 4), Err(DownloadError::InvalidPlan(_))));
        assert!(matches!(plan(100, 0), Err(DownloadError::InvalidPlan(_))));
    }

    #[test]
    fn rejects_more_workers_than_bytes() {
        assert!(matches!(plan(3, 8), Err(DownloadError::InvalidPlan(_))));
    }

    #[test]
    fn ranges_are_contiguous_and_cover_the_file() {
        for total in [1u64, 7, 100, 1001, 65_537, 10_000_019] {
            for workers in 1..=16usize {
                if (workers as u64) > total {
                    continue;
                }
                let ranges = plan(total, workers).unwrap();
                assert_eq!(ranges.len(), workers);
                assert_eq!(ranges[0].start, 0);
                for pair in ranges.windows(2) {
                    assert_eq!(
                        pair[1].start,
                        pair[0].end + 1,
                        "gap or overlap for {total}/{workers}"
                    );
                }
                assert_eq!(ranges.last().unwrap().end, total);

                let covered: u64 = ranges.iter().map(|r| r.len()).sum();
                assert!(covered >= total, "dropped bytes for {total}/{workers}");
            }
        }
    }
}
