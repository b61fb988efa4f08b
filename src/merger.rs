use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::DownloadError;
use crate::state::{staging_path, ChunkResult};

/// Concatenates chunk files into `dest` in ascending index order.
///
/// Bytes are assembled in `<dest>.tmp` and renamed into place at the end, so
/// `dest` only ever appears complete. Each chunk file is deleted right after
/// it has been appended; a failed delete is logged and the merge continues.
pub async fn merge(results: &[ChunkResult], dest: &Path) -> Result<(), DownloadError> {
    let mut ordered: Vec<&ChunkResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.index);

    let mut found = 0;
    for result in &ordered {
        if fs::try_exists(&result.path).await.unwrap_or(false) {
            found += 1;
        }
    }
    if found < ordered.len() {
        return Err(DownloadError::IncompleteMerge {
            expected: ordered.len(),
            found,
        });
    }

    let staging = staging_path(dest);
    let mut output = File::create(&staging)
        .await
        .map_err(|e| DownloadError::io(&staging, e))?;

    for result in ordered {
        let bytes = fs::read(&result.path)
            .await
            .map_err(|e| DownloadError::io(&result.path, e))?;
        output
            .write_all(&bytes)
            .await
            .map_err(|e| DownloadError::io(&staging, e))?;
        debug!(index = result.index, len = bytes.len(), "chunk appended");

        if let Err(e) = fs::remove_file(&result.path).await {
            warn!(path = %result.path.display(), error = %e, "failed to remove chunk file");
        }
    }

    output
        .flush()
        .await
        .map_err(|e| DownloadError::io(&staging, e))?;
    drop(output);

    fs::rename(&staging, dest)
        .await
        .map_err(|e| DownloadError::io(dest, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::plan;
    use crate::state::chunk_path;

    async fn write_chunks(data: &[u8], workers: usize, dest: &Path) -> Vec<ChunkResult> {
        let ranges = plan(data.len() as u64, workers).unwrap();
        let mut results = Vec::new();
        for (i, range) in ranges.into_iter().enumerate() {
            let index = i + 1;
            let path = chunk_path(dest, index);
            // The last planned end sits one past the data, as a server would clamp it.
            let end = (range.end as usize).min(data.len() - 1);
            fs::write(&path, &data[range.start as usize..=end]).await.unwrap();
            results.push(ChunkResult { index, range, path });
        }
        results
    }

    #[tokio::test]
    async fn merging_reproduces_the_source_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let data: Vec<u8> = (0..10_007u32).map(|i| (i * 31 % 251) as u8).collect();

        for workers in [1usize, 2, 3, 7, 16] {
            let dest = dir.path().join(format!("out-{}.bin", workers));
            let results = write_chunks(&data, workers, &dest).await;

            merge(&results, &dest).await.unwrap();

            assert_eq!(fs::read(&dest).await.unwrap(), data);
            for result in &results {
                assert!(!result.path.exists(), "chunk {} left behind", result.index);
            }
            assert!(!staging_path(&dest).exists());
        }
    }

    #[tokio::test]
    async fn order_follows_index_not_input_position() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let mut results = write_chunks(b"HelloWorld", 2, &dest).await;
        results.reverse();

        merge(&results, &dest).await.unwrap();

        assert_eq!(fs::read(&dest).await.unwrap(), b"HelloWorld");
    }

    #[tokio::test]
    async fn second_merge_fails_instead_of_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let results = write_chunks(b"0123456789abcdef", 4, &dest).await;

        merge(&results, &dest).await.unwrap();
        let err = merge(&results, &dest).await.unwrap_err();

        assert!(matches!(
            err,
            DownloadError::IncompleteMerge { expected: 4, found: 0 }
        ));
        assert_eq!(fs::read(&dest).await.unwrap(), b"0123456789abcdef");
    }

    #[tokio::test]
    async fn missing_chunk_is_fatal_and_leaves_no_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let results = write_chunks(b"0123456789abcdef", 4, &dest).await;
        fs::remove_file(&results[2].path).await.unwrap();

        let err = merge(&results, &dest).await.unwrap_err();

        assert!(matches!(
            err,
            DownloadError::IncompleteMerge { expected: 4, found: 3 }
        ));
        assert!(!dest.exists());
        assert!(results[0].path.exists());
    }
}
