use futures::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::DownloaderConfig;
use crate::error::DownloadError;
use crate::merger::merge;
use crate::planner::plan;
use crate::progress::{ProgressObserver, ProgressTracker};
use crate::state::{chunk_path, staging_path, ByteRange, ChunkResult, TransferTarget};
use crate::worker::{fetch_chunk, get_request};

/// Where a split download currently is. `Failed` can follow `Running` or `Merging`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Planning,
    Running,
    Merging,
    Done,
    Failed,
}

impl Phase {
    fn advance(&mut self, next: Phase) {
        debug!(from = ?*self, to = ?next, "download phase");
        *self = next;
    }
}

pub struct Downloader {
    client: Client,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl Downloader {
    pub fn new(config: &DownloaderConfig) -> Result<Self, DownloadError> {
        Ok(Self {
            client: config.build_client()?,
            observer: None,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Downloads `target` to `dest`, splitting it across `worker_count`
    /// range requests when the origin supports them.
    ///
    /// On success `dest` holds the whole resource and no temporary files
    /// remain. On failure `dest` does not exist; temporary files are kept.
    pub async fn download(
        &self,
        target: &TransferTarget,
        dest: &Path,
        worker_count: usize,
    ) -> Result<PathBuf, DownloadError> {
        let mut phase = Phase::Planning;
        debug!(url = %target.url, size = target.total_size, "planning download");

        if !target.supports_ranges || target.total_size == 0 {
            info!("server does not support partial downloads, continuing with a single stream");
            self.download_single(target, dest).await?;
            return Ok(dest.to_path_buf());
        }

        let workers = clamp_workers(target.total_size, worker_count);
        let ranges = plan(target.total_size, workers)?;

        info!(threads = ranges.len(), "downloading file");
        phase.advance(Phase::Running);
        let results = match self.run_workers(target, dest, &ranges).await {
            Ok(results) => results,
            Err(e) => {
                phase.advance(Phase::Failed);
                return Err(e);
            }
        };

        phase.advance(Phase::Merging);
        if let Err(e) = merge(&results, dest).await {
            phase.advance(Phase::Failed);
            return Err(e);
        }

        phase.advance(Phase::Done);
        Ok(dest.to_path_buf())
    }

    /// Runs one task per range and waits for every one of them, even after a
    /// failure. Returns the results in index order, or the first error seen.
    async fn run_workers(
        &self,
        target: &TransferTarget,
        dest: &Path,
        ranges: &[ByteRange],
    ) -> Result<Vec<ChunkResult>, DownloadError> {
        let tracker = Arc::new(
            ProgressTracker::new(target.total_size, ranges.len())
                .with_observer(self.observer.clone()),
        );
        let shared_target = Arc::new(target.clone());

        let mut tasks = JoinSet::new();
        for (i, range) in ranges.iter().copied().enumerate() {
            let index = i + 1;
            let client = self.client.clone();
            let target = shared_target.clone();
            let tracker = tracker.clone();
            let path = chunk_path(dest, index);

            tasks.spawn(async move {
                fetch_chunk(&client, &target, index, range, &path, &tracker).await
            });
        }

        let mut results = Vec::with_capacity(ranges.len());
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined.map_err(DownloadError::from).and_then(|r| r) {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!(error = %e, "chunk failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        results.sort_by_key(|r| r.index);
        Ok(results)
    }

    /// Streams the whole body into `<dest>.tmp` and renames it into place only
    /// once the body has been read without error.
    async fn download_single(
        &self,
        target: &TransferTarget,
        dest: &Path,
    ) -> Result<(), DownloadError> {
        const WHAT: &str = "full body";

        let staging = staging_path(dest);
        let mut file = File::create(&staging)
            .await
            .map_err(|e| DownloadError::io(&staging, e))?;

        let response = get_request(&self.client, &target.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DownloadError::network(WHAT, e))?;

        let total = response.content_length().unwrap_or(target.total_size);
        let tracker = ProgressTracker::new(total, 1).with_observer(self.observer.clone());
        let mut stream = response.bytes_stream();

        let streamed = async {
            while let Some(item) = stream.next().await {
                let bytes = item.map_err(|e| DownloadError::network(WHAT, e))?;
                file.write_all(&bytes)
                    .await
                    .map_err(|e| DownloadError::io(&staging, e))?;
                tracker.record(bytes.len() as u64);
            }
            file.flush().await.map_err(|e| DownloadError::io(&staging, e))
        }
        .await;
        tracker.worker_finished();
        streamed?;
        drop(file);

        fs::rename(&staging, dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;
        Ok(())
    }
}

/// More workers than bytes would plan empty slices.
fn clamp_workers(total_size: u64, worker_count: usize) -> usize {
    if worker_count as u64 > total_size {
        warn!(requested = worker_count, total_size, "more threads than bytes, clamping");
        total_size as usize
    } else {
        worker_count
    }
}
