use futures::StreamExt;
use reqwest::header::HeaderMap;
use reqwest::{header, Client, RequestBuilder, StatusCode};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::DownloadError;
use crate::progress::ProgressTracker;
use crate::state::{ByteRange, ChunkResult, TransferTarget};

/// GET with the header set origins expect. The client carries the User-Agent.
pub(crate) fn get_request(client: &Client, url: &str) -> RequestBuilder {
    client.get(url).header(header::REFERER, url)
}

/// Fetches one range of `target` into `dest`.
///
/// The tracker's worker count is bumped when this returns, on success and
/// on failure alike. A failed chunk may leave a partial file at `dest`.
pub async fn fetch_chunk(
    client: &Client,
    target: &TransferTarget,
    index: usize,
    range: ByteRange,
    dest: &Path,
    tracker: &ProgressTracker,
) -> Result<ChunkResult, DownloadError> {
    let result = fetch_into(client, target, index, range, dest, tracker).await;
    tracker.worker_finished();
    result
}

async fn fetch_into(
    client: &Client,
    target: &TransferTarget,
    index: usize,
    range: ByteRange,
    dest: &Path,
    tracker: &ProgressTracker,
) -> Result<ChunkResult, DownloadError> {
    let what = format!("chunk {}", index);
    let response = get_request(client, &target.url)
        .header(header::RANGE, range.header_value())
        .send()
        .await
        .map_err(|e| DownloadError::network(&what, e))?;

    let status = response.status();
    if status != StatusCode::PARTIAL_CONTENT {
        return Err(DownloadError::ServerRejectedRange { index, status });
    }
    if let Some(start) = content_range_start(response.headers()) {
        if start != range.start {
            return Err(DownloadError::MisplacedChunk {
                index,
                expected: range.start,
                received: start,
            });
        }
    }

    let mut file = File::create(dest)
        .await
        .map_err(|e| DownloadError::io(dest, e))?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(item) = stream.next().await {
        let bytes = item.map_err(|e| DownloadError::network(&what, e))?;
        if bytes.is_empty() {
            continue;
        }
        file.write_all(&bytes)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;
        written += tracker.record(bytes.len() as u64);
    }

    file.flush().await.map_err(|e| DownloadError::io(dest, e))?;

    let expected = expected_len(range, target.total_size);
    if written != expected {
        return Err(DownloadError::ShortChunk {
            index,
            expected,
            received: written,
        });
    }
    debug!(index, start = range.start, end = range.end, written, "chunk complete");

    Ok(ChunkResult {
        index,
        range,
        path: dest.to_path_buf(),
    })
}

/// The planned end of the last range sits one past the resource.
fn expected_len(range: ByteRange, total_size: u64) -> u64 {
    range.end.min(total_size.saturating_sub(1)) - range.start + 1
}

/// First byte position of a `Content-Range: bytes <start>-<end>/<len>` header.
fn content_range_start(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(header::CONTENT_RANGE)?.to_str().ok()?;
    let spec = value.trim().strip_prefix("bytes")?.trim_start();
    spec.split('-').next()?.trim().parse().ok()
}
