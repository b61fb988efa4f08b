use reqwest::{header, Client};

use crate::error::DownloadError;
use crate::state::TransferTarget;

/// Asks the origin for the size of `url` and whether it serves byte ranges.
///
/// A missing or unparsable `Content-Length` yields a size of zero, which the
/// downloader treats as "stream it".
pub async fn probe(client: &Client, url: &str) -> Result<TransferTarget, DownloadError> {
    let response = client
        .head(url)
        .header(header::REFERER, url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| DownloadError::network("probe", e))?;

    let headers = response.headers();
    let total_size = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0);
    let supports_ranges = headers
        .get(header::ACCEPT_RANGES)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().eq_ignore_ascii_case("bytes"))
        .unwrap_or(false);

    Ok(TransferTarget {
        url: url.to_string(),
        total_size,
        supports_ranges,
    })
}
