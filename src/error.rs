use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while planning, fetching or assembling a download.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("invalid download plan: {0}")]
    InvalidPlan(String),
    #[error("network error on {what}: {source}")]
    Network {
        what: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server rejected range request for chunk {index} (status {status})")]
    ServerRejectedRange {
        index: usize,
        status: reqwest::StatusCode,
    },
    #[error("chunk {index} starts at byte {received} instead of {expected}")]
    MisplacedChunk {
        index: usize,
        expected: u64,
        received: u64,
    },
    #[error("chunk {index} holds {received} bytes, expected {expected}")]
    ShortChunk {
        index: usize,
        expected: u64,
        received: u64,
    },
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("incomplete merge: expected {expected} chunk files, found {found}")]
    IncompleteMerge { expected: usize, found: usize },
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl DownloadError {
    pub(crate) fn network(what: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            what: what.into(),
            source,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
