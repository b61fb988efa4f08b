//! # splitdl
//!
//! Fetches one remote file as fast as the origin allows:
//! - Parallel range requests, one task per planned slice
//! - Ordered reassembly of the slices into the destination file
//! - Single streamed request when the origin can't serve ranges
//! - Shared, lock-free progress reporting
//! - Picking one quality out of the variants a resolver found
//!
//! The destination is either complete or absent; temporary `<dest>.N.tmp`
//! and `<dest>.tmp` files are left behind on failure for inspection.

pub mod config;
pub mod downloader;
pub mod error;
pub mod merger;
pub mod planner;
pub mod probe;
pub mod progress;
pub mod quality;
pub mod state;
pub mod worker;

pub use config::{DownloaderConfig, ProxyConfig};
pub use downloader::Downloader;
pub use error::DownloadError;
pub use progress::{ProgressObserver, ProgressState, ProgressTracker};
pub use quality::{QualityChoice, VideoVariants};
pub use state::{ByteRange, ChunkResult, TransferTarget};
