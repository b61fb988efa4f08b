use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What to fetch: a direct URL plus what the origin told us about it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TransferTarget {
    pub url: String,
    pub total_size: u64,
    pub supports_ranges: bool,
}

/// One planned slice of the remote resource. `end` is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the `Range` request header.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// A chunk that a worker finished writing to its temporary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkResult {
    /// 1-based ordinal; defines merge order.
    pub index: usize,
    pub range: ByteRange,
    pub path: PathBuf,
}

/// `<dest>.<index>.tmp`
pub fn chunk_path(dest: &Path, index: usize) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(format!(".{}.tmp", index));
    PathBuf::from(name)
}

/// `<dest>.tmp`, used by the single-stream path and as the merge staging file.
pub fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_names_derive_from_destination() {
        let dest = Path::new("out/video.mp4");
        assert_eq!(chunk_path(dest, 3), PathBuf::from("out/video.mp4.3.tmp"));
        assert_eq!(staging_path(dest), PathBuf::from("out/video.mp4.tmp"));
    }

    #[test]
    fn target_reads_resolver_json() {
        let target: TransferTarget = serde_json::from_str(
            r#"{"url":"http://cdn.test/v.mp4","total_size":1000,"supports_ranges":true}"#,
        )
        .unwrap();
        assert_eq!(target.total_size, 1000);
        assert!(target.supports_ranges);
    }

    #[test]
    fn range_header_is_inclusive() {
        let range = ByteRange { start: 250, end: 499 };
        assert_eq!(range.len(), 250);
        assert_eq!(range.header_value(), "bytes=250-499");
    }
}
