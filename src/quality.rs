use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

use crate::state::TransferTarget;

/// Key used when the resolver only knows one variant.
pub const UNKNOWN_QUALITY: &str = "unknown";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QualityError {
    #[error("no qualities available")]
    Empty,
    #[error("quality {requested} is not available (available: {})", .available.join(", "))]
    Unavailable {
        requested: String,
        available: Vec<String>,
    },
    #[error("invalid quality {0:?}, expected 'highest' or a number like 720")]
    Invalid(String),
}

/// Which variant of a video to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualityChoice {
    Highest,
    Named(String),
}

impl FromStr for QualityChoice {
    type Err = QualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("highest") {
            return Ok(QualityChoice::Highest);
        }
        let name = s.strip_suffix(['p', 'P']).unwrap_or(s);
        if name.is_empty() {
            return Err(QualityError::Invalid(s.to_string()));
        }
        Ok(QualityChoice::Named(name.to_string()))
    }
}

/// Everything a resolver found for one video, keyed by quality (e.g. "720").
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VideoVariants {
    #[serde(default)]
    pub title: Option<String>,
    pub qualities: BTreeMap<String, TransferTarget>,
}

/// A resolver file holds either several variants or a bare target.
#[derive(Deserialize)]
#[serde(untagged)]
enum ResolverFile {
    Variants(VideoVariants),
    Single(TransferTarget),
}

impl VideoVariants {
    pub fn single(target: TransferTarget) -> Self {
        let mut qualities = BTreeMap::new();
        qualities.insert(UNKNOWN_QUALITY.to_string(), target);
        Self {
            title: None,
            qualities,
        }
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        Ok(match serde_json::from_str(content)? {
            ResolverFile::Variants(variants) => variants,
            ResolverFile::Single(target) => Self::single(target),
        })
    }

    /// Picks the requested variant. `Highest` takes the numerically largest
    /// key; when no key is numeric it takes the first one.
    pub fn select(
        &self,
        choice: &QualityChoice,
    ) -> Result<(&str, &TransferTarget), QualityError> {
        if self.qualities.is_empty() {
            return Err(QualityError::Empty);
        }

        let picked = match choice {
            QualityChoice::Highest => self
                .qualities
                .iter()
                .filter_map(|(name, target)| {
                    name.parse::<u32>().ok().map(|n| (n, name, target))
                })
                .max_by_key(|(n, _, _)| *n)
                .map(|(_, name, target)| (name, target))
                .or_else(|| self.qualities.iter().next()),
            QualityChoice::Named(name) => self.qualities.get_key_value(name),
        };

        picked
            .map(|(name, target)| (name.as_str(), target))
            .ok_or_else(|| QualityError::Unavailable {
                requested: match choice {
                    QualityChoice::Highest => "highest".to_string(),
                    QualityChoice::Named(name) => name.clone(),
                },
                available: self.qualities.keys().cloned().collect(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(size: u64) -> TransferTarget {
        TransferTarget {
            url: format!("http://cdn.test/{}.mp4", size),
            total_size: size,
            supports_ranges: true,
        }
    }

    fn variants(keys: &[&str]) -> VideoVariants {
        VideoVariants {
            title: Some("clip".into()),
            qualities: keys
                .iter()
                .enumerate()
                .map(|(i, k)| (k.to_string(), target(i as u64 + 1)))
                .collect(),
        }
    }

    #[test]
    fn highest_is_numeric_not_lexical() {
        let v = variants(&["1080", "240", "720", "480"]);
        let (name, _) = v.select(&QualityChoice::Highest).unwrap();
        assert_eq!(name, "1080");
    }

    #[test]
    fn highest_falls_back_to_the_only_variant() {
        let v = VideoVariants::single(target(10));
        let (name, picked) = v.select(&QualityChoice::Highest).unwrap();
        assert_eq!(name, UNKNOWN_QUALITY);
        assert_eq!(picked.total_size, 10);
    }

    #[test]
    fn named_quality_must_exist() {
        let v = variants(&["480", "720"]);
        let (name, _) = v.select(&"720p".parse().unwrap()).unwrap();
        assert_eq!(name, "720");

        let err = v.select(&QualityChoice::Named("1080".into())).unwrap_err();
        assert_eq!(
            err,
            QualityError::Unavailable {
                requested: "1080".into(),
                available: vec!["480".into(), "720".into()],
            }
        );
        assert_eq!(err.to_string(), "quality 1080 is not available (available: 480, 720)");
    }

    #[test]
    fn empty_variants_are_an_error() {
        let v = variants(&[]);
        assert_eq!(v.select(&QualityChoice::Highest), Err(QualityError::Empty));
    }

    #[test]
    fn parses_choices() {
        assert_eq!("HIGHEST".parse::<QualityChoice>(), Ok(QualityChoice::Highest));
        assert_eq!("480".parse::<QualityChoice>(), Ok(QualityChoice::Named("480".into())));
        assert!(matches!("p".parse::<QualityChoice>(), Err(QualityError::Invalid(_))));
    }

    #[test]
    fn reads_both_resolver_file_shapes() {
        let many = VideoVariants::from_json(
            r#"{"title":"clip","qualities":{
                "480":{"url":"http://c.test/480.mp4","total_size":100,"supports_ranges":true},
                "720":{"url":"http://c.test/720.mp4","total_size":200,"supports_ranges":false}}}"#,
        )
        .unwrap();
        assert_eq!(many.qualities.len(), 2);
        assert_eq!(many.title.as_deref(), Some("clip"));

        let one = VideoVariants::from_json(
            r#"{"url":"http://cdn.test/v.mp4","total_size":1000,"supports_ranges":true}"#,
        )
        .unwrap();
        assert_eq!(one.qualities.keys().collect::<Vec<_>>(), vec![UNKNOWN_QUALITY]);
    }
}
