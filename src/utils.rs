use anyhow::Result;
use url::Url;

/// Local file name for `url`: its last path segment with anything outside
/// `[A-Za-z0-9._-]` replaced, or a generated name when the path is empty.
pub fn default_output_name(url: &str) -> Result<String> {
    let parsed = Url::parse(url)?;
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty());

    Ok(match segment {
        Some(name) => name
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
                _ => '_',
            })
            .collect(),
        None => format!("download_{}", uuid::Uuid::new_v4()),
    })
}
