//! Filename derivation for exported media.

use url::Url;

use crate::error::{Error, Result};

/// Validate and sanitize a media filename.
///
/// Returns an error if the name could escape the destination directory.
pub fn sanitize_filename(name: &str) -> Result<String> {
    if name == "." || name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidFilename(format!(
            "Path separators not allowed in filename: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed in filename: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Filename cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// Last path segment of a URL, ignoring query string and fragment.
pub fn url_basename(raw: &str) -> Result<String> {
    let url = Url::parse(raw)?;
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|segment| segment.to_string())
        .ok_or_else(|| Error::Media(format!("URL has no file name: {}", raw)))
}

/// Build a file name from a platform asset ID and an extension.
pub fn asset_filename(asset_id: &str, extension: &str) -> Result<String> {
    sanitize_filename(&format!("{}.{}", asset_id, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_valid() {
        assert_eq!(sanitize_filename("EaBcD12.jpg").unwrap(), "EaBcD12.jpg");
        assert_eq!(sanitize_filename("file:name.jpg").unwrap(), "file_name.jpg");
    }

    #[test]
    fn test_sanitize_filename_rejects_escapes() {
        assert!(sanitize_filename("../etc/passwd").is_err());
        assert!(sanitize_filename("path/to/file.jpg").is_err());
        assert!(sanitize_filename("path\\file.jpg").is_err());
        assert!(sanitize_filename("file\0.jpg").is_err());
        assert!(sanitize_filename(".").is_err());
        assert!(sanitize_filename("  ").is_err());
    }

    #[test]
    fn test_url_basename() {
        assert_eq!(
            url_basename("https://pbs.twimg.com/media/EaBcD12.jpg").unwrap(),
            "EaBcD12.jpg"
        );
        assert_eq!(
            url_basename("https://video.twimg.com/ext_tw_video/1/pu/vid/1280x720/Xy.mp4?tag=12")
                .unwrap(),
            "Xy.mp4"
        );
        assert!(url_basename("https://pbs.twimg.com/").is_err());
        assert!(url_basename("not a url").is_err());
    }

    #[test]
    fn test_asset_filename() {
        assert_eq!(
            asset_filename("1290000000000000001", "mp4").unwrap(),
            "1290000000000000001.mp4"
        );
    }
}
