//! Fetching artwork bytes for the now-playing surface.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::TrackId;

#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("artwork request failed: {0}")]
    Http(String),
    #[error("failed to read artwork file {path:?}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("artwork at {0} is empty")]
    Empty(String),
}

/// Turns an artwork reference into image bytes. Called off the control path.
pub trait ArtworkFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ArtworkError>;
}

/// Completion of a fetch, routed back through the control queue.
#[derive(Debug)]
pub struct ArtworkFetched {
    pub generation: u64,
    pub track: TrackId,
    pub result: Result<Vec<u8>, ArtworkError>,
}

/// `http(s)://` through ureq, `file://` and plain paths from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpArtworkFetcher;

impl ArtworkFetcher for HttpArtworkFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ArtworkError> {
        let bytes = if is_http_url(url) {
            let mut response = ureq::get(url)
                .call()
                .map_err(|e| ArtworkError::Http(e.to_string()))?;
            response
                .body_mut()
                .read_to_vec()
                .map_err(|e| ArtworkError::Http(e.to_string()))?
        } else {
            let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
            fs::read(&path).map_err(|source| ArtworkError::File { path, source })?
        };

        if bytes.is_empty() {
            return Err(ArtworkError::Empty(url.to_string()));
        }
        Ok(bytes)
    }
}

/// Check if a reference looks like an HTTP URL.
pub fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_http_url_checks_scheme() {
        assert!(is_http_url("https://example.com/cover.jpg"));
        assert!(is_http_url("http://example.com/cover.jpg"));
        assert!(!is_http_url("file:///home/user/cover.jpg"));
        assert!(!is_http_url("/home/user/cover.jpg"));
    }

    #[test]
    fn fetches_file_urls_and_plain_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.png");
        fs::write(&path, b"\x89PNG fake").unwrap();

        let fetcher = HttpArtworkFetcher;
        let url = format!("file://{}", path.display());
        assert_eq!(fetcher.fetch(&url).unwrap(), b"\x89PNG fake");
        assert_eq!(
            fetcher.fetch(path.to_str().unwrap()).unwrap(),
            b"\x89PNG fake"
        );
    }

    #[test]
    fn missing_or_empty_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = HttpArtworkFetcher;
        assert!(matches!(
            fetcher.fetch(dir.path().join("nope.jpg").to_str().unwrap()),
            Err(ArtworkError::File { .. })
        ));

        let empty = dir.path().join("empty.jpg");
        fs::write(&empty, b"").unwrap();
        assert!(matches!(
            fetcher.fetch(empty.to_str().unwrap()),
            Err(ArtworkError::Empty(_))
        ));
    }
}
