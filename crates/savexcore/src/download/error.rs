use thiserror::Error;

use super::link::Platform;

/// Structured error type for the download pipeline.
///
/// Strategy-level failures never show up here: the resolver chain swallows them
/// and only total exhaustion surfaces as [`DownloadError::Unresolved`].
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Input text is not a supported Instagram/TikTok video link
    #[error("not a supported video link: {0}")]
    InvalidLink(String),
    /// Every strategy in the chain failed or returned nothing
    #[error("no strategy could resolve a {platform} video URL")]
    Unresolved { platform: Platform },
    /// Fetched file is bigger than we can send
    #[error("file is {size} bytes, limit is {limit} bytes")]
    Oversize { size: u64, limit: u64 },
    /// Response is not video content (content-type or leading bytes)
    #[error("response is not a video: {0}")]
    NotVideo(String),
    /// Upstream answered with a non-success status
    #[error("HTTP request failed with status: {0}")]
    HttpStatus(reqwest::StatusCode),
    /// Transport error while fetching
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Local filesystem error while writing the video
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Fetch took longer than allowed
    #[error("timed out: {0}")]
    Timeout(String),
}

impl DownloadError {
    /// Returns subcategory for log tags
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::InvalidLink(_) => "invalid_link",
            DownloadError::Unresolved { .. } => "unresolved",
            DownloadError::Oversize { .. } => "oversize",
            DownloadError::NotVideo(_) => "not_video",
            DownloadError::HttpStatus(_) => "http_status",
            DownloadError::Http(_) => "http",
            DownloadError::Io(_) => "io",
            DownloadError::Timeout(_) => "timeout",
        }
    }

    /// Localization key of the message shown to the user for this error.
    pub fn message_key(&self) -> &'static str {
        match self {
            DownloadError::InvalidLink(_) => "invalid-url",
            DownloadError::Oversize { .. } => "download-too-large",
            _ => "download-error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_display() {
        let err = DownloadError::Oversize {
            size: 60,
            limit: 50,
        };
        assert_eq!(err.to_string(), "file is 60 bytes, limit is 50 bytes");

        let err = DownloadError::Unresolved {
            platform: Platform::TikTok,
        };
        assert_eq!(err.to_string(), "no strategy could resolve a tiktok video URL");
    }

    #[test]
    fn test_download_error_subcategory() {
        assert_eq!(DownloadError::InvalidLink("".into()).subcategory(), "invalid_link");
        assert_eq!(DownloadError::NotVideo("".into()).subcategory(), "not_video");
        assert_eq!(DownloadError::Timeout("".into()).subcategory(), "timeout");
        assert_eq!(
            DownloadError::Oversize { size: 1, limit: 0 }.subcategory(),
            "oversize"
        );
    }

    #[test]
    fn test_message_keys() {
        assert_eq!(DownloadError::InvalidLink("x".into()).message_key(), "invalid-url");
        assert_eq!(
            DownloadError::Oversize { size: 2, limit: 1 }.message_key(),
            "download-too-large"
        );
        assert_eq!(
            DownloadError::Unresolved {
                platform: Platform::Instagram
            }
            .message_key(),
            "download-error"
        );
        assert_eq!(DownloadError::NotVideo("text/html".into()).message_key(), "download-error");
    }
}
