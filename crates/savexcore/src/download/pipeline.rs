//! Download pipeline: classify → resolve → fetch → size policy.

use std::path::PathBuf;

use super::error::DownloadError;
use super::fetch::{DownloadedFile, Fetcher};
use super::link::{classify, VideoLink};
use super::resolver::{ResolvedMedia, Resolver};
use crate::core::config;

/// Turns a chat message into a video file on disk.
///
/// One instance per process, shared across handlers behind an `Arc`.
pub struct VideoDownloader {
    resolver: Resolver,
    fetcher: Fetcher,
    temp_dir: PathBuf,
    max_file_size: u64,
}

impl VideoDownloader {
    /// Default chains, configured temp dir and the Telegram upload limit.
    pub fn new(client: reqwest::Client) -> Self {
        Self::from_parts(
            Resolver::new(client.clone()),
            Fetcher::new(client),
            config::temp_dir(),
            config::download::MAX_FILE_SIZE,
        )
    }

    pub fn from_parts(resolver: Resolver, fetcher: Fetcher, temp_dir: PathBuf, max_file_size: u64) -> Self {
        Self {
            resolver,
            fetcher,
            temp_dir,
            max_file_size,
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Classifies and resolves without downloading.
    pub async fn resolve(&self, text: &str) -> Result<(VideoLink, ResolvedMedia), DownloadError> {
        let link = classify(text).ok_or_else(|| DownloadError::InvalidLink(text.trim().to_string()))?;
        let resolved = self.resolver.resolve(&link).await;
        Ok((link, resolved))
    }

    /// Downloads the video behind the first link in `text`.
    ///
    /// The returned file is deleted when dropped; send it before letting it go.
    pub async fn download(&self, text: &str) -> Result<DownloadedFile, DownloadError> {
        let (link, resolved) = self.resolve(text).await?;
        let (media_url, via) = match resolved {
            ResolvedMedia::Found { url, via } => (url, via),
            ResolvedMedia::Unresolved => {
                return Err(DownloadError::Unresolved {
                    platform: link.platform,
                })
            }
        };

        let destination = self.temp_dir.join(temp_file_name());
        log::info!(
            "[{}] downloading via {} into {}",
            link.platform,
            via,
            destination.display()
        );

        let file = self
            .fetcher
            .fetch_capped(&media_url, &destination, Some(self.max_file_size))
            .await?;

        if file.size() > self.max_file_size {
            let size = file.size();
            drop(file);
            return Err(DownloadError::Oversize {
                size,
                limit: self.max_file_size,
            });
        }

        log::info!("[{}] downloaded {} bytes for {}", link.platform, file.size(), link.raw);
        Ok(file)
    }
}

/// `video_<8 hex>.mp4`
fn temp_file_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("video_{}.mp4", &id[..8])
}
