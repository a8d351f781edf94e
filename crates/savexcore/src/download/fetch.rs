//! Fetcher: streams a resolved media URL to a local file.
//!
//! The body goes through a fixed-size buffered writer, never fully into memory.
//! A response is accepted when it declares `video/*`, rejected outright when it
//! declares text/JSON/XML, and otherwise judged by its leading bytes.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};

use super::error::DownloadError;
use crate::core::config;

/// Bytes kept from the start of the body for signature sniffing.
/// 189 covers a second MPEG-TS sync byte at offset 188.
const SNIFF_LEN: usize = 189;

/// A downloaded video on disk. Dropping it deletes the file.
#[derive(Debug)]
pub struct DownloadedFile {
    path: PathBuf,
    size: u64,
}

impl DownloadedFile {
    fn new(path: PathBuf) -> Self {
        Self { path, size: 0 }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for DownloadedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed temp file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove temp file {}: {}", self.path.display(), e),
        }
    }
}

/// What the declared content type says about the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentVerdict {
    Video,
    Reject,
    Sniff,
}

/// Judges a `content-type` header value.
pub fn judge_content_type(content_type: Option<&str>) -> ContentVerdict {
    let Some(raw) = content_type else {
        return ContentVerdict::Sniff;
    };
    let mime = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    if mime.starts_with("video/") {
        ContentVerdict::Video
    } else if mime.starts_with("text/")
        || mime == "application/json"
        || mime == "application/xml"
        || mime == "application/xhtml+xml"
        || mime.ends_with("+json")
    {
        ContentVerdict::Reject
    } else {
        ContentVerdict::Sniff
    }
}

/// Checks leading bytes for a known video container signature.
pub fn sniff_video(head: &[u8]) -> bool {
    // MP4 / MOV / 3GP
    if head.len() >= 8 && &head[4..8] == b"ftyp" {
        return true;
    }
    // Matroska / WebM (EBML)
    if head.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return true;
    }
    if head.starts_with(b"FLV") {
        return true;
    }
    if head.len() >= 12 && head.starts_with(b"RIFF") && &head[8..11] == b"AVI" {
        return true;
    }
    // MPEG program stream pack header
    if head.starts_with(&[0x00, 0x00, 0x01, 0xBA]) {
        return true;
    }
    // MPEG-TS: two sync bytes one packet apart
    if head.len() > 188 && head[0] == 0x47 && head[188] == 0x47 && !head.starts_with(b"GIF") {
        return true;
    }
    false
}

/// Streams media URLs to disk with the shared HTTP client.
#[derive(Clone)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Downloads `media_url` into `destination`.
    pub async fn fetch(&self, media_url: &str, destination: &Path) -> Result<DownloadedFile, DownloadError> {
        self.fetch_capped(media_url, destination, None).await
    }

    /// Like [`Fetcher::fetch`], but aborts as soon as more than `cap` bytes arrive.
    ///
    /// On every error path the partial file is gone before this returns.
    pub async fn fetch_capped(
        &self,
        media_url: &str,
        destination: &Path,
        cap: Option<u64>,
    ) -> Result<DownloadedFile, DownloadError> {
        let response = self
            .client
            .get(media_url)
            .timeout(config::network::timeout())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus(status));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let verdict = judge_content_type(content_type.as_deref());
        if verdict == ContentVerdict::Reject {
            return Err(DownloadError::NotVideo(content_type.unwrap_or_default()));
        }

        if let (Some(limit), Some(declared)) = (cap, response.content_length()) {
            if declared > limit {
                return Err(DownloadError::Oversize { size: declared, limit });
            }
        }

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = DownloadedFile::new(destination.to_path_buf());
        let mut writer = BufWriter::with_capacity(config::download::CHUNK_SIZE, tokio::fs::File::create(destination).await?);
        let mut head: Vec<u8> = Vec::with_capacity(SNIFF_LEN);
        let mut sniffed = verdict == ContentVerdict::Video;
        let mut written: u64 = 0;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            written += chunk.len() as u64;
            if let Some(limit) = cap {
                if written > limit {
                    return Err(DownloadError::Oversize { size: written, limit });
                }
            }

            if !sniffed {
                let take = (SNIFF_LEN - head.len()).min(chunk.len());
                head.extend_from_slice(&chunk[..take]);
                if head.len() >= SNIFF_LEN {
                    check_signature(&head)?;
                    sniffed = true;
                }
            }

            writer.write_all(&chunk).await?;
        }

        if !sniffed {
            check_signature(&head)?;
        }

        writer.flush().await?;
        writer.into_inner().sync_all().await?;

        file.size = written;
        log::debug!("Fetched {} bytes into {}", written, destination.display());
        Ok(file)
    }
}

fn check_signature(head: &[u8]) -> Result<(), DownloadError> {
    if head.is_empty() {
        return Err(DownloadError::NotVideo("empty body".to_string()));
    }
    if sniff_video(head) {
        Ok(())
    } else {
        Err(DownloadError::NotVideo("unknown signature".to_string()))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> DownloadError {
    if e.is_timeout() {
        DownloadError::Timeout(e.to_string())
    } else {
        DownloadError::Http(e)
    }
}
