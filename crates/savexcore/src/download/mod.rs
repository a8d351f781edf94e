//! Video download pipeline
//!
//! - `link`: classifies user text into a [`VideoLink`]
//! - `resolver`: ordered strategy chains turning a link into a direct media URL
//! - `fetch`: streams a media URL to disk and checks it is really a video
//! - `pipeline`: glues the three together and applies the size policy

pub mod error;
pub mod fetch;
pub mod link;
pub mod pipeline;
pub mod resolver;

pub use error::DownloadError;
pub use fetch::{DownloadedFile, Fetcher};
pub use link::{classify, Platform, VideoLink};
pub use pipeline::VideoDownloader;
pub use resolver::{ResolvedMedia, Resolver};

use crate::core::config;

/// Builds the HTTP client shared by the resolver and the fetcher.
///
/// Created once per process; `reqwest::Client` is cheap to clone and safe to share.
pub fn build_http_client() -> Result<reqwest::Client, DownloadError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(config::resolver::USER_AGENT)
        .connect_timeout(config::network::connect_timeout());

    if let Some(proxy_url) = config::SCRAPER_PROXY.as_deref() {
        match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => {
                log::info!("Scraping requests go through proxy");
                builder = builder.proxy(proxy);
            }
            Err(e) => log::warn!("Ignoring invalid SCRAPER_PROXY: {}", e),
        }
    }

    Ok(builder.build()?)
}
