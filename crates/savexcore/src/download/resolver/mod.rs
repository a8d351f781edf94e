//! Resolver chain: turns a [`VideoLink`] into a direct, fetchable media URL.
//!
//! Each platform has an ordered list of independent [`Strategy`] implementations,
//! most reliable first. The chain runs them one by one under a per-strategy timeout
//! and stops at the first usable candidate. A strategy that errors, times out or
//! panics only costs its own slot in the chain.

pub mod instagram;
pub mod providers;
pub mod scrape;
pub mod tiktok;

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::FutureExt;
use url::Url;

use crate::core::config;
use crate::download::link::{Platform, VideoLink};

pub use providers::{ProviderSpec, ProviderStrategy, RequestShape};

/// Result of a single strategy attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// A candidate media URL (not yet unescaped or validated)
    Found(String),
    /// The upstream answered but carried no video URL
    NotFound,
    /// Transport error, bad status, unexpected body, timeout or panic
    Failed(String),
}

impl StrategyOutcome {
    pub fn found_or_not(candidate: Option<String>) -> Self {
        match candidate {
            Some(url) => StrategyOutcome::Found(url),
            None => StrategyOutcome::NotFound,
        }
    }
}

impl<E: std::fmt::Display> From<Result<StrategyOutcome, E>> for StrategyOutcome {
    fn from(result: Result<StrategyOutcome, E>) -> Self {
        result.unwrap_or_else(|e| StrategyOutcome::Failed(e.to_string()))
    }
}

/// Final answer of the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedMedia {
    /// Direct absolute media URL and the strategy that produced it
    Found { url: String, via: String },
    Unresolved,
}

/// One self-contained extraction attempt.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Name used in logs and in [`ResolvedMedia::Found::via`]
    fn name(&self) -> &str;

    /// Upper bound for one attempt
    fn timeout(&self) -> Duration {
        config::resolver::strategy_timeout()
    }

    async fn attempt(&self, link: &VideoLink) -> StrategyOutcome;
}

/// Ordered, short-circuiting sequence of strategies for one platform.
pub struct ResolverChain {
    platform: Platform,
    strategies: Vec<Arc<dyn Strategy>>,
}

impl ResolverChain {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            strategies: Vec::new(),
        }
    }

    /// Appends a strategy. Strategies run in insertion order.
    pub fn push(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategies.push(strategy);
    }

    pub fn with(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.push(strategy);
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn run(&self, link: &VideoLink) -> ResolvedMedia {
        for strategy in &self.strategies {
            let outcome = run_guarded(strategy.as_ref(), link).await;
            match outcome {
                StrategyOutcome::Found(candidate) => match finalize_candidate(&candidate) {
                    Some(url) => {
                        log::info!("[{}] {} resolved {}", self.platform, strategy.name(), link.raw);
                        return ResolvedMedia::Found {
                            url,
                            via: strategy.name().to_string(),
                        };
                    }
                    None => {
                        log::debug!("[{}] {} returned unusable candidate", self.platform, strategy.name());
                    }
                },
                StrategyOutcome::NotFound => {
                    log::debug!("[{}] {} found nothing", self.platform, strategy.name());
                }
                StrategyOutcome::Failed(reason) => {
                    log::warn!("[{}] {} failed: {}", self.platform, strategy.name(), reason);
                }
            }
        }

        log::warn!("[{}] all {} strategies exhausted", self.platform, self.strategies.len());
        ResolvedMedia::Unresolved
    }
}

/// Runs one strategy, converting timeouts and panics into `Failed`.
async fn run_guarded(strategy: &dyn Strategy, link: &VideoLink) -> StrategyOutcome {
    let limit = strategy.timeout();
    let attempt = AssertUnwindSafe(strategy.attempt(link)).catch_unwind();
    match tokio::time::timeout(limit, attempt).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(_)) => StrategyOutcome::Failed("strategy panicked".to_string()),
        Err(_) => StrategyOutcome::Failed(format!("timed out after {}s", limit.as_secs())),
    }
}

/// Unescapes a scraped candidate and checks it is an absolute http(s) URL.
pub fn finalize_candidate(raw: &str) -> Option<String> {
    let url = unescape_candidate(raw);
    if url.is_empty() || !url.starts_with("http") {
        return None;
    }
    let parsed = Url::parse(&url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    Some(url)
}

/// Undoes the JSON/HTML escaping that scraped URLs usually carry.
pub fn unescape_candidate(raw: &str) -> String {
    raw.trim()
        .trim_matches('"')
        .replace("\\u0026", "&")
        .replace("\\u002F", "/")
        .replace("\\u002f", "/")
        .replace("\\/", "/")
        .replace("%3D", "=")
        .replace("%3d", "=")
        .replace("&amp;", "&")
}

/// Routes links to the chain of their platform.
///
/// Holds the shared HTTP client, used directly only for TikTok short-link expansion.
pub struct Resolver {
    client: reqwest::Client,
    instagram: ResolverChain,
    tiktok: ResolverChain,
}

impl Resolver {
    /// Default chains with the provider table from `PROVIDERS_FILE` or the built-in one.
    pub fn new(client: reqwest::Client) -> Self {
        let providers = providers::load_configured_providers();
        let instagram = instagram::default_chain(&client, &providers);
        let tiktok = tiktok::default_chain(&client, &providers);
        Self::from_chains(client, instagram, tiktok)
    }

    pub fn from_chains(client: reqwest::Client, instagram: ResolverChain, tiktok: ResolverChain) -> Self {
        Self {
            client,
            instagram,
            tiktok,
        }
    }

    pub fn chain(&self, platform: Platform) -> &ResolverChain {
        match platform {
            Platform::Instagram => &self.instagram,
            Platform::TikTok => &self.tiktok,
        }
    }

    pub async fn resolve(&self, link: &VideoLink) -> ResolvedMedia {
        let link = if link.is_short_link() {
            self.expand_short_link(link).await
        } else {
            link.clone()
        };
        self.chain(link.platform).run(&link).await
    }

    /// Follows redirects of a short link. On failure the original link is returned.
    pub async fn expand_short_link(&self, link: &VideoLink) -> VideoLink {
        let request = self
            .client
            .get(link.url.clone())
            .timeout(config::resolver::strategy_timeout())
            .send();
        match request.await {
            Ok(response) => {
                let final_url = response.url().clone();
                log::debug!("Expanded {} -> {}", link.raw, final_url);
                link.expanded(final_url)
            }
            Err(e) => {
                log::warn!("Short link expansion failed for {}: {}", link.raw, e);
                link.clone()
            }
        }
    }
}
