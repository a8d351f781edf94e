//! TikTok strategies: item detail API and the embed player page.

use std::sync::Arc;

use async_trait::async_trait;

use super::providers::{strategies_for, ProviderSpec};
use super::scrape::{get_page, scrape_video_url, PageScrapeStrategy};
use super::{ResolverChain, Strategy, StrategyOutcome};
use crate::download::link::{Platform, VideoLink};

/// TikTok web origin
pub const TIKTOK_BASE: &str = "https://www.tiktok.com";

const ITEM_VIDEO_POINTERS: &[&str] = &[
    "/itemInfo/itemStruct/video/playAddr",
    "/itemInfo/itemStruct/video/downloadAddr",
    "/itemStruct/video/playAddr",
    "/itemStruct/video/downloadAddr",
];

/// Default TikTok chain: item API, embed page, page scrape, then providers.
pub fn default_chain(client: &reqwest::Client, providers: &[ProviderSpec]) -> ResolverChain {
    let mut chain = ResolverChain::new(Platform::TikTok)
        .with(Arc::new(ItemDetailStrategy::new(client.clone(), TIKTOK_BASE)))
        .with(Arc::new(EmbedStrategy::new(client.clone(), TIKTOK_BASE)))
        .with(Arc::new(PageScrapeStrategy::new(
            "tiktok_page",
            client.clone(),
            vec!["playAddr", "downloadAddr", "contentUrl"],
        )));
    for strategy in strategies_for(Platform::TikTok, providers, client) {
        chain.push(strategy);
    }
    chain
}

fn item_video_url(body: &serde_json::Value) -> Option<String> {
    ITEM_VIDEO_POINTERS
        .iter()
        .filter_map(|p| body.pointer(p).and_then(|v| v.as_str()))
        .find(|url| !url.is_empty())
        .map(str::to_string)
}

/// `/api/item/detail/?itemId=` JSON API.
pub struct ItemDetailStrategy {
    client: reqwest::Client,
    base: String,
}

impl ItemDetailStrategy {
    pub fn new(client: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }
}

#[async_trait]
impl Strategy for ItemDetailStrategy {
    fn name(&self) -> &str {
        "tiktok_item_api"
    }

    async fn attempt(&self, link: &VideoLink) -> StrategyOutcome {
        let Some(id) = link.id.as_deref() else {
            return StrategyOutcome::Failed("link has no video id".to_string());
        };

        let response = self
            .client
            .get(format!("{}/api/item/detail/", self.base))
            .query(&[("itemId", id)])
            .header(reqwest::header::REFERER, format!("{}/", TIKTOK_BASE))
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => return StrategyOutcome::Failed(format!("HTTP {}", r.status())),
            Err(e) => return StrategyOutcome::Failed(e.to_string()),
        };

        match response.json::<serde_json::Value>().await {
            Ok(body) => StrategyOutcome::found_or_not(item_video_url(&body)),
            Err(e) => StrategyOutcome::Failed(format!("non-JSON response: {}", e)),
        }
    }
}

/// Scrapes the `/embed/v2/{id}` player page.
pub struct EmbedStrategy {
    client: reqwest::Client,
    base: String,
}

impl EmbedStrategy {
    pub fn new(client: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }
}

#[async_trait]
impl Strategy for EmbedStrategy {
    fn name(&self) -> &str {
        "tiktok_embed"
    }

    async fn attempt(&self, link: &VideoLink) -> StrategyOutcome {
        let Some(id) = link.id.as_deref() else {
            return StrategyOutcome::Failed("link has no video id".to_string());
        };
        let request = self.client.get(format!("{}/embed/v2/{}", self.base, id));
        match get_page(request).await {
            Ok(html) => StrategyOutcome::found_or_not(scrape_video_url(&html, &["playAddr", "downloadAddr"])),
            Err(reason) => StrategyOutcome::Failed(reason),
        }
    }
}
