//! Instagram strategies: internal GraphQL API and the embed page.
//!
//! Both work anonymously for public posts and reels. The GraphQL `doc_id`
//! rotates every few weeks and is read from `INSTAGRAM_DOC_ID`.

use std::sync::Arc;

use async_trait::async_trait;

use super::providers::{strategies_for, ProviderSpec};
use super::scrape::{get_page, scrape_video_url, PageScrapeStrategy};
use super::{ResolverChain, Strategy, StrategyOutcome};
use crate::core::config;
use crate::download::link::{Platform, VideoLink};

/// Instagram web origin
pub const INSTAGRAM_BASE: &str = "https://www.instagram.com";

/// Instagram internal app ID (public, embedded in the web app).
const IG_APP_ID: &str = "936619743392459";

/// Facebook LSD token (anti-CSRF, public static value used by web scrapers).
const FB_LSD_TOKEN: &str = "AVqbxe3J_YA";

/// Facebook ASBD ID (public, embedded in the web app).
const FB_ASBD_ID: &str = "129477";

/// Default Instagram chain: GraphQL, embed page, page scrape, then providers.
pub fn default_chain(client: &reqwest::Client, providers: &[ProviderSpec]) -> ResolverChain {
    let mut chain = ResolverChain::new(Platform::Instagram)
        .with(Arc::new(GraphqlStrategy::new(client.clone(), INSTAGRAM_BASE)))
        .with(Arc::new(EmbedStrategy::new(client.clone(), INSTAGRAM_BASE)))
        .with(Arc::new(PageScrapeStrategy::new(
            "instagram_page",
            client.clone(),
            vec!["video_url", "contentUrl"],
        )));
    for strategy in strategies_for(Platform::Instagram, providers, client) {
        chain.push(strategy);
    }
    chain
}

/// Queries `/api/graphql` for the shortcode media and reads `video_url`.
pub struct GraphqlStrategy {
    client: reqwest::Client,
    base: String,
}

impl GraphqlStrategy {
    pub fn new(client: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }
}

/// Picks the video URL out of a GraphQL shortcode media response.
///
/// Carousels (sidecars) yield the first video child.
pub fn graphql_video_url(body: &serde_json::Value) -> Option<String> {
    let media = body
        .pointer("/data/xdt_shortcode_media")
        .or_else(|| body.pointer("/data/shortcode_media"))?;

    if let Some(url) = media.get("video_url").and_then(|v| v.as_str()) {
        return Some(url.to_string());
    }

    media
        .pointer("/edge_sidecar_to_children/edges")
        .and_then(|v| v.as_array())?
        .iter()
        .filter_map(|edge| edge.pointer("/node/video_url").and_then(|v| v.as_str()))
        .next()
        .map(str::to_string)
}

#[async_trait]
impl Strategy for GraphqlStrategy {
    fn name(&self) -> &str {
        "instagram_graphql"
    }

    async fn attempt(&self, link: &VideoLink) -> StrategyOutcome {
        let Some(shortcode) = link.id.as_deref() else {
            return StrategyOutcome::Failed("link has no shortcode".to_string());
        };

        let variables = format!(r#"{{"shortcode":"{}"}}"#, shortcode);
        let form = [
            ("doc_id", config::INSTAGRAM_DOC_ID.as_str()),
            ("variables", variables.as_str()),
            ("lsd", FB_LSD_TOKEN),
        ];

        let response = self
            .client
            .post(format!("{}/api/graphql", self.base))
            .header("X-IG-App-ID", IG_APP_ID)
            .header("X-FB-LSD", FB_LSD_TOKEN)
            .header("X-ASBD-ID", FB_ASBD_ID)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(reqwest::header::REFERER, format!("{}/", INSTAGRAM_BASE))
            .header(reqwest::header::ORIGIN, INSTAGRAM_BASE)
            .form(&form)
            .send()
            .await;

        let response = match response {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => return StrategyOutcome::Failed(format!("HTTP {}", r.status())),
            Err(e) => return StrategyOutcome::Failed(e.to_string()),
        };

        let body: serde_json::Value = match response.json().await {
            Ok(body) => body,
            Err(e) => return StrategyOutcome::Failed(format!("non-JSON response: {}", e)),
        };

        if let Some(message) = body.get("message").and_then(|v| v.as_str()) {
            if message.contains("doc_id") || message.contains("useragent mismatch") {
                log::error!("Instagram GraphQL: possible doc_id expiry: {}", message);
            }
            return StrategyOutcome::Failed(message.to_string());
        }

        StrategyOutcome::found_or_not(graphql_video_url(&body))
    }
}

/// Scrapes `/p/{shortcode}/embed/captioned/`.
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
        "instagram_embed"
    }

    async fn attempt(&self, link: &VideoLink) -> StrategyOutcome {
        let Some(shortcode) = link.id.as_deref() else {
            return StrategyOutcome::Failed("link has no shortcode".to_string());
        };
        let request = self
            .client
            .get(format!("{}/p/{}/embed/captioned/", self.base, shortcode));
        match get_page(request).await {
            Ok(html) => StrategyOutcome::found_or_not(scrape_video_url(&html, &["video_url"])),
            Err(reason) => StrategyOutcome::Failed(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::classify;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_graphql_video_url_single() {
        let body = json!({"data": {"xdt_shortcode_media": {"is_video": true, "video_url": "https://cdn.example/a.mp4"}}});
        assert_eq!(graphql_video_url(&body).as_deref(), Some("https://cdn.example/a.mp4"));
    }

    #[test]
    fn test_graphql_video_url_legacy_key_and_sidecar() {
        let body = json!({"data": {"shortcode_media": {"edge_sidecar_to_children": {"edges": [
            {"node": {"is_video": false, "display_url": "https://cdn.example/p.jpg"}},
            {"node": {"is_video": true, "video_url": "https://cdn.example/b.mp4"}}
        ]}}}});
        assert_eq!(graphql_video_url(&body).as_deref(), Some("https://cdn.example/b.mp4"));
    }

    #[test]
    fn test_graphql_photo_post_has_no_video() {
        let body = json!({"data": {"xdt_shortcode_media": {"is_video": false, "display_url": "https://cdn.example/p.jpg"}}});
        assert_eq!(graphql_video_url(&body), None);
        assert_eq!(graphql_video_url(&json!({"data": null})), None);
    }

    #[tokio::test]
    async fn test_graphql_strategy_against_mock() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/graphql"))
            .and(header("X-IG-App-ID", IG_APP_ID))
            .and(body_string_contains("ABC123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"xdt_shortcode_media": {"video_url": "https://cdn.example/g.mp4"}}
            })))
            .mount(&mock_server)
            .await;

        let strategy = GraphqlStrategy::new(reqwest::Client::new(), mock_server.uri());
        let link = classify("https://www.instagram.com/reel/ABC123/").unwrap();
        assert_eq!(
            strategy.attempt(&link).await,
            StrategyOutcome::Found("https://cdn.example/g.mp4".to_string())
        );
    }

    #[tokio::test]
    async fn test_graphql_strategy_error_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "login_required", "status": "fail"})))
            .mount(&mock_server)
            .await;

        let strategy = GraphqlStrategy::new(reqwest::Client::new(), mock_server.uri());
        let link = classify("https://www.instagram.com/p/ABC123/").unwrap();
        assert_eq!(
            strategy.attempt(&link).await,
            StrategyOutcome::Failed("login_required".to_string())
        );
    }

    #[tokio::test]
    async fn test_embed_strategy_against_mock() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/p/ABC123/embed/captioned/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><script>window.__additionalDataLoaded('extra',{"video_url":"https:\/\/cdn.example\/e.mp4"});</script></html>"#,
            ))
            .mount(&mock_server)
            .await;

        let strategy = EmbedStrategy::new(reqwest::Client::new(), mock_server.uri());
        let link = classify("https://www.instagram.com/p/ABC123/").unwrap();
        assert_eq!(
            strategy.attempt(&link).await,
            StrategyOutcome::Found(r"https:\/\/cdn.example\/e.mp4".to_string())
        );
    }

    #[test]
    fn test_default_chain_order() {
        let chain = default_chain(&reqwest::Client::new(), &[]);
        assert_eq!(
            chain.strategy_names(),
            vec!["instagram_graphql", "instagram_embed", "instagram_page"]
        );
    }
}
