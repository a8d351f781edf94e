//! HTML/JSON scraping helpers and the generic page-scrape strategy.
//!
//! Public post pages embed the media URL in several places depending on the
//! A/B bucket the request lands in: inline JSON (`"video_url":"..."`), JSON-LD
//! (`contentUrl`), OpenGraph `og:video` tags or a plain `<video src>`.

use async_trait::async_trait;
use regex::Regex;
use select::document::Document;
use select::predicate::{Attr, Name};

use super::{Strategy, StrategyOutcome};
use crate::download::link::VideoLink;

const OG_VIDEO_PROPERTIES: &[&str] = &["og:video", "og:video:secure_url", "og:video:url", "twitter:player:stream"];

/// GETs a page and returns its body, mapping transport errors and bad statuses to a reason.
pub async fn get_page(request: reqwest::RequestBuilder) -> Result<String, String> {
    let response = request.send().await.map_err(|e| format!("request failed: {}", e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(format!("HTTP {}", status));
    }
    response.text().await.map_err(|e| format!("reading body failed: {}", e))
}

/// Finds the first non-empty JSON string value for `key` anywhere in `body`.
///
/// Works on raw HTML with inline scripts, where the value is still JSON-escaped.
pub fn find_json_string(body: &str, key: &str) -> Option<String> {
    let pattern = format!(r#""{}"\s*:\s*"((?:[^"\\]|\\.)*)""#, regex::escape(key));
    let re = Regex::new(&pattern).ok()?;
    let found = re
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .find(|value| !value.is_empty());
    found
}

/// Finds an OpenGraph/Twitter video meta tag.
pub fn find_meta_video(document: &Document) -> Option<String> {
    OG_VIDEO_PROPERTIES.iter().find_map(|property| {
        document
            .find(Name("meta"))
            .find(|n| n.attr("property").or_else(|| n.attr("name")) == Some(*property))
            .and_then(|n| n.attr("content"))
            .filter(|content| !content.is_empty())
            .map(str::to_string)
    })
}

/// Finds `<video src>` or a `<source src>` child.
pub fn find_video_tag(document: &Document) -> Option<String> {
    document
        .find(Name("video"))
        .find_map(|n| n.attr("src").map(str::to_string))
        .or_else(|| {
            document
                .find(Name("source"))
                .filter(|n| n.attr("type").map(|t| t.starts_with("video/")).unwrap_or(true))
                .find_map(|n| n.attr("src").map(str::to_string))
        })
        .filter(|src| !src.is_empty())
}

/// Finds a JSON-LD `contentUrl`.
fn find_json_ld(document: &Document) -> Option<String> {
    document
        .find(Attr("type", "application/ld+json"))
        .find_map(|n| find_json_string(&n.text(), "contentUrl"))
}

/// Looks for a video URL in a page: JSON keys in order, then JSON-LD, meta tags and video tags.
pub fn scrape_video_url(html: &str, json_keys: &[&str]) -> Option<String> {
    if let Some(found) = json_keys.iter().find_map(|key| find_json_string(html, key)) {
        return Some(found);
    }
    let document = Document::from(html);
    find_json_ld(&document)
        .or_else(|| find_meta_video(&document))
        .or_else(|| find_video_tag(&document))
}

/// Generic scrape of the link's own page.
pub struct PageScrapeStrategy {
    name: String,
    client: reqwest::Client,
    json_keys: Vec<&'static str>,
}

impl PageScrapeStrategy {
    pub fn new(name: impl Into<String>, client: reqwest::Client, json_keys: Vec<&'static str>) -> Self {
        Self {
            name: name.into(),
            client,
            json_keys,
        }
    }
}

#[async_trait]
impl Strategy for PageScrapeStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self, link: &VideoLink) -> StrategyOutcome {
        let request = self
            .client
            .get(link.url.clone())
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9");
        match get_page(request).await {
            Ok(html) => StrategyOutcome::found_or_not(scrape_video_url(&html, &self.json_keys)),
            Err(reason) => StrategyOutcome::Failed(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::link::{Platform, VideoLink};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_find_json_string_escaped() {
        let html = r#"<script>{"foo":1,"video_url":"https:\/\/cdn.example\/v.mp4?a=1&b=2"}</script>"#;
        assert_eq!(
            find_json_string(html, "video_url").as_deref(),
            Some(r"https:\/\/cdn.example\/v.mp4?a=1&b=2")
        );
    }

    #[test]
    fn test_find_json_string_skips_empty() {
        let html = r#"{"playAddr":"","playAddr" : "https://v16.example/x.mp4"}"#;
        assert_eq!(find_json_string(html, "playAddr").as_deref(), Some("https://v16.example/x.mp4"));
        assert_eq!(find_json_string(html, "downloadAddr"), None);
    }

    #[test]
    fn test_scrape_og_video() {
        let html = r#"<html><head><meta property="og:video" content="https://cdn.example/og.mp4"></head></html>"#;
        assert_eq!(scrape_video_url(html, &["video_url"]).as_deref(), Some("https://cdn.example/og.mp4"));
    }

    #[test]
    fn test_scrape_video_tag() {
        let html = r#"<html><body><video poster="x.jpg"><source src="https://cdn.example/tag.mp4" type="video/mp4"></video></body></html>"#;
        assert_eq!(scrape_video_url(html, &[]).as_deref(), Some("https://cdn.example/tag.mp4"));
    }

    #[test]
    fn test_scrape_json_ld() {
        let html = r#"<script type="application/ld+json">{"@type":"VideoObject","contentUrl":"https://cdn.example/ld.mp4"}</script>"#;
        assert_eq!(scrape_video_url(html, &[]).as_deref(), Some("https://cdn.example/ld.mp4"));
    }

    #[test]
    fn test_scrape_nothing() {
        assert_eq!(scrape_video_url("<html><body>Login</body></html>", &["video_url"]), None);
    }

    #[tokio::test]
    async fn test_page_scrape_strategy() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/p/ABC123/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"<html>"video_url":"https://cdn.example/p.mp4"</html>"#))
            .mount(&mock_server)
            .await;

        let url = url::Url::parse(&format!("{}/p/ABC123/", mock_server.uri())).unwrap();
        let link = VideoLink::new(Platform::Instagram, url);
        let strategy = PageScrapeStrategy::new("page", reqwest::Client::new(), vec!["video_url"]);

        assert_eq!(
            strategy.attempt(&link).await,
            StrategyOutcome::Found("https://cdn.example/p.mp4".to_string())
        );
    }

    #[tokio::test]
    async fn test_page_scrape_strategy_bad_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&mock_server)
            .await;

        let url = url::Url::parse(&format!("{}/p/ABC123/", mock_server.uri())).unwrap();
        let link = VideoLink::new(Platform::Instagram, url);
        let strategy = PageScrapeStrategy::new("page", reqwest::Client::new(), vec!["video_url"]);

        assert!(matches!(strategy.attempt(&link).await, StrategyOutcome::Failed(_)));
    }
}
