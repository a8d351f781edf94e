//! Link classification: decides whether a chat message carries a supported video link.
//!
//! Pure parsing, no network. Anything that does not parse or does not match a
//! known post/reel/video shape is rejected with `None`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use url::Url;

/// Source platform of a video link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    #[strum(serialize = "tiktok")]
    TikTok,
}

/// A classified, well-formed video link. Built per inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoLink {
    /// The link token as the user sent it
    pub raw: String,
    /// Parsed form of the link
    pub url: Url,
    pub platform: Platform,
    /// Instagram shortcode or TikTok numeric id, when the link carries one
    pub id: Option<String>,
}

impl VideoLink {
    /// Builds a link for a known platform, extracting the id from the URL.
    pub fn new(platform: Platform, url: Url) -> Self {
        let id = match platform {
            Platform::Instagram => extract_shortcode(&url),
            Platform::TikTok => extract_tiktok_id(url.as_str()),
        };
        Self {
            raw: url.to_string(),
            url,
            platform,
            id,
        }
    }

    /// TikTok short link (`vt.`/`vm.` redirector) that needs expanding before an id is known.
    pub fn is_short_link(&self) -> bool {
        self.platform == Platform::TikTok && is_tiktok_short_host(&host_of(&self.url))
    }

    /// Replaces the URL after redirect expansion, keeping the original raw text.
    pub fn expanded(&self, url: Url) -> Self {
        let mut link = Self::new(self.platform, url);
        link.raw = self.raw.clone();
        if link.id.is_none() {
            link.id = self.id.clone();
        }
        link
    }
}

/// Classifies free-form user text.
///
/// Returns the first supported link in the text, or `None` when there is no Instagram
/// post/reel or TikTok video link at all.
pub fn classify(text: &str) -> Option<VideoLink> {
    link_tokens(text).into_iter().find_map(|token| classify_token(&token))
}

fn classify_token(candidate: &str) -> Option<VideoLink> {
    let url = Url::parse(candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let host = host_of(&url);
    let path = url.path();

    let platform = if host.contains("instagram.com") {
        if !is_instagram_content_path(path) {
            return None;
        }
        Platform::Instagram
    } else if host.contains("tiktok.com") {
        let video_path = path.contains("/video/") || path.contains("/v/");
        if !video_path && !is_tiktok_short_host(&host) {
            return None;
        }
        Platform::TikTok
    } else {
        return None;
    };

    let mut link = VideoLink::new(platform, url);
    link.raw = candidate.to_string();
    Some(link)
}

/// URL-looking tokens in message order. Bare platform links get an `https://` prefix.
fn link_tokens(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|token| {
            let lower = token.to_ascii_lowercase();
            if lower.starts_with("http://") || lower.starts_with("https://") {
                Some(token.to_string())
            } else if lower.contains("instagram.com/") || lower.contains("tiktok.com/") {
                Some(format!("https://{}", token))
            } else {
                None
            }
        })
        .collect()
}

fn host_of(url: &Url) -> String {
    url.host_str().unwrap_or("").to_ascii_lowercase()
}

fn is_instagram_content_path(path: &str) -> bool {
    ["/p/", "/reel/", "/reels/", "/tv/"].iter().any(|marker| path.contains(marker))
}

fn is_tiktok_short_host(host: &str) -> bool {
    host == "vt.tiktok.com" || host == "vm.tiktok.com"
}

/// Extracts the shortcode from an Instagram URL.
///
/// Supports `/p/<code>/`, `/reel/<code>/`, `/reels/<code>/`, `/tv/<code>/`, optionally
/// prefixed by a username segment.
pub fn extract_shortcode(url: &Url) -> Option<String> {
    const CONTENT_TYPES: &[&str] = &["p", "reel", "reels", "tv"];
    let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
    let pos = segments.iter().position(|s| CONTENT_TYPES.contains(s))?;
    segments
        .get(pos + 1)
        .filter(|code| code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .map(|code| code.to_string())
}

static TIKTOK_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"/video/(\d{5,})",
        r"/v/(\d{5,})",
        r"/embed/(?:v2/)?(\d{5,})",
        r"[?&](?:item_id|itemId|share_item_id)=(\d{5,})",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Extracts the numeric TikTok video id, trying several URL shapes.
pub fn extract_tiktok_id(url: &str) -> Option<String> {
    TIKTOK_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rejects_foreign_host() {
        assert_eq!(classify("https://example.com/foo"), None);
        assert_eq!(classify("https://www.youtube.com/watch?v=abc"), None);
    }

    #[test]
    fn test_rejects_instagram_non_content() {
        assert_eq!(classify("https://instagram.com/explore/"), None);
        assert_eq!(classify("https://www.instagram.com/cristiano/"), None);
    }

    #[test]
    fn test_instagram_post_ignores_query() {
        let link = classify("https://instagram.com/p/ABC123/?utm=1").unwrap();
        assert_eq!(link.platform, Platform::Instagram);
        assert_eq!(link.id.as_deref(), Some("ABC123"));
    }

    #[test]
    fn test_instagram_reel_variants() {
        for (text, code) in [
            ("https://www.instagram.com/reel/C1a2B3/", "C1a2B3"),
            ("https://www.instagram.com/reels/C1a2B3", "C1a2B3"),
            ("https://www.instagram.com/tv/Xy_z-9/", "Xy_z-9"),
            ("https://www.instagram.com/someuser/reel/B58TfHTnY2u/", "B58TfHTnY2u"),
        ] {
            let link = classify(text).unwrap();
            assert_eq!(link.id.as_deref(), Some(code), "{}", text);
        }
    }

    #[test]
    fn test_bare_instagram_link_gets_scheme() {
        let link = classify("instagram.com/p/ABC123/").unwrap();
        assert_eq!(link.url.scheme(), "https");
        assert_eq!(link.raw, "https://instagram.com/p/ABC123/");
    }

    #[test]
    fn test_link_inside_text() {
        let link = classify("  look at this https://www.tiktok.com/@user/video/7234567890123456789 lol ").unwrap();
        assert_eq!(link.platform, Platform::TikTok);
        assert_eq!(link.id.as_deref(), Some("7234567890123456789"));
    }

    #[test]
    fn test_tiktok_short_link_has_no_id() {
        let link = classify("vt.tiktok.com/XYZ").unwrap();
        assert_eq!(link.platform, Platform::TikTok);
        assert_eq!(link.id, None);
        assert!(link.is_short_link());

        let link = classify("https://vm.tiktok.com/ZMabc/").unwrap();
        assert!(link.is_short_link());
    }

    #[test]
    fn test_tiktok_v_path() {
        let link = classify("https://m.tiktok.com/v/7234567890123456789.html").unwrap();
        assert_eq!(link.id.as_deref(), Some("7234567890123456789"));
        assert!(!link.is_short_link());
    }

    #[test]
    fn test_tiktok_profile_rejected() {
        assert_eq!(classify("https://www.tiktok.com/@someone"), None);
    }

    #[test]
    fn test_unparsable_rejected() {
        assert_eq!(classify(""), None);
        assert_eq!(classify("hello there"), None);
        assert_eq!(classify("https://"), None);
    }

    #[test]
    fn test_first_supported_link_wins() {
        let link = classify("see https://example.com and https://instagram.com/p/X/").unwrap();
        assert_eq!(link.platform, Platform::Instagram);
        assert_eq!(link.id.as_deref(), Some("X"));

        let link = classify("https://instagram.com/explore/ then vt.tiktok.com/XYZ").unwrap();
        assert_eq!(link.platform, Platform::TikTok);
        assert_eq!(link.raw, "https://vt.tiktok.com/XYZ");
    }

    #[test]
    fn test_extract_tiktok_id_shapes() {
        assert_eq!(
            extract_tiktok_id("https://www.tiktok.com/embed/v2/7234567890123456789").as_deref(),
            Some("7234567890123456789")
        );
        assert_eq!(
            extract_tiktok_id("https://www.tiktok.com/share?item_id=7234567890123456789&x=1").as_deref(),
            Some("7234567890123456789")
        );
        assert_eq!(extract_tiktok_id("https://www.tiktok.com/@user"), None);
    }

    #[test]
    fn test_expanded_keeps_raw() {
        let short = classify("https://vt.tiktok.com/XYZ/").unwrap();
        let full = Url::parse("https://www.tiktok.com/@u/video/7234567890123456789").unwrap();
        let expanded = short.expanded(full);
        assert_eq!(expanded.raw, "https://vt.tiktok.com/XYZ/");
        assert_eq!(expanded.id.as_deref(), Some("7234567890123456789"));
        assert!(!expanded.is_short_link());
    }

    #[test]
    fn test_platform_display() {
        assert_eq!(Platform::Instagram.to_string(), "instagram");
        assert_eq!(Platform::TikTok.to_string(), "tiktok");
        assert_eq!("tiktok".parse::<Platform>().unwrap(), Platform::TikTok);
    }
}
