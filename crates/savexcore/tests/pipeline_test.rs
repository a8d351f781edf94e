//! End-to-end download pipeline with stubbed strategies and a mock CDN.

use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use savexcore::download::resolver::{ResolverChain, Strategy, StrategyOutcome};
use savexcore::download::{classify, DownloadError, Fetcher, Platform, ResolvedMedia, Resolver, VideoDownloader, VideoLink};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEN_MB: usize = 10 * 1024 * 1024;

/// Always answers with the same candidate.
struct StubStrategy {
    candidate: String,
}

#[async_trait]
impl Strategy for StubStrategy {
    fn name(&self) -> &str {
        "stub"
    }

    async fn attempt(&self, _link: &VideoLink) -> StrategyOutcome {
        StrategyOutcome::Found(self.candidate.clone())
    }
}

struct Failing;

#[async_trait]
impl Strategy for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    async fn attempt(&self, _link: &VideoLink) -> StrategyOutcome {
        StrategyOutcome::Failed("upstream 500".to_string())
    }
}

fn mp4_bytes(len: usize) -> Vec<u8> {
    let mut body = vec![0x00, 0x00, 0x00, 0x18];
    body.extend_from_slice(b"ftypmp42");
    body.resize(len, 0x11);
    body
}

fn downloader(candidate: String, temp_dir: std::path::PathBuf, max: u64) -> VideoDownloader {
    let client = reqwest::Client::new();
    let instagram = ResolverChain::new(Platform::Instagram)
        .with(Arc::new(Failing))
        .with(Arc::new(StubStrategy {
            candidate: candidate.clone(),
        }));
    let tiktok = ResolverChain::new(Platform::TikTok).with(Arc::new(StubStrategy { candidate }));
    VideoDownloader::from_parts(
        Resolver::from_chains(client.clone(), instagram, tiktok),
        Fetcher::new(client),
        temp_dir,
        max,
    )
}

#[tokio::test]
async fn test_instagram_post_end_to_end() {
    let _ = pretty_env_logger::try_init();
    let cdn = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(mp4_bytes(TEN_MB), "video/mp4"))
        .mount(&cdn)
        .await;

    let temp = tempfile::tempdir().unwrap();
    let downloader = downloader(
        format!("{}/clip.mp4", cdn.uri()),
        temp.path().to_path_buf(),
        50 * 1024 * 1024,
    );

    let file = downloader
        .download("https://www.instagram.com/p/Cxyz123/")
        .await
        .unwrap();
    assert_eq!(file.size(), TEN_MB as u64);

    let stored = file.path().to_path_buf();
    assert!(stored.starts_with(temp.path()));
    let name = stored.file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("video_") && name.ends_with(".mp4"));
    assert_eq!(std::fs::metadata(&stored).unwrap().len(), TEN_MB as u64);

    drop(file);
    assert!(!stored.exists());
}

#[tokio::test]
async fn test_escaped_candidate_is_unescaped_before_fetch() {
    let cdn = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(mp4_bytes(2048), "video/mp4"))
        .expect(1)
        .mount(&cdn)
        .await;

    let escaped = format!("{}/v/clip.mp4?a=1\\u0026b=2", cdn.uri()).replace('/', "\\/");
    let temp = tempfile::tempdir().unwrap();
    let downloader = downloader(escaped, temp.path().to_path_buf(), 1024 * 1024);

    let (_, resolved) = downloader.resolve("https://www.instagram.com/reel/Cxyz123/").await.unwrap();
    match resolved {
        ResolvedMedia::Found { url, via } => {
            assert_eq!(url, format!("{}/v/clip.mp4?a=1&b=2", cdn.uri()));
            assert_eq!(via, "stub");
        }
        ResolvedMedia::Unresolved => panic!("expected a resolved URL"),
    }

    let file = downloader.download("https://www.instagram.com/reel/Cxyz123/").await.unwrap();
    assert_eq!(file.size(), 2048);
}

#[tokio::test]
async fn test_oversize_file_is_removed() {
    let cdn = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(mp4_bytes(64 * 1024), "video/mp4"))
        .mount(&cdn)
        .await;

    let temp = tempfile::tempdir().unwrap();
    let downloader = downloader(format!("{}/big.mp4", cdn.uri()), temp.path().to_path_buf(), 16 * 1024);

    let err = downloader
        .download("https://www.tiktok.com/@user/video/7234567890123456789")
        .await
        .unwrap_err();
    assert!(matches!(err, DownloadError::Oversize { limit, .. } if limit == 16 * 1024));
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_unresolved_names_platform() {
    let client = reqwest::Client::new();
    let instagram = ResolverChain::new(Platform::Instagram).with(Arc::new(Failing));
    let tiktok = ResolverChain::new(Platform::TikTok).with(Arc::new(Failing));
    let temp = tempfile::tempdir().unwrap();
    let downloader = VideoDownloader::from_parts(
        Resolver::from_chains(client.clone(), instagram, tiktok),
        Fetcher::new(client),
        temp.path().to_path_buf(),
        1024,
    );

    let err = downloader
        .download("https://instagram.com/reel/ABC/")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DownloadError::Unresolved {
            platform: Platform::Instagram
        }
    ));
    assert_eq!(err.message_key(), "download-error");
}

#[tokio::test]
async fn test_short_link_expansion_follows_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ZMabc/"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("Location", format!("{}/@user/video/7234567890123456789", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/@user/video/7234567890123456789"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&server)
        .await;

    let client = reqwest::Client::new();
    let resolver = Resolver::from_chains(
        client,
        ResolverChain::new(Platform::Instagram),
        ResolverChain::new(Platform::TikTok),
    );

    let short = VideoLink::new(
        Platform::TikTok,
        url::Url::parse(&format!("{}/ZMabc/", server.uri())).unwrap(),
    );
    assert_eq!(short.id, None);

    let expanded = resolver.expand_short_link(&short).await;
    assert_eq!(expanded.id.as_deref(), Some("7234567890123456789"));
    assert_eq!(expanded.raw, short.raw);
}

#[tokio::test]
async fn test_short_link_expansion_failure_keeps_link() {
    let client = reqwest::Client::new();
    let resolver = Resolver::from_chains(
        client,
        ResolverChain::new(Platform::Instagram),
        ResolverChain::new(Platform::TikTok),
    );
    // Nothing listens on the discard port
    let short = VideoLink::new(Platform::TikTok, url::Url::parse("http://127.0.0.1:9/x").unwrap());
    let expanded = resolver.expand_short_link(&short).await;
    assert_eq!(expanded, short);
}

#[test]
fn test_classifier_properties() {
    assert!(classify("https://example.com/foo").is_none());
    assert!(classify("https://instagram.com/explore/").is_none());
    assert_eq!(
        classify("https://instagram.com/p/ABC123/?utm=1").unwrap().id.as_deref(),
        Some("ABC123")
    );
    let short = classify("vt.tiktok.com/XYZ").unwrap();
    assert_eq!(short.platform, Platform::TikTok);
    assert_eq!(short.id, None);
}

/// Live check against the real platforms.
/// Run with: cargo test test_live_instagram_resolve -- --ignored --nocapture
#[tokio::test]
#[ignore]
async fn test_live_instagram_resolve() {
    let client = savexcore::download::build_http_client().unwrap();
    let downloader = VideoDownloader::new(client);
    let (_, resolved) = downloader
        .resolve("https://www.instagram.com/reel/C1234567890/")
        .await
        .unwrap();
    println!("{:?}", resolved);
}
