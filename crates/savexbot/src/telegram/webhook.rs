//! Webhook mode: Telegram pushes updates to `<WEBHOOK_URL>/webhook`, and
//! `GET /` answers health probes of the hosting platform.

use std::net::SocketAddr;

use axum::{routing::get, Router};
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{axum_to_router, Options};
use tokio::net::TcpListener;

use super::handlers::HandlerError;

/// Path Telegram posts updates to, appended to `WEBHOOK_URL`.
pub const WEBHOOK_PATH: &str = "/webhook";

async fn health() -> &'static str {
    "Bot is running!"
}

/// Router with the health route only.
pub fn health_router() -> Router {
    Router::new().route("/", get(health))
}

/// Full public URL Telegram should post updates to.
pub fn webhook_endpoint(base: &str) -> Result<url::Url, url::ParseError> {
    let base = base.trim_end_matches('/');
    url::Url::parse(&format!("{}{}", base, WEBHOOK_PATH))
}

/// Registers the webhook, serves it next to the health route and runs the dispatcher
/// until Ctrl-C.
pub async fn run_webhook(
    bot: Bot,
    handler: UpdateHandler<HandlerError>,
    base_url: &str,
    port: u16,
) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let url = webhook_endpoint(base_url)?;
    log::info!("Starting bot in webhook mode at {} (listening on {})", url, addr);

    let (listener, stop_flag, router) = axum_to_router(bot.clone(), Options::new(addr, url)).await?;
    let app = router.merge(health_router());

    let tcp = TcpListener::bind(addr).await?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(tcp, app).with_graceful_shutdown(stop_flag).await {
            log::error!("Webhook server failed: {}", e);
        }
    });

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the webhook listener"),
        )
        .await;

    log::info!("Webhook dispatcher shut down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_health_route() {
        let response = health_router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Bot is running!");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = health_router()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_webhook_endpoint() {
        assert_eq!(
            webhook_endpoint("https://savex.onrender.com/").unwrap().as_str(),
            "https://savex.onrender.com/webhook"
        );
        assert_eq!(
            webhook_endpoint("https://savex.onrender.com").unwrap().as_str(),
            "https://savex.onrender.com/webhook"
        );
        assert!(webhook_endpoint("not a url").is_err());
    }
}
