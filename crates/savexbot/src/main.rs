use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::prelude::*;
use tokio::time::sleep;

use savex::broadcast::broadcast;
use savex::cli::{Cli, Commands};
use savex::telegram::webhook::run_webhook;
use savex::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};
use savexcore::core::{config, init_logger, log_startup_configuration};
use savexcore::download::build_http_client;
use savexcore::storage::create_pool;
use savexcore::{ResolvedMedia, VideoDownloader};

/// Main entry point for the Telegram bot
///
/// Parses CLI arguments and dispatches to the matching subcommand.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
        if let Some(msg) = panic_info.payload().downcast_ref::<&str>() {
            log::error!("Panic message: {}", msg);
        }
    }));

    // .env first so LOG_FILE_PATH from it is honored
    let _ = dotenv();
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run { webhook }) => run_bot(webhook).await,
        Some(Commands::Broadcast { text }) => run_broadcast(text.as_deref()).await,
        Some(Commands::Resolve { url }) => run_resolve(&url).await,
        None => run_bot(false).await,
    }
}

/// Run the Telegram bot
async fn run_bot(use_webhook: bool) -> Result<()> {
    log::info!("Starting bot...");
    log_startup_configuration();

    let db_pool = Arc::new(create_pool(&config::DATABASE_PATH)?);
    let client = build_http_client()?;
    let downloader = Arc::new(VideoDownloader::new(client));

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let handler_deps = HandlerDeps::new(db_pool, downloader, *config::admin::ADMIN_USER_ID);
    let handler = schema(handler_deps);

    let webhook_url = if use_webhook { config::WEBHOOK_URL.clone() } else { None };
    if use_webhook && webhook_url.is_none() {
        log::warn!("--webhook given but WEBHOOK_URL is not set, falling back to long polling");
    }

    if let Some(url) = webhook_url {
        return run_webhook(bot, handler, &url, *config::PORT).await;
    }

    // Long polling mode (default)
    let _ = bot.delete_webhook().await;
    log::info!("Starting bot in long polling mode");

    let mut retry_count = 0;
    let max_retries = config::retry::MAX_DISPATCHER_RETRIES;

    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // Separate task so a panic inside the dispatcher surfaces through the JoinHandle
        let handle = tokio::spawn(async move {
            use teloxide::update_listeners::Polling;

            let listener = Polling::builder(bot_clone.clone()).drop_pending_updates().build();

            Dispatcher::builder(bot_clone, handler_clone)
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) if join_err.is_panic() => {
                log::error!("Dispatcher panicked: {}", join_err);
                if retry_count >= max_retries {
                    log::error!("Max retries reached after panic. Exiting...");
                    break;
                }
                retry_count += 1;
                log::info!(
                    "Retrying dispatcher after panic (attempt {}/{})...",
                    retry_count,
                    max_retries
                );
                sleep(config::retry::dispatcher_delay()).await;
            }
            Err(join_err) => {
                log::warn!("Dispatcher task was cancelled: {}", join_err);
                break;
            }
        }
    }

    Ok(())
}

async fn run_broadcast(text: Option<&str>) -> Result<()> {
    let db_pool = create_pool(&config::DATABASE_PATH)?;
    let bot = create_bot()?;
    let report = broadcast(&bot, &db_pool, text).await?;
    println!("Broadcast finished: {} sent, {} failed", report.sent, report.failed);
    Ok(())
}

/// Classifier + resolver chain only, prints what would be downloaded
async fn run_resolve(text: &str) -> Result<()> {
    let client = build_http_client()?;
    let downloader = VideoDownloader::new(client);
    let (link, media) = downloader.resolve(text).await?;
    println!("platform: {}", link.platform);
    println!("link:     {}", link.url);
    match media {
        ResolvedMedia::Found { url, via } => {
            println!("resolved: {}", url);
            println!("via:      {}", via);
        }
        ResolvedMedia::Unresolved => {
            println!("resolved: <none>");
            anyhow::bail!("no strategy could resolve {}", link.url);
        }
    }
    Ok(())
}
