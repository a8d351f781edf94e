//! Logging initialization and startup diagnostics

use anyhow::Result;
use simplelog::*;
use std::fs::OpenOptions;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// The log file is opened in append mode so restarts on the same host keep history.
///
/// # Arguments
/// * `log_file_path` - Path to the log file
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(|e| anyhow::anyhow!("Failed to open log file: {}", e))?;

    let log_config = ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("html5ever")
        .add_filter_ignore_str("selectors")
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            log_config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, log_config, log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs the effective configuration at application startup.
///
/// Secrets are never printed, only whether they are set.
pub fn log_startup_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("⚙️  SaveX configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    if config::BOT_TOKEN.is_empty() {
        log::error!("❌ BOT_TOKEN: not set, the bot cannot start");
    } else {
        log::info!("✅ BOT_TOKEN: set");
    }

    match config::WEBHOOK_URL.as_deref() {
        Some(url) => log::info!("🌐 Mode: webhook ({}) on port {}", url, *config::PORT),
        None => log::info!("🔄 Mode: long polling"),
    }

    log::info!("🗄  Database: {}", *config::DATABASE_PATH);
    log::info!("📁 Temp folder: {}", config::temp_dir().display());
    if *config::IS_EPHEMERAL_HOST {
        log::info!("   Ephemeral host detected, using the OS temp directory");
    }

    if *config::admin::ADMIN_USER_ID == 0 {
        log::warn!("⚠️  ADMIN_USER_ID: not set, support and feedback messages will be dropped");
    } else {
        log::info!("✅ ADMIN_USER_ID: {}", *config::admin::ADMIN_USER_ID);
    }

    match config::PROVIDERS_FILE.as_deref() {
        Some(path) => log::info!("🔌 Providers: {}", path),
        None => log::info!("🔌 Providers: built-in table"),
    }

    if config::SCRAPER_PROXY.is_some() {
        log::info!("🛡  Scraper proxy: enabled");
    }

    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
