//! SaveX core: everything the bot needs except Telegram itself
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging
//! - `download`: link classification, the resolver chain, the fetcher and the
//!   pipeline that glues them together
//! - `storage`: user preference store (SQLite)
//! - `i18n`: localized strings

pub mod core;
pub mod download;
pub mod i18n;
pub mod storage;

// Re-export commonly used types for convenience
pub use core::error::{AppError, AppResult};
pub use download::{classify, DownloadError, DownloadedFile, Platform, ResolvedMedia, VideoDownloader, VideoLink};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
