//! Handler types and dependencies

use std::sync::Arc;

use teloxide::types::{Message, User};

use savexcore::storage::db::{self, UserRecord};
use savexcore::storage::get_connection;
use savexcore::VideoDownloader;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<db::DbPool>,
    pub downloader: Arc<VideoDownloader>,
    /// Chat receiving support requests and feedback; 0 disables forwarding
    pub admin_id: i64,
}

impl HandlerDeps {
    /// Create new handler dependencies
    pub fn new(db_pool: Arc<db::DbPool>, downloader: Arc<VideoDownloader>, admin_id: i64) -> Self {
        Self {
            db_pool,
            downloader,
            admin_id,
        }
    }

    /// Loads (or creates) the stored record of the sender.
    ///
    /// `None` only when the database is unavailable.
    pub fn user_record(&self, user: &UserInfo) -> Option<UserRecord> {
        let conn = match get_connection(&self.db_pool) {
            Ok(conn) => conn,
            Err(e) => {
                log::error!("Failed to get DB connection: {}", e);
                return None;
            }
        };
        match db::ensure_user(&conn, user.user_id, user.username.as_deref()) {
            Ok(record) => Some(record),
            Err(e) => {
                log::error!("Failed to load user {}: {}", user.user_id, e);
                None
            }
        }
    }
}

/// Sender details used for replies and admin reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub user_id: i64,
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: String,
}

impl UserInfo {
    pub fn from_user(user: &User, chat_id: i64) -> Self {
        Self {
            user_id: i64::try_from(user.id.0).unwrap_or_default(),
            chat_id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
        }
    }

    /// Extract user info from a Telegram message; falls back to the chat for anonymous senders.
    pub fn from_message(msg: &Message) -> Self {
        match msg.from.as_ref() {
            Some(user) => Self::from_user(user, msg.chat.id.0),
            None => Self {
                user_id: msg.chat.id.0,
                chat_id: msg.chat.id.0,
                username: msg.chat.username().map(str::to_string),
                first_name: msg.chat.first_name().unwrap_or_default().to_string(),
            },
        }
    }
}
