//! One-off announcement to every stored user

use std::future::Future;
use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::ChatId;

use savexcore::core::config;
use savexcore::i18n;
use savexcore::storage::db::{self, DbPool};
use savexcore::storage::get_connection;

/// Outcome of a broadcast run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub failed: usize,
}

/// Calls `send` for every id, pausing `delay` between sends. Failures are logged and counted.
pub async fn send_to_all<F, Fut, E>(ids: &[i64], delay: Duration, mut send: F) -> BroadcastReport
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: std::fmt::Display,
{
    let mut report = BroadcastReport::default();
    for (i, &id) in ids.iter().enumerate() {
        match send(id).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                log::warn!("Broadcast to {} failed: {}", id, e);
                report.failed += 1;
            }
        }
        if i + 1 < ids.len() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    report
}

/// Text sent when no `--text` is given.
pub fn default_announcement() -> String {
    let lang = i18n::lang_from_code(db::DEFAULT_LANGUAGE);
    i18n::t(&lang, "broadcast-update")
}

/// Sends `text` (or the built-in update announcement) to every user in the database.
pub async fn broadcast(bot: &Bot, pool: &DbPool, text: Option<&str>) -> anyhow::Result<BroadcastReport> {
    let ids = {
        let conn = get_connection(pool)?;
        db::all_user_ids(&conn)?
    };
    let text = text.map(str::to_string).unwrap_or_else(default_announcement);
    log::info!("Broadcasting to {} users", ids.len());

    let report = send_to_all(&ids, config::broadcast::delay(), |id| {
        let bot = bot.clone();
        let text = text.clone();
        async move { bot.send_message(ChatId(id), text).await.map(|_| ()) }
    })
    .await;

    log::info!("Broadcast finished: {} sent, {} failed", report.sent, report.failed);
    Ok(report)
}
