//! Plain-text message routing: downloads, feedback and support forwarding

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use teloxide::types::{InputFile, Message};
use unic_langid::LanguageIdentifier;

use savexcore::storage::db::{self, UserRecord};
use savexcore::storage::get_connection;
use savexcore::{classify, i18n, DownloadError};

use super::types::{HandlerDeps, HandlerError, UserInfo};
use crate::telegram::keyboards::language_keyboard;
use crate::telegram::notifications::{admin_report, notify_admin_text};

/// Words that turn a non-link message into a support request
const SUPPORT_KEYWORDS: &[&str] = &["support", "yordam", "помощь", "help"];

/// What to do with an incoming text message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Unknown `/command`
    Ignore,
    /// The user has not picked a language yet
    AskLanguage,
    /// Feedback mode is on; forward to admin
    Feedback,
    Download,
    /// Not a link but mentions support
    Support,
    Invalid,
}

/// Decides how to handle `text` from a user with the given stored record.
pub fn route_text(text: &str, record: Option<&UserRecord>) -> Route {
    let text = text.trim();
    if text.starts_with('/') {
        return Route::Ignore;
    }
    if let Some(record) = record {
        if !record.language_set {
            return Route::AskLanguage;
        }
        if record.feedback_mode {
            return Route::Feedback;
        }
    }
    if classify(text).is_some() {
        return Route::Download;
    }
    let lower = text.to_lowercase();
    if SUPPORT_KEYWORDS.iter().any(|word| lower.contains(word)) {
        Route::Support
    } else {
        Route::Invalid
    }
}

/// Entry point for every non-command text message.
pub(super) async fn handle_text(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let user = UserInfo::from_message(msg);
    let record = deps.user_record(&user);
    let lang = record
        .as_ref()
        .map(|r| i18n::lang_from_code(&r.language))
        .unwrap_or_else(|| i18n::lang_from_code(db::DEFAULT_LANGUAGE));

    match route_text(text, record.as_ref()) {
        Route::Ignore => {}
        Route::AskLanguage => {
            bot.send_message(msg.chat.id, i18n::t(&lang, "choose-language"))
                .reply_markup(language_keyboard())
                .await?;
        }
        Route::Feedback => handle_feedback(bot, msg, deps, &user, &lang, text).await?,
        Route::Download => handle_download(bot, msg, deps, &lang, text).await?,
        Route::Support => {
            bot.send_message(msg.chat.id, i18n::t(&lang, "support-sent")).await?;
            notify_admin_text(bot, deps.admin_id, &admin_report("admin-support", &user, text)).await;
        }
        Route::Invalid => {
            bot.send_message(msg.chat.id, i18n::t(&lang, "invalid-url")).await?;
        }
    }
    Ok(())
}

async fn handle_feedback(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    user: &UserInfo,
    lang: &LanguageIdentifier,
    text: &str,
) -> Result<(), HandlerError> {
    bot.send_message(msg.chat.id, i18n::t(lang, "feedback-thanks")).await?;
    notify_admin_text(bot, deps.admin_id, &admin_report("admin-feedback", user, text)).await;

    let conn = get_connection(&deps.db_pool)?;
    db::set_feedback_mode(&conn, user.user_id, false)?;
    Ok(())
}

/// Status message, pipeline, upload, status update.
async fn handle_download(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
    text: &str,
) -> Result<(), HandlerError> {
    let status = bot.send_message(msg.chat.id, i18n::t(lang, "downloading")).await?;

    let outcome = match deps.downloader.download(text).await {
        Ok(file) => {
            log::info!("Sending {} bytes to chat {}", file.size(), msg.chat.id);
            let sent = bot
                .send_video(msg.chat.id, InputFile::file(file.path().to_path_buf()))
                .caption(i18n::t(lang, "video-caption"))
                .supports_streaming(true)
                .await;
            drop(file);
            match sent {
                Ok(_) => i18n::t(lang, "video-sent"),
                Err(e) => {
                    log::error!("send_video failed for chat {}: {}", msg.chat.id, e);
                    i18n::t(lang, "download-error")
                }
            }
        }
        Err(e) => {
            log::warn!("[{}] download failed for chat {}: {}", e.subcategory(), msg.chat.id, e);
            error_text(lang, &e)
        }
    };

    bot.edit_message_text(msg.chat.id, status.id, outcome).await?;
    Ok(())
}

/// Localized message for a pipeline error.
pub(crate) fn error_text(lang: &LanguageIdentifier, err: &DownloadError) -> String {
    match err {
        DownloadError::Oversize { limit, .. } => {
            let mut args = FluentArgs::new();
            args.set("limit", (limit / (1024 * 1024)).to_string());
            i18n::t_args(lang, err.message_key(), &args)
        }
        _ => i18n::t(lang, err.message_key()),
    }
}
