//! Inline button callbacks: language picker and donate card list

use teloxide::prelude::*;
use teloxide::types::CallbackQuery;

use savexcore::core::config;
use savexcore::i18n;
use savexcore::storage::db;
use savexcore::storage::get_connection;

use super::commands::welcome_text;
use super::types::{HandlerDeps, HandlerError, UserInfo};
use crate::telegram::keyboards::{donate_cards_text, DONATE_CARD, LANG_PREFIX};

/// What a callback button asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallbackAction {
    SetLanguage(&'static str),
    DonateCards,
    Unknown,
}

pub(crate) fn parse_callback(data: &str) -> CallbackAction {
    if data == DONATE_CARD {
        return CallbackAction::DonateCards;
    }
    match data.strip_prefix(LANG_PREFIX).and_then(i18n::is_language_supported) {
        Some(code) => CallbackAction::SetLanguage(code),
        None => CallbackAction::Unknown,
    }
}

pub(super) async fn handle_callback(bot: &Bot, q: &CallbackQuery, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let data = q.data.as_deref().unwrap_or_default();
    let Some(message) = q.message.as_ref() else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat_id = message.chat().id;

    match parse_callback(data) {
        CallbackAction::SetLanguage(code) => {
            let user = UserInfo::from_user(&q.from, chat_id.0);
            {
                let conn = get_connection(&deps.db_pool)?;
                db::ensure_user(&conn, user.user_id, user.username.as_deref())?;
                db::set_user_language(&conn, user.user_id, code)?;
            }
            log::info!("User {} switched language to {}", user.user_id, code);

            let lang = i18n::lang_from_code(code);
            bot.answer_callback_query(q.id.clone()).await?;
            bot.edit_message_text(chat_id, message.id(), i18n::t(&lang, "language-changed"))
                .await?;
            bot.send_message(chat_id, welcome_text(&lang, &user.first_name)).await?;
        }
        CallbackAction::DonateCards => {
            let lang = i18n::user_lang_from_pool(&deps.db_pool, chat_id.0);
            bot.answer_callback_query(q.id.clone()).await?;
            bot.edit_message_text(
                chat_id,
                message.id(),
                donate_cards_text(&lang, &config::donate::DONATE_CARDS),
            )
            .await?;
        }
        CallbackAction::Unknown => {
            log::warn!("Unknown callback data: {:?}", data);
            bot.answer_callback_query(q.id.clone()).await?;
        }
    }
    Ok(())
}
