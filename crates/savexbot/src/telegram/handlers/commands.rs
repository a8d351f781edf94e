//! Command handler implementations (/start, /language, /support, /donate, /help)

use fluent_templates::fluent_bundle::FluentArgs;
use teloxide::prelude::*;
use teloxide::types::Message;

use savexcore::core::config;
use savexcore::i18n;
use savexcore::storage::db;
use savexcore::storage::get_connection;

use super::types::{HandlerDeps, HandlerError, UserInfo};
use crate::telegram::bot::Command;
use crate::telegram::keyboards::{donate_keyboard, language_keyboard};

/// Dispatches a parsed bot command.
pub(super) async fn handle_command(
    bot: &Bot,
    msg: &Message,
    cmd: Command,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    match cmd {
        Command::Start => handle_start_command(bot, msg, deps).await,
        Command::Language => send_language_picker(bot, msg, deps).await,
        Command::Support => handle_support_command(bot, msg, deps).await,
        Command::Donate => handle_donate_command(bot, msg, deps).await,
        Command::Help => {
            let lang = i18n::user_lang_from_pool(&deps.db_pool, msg.chat.id.0);
            bot.send_message(msg.chat.id, i18n::t(&lang, "help-text")).await?;
            Ok(())
        }
    }
}

/// Builds the greeting sent after /start and after a language is picked.
pub(crate) fn welcome_text(lang: &unic_langid::LanguageIdentifier, first_name: &str) -> String {
    let mut args = FluentArgs::new();
    args.set("name", first_name.to_string());
    i18n::t_args(lang, "welcome", &args)
}

/// Handle /start command
///
/// New users (or users that never picked a language) get the language picker,
/// everyone else gets the welcome message.
async fn handle_start_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let user = UserInfo::from_message(msg);
    let record = deps.user_record(&user);

    match record {
        Some(record) if record.language_set => {
            let lang = i18n::lang_from_code(&record.language);
            bot.send_message(msg.chat.id, welcome_text(&lang, &user.first_name))
                .await?;
        }
        _ => {
            log::info!("New user on /start: chat_id={}", msg.chat.id.0);
            let lang = i18n::lang_from_code(db::DEFAULT_LANGUAGE);
            bot.send_message(msg.chat.id, i18n::t(&lang, "choose-language"))
                .reply_markup(language_keyboard())
                .await?;
        }
    }
    Ok(())
}

async fn send_language_picker(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let lang = i18n::user_lang_from_pool(&deps.db_pool, msg.chat.id.0);
    bot.send_message(msg.chat.id, i18n::t(&lang, "choose-language"))
        .reply_markup(language_keyboard())
        .await?;
    Ok(())
}

/// Handle /support command
///
/// Users without a @username cannot be answered by the admin, so they are turned away.
async fn handle_support_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let user = UserInfo::from_message(msg);
    let record = deps.user_record(&user);
    let lang = record
        .as_ref()
        .map(|r| i18n::lang_from_code(&r.language))
        .unwrap_or_else(|| i18n::lang_from_code(db::DEFAULT_LANGUAGE));

    if user.username.is_none() {
        bot.send_message(msg.chat.id, i18n::t(&lang, "support-need-username"))
            .await?;
        return Ok(());
    }

    let conn = get_connection(&deps.db_pool)?;
    db::set_feedback_mode(&conn, user.user_id, true)?;
    bot.send_message(msg.chat.id, i18n::t(&lang, "support-prompt")).await?;
    Ok(())
}

async fn handle_donate_command(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    let lang = i18n::user_lang_from_pool(&deps.db_pool, msg.chat.id.0);
    bot.send_message(msg.chat.id, i18n::t(&lang, "donate-choose"))
        .reply_markup(donate_keyboard(&lang, config::donate::DONATE_URL.as_deref()))
        .await?;
    Ok(())
}
