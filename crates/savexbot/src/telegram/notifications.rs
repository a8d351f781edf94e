use teloxide::prelude::*;
use teloxide::types::ChatId;

use fluent_templates::fluent_bundle::FluentArgs;
use savexcore::i18n;

use super::handlers::UserInfo;

/// Builds the admin report for a feedback (`admin-feedback`) or support (`admin-support`) message.
///
/// Admin reports are always in the default language.
pub fn admin_report(key: &str, user: &UserInfo, text: &str) -> String {
    let lang = i18n::lang_from_code("uz");
    let username = user
        .username
        .clone()
        .unwrap_or_else(|| i18n::t(&lang, "no-username"));

    let mut args = FluentArgs::new();
    args.set("name", user.first_name.clone());
    args.set("id", user.user_id.to_string());
    args.set("username", username);
    args.set("text", text.to_string());
    i18n::t_args(&lang, key, &args)
}

/// Sends a plain text message to the administrator.
///
/// Returns false if no admin is configured or the send failed.
pub async fn notify_admin_text(bot: &Bot, admin_id: i64, text: &str) -> bool {
    if admin_id == 0 {
        log::warn!("ADMIN_USER_ID is not set, dropping admin message");
        return false;
    }
    match bot.send_message(ChatId(admin_id), text).await {
        Ok(_) => true,
        Err(e) => {
            log::error!("Failed to notify admin {}: {}", admin_id, e);
            false
        }
    }
}
