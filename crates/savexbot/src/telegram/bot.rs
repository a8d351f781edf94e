//! Bot initialization: command enum, Bot instance, command menus

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;

use savexcore::core::config;
use savexcore::i18n;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "SaveX commands:")]
pub enum Command {
    #[command(description = "start the bot")]
    Start,
    #[command(description = "change language")]
    Language,
    #[command(description = "contact support")]
    Support,
    #[command(description = "support the project")]
    Donate,
    #[command(description = "show help")]
    Help,
}

/// Creates a Bot instance from `BOT_TOKEN`
///
/// The HTTP client timeout is large enough for a 50MB video upload.
pub fn create_bot() -> anyhow::Result<Bot> {
    if config::BOT_TOKEN.is_empty() {
        anyhow::bail!("BOT_TOKEN is not set");
    }
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    Ok(Bot::with_client(config::BOT_TOKEN.as_str(), client))
}

/// Localized command menu for one language.
pub fn commands_for(lang_code: &str) -> Vec<BotCommand> {
    let lang = i18n::lang_from_code(lang_code);
    ["start", "language", "support", "donate", "help"]
        .iter()
        .map(|name| BotCommand::new(*name, i18n::t(&lang, &format!("cmd-{}", name))))
        .collect()
}

/// Sets up the command menu in Telegram UI, one per supported language.
///
/// The Uzbek menu doubles as the default for users with other client languages.
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(commands_for("uz")).await?;
    for (code, _) in i18n::SUPPORTED_LANGS {
        bot.set_my_commands(commands_for(code)).language_code(*code).await?;
    }
    Ok(())
}
