use std::collections::HashMap;

use fluent_templates::{
    fluent_bundle::{FluentArgs, FluentValue},
    static_loader, Loader,
};
use once_cell::sync::Lazy;
use unic_langid::LanguageIdentifier;

use crate::storage::db;

static_loader! {
    static LOCALES = {
        locales: "./locales",
        fallback_language: "uz",
    };
}

/// Supported languages (code, human-readable name with flag).
pub static SUPPORTED_LANGS: &[(&str, &str)] = &[
    ("uz", "🇺🇿 O'zbekcha"),
    ("en", "🇬🇧 English"),
    ("ru", "🇷🇺 Русский"),
];

/// Default language identifier used as a fallback.
static DEFAULT_LANG: Lazy<LanguageIdentifier> = Lazy::new(|| "uz".parse().unwrap_or_default());

/// Normalizes a language code into a LanguageIdentifier (falls back to `uz`).
pub fn lang_from_code(code: &str) -> LanguageIdentifier {
    is_language_supported(code)
        .and_then(|c| c.parse().ok())
        .unwrap_or_else(|| DEFAULT_LANG.clone())
}

/// Resolves the language for a user from the database using an existing connection.
pub fn user_lang(conn: &db::DbConnection, telegram_id: i64) -> LanguageIdentifier {
    match db::get_user_language(conn, telegram_id) {
        Ok(lang_code) => lang_from_code(&lang_code),
        Err(_) => DEFAULT_LANG.clone(),
    }
}

/// Resolves the language for a user using a connection pool.
pub fn user_lang_from_pool(db_pool: &db::DbPool, telegram_id: i64) -> LanguageIdentifier {
    if let Ok(conn) = db::get_connection(db_pool) {
        return user_lang(&conn, telegram_id);
    }
    DEFAULT_LANG.clone()
}

/// Returns a localized string for the given key.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
///
/// Only for messages without placeables: fluent-templates panics when a `{ $var }`
/// is left unset, so keys such as `welcome` or `download-too-large` go through [`t_args`].
pub fn t(lang: &LanguageIdentifier, key: &str) -> String {
    let text = LOCALES
        .lookup(lang, key)
        .unwrap_or_else(|| LOCALES.lookup(&DEFAULT_LANG, key).unwrap_or_else(|| key.to_string()));
    text.replace("\\n", "\n")
}

/// Returns a localized string with arguments for interpolation.
/// Converts literal `\n` sequences to actual newlines for proper Telegram formatting.
pub fn t_args(lang: &LanguageIdentifier, key: &str, args: &FluentArgs) -> String {
    let args_map: HashMap<String, FluentValue> = args.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();

    let text = LOCALES.lookup_with_args(lang, key, &args_map).unwrap_or_else(|| {
        LOCALES
            .lookup_with_args(&DEFAULT_LANG, key, &args_map)
            .unwrap_or_else(|| key.to_string())
    });
    text.replace("\\n", "\n")
}

/// Finds a human-friendly name for a language code.
pub fn language_name(code: &str) -> &str {
    SUPPORTED_LANGS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

/// Checks if a language code is supported by the bot.
/// Returns the normalized language code if supported, None otherwise.
pub fn is_language_supported(code: &str) -> Option<&'static str> {
    // "en-US" -> "en", "ru-RU" -> "ru"
    let normalized = code.split(['-', '_']).next().unwrap_or(code).to_lowercase();

    SUPPORTED_LANGS
        .iter()
        .find(|(c, _)| c.eq_ignore_ascii_case(&normalized))
        .map(|(c, _)| *c)
}
