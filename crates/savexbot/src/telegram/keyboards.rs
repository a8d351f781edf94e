//! Inline keyboards and the texts that go with them

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use unic_langid::LanguageIdentifier;

use savexcore::core::config::donate::DonateCard;
use savexcore::i18n;

/// Callback data prefix of the language picker buttons
pub const LANG_PREFIX: &str = "lang_";
/// Callback data of the "card" donate button
pub const DONATE_CARD: &str = "donate_card";

/// Language picker: Uzbek and English on the first row, Russian on the second.
pub fn language_keyboard() -> InlineKeyboardMarkup {
    let button = |code: &str| {
        InlineKeyboardButton::callback(i18n::language_name(code), format!("{}{}", LANG_PREFIX, code))
    };
    InlineKeyboardMarkup::new(vec![vec![button("uz"), button("en")], vec![button("ru")]])
}

/// Donate options: the donation page (when configured and valid) and the card list.
pub fn donate_keyboard(lang: &LanguageIdentifier, donate_url: Option<&str>) -> InlineKeyboardMarkup {
    let mut row = Vec::new();
    if let Some(url) = donate_url.and_then(|u| url::Url::parse(u).ok()) {
        row.push(InlineKeyboardButton::url(i18n::t(lang, "donate-link-button"), url));
    }
    row.push(InlineKeyboardButton::callback(
        i18n::t(lang, "donate-card-button"),
        DONATE_CARD,
    ));
    InlineKeyboardMarkup::new(vec![row])
}

/// Text shown by the card button.
pub fn donate_cards_text(lang: &LanguageIdentifier, cards: &[DonateCard]) -> String {
    if cards.is_empty() {
        return i18n::t(lang, "donate-no-cards");
    }
    let mut text = i18n::t(lang, "donate-cards-header");
    for card in cards {
        text.push_str("\n\n💳 ");
        text.push_str(&card.number);
        if !card.label.is_empty() {
            text.push_str("\n👤 ");
            text.push_str(&card.label);
        }
    }
    text
}
