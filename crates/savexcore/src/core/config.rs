use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Public base URL for webhook mode (e.g. `https://savex.onrender.com`)
/// Read from WEBHOOK_URL environment variable
pub static WEBHOOK_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_var("WEBHOOK_URL"));

/// Port the webhook/health HTTP server listens on
/// Read from PORT environment variable (set by most PaaS hosts)
/// Default: 8080
pub static PORT: Lazy<u16> = Lazy::new(|| env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080));

/// Database file path
/// Read from DATABASE_PATH environment variable
/// Default: savex.sqlite
pub static DATABASE_PATH: Lazy<String> =
    Lazy::new(|| env::var("DATABASE_PATH").unwrap_or_else(|_| "savex.sqlite".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Folder for downloaded videos, relative to the working directory
/// Read from TEMP_FOLDER environment variable
/// Default: temp_videos
pub static TEMP_FOLDER: Lazy<String> =
    Lazy::new(|| env::var("TEMP_FOLDER").unwrap_or_else(|_| "temp_videos".to_string()));

/// Set when running on an ephemeral host (Render). The repo-relative
/// TEMP_FOLDER is not writable there, so the OS temp dir is used instead.
pub static IS_EPHEMERAL_HOST: Lazy<bool> = Lazy::new(|| env::var_os("RENDER").is_some());

/// Instagram GraphQL `doc_id` for the shortcode media query.
/// Instagram rotates it every few weeks, so it is overridable.
/// Read from INSTAGRAM_DOC_ID environment variable
pub static INSTAGRAM_DOC_ID: Lazy<String> =
    Lazy::new(|| env::var("INSTAGRAM_DOC_ID").unwrap_or_else(|_| "8845758582119845".to_string()));

/// Optional JSON file replacing the built-in third-party provider table
/// Read from PROVIDERS_FILE environment variable
pub static PROVIDERS_FILE: Lazy<Option<String>> = Lazy::new(|| non_empty_var("PROVIDERS_FILE"));

/// Optional proxy for all scraping requests (http://, https:// or socks5://)
/// Read from SCRAPER_PROXY environment variable
pub static SCRAPER_PROXY: Lazy<Option<String>> = Lazy::new(|| {
    non_empty_var("SCRAPER_PROXY").filter(|v| v != "none" && v != "disabled")
});

/// Returns the directory downloaded videos are written to.
pub fn temp_dir() -> PathBuf {
    resolve_temp_dir(*IS_EPHEMERAL_HOST, &TEMP_FOLDER)
}

fn resolve_temp_dir(ephemeral: bool, folder: &str) -> PathBuf {
    if ephemeral {
        env::temp_dir()
    } else {
        PathBuf::from(folder)
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Download configuration
pub mod download {
    /// Maximum size of a video we are willing to send (Telegram bot upload limit)
    pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024; // 50MB

    /// Size of the write buffer used while streaming a video to disk
    pub const CHUNK_SIZE: usize = 8192;
}

/// Resolver chain configuration
pub mod resolver {
    use super::Duration;

    /// Per-strategy timeout for first-party and scraping strategies (in seconds)
    pub const STRATEGY_TIMEOUT_SECS: u64 = 15;

    /// Timeout for slow third-party conversion services (in seconds)
    pub const SLOW_STRATEGY_TIMEOUT_SECS: u64 = 30;

    /// Desktop browser UA; the platforms serve stripped pages to unknown agents
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

    pub fn strategy_timeout() -> Duration {
        Duration::from_secs(STRATEGY_TIMEOUT_SECS)
    }

    pub fn slow_strategy_timeout() -> Duration {
        Duration::from_secs(SLOW_STRATEGY_TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Telegram API calls (in seconds)
    /// Large enough for a 50MB video upload on a slow link
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;

    /// Connect timeout for scraping requests (in seconds)
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }

    pub fn connect_timeout() -> Duration {
        Duration::from_secs(CONNECT_TIMEOUT_SECS)
    }
}

/// Retry configuration for the dispatcher (the download core never retries)
pub mod retry {
    use super::Duration;

    /// Maximum number of dispatcher restarts after a panic
    pub const MAX_DISPATCHER_RETRIES: u32 = 5;

    /// Delay between dispatcher restarts (in seconds)
    pub const DISPATCHER_RETRY_DELAY_SECS: u64 = 5;

    pub fn dispatcher_delay() -> Duration {
        Duration::from_secs(DISPATCHER_RETRY_DELAY_SECS)
    }
}

/// Broadcast configuration
pub mod broadcast {
    use super::Duration;

    /// Pause between two broadcast messages, keeps us under Telegram's flood limits
    pub const DELAY_MS: u64 = 100;

    pub fn delay() -> Duration {
        Duration::from_millis(DELAY_MS)
    }
}

/// Admin configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    /// Admin user ID receiving support requests and feedback
    /// Read from ADMIN_USER_ID environment variable
    /// Defaults to 0 if not set (forwarding disabled)
    pub static ADMIN_USER_ID: Lazy<i64> =
        Lazy::new(|| env::var("ADMIN_USER_ID").ok().and_then(|s| s.trim().parse().ok()).unwrap_or(0));
}

/// Donation configuration
pub mod donate {
    use once_cell::sync::Lazy;
    use std::env;

    /// A card shown by the "card" donate button
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DonateCard {
        pub number: String,
        pub label: String,
    }

    /// Donation page link
    /// Read from DONATE_URL environment variable
    pub static DONATE_URL: Lazy<Option<String>> = Lazy::new(|| super::non_empty_var("DONATE_URL"));

    /// Donation cards, `number|label` pairs separated by `;`
    /// Read from DONATE_CARDS environment variable
    /// Example: `4067 0700 0070 9266|John Doe;4231 2000 7103 8359|VISA`
    pub static DONATE_CARDS: Lazy<Vec<DonateCard>> =
        Lazy::new(|| env::var("DONATE_CARDS").map(|raw| parse_cards(&raw)).unwrap_or_default());

    pub fn parse_cards(raw: &str) -> Vec<DonateCard> {
        raw.split(';')
            .filter_map(|entry| {
                let mut parts = entry.splitn(2, '|');
                let number = parts.next()?.trim();
                if number.is_empty() {
                    return None;
                }
                let label = parts.next().unwrap_or("").trim();
                Some(DonateCard {
                    number: number.to_string(),
                    label: label.to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_temp_dir_uses_folder_on_regular_host() {
        assert_eq!(resolve_temp_dir(false, "temp_videos"), PathBuf::from("temp_videos"));
    }

    #[test]
    fn test_temp_dir_uses_os_temp_on_ephemeral_host() {
        assert_eq!(resolve_temp_dir(true, "temp_videos"), env::temp_dir());
    }

    #[test]
    fn test_parse_donate_cards() {
        let cards = donate::parse_cards("4067 0700 0070 9266|John Doe; 4231 2000 7103 8359 | VISA ;;");
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].number, "4067 0700 0070 9266");
        assert_eq!(cards[0].label, "John Doe");
        assert_eq!(cards[1].label, "VISA");
    }

    #[test]
    fn test_parse_donate_card_without_label() {
        let cards = donate::parse_cards("1111 2222");
        assert_eq!(
            cards,
            vec![donate::DonateCard {
                number: "1111 2222".to_string(),
                label: String::new(),
            }]
        );
    }

    #[test]
    fn test_timeouts() {
        assert_eq!(resolver::strategy_timeout(), Duration::from_secs(15));
        assert_eq!(resolver::slow_strategy_timeout(), Duration::from_secs(30));
    }
}
