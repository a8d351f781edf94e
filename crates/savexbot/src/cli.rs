use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "savex")]
#[command(author, version, about = "Telegram bot that downloads Instagram and TikTok videos", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (default when no subcommand is given)
    Run {
        /// Use webhook mode instead of long polling (requires WEBHOOK_URL)
        #[arg(long)]
        webhook: bool,
    },

    /// Send a message to every stored user
    Broadcast {
        /// Message text; the built-in update announcement is sent when omitted
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Resolve a link to its direct video URL without downloading it
    Resolve {
        /// Instagram or TikTok link
        url: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
