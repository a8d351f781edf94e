use clap::Parser;
use pretty_assertions::assert_eq;
use savex::cli::{Cli, Commands};

#[test]
fn no_subcommand_means_default_run() {
    let cli = Cli::parse_from(["savex"]);
    assert_eq!(cli.command, None);
}

#[test]
fn run_with_webhook_flag() {
    let cli = Cli::parse_from(["savex", "run", "--webhook"]);
    assert_eq!(cli.command, Some(Commands::Run { webhook: true }));

    let cli = Cli::parse_from(["savex", "run"]);
    assert_eq!(cli.command, Some(Commands::Run { webhook: false }));
}

#[test]
fn broadcast_text_is_optional() {
    let cli = Cli::parse_from(["savex", "broadcast"]);
    assert_eq!(cli.command, Some(Commands::Broadcast { text: None }));

    let cli = Cli::parse_from(["savex", "broadcast", "--text", "New version is out"]);
    assert_eq!(
        cli.command,
        Some(Commands::Broadcast {
            text: Some("New version is out".to_string())
        })
    );
}

#[test]
fn resolve_requires_url() {
    assert!(Cli::try_parse_from(["savex", "resolve"]).is_err());

    let cli = Cli::parse_from(["savex", "resolve", "https://www.instagram.com/reel/ABC123/"]);
    assert_eq!(
        cli.command,
        Some(Commands::Resolve {
            url: "https://www.instagram.com/reel/ABC123/".to_string()
        })
    );
}

#[test]
fn unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["savex", "download"]).is_err());
}
