// src/cli.rs

use clap::{Parser, Subcommand};
use secure_string::SecureString;
use std::path::PathBuf;

/// Command-line interface options for link-relay.
#[derive(Parser, Debug)]
#[command(
    name = "link-relay",
    version,
    about = "Forward Gmail sign-in links to Telegram",
    long_about = None
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "link-relay.yml")]
    pub config: PathBuf,

    /// IMAP server domain
    #[arg(short = 'H', long, env = "IMAP_HOST")]
    pub imap_host: Option<String>,

    /// IMAP username (the Gmail address being watched)
    #[arg(short = 'U', long, env = "IMAP_USER")]
    pub imap_username: Option<String>,

    /// IMAP password (app password; omit to use the stored OAuth token)
    #[arg(short = 'P', long, env = "IMAP_PASSWORD")]
    pub imap_password: Option<SecureString>,

    /// Telegram bot token
    #[arg(short = 'T', long, env = "TELEGRAM_BOT_TOKEN")]
    pub telegram_bot_token: Option<SecureString>,

    /// Telegram chat id of the recipient
    #[arg(short = 'C', long, env = "TELEGRAM_CHAT_ID")]
    pub telegram_chat_id: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Mode selection. Defaults to `bot` when no subcommand is given.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// One-time Gmail OAuth setup; saves the token file
    Auth,
    /// Long-lived bot: the recipient sends /link and gets the sign-in link
    Bot,
    /// Push the latest unread sign-in link once, then exit
    Forward {
        /// Fetch and print the extracted link only (no send, no mark read)
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the forward cycle on a fixed interval
    Run {
        /// Seconds between runs (minimum 60)
        #[arg(long, default_value_t = 300, value_name = "SEC")]
        interval: u64,
    },
}
