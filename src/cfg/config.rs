// src/cfg/config.rs

use eyre::{eyre, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use log::{debug, error};
use secure_string::SecureString;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cfg::secure;
use crate::cli::Cli;
use crate::extract::DEFAULT_LINK_PATTERN;

const DEFAULT_IMAP_HOST: &str = "imap.gmail.com";
const DEFAULT_IMAP_PORT: u16 = 993;
const DEFAULT_IMAP_FOLDER: &str = "INBOX";

/// IMAP SUBJECT search text for the sign-in email.
const DEFAULT_SUBJECT_FILTER: &str = "Secure link";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default, alias = "imap-host")]
    pub imap_host: Option<String>,

    #[serde(default, alias = "imap-port")]
    pub imap_port: Option<u16>,

    #[serde(default, alias = "imap-username")]
    pub imap_username: Option<String>,

    #[serde(alias = "imap-password", default, deserialize_with = "secure::deserialize_opt")]
    pub imap_password: Option<SecureString>,

    #[serde(default, alias = "imap-folder")]
    pub imap_folder: Option<String>,

    /// SUBJECT text the IMAP search asks the server for.
    #[serde(default, alias = "subject-filter")]
    pub subject_filter: Option<String>,

    /// Words the fetched subject must all contain (case-insensitive),
    /// re-checked client-side after the server search.
    #[serde(default, alias = "subject-must-contain")]
    pub subject_must_contain: Option<Vec<String>>,

    /// Glob patterns for acceptable From addresses; empty = any sender.
    #[serde(default, alias = "allowed-senders")]
    pub allowed_senders: Vec<String>,

    /// Regex for the sign-in link.
    #[serde(default, alias = "link-pattern")]
    pub link_pattern: Option<String>,

    #[serde(
        alias = "telegram-bot-token",
        default,
        deserialize_with = "secure::deserialize_opt"
    )]
    pub telegram_bot_token: Option<SecureString>,

    #[serde(default, alias = "telegram-chat-id")]
    pub telegram_chat_id: Option<String>,

    /// Mark the message \Seen after a successful send.
    #[serde(default, alias = "mark-read")]
    pub mark_read: Option<bool>,

    /// Where the OAuth token lives; defaults under the user config dir.
    #[serde(default, alias = "token-file")]
    pub token_file: Option<PathBuf>,
}

pub fn load_config(config_path: &Path) -> Result<Config> {
    debug!("Loading configuration from {:?}", config_path);

    if !config_path.exists() {
        debug!("No config file at {}; using defaults", config_path.display());
        return Ok(Config::default());
    }

    let content = fs::read_to_string(config_path).map_err(|e| {
        error!("Failed to read config file {}: {}", config_path.display(), e);
        eyre!("Failed to read config file {}: {}", config_path.display(), e)
    })?;

    let cfg: Config = serde_yaml::from_str(&content).map_err(|e| {
        error!("Failed to parse YAML: {}", e);
        eyre!("Failed to parse YAML: {}", e)
    })?;

    debug!("Successfully loaded configuration");
    Ok(cfg)
}

impl Config {
    /// Load the config file and overlay CLI/env values on top of it.
    pub fn resolve(cli: &Cli) -> Result<Config> {
        let mut cfg = load_config(&cli.config)?;
        if cli.imap_host.is_some() {
            cfg.imap_host = cli.imap_host.clone();
        }
        if cli.imap_username.is_some() {
            cfg.imap_username = cli.imap_username.clone();
        }
        if cli.imap_password.is_some() {
            cfg.imap_password = cli.imap_password.clone();
        }
        if cli.telegram_bot_token.is_some() {
            cfg.telegram_bot_token = cli.telegram_bot_token.clone();
        }
        if cli.telegram_chat_id.is_some() {
            cfg.telegram_chat_id = cli.telegram_chat_id.clone();
        }
        Ok(cfg)
    }

    pub fn imap_host(&self) -> &str {
        self.imap_host.as_deref().unwrap_or(DEFAULT_IMAP_HOST)
    }

    pub fn imap_port(&self) -> u16 {
        self.imap_port.unwrap_or(DEFAULT_IMAP_PORT)
    }

    pub fn imap_folder(&self) -> &str {
        self.imap_folder.as_deref().unwrap_or(DEFAULT_IMAP_FOLDER)
    }

    pub fn subject_filter(&self) -> &str {
        self.subject_filter.as_deref().unwrap_or(DEFAULT_SUBJECT_FILTER)
    }

    /// Defaults to the two words the sign-in email always carries.
    pub fn subject_must_contain(&self) -> Vec<String> {
        match &self.subject_must_contain {
            Some(words) => words.clone(),
            None => vec!["secure link".to_string(), "claude".to_string()],
        }
    }

    pub fn link_pattern(&self) -> &str {
        self.link_pattern.as_deref().unwrap_or(DEFAULT_LINK_PATTERN)
    }

    pub fn mark_read(&self) -> bool {
        self.mark_read.unwrap_or(true)
    }

    pub fn token_file(&self) -> PathBuf {
        match &self.token_file {
            Some(path) => path.clone(),
            None => dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("link-relay")
                .join("token.json"),
        }
    }

    pub fn require_imap_username(&self) -> Result<&str> {
        self.imap_username
            .as_deref()
            .ok_or_else(|| eyre!("Set imap-username (e.g. your_email@gmail.com)"))
    }

    pub fn require_telegram_bot_token(&self) -> Result<&SecureString> {
        self.telegram_bot_token
            .as_ref()
            .ok_or_else(|| eyre!("Set telegram-bot-token in config or TELEGRAM_BOT_TOKEN"))
    }

    pub fn require_telegram_chat_id(&self) -> Result<&str> {
        self.telegram_chat_id
            .as_deref()
            .ok_or_else(|| eyre!("Set telegram-chat-id in config or TELEGRAM_CHAT_ID"))
    }

    /// Compile the allowed-senders globs; `None` when the list is empty.
    pub fn sender_globs(&self) -> Result<Option<GlobSet>> {
        if self.allowed_senders.is_empty() {
            return Ok(None);
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.allowed_senders {
            let glob = Glob::new(pattern)
                .map_err(|e| eyre!("Invalid allowed-senders pattern '{}': {}", pattern, e))?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|e| eyre!("Failed to compile allowed-senders globs: {}", e))?;
        Ok(Some(set))
    }
}
