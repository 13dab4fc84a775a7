// src/main.rs

use clap::Parser;
use env_logger::Builder;
use eyre::Result;
use log::{error, info};
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::Duration;

use link_relay::bot;
use link_relay::cfg::config::Config;
use link_relay::cli::{Cli, Command};
use link_relay::forward;
use link_relay::oauth2;
use link_relay::telegram::TelegramClient;

fn main() -> Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .parse_default_env()
        .try_init()
        .ok();

    let config = Config::resolve(&cli)?;

    match cli.command.clone().unwrap_or(Command::Bot) {
        Command::Auth => oauth2::run_auth(&config.token_file()),
        Command::Bot => {
            let telegram = TelegramClient::from_config(&config)?;
            let shutdown = AtomicBool::new(false);
            bot::run_bot(&config, &telegram, &shutdown)
        }
        Command::Forward { dry_run } => {
            info!("Running forward...");
            forward::forward_once(&config, dry_run)
        }
        Command::Run { interval } => {
            let interval = interval.max(60);
            info!("Running forwarder every {}s. Ctrl+C to stop.", interval);
            loop {
                if let Err(e) = forward::forward_once(&config, false) {
                    error!("Forward cycle failed: {}", e);
                }
                thread::sleep(Duration::from_secs(interval));
            }
        }
    }
}
