// src/bot.rs
//
// On-demand mode: a blocking receive-dispatch loop against getUpdates.
// The recipient sends /link and gets the sign-in link back.

use eyre::Result;
use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::cfg::config::Config;
use crate::client_ops::Dispatch;
use crate::forward::{lookup_latest, Lookup};
use crate::telegram::{TelegramClient, Update};

pub const GREETING: &str = "Hi! Use /link to get the latest sign-in link from today's email.";
pub const CHECKING: &str = "Checking your email…";

/// Commands the recipient can send.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BotCommand {
    Start,
    Link,
}

/// Recognize a command, trimmed and case-folded.
pub fn parse_command(text: &str) -> Option<BotCommand> {
    match text.trim().to_lowercase().as_str() {
        "/start" | "start" => Some(BotCommand::Start),
        "/link" | "link" | "/getlink" | "get link" => Some(BotCommand::Link),
        _ => None,
    }
}

/// Process one update. Returns true when it was consumed.
/// Updates from any chat other than the configured recipient are dropped
/// without a reply.
pub fn handle_update<D, F>(
    update: &Update,
    recipient_chat_id: &str,
    dispatch: &D,
    lookup: F,
) -> bool
where
    D: Dispatch,
    F: FnOnce() -> Result<Lookup>,
{
    let incoming = match update.content() {
        Some(incoming) => incoming,
        None => return false,
    };
    let text = match incoming.text.as_deref() {
        Some(text) => text,
        None => return false,
    };

    let chat_id = incoming.chat.id.to_string();
    if chat_id != recipient_chat_id {
        debug!("Ignoring message from chat {}", chat_id);
        return false;
    }

    let command = match parse_command(text) {
        Some(command) => command,
        None => return false,
    };

    match command {
        BotCommand::Start => reply(dispatch, &chat_id, GREETING),
        BotCommand::Link => {
            reply(dispatch, &chat_id, CHECKING);
            let answer = match lookup() {
                Ok(Lookup::Link(link)) => link,
                Ok(Lookup::NotFound(reason)) => reason,
                Err(e) => format!("Could not fetch: {}", e),
            };
            reply(dispatch, &chat_id, &answer);
        }
    }
    true
}

fn reply<D: Dispatch>(dispatch: &D, chat_id: &str, text: &str) {
    if let Err(e) = dispatch.send(chat_id, text) {
        error!("Failed to reply to {}: {}", chat_id, e);
    }
}

/// Blocking receive-dispatch loop. Runs until the shutdown flag is raised
/// or the process is terminated. Poll errors are logged and polling
/// continues on the next pass.
pub fn run_bot(config: &Config, telegram: &TelegramClient, shutdown: &AtomicBool) -> Result<()> {
    let chat_id = config.require_telegram_chat_id()?.to_string();
    config.require_imap_username()?;

    telegram.register_commands();
    info!("Bot running. Send /link (or tap Menu) to get the sign-in link. Ctrl+C to stop.");

    let mut offset: Option<i64> = None;
    while !shutdown.load(Ordering::Relaxed) {
        let updates = match telegram.get_updates(offset) {
            Ok(updates) => updates,
            Err(e) => {
                error!("{}", e);
                continue;
            }
        };
        for update in updates {
            offset = Some(update.update_id + 1);
            handle_update(&update, &chat_id, telegram, || lookup_latest(config));
        }
    }

    info!("Bot stopped.");
    Ok(())
}
