// src/forward.rs
//
// One fetch-extract-deliver cycle, seamed from IMAP and Telegram through
// the MailStore/Dispatch traits.

use chrono::{DateTime, Utc};
use eyre::Result;
use log::{debug, error, info, warn};

use crate::cfg::config::Config;
use crate::client_ops::{Clock, Dispatch, MailStore, RealClock};
use crate::extract::LinkMatcher;
use crate::mail::ImapMailStore;
use crate::telegram::TelegramClient;

/// Result of one forward pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Links delivered to the recipient.
    Sent(Vec<String>),
    /// Dry run: links extracted, nothing delivered or marked.
    DryRun(Vec<String>),
    /// Nothing to forward; an expected outcome, not an error.
    NotFound(String),
}

/// Result of an on-demand lookup (the bot's /link).
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Link(String),
    NotFound(String),
}

/// INTERNALDATE-style date for IMAP ON searches, e.g. "07-Aug-2026".
fn imap_date(now: DateTime<Utc>) -> String {
    now.format("%d-%b-%Y").to_string()
}

fn preview(s: &str) -> String {
    s.chars().take(60).collect()
}

/// Search today's unread sign-in emails and forward each extracted link.
/// Messages are marked \Seen only after a successful send, and only when
/// `mark-read` is enabled.
pub fn forward_cycle<M, D, C>(
    mail: &mut M,
    dispatch: &D,
    config: &Config,
    clock: &C,
    dry_run: bool,
) -> Result<Outcome>
where
    M: MailStore,
    D: Dispatch,
    C: Clock,
{
    let chat_id = config.require_telegram_chat_id()?;
    let matcher = LinkMatcher::new(config.link_pattern())?;
    let sender_globs = config.sender_globs()?;
    let required_words = config.subject_must_contain();

    mail.select(config.imap_folder(), dry_run)?;

    let today = imap_date(clock.now());
    let query = format!("UNSEEN SUBJECT \"{}\" ON {}", config.subject_filter(), today);
    let uids = mail.search(&query)?;
    info!(
        "Found {} unread candidate(s) from today ({})",
        uids.len(),
        today
    );

    if uids.is_empty() {
        return Ok(Outcome::NotFound(format!(
            "No unread '{}' email from today.",
            config.subject_filter()
        )));
    }

    let mut links = Vec::new();
    for uid in uids {
        let msg = match mail.fetch(uid) {
            Ok(Some(msg)) => msg,
            Ok(None) => {
                warn!("Fetch returned nothing for uid {}", uid);
                continue;
            }
            Err(e) => {
                error!("Fetch uid {} failed: {}", uid, e);
                continue;
            }
        };

        if !msg.subject_contains_all(&required_words) {
            debug!("uid {} subject '{}' lacks required words", uid, msg.subject);
            continue;
        }
        if !msg.sender_matches(sender_globs.as_ref()) {
            debug!(
                "uid {} sender '{}' not in allowed senders",
                uid,
                msg.sender_display()
            );
            continue;
        }

        let link = match matcher.extract(&msg) {
            Some(link) => link,
            None => {
                warn!("No sign-in link found in uid {}", uid);
                continue;
            }
        };
        info!("Extracted link from uid {}: {}...", uid, preview(&link));

        if dry_run {
            println!("(dry-run) Would send: {}", link);
            links.push(link);
            continue;
        }

        dispatch.send(chat_id, &link)?;
        info!("Sent to recipient.");
        if config.mark_read() {
            mail.mark_seen(uid)?;
        }
        links.push(link);
    }

    if links.is_empty() {
        Ok(Outcome::NotFound(
            "No sign-in link in today's unread email.".to_string(),
        ))
    } else if dry_run {
        Ok(Outcome::DryRun(links))
    } else {
        Ok(Outcome::Sent(links))
    }
}

/// Most recent matching email from today, unread or not, without mutating
/// any flags. Used by the bot's /link command.
pub fn latest_link<M, C>(mail: &mut M, config: &Config, clock: &C) -> Result<Lookup>
where
    M: MailStore,
    C: Clock,
{
    let matcher = LinkMatcher::new(config.link_pattern())?;
    let sender_globs = config.sender_globs()?;
    let required_words = config.subject_must_contain();

    mail.select(config.imap_folder(), true)?;

    let today = imap_date(clock.now());
    let query = format!("SUBJECT \"{}\" ON {}", config.subject_filter(), today);
    let uids = mail.search(&query)?;

    let not_found = || {
        Lookup::NotFound(format!(
            "No '{}' email from today.",
            config.subject_filter()
        ))
    };

    // uids come back ascending; the most recent wins
    let uid = match uids.last() {
        Some(&uid) => uid,
        None => return Ok(not_found()),
    };

    let msg = match mail.fetch(uid)? {
        Some(msg) => msg,
        None => return Ok(Lookup::NotFound("Fetch failed.".to_string())),
    };

    if !msg.subject_contains_all(&required_words) || !msg.sender_matches(sender_globs.as_ref()) {
        return Ok(not_found());
    }

    match matcher.extract(&msg) {
        Some(link) => Ok(Lookup::Link(link)),
        None => Ok(Lookup::NotFound(
            "No sign-in link in today's email.".to_string(),
        )),
    }
}

/// Single forward pass against the real IMAP server and Telegram API.
pub fn forward_once(config: &Config, dry_run: bool) -> Result<()> {
    config.require_telegram_chat_id()?;
    let telegram = TelegramClient::from_config(config)?;

    let mut mail = ImapMailStore::connect(config)?;
    let outcome = forward_cycle(&mut mail, &telegram, config, &RealClock, dry_run);
    if let Err(e) = mail.logout() {
        warn!("IMAP logout failed: {}", e);
    }

    match outcome? {
        Outcome::Sent(links) => info!("Forwarded {} link(s).", links.len()),
        Outcome::DryRun(links) => info!("(dry-run) {} link(s) extracted.", links.len()),
        Outcome::NotFound(reason) => info!("{}", reason),
    }
    Ok(())
}

/// On-demand lookup against the real IMAP server.
pub fn lookup_latest(config: &Config) -> Result<Lookup> {
    let mut mail = ImapMailStore::connect(config)?;
    let result = latest_link(&mut mail, config, &RealClock);
    if let Err(e) = mail.logout() {
        warn!("IMAP logout failed: {}", e);
    }
    result
}
