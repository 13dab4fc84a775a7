// src/client_ops.rs
//
// Trait seams between the orchestrator and its external collaborators.
// Production code talks to a real IMAP session and the Telegram API;
// tests swap in in-memory fakes.

use chrono::{DateTime, Utc};
use eyre::Result;

use crate::message::CandidateMessage;

/// Operations the orchestrator needs from a mailbox.
pub trait MailStore {
    /// Select a mailbox/folder; read-only selection must not mutate flags.
    fn select(&mut self, folder: &str, readonly: bool) -> Result<()>;

    /// Search the selected folder, returning matching UIDs in ascending order.
    fn search(&mut self, query: &str) -> Result<Vec<u32>>;

    /// Fetch one message by UID. `None` when the server has no such message.
    fn fetch(&mut self, uid: u32) -> Result<Option<CandidateMessage>>;

    /// Add \Seen to a message.
    fn mark_seen(&mut self, uid: u32) -> Result<()>;

    /// End the session.
    fn logout(&mut self) -> Result<()>;
}

/// Delivery side: send a text to a chat.
pub trait Dispatch {
    fn send(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Trait for time providers.
/// Allows production code to use real time or virtual time for testing.
pub trait Clock: Clone + Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real clock implementation using system time.
#[derive(Clone, Default)]
pub struct RealClock;

impl Clock for RealClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
