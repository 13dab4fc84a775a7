// tests/harness/mock_client.rs
//
// Mock mail store and recording dispatcher for testing.
// Both record their actions for verification and operate against a
// VirtualMailbox instead of the network.

use eyre::{eyre, Result};
use std::sync::{Arc, RwLock};

use link_relay::client_ops::{Dispatch, MailStore};
use link_relay::message::CandidateMessage;

use crate::harness::virtual_mailbox::VirtualMailbox;

/// Recorded action types for verification in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedAction {
    /// A mailbox was selected
    Select { folder: String, readonly: bool },
    /// A search was issued
    Search { query: String },
    /// A message was fetched
    Fetch { uid: u32 },
    /// A message was marked \Seen
    MarkSeen { uid: u32 },
    /// The session ended
    Logout,
}

/// Mock mail store operating against a VirtualMailbox.
pub struct MockMailStore {
    mailbox: Arc<RwLock<VirtualMailbox>>,
    actions: Arc<RwLock<Vec<RecordedAction>>>,
    /// When set, search calls fail, simulating a provider outage.
    pub fail_search: bool,
}

impl MockMailStore {
    pub fn new(mailbox: Arc<RwLock<VirtualMailbox>>) -> Self {
        Self {
            mailbox,
            actions: Arc::new(RwLock::new(Vec::new())),
            fail_search: false,
        }
    }

    pub fn recorded_actions(&self) -> Vec<RecordedAction> {
        self.actions.read().unwrap().clone()
    }

    pub fn mark_seen_actions(&self) -> Vec<u32> {
        self.actions
            .read()
            .unwrap()
            .iter()
            .filter_map(|a| match a {
                RecordedAction::MarkSeen { uid } => Some(*uid),
                _ => None,
            })
            .collect()
    }

    fn record(&self, action: RecordedAction) {
        self.actions.write().unwrap().push(action);
    }
}

/// Pull the unseen/subject/day criteria out of the query strings the
/// orchestrator builds, e.g. `UNSEEN SUBJECT "Secure link" ON 07-Aug-2026`.
fn parse_query(query: &str) -> (bool, Option<String>, Option<String>) {
    let unseen = query.starts_with("UNSEEN");
    let subject = query.split('"').nth(1).map(String::from);
    let day = query.split(" ON ").nth(1).map(|s| s.trim().to_string());
    (unseen, subject, day)
}

impl MailStore for MockMailStore {
    fn select(&mut self, folder: &str, readonly: bool) -> Result<()> {
        self.record(RecordedAction::Select {
            folder: folder.to_string(),
            readonly,
        });
        Ok(())
    }

    fn search(&mut self, query: &str) -> Result<Vec<u32>> {
        self.record(RecordedAction::Search {
            query: query.to_string(),
        });
        if self.fail_search {
            return Err(eyre!("IMAP search failed: simulated outage"));
        }
        let (unseen, subject, day) = parse_query(query);
        let mailbox = self.mailbox.read().unwrap();
        Ok(mailbox.search(unseen, subject.as_deref(), day.as_deref()))
    }

    fn fetch(&mut self, uid: u32) -> Result<Option<CandidateMessage>> {
        self.record(RecordedAction::Fetch { uid });
        let mailbox = self.mailbox.read().unwrap();
        let msg = match mailbox.get_message(uid) {
            Some(msg) => msg,
            None => return Ok(None),
        };
        let candidate = CandidateMessage::from_rfc822(
            uid,
            &msg.to_rfc822(),
            "2026-08-07T10:00:00+00:00".to_string(),
            msg.unread,
        )?;
        Ok(Some(candidate))
    }

    fn mark_seen(&mut self, uid: u32) -> Result<()> {
        self.record(RecordedAction::MarkSeen { uid });
        self.mailbox.write().unwrap().mark_seen(uid);
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        self.record(RecordedAction::Logout);
        Ok(())
    }
}

/// Dispatcher that records every send instead of calling Telegram.
pub struct RecordingDispatch {
    sent: RwLock<Vec<(String, String)>>,
    /// When set, sends fail, simulating a Telegram outage.
    pub fail_send: bool,
}

impl RecordingDispatch {
    pub fn new() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            fail_send: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            sent: RwLock::new(Vec::new()),
            fail_send: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.read().unwrap().clone()
    }
}

impl Default for RecordingDispatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatch for RecordingDispatch {
    fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        if self.fail_send {
            return Err(eyre!("Telegram API error: 502 simulated"));
        }
        self.sent
            .write()
            .unwrap()
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }
}
