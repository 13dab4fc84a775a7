// tests/harness/virtual_mailbox.rs
//
// In-memory mailbox for testing.
// Simulates the IMAP server's view: raw RFC 2822 messages with read/unread
// state, searchable by unread/subject/day.

use std::collections::HashMap;

/// One message as the fixture inbox holds it.
#[derive(Debug, Clone)]
pub struct MailboxMessage {
    pub uid: u32,
    pub subject: String,
    pub from: String,
    /// IMAP search day, e.g. "07-Aug-2026".
    pub day: String,
    pub unread: bool,
    pub text: Option<String>,
    pub html: Option<String>,
}

impl MailboxMessage {
    pub fn new(subject: &str, from: &str, day: &str) -> Self {
        Self {
            uid: 0,
            subject: subject.to_string(),
            from: from.to_string(),
            day: day.to_string(),
            unread: true,
            text: None,
            html: None,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_html(mut self, html: &str) -> Self {
        self.html = Some(html.to_string());
        self
    }

    pub fn read(mut self) -> Self {
        self.unread = false;
        self
    }

    /// Raw RFC 2822 bytes the mock hands to fetch.
    pub fn to_rfc822(&self) -> Vec<u8> {
        let mut raw = String::new();
        raw.push_str(&format!("From: {}\r\n", self.from));
        raw.push_str("To: me@gmail.com\r\n");
        raw.push_str(&format!("Subject: {}\r\n", self.subject));
        raw.push_str("MIME-Version: 1.0\r\n");

        match (&self.text, &self.html) {
            (Some(text), Some(html)) => {
                raw.push_str("Content-Type: multipart/alternative; boundary=\"b1\"\r\n\r\n");
                raw.push_str("--b1\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n");
                raw.push_str(text);
                raw.push_str("\r\n--b1\r\nContent-Type: text/html; charset=utf-8\r\n\r\n");
                raw.push_str(html);
                raw.push_str("\r\n--b1--\r\n");
            }
            (Some(text), None) => {
                raw.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
                raw.push_str(text);
                raw.push_str("\r\n");
            }
            (None, Some(html)) => {
                raw.push_str("Content-Type: text/html; charset=utf-8\r\n\r\n");
                raw.push_str(html);
                raw.push_str("\r\n");
            }
            (None, None) => {
                raw.push_str("\r\n");
            }
        }
        raw.into_bytes()
    }
}

/// In-memory mailbox. UIDs are assigned in insertion order, so a higher uid
/// is a more recent message, matching the server's behavior.
#[derive(Debug, Default)]
pub struct VirtualMailbox {
    messages: HashMap<u32, MailboxMessage>,
    next_uid: u32,
}

impl VirtualMailbox {
    pub fn new() -> Self {
        Self {
            messages: HashMap::new(),
            next_uid: 1,
        }
    }

    /// Add a message; the assigned uid is returned.
    pub fn add_message(&mut self, mut msg: MailboxMessage) -> u32 {
        let uid = self.next_uid;
        self.next_uid += 1;
        msg.uid = uid;
        self.messages.insert(uid, msg);
        uid
    }

    pub fn get_message(&self, uid: u32) -> Option<&MailboxMessage> {
        self.messages.get(&uid)
    }

    pub fn mark_seen(&mut self, uid: u32) {
        if let Some(msg) = self.messages.get_mut(&uid) {
            msg.unread = false;
        }
    }

    pub fn unread_count(&self) -> usize {
        self.messages.values().filter(|m| m.unread).count()
    }

    /// Evaluate a search: unread state, SUBJECT substring (case-insensitive),
    /// and ON day equality. Returns uids ascending.
    pub fn search(&self, unseen: bool, subject: Option<&str>, day: Option<&str>) -> Vec<u32> {
        let mut uids: Vec<u32> = self
            .messages
            .values()
            .filter(|m| !unseen || m.unread)
            .filter(|m| {
                subject
                    .map(|s| m.subject.to_lowercase().contains(&s.to_lowercase()))
                    .unwrap_or(true)
            })
            .filter(|m| day.map(|d| m.day == d).unwrap_or(true))
            .map(|m| m.uid)
            .collect();
        uids.sort_unstable();
        uids
    }
}
