// src/message.rs

use eyre::{eyre, Result};
use globset::GlobSet;
use mailparse::{addrparse, parse_mail, MailAddr, MailHeaderMap, ParsedMail};

#[derive(Debug, Clone)]
pub struct EmailAddress {
    pub name: String,
    pub email: String,
}

/// An email fetched from the inbox that may carry the sign-in link.
/// Built fresh on every trigger, never persisted.
#[derive(Debug, Clone)]
pub struct CandidateMessage {
    pub uid: u32,
    pub from: Vec<EmailAddress>,
    pub subject: String,
    pub date: String,
    pub text: Option<String>,
    pub html: Option<String>,
    pub unread: bool,
}

impl CandidateMessage {
    /// Parse a raw RFC 2822 message into a candidate.
    pub fn from_rfc822(uid: u32, raw: &[u8], date: String, unread: bool) -> Result<Self> {
        let parsed = parse_mail(raw).map_err(|e| eyre!("Failed to parse message {}: {}", uid, e))?;

        // RFC 2047 encoded words are decoded by mailparse
        let subject = parsed
            .headers
            .get_first_value("Subject")
            .unwrap_or_default();
        let from = parse_addrs(parsed.headers.get_first_value("From").as_ref());

        let mut text = None;
        let mut html = None;
        collect_bodies(&parsed, &mut text, &mut html);

        Ok(CandidateMessage {
            uid,
            from,
            subject,
            date,
            text,
            html,
            unread,
        })
    }

    /// True when the subject carries every required word, case-insensitively.
    pub fn subject_contains_all(&self, words: &[String]) -> bool {
        let subject = self.subject.to_lowercase();
        words.iter().all(|w| subject.contains(&w.to_lowercase()))
    }

    /// True when any From address matches the glob set; no globs = any sender.
    pub fn sender_matches(&self, globs: Option<&GlobSet>) -> bool {
        match globs {
            None => true,
            Some(set) => self.from.iter().any(|addr| set.is_match(&addr.email)),
        }
    }

    /// Display name of the first sender, or their email if no name.
    pub fn sender_display(&self) -> String {
        self.from
            .first()
            .map(|addr| {
                if addr.name.is_empty() {
                    addr.email.clone()
                } else {
                    addr.name.clone()
                }
            })
            .unwrap_or_default()
    }
}

/// Walk the MIME tree and keep the first text/plain and first text/html
/// bodies found. Transfer encoding and charset are handled by mailparse.
fn collect_bodies(part: &ParsedMail, text: &mut Option<String>, html: &mut Option<String>) {
    if part.subparts.is_empty() {
        match part.ctype.mimetype.to_lowercase().as_str() {
            "text/plain" => {
                if text.is_none() {
                    if let Ok(body) = part.get_body() {
                        *text = Some(body);
                    }
                }
            }
            "text/html" => {
                if html.is_none() {
                    if let Ok(body) = part.get_body() {
                        *html = Some(body);
                    }
                }
            }
            _ => {}
        }
    } else {
        for sub in &part.subparts {
            collect_bodies(sub, text, html);
        }
    }
}

/// Owned parsing of an address header into `EmailAddress`
fn parse_addrs(field: Option<&String>) -> Vec<EmailAddress> {
    if let Some(s) = field {
        if let Ok(addrs) = addrparse(s) {
            let mut result = Vec::new();
            for addr in addrs.iter() {
                match addr {
                    MailAddr::Single(info) => {
                        result.push(EmailAddress {
                            name: info.display_name.clone().unwrap_or_default(),
                            email: info.addr.clone(),
                        });
                    }
                    MailAddr::Group(group) => {
                        for info in &group.addrs {
                            result.push(EmailAddress {
                                name: info.display_name.clone().unwrap_or_default(),
                                email: info.addr.clone(),
                            });
                        }
                    }
                }
            }
            return result;
        }
    }
    Vec::new()
}
