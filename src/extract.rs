// src/extract.rs

use eyre::{eyre, Result};
use log::debug;
use regex::Regex;

use crate::message::CandidateMessage;

/// Default pattern for Claude.ai sign-in links, both the magic-link and the
/// login forms. The character class stops at whitespace, quotes, and closing
/// brackets so a match never swallows surrounding markup.
pub const DEFAULT_LINK_PATTERN: &str =
    r#"(?i)https://claude\.ai/(?:magic-link|login)[^\s"'<>)\]]*"#;

/// Finds the sign-in link in a message body. Absence is a normal outcome,
/// reported as `None`.
#[derive(Debug, Clone)]
pub struct LinkMatcher {
    regex: Regex,
}

impl LinkMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex =
            Regex::new(pattern).map_err(|e| eyre!("Invalid link pattern '{}': {}", pattern, e))?;
        Ok(LinkMatcher { regex })
    }

    /// Pull the first matching link out of a candidate message, preferring
    /// the plain-text form over HTML.
    pub fn extract(&self, msg: &CandidateMessage) -> Option<String> {
        if let Some(text) = msg.text.as_deref() {
            if let Some(url) = self.find_in(text) {
                debug!("Link found in text/plain body of UID {}", msg.uid);
                return Some(url);
            }
        }
        if let Some(html) = msg.html.as_deref() {
            if let Some(url) = self.find_in(&decode_entities(html)) {
                debug!("Link found in text/html body of UID {}", msg.uid);
                return Some(url);
            }
        }
        None
    }

    fn find_in(&self, text: &str) -> Option<String> {
        self.regex
            .find(text)
            .map(|m| {
                m.as_str()
                    .trim_end_matches(['\'', '"', '>', ')', ']'])
                    .to_string()
            })
            .filter(|url| !url.is_empty())
    }
}

impl Default for LinkMatcher {
    fn default() -> Self {
        LinkMatcher {
            regex: Regex::new(DEFAULT_LINK_PATTERN).expect("valid default pattern"),
        }
    }
}

/// Decode HTML character references so entity-encoded URLs (`&amp;` etc.)
/// match the link pattern. Unknown entities pass through untouched.
pub fn decode_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        // entity names are short; scan a bounded window for the terminator
        let end = rest
            .char_indices()
            .take(12)
            .find(|(_, c)| *c == ';')
            .map(|(i, _)| i);

        if let Some(end) = end {
            if let Some(decoded) = decode_entity(&rest[1..end]) {
                out.push(decoded);
                rest = &rest[end + 1..];
                continue;
            }
        }
        out.push('&');
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse().ok()?
            } else {
                return None;
            };
            char::from_u32(code)
        }
    }
}
