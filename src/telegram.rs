// src/telegram.rs

use eyre::{eyre, Result};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::cfg::config::Config;
use crate::client_ops::Dispatch;

/// Max characters per message, with margin under Telegram's 4096 cap.
const TELEGRAM_MAX_CHARS: usize = 4050;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);
const REGISTER_TIMEOUT: Duration = Duration::from_secs(10);

/// Long-poll window asked of the server, and the slightly larger HTTP timeout.
const POLL_WINDOW_SECS: u64 = 60;
const POLL_TIMEOUT: Duration = Duration::from_secs(70);

/// One inbound update from getUpdates.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Incoming>,
    #[serde(default)]
    pub edited_message: Option<Incoming>,
}

impl Update {
    /// The message payload, whether new or edited.
    pub fn content(&self) -> Option<&Incoming> {
        self.message.as_ref().or(self.edited_message.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Incoming {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

/// Telegram Bot API client for a single bot token.
pub struct TelegramClient {
    base: String,
}

impl TelegramClient {
    pub fn new(bot_token: &str) -> Self {
        TelegramClient {
            base: format!("https://api.telegram.org/bot{}", bot_token),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let token = config.require_telegram_bot_token()?;
        Ok(Self::new(token.unsecure()))
    }

    /// Register /link and /start and show the command menu button.
    /// Best-effort: failures are warned about, never fatal.
    pub fn register_commands(&self) {
        let commands = json!({
            "commands": [
                {"command": "link", "description": "Get the latest sign-in link"},
                {"command": "start", "description": "Start"},
            ]
        });
        if let Err(e) = ureq::post(&format!("{}/setMyCommands", self.base))
            .timeout(REGISTER_TIMEOUT)
            .send_json(commands)
        {
            warn!("setMyCommands failed: {}", e);
        }

        let menu = json!({"menu_button": {"type": "commands"}});
        if let Err(e) = ureq::post(&format!("{}/setChatMenuButton", self.base))
            .timeout(REGISTER_TIMEOUT)
            .send_json(menu)
        {
            warn!("setChatMenuButton failed: {}", e);
        }
    }

    /// Long-poll for updates past `offset`.
    pub fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>> {
        let url = format!("{}/getUpdates", self.base);
        let mut request = ureq::get(&url)
            .timeout(POLL_TIMEOUT)
            .query("timeout", &POLL_WINDOW_SECS.to_string());
        if let Some(offset) = offset {
            request = request.query("offset", &offset.to_string());
        }

        let response: UpdatesResponse = request
            .call()
            .map_err(|e| eyre!("getUpdates failed: {}", e))?
            .into_json()
            .map_err(|e| eyre!("getUpdates returned malformed JSON: {}", e))?;

        if !response.ok {
            return Err(eyre!("getUpdates returned ok=false"));
        }
        debug!("getUpdates returned {} update(s)", response.result.len());
        Ok(response.result)
    }

    fn send_chunk(&self, chat_id: &str, chunk: &str) -> Result<()> {
        let url = format!("{}/sendMessage", self.base);
        let first = ureq::post(&url).timeout(SEND_TIMEOUT).send_json(json!({
            "chat_id": chat_id,
            "text": chunk,
            "parse_mode": "HTML",
        }));

        match first {
            Ok(_) => Ok(()),
            // HTML parse mode chokes on bare angle brackets; retry plain
            Err(ureq::Error::Status(..)) => {
                let retry = ureq::post(&url)
                    .timeout(SEND_TIMEOUT)
                    .send_form(&[("chat_id", chat_id), ("text", chunk)]);
                match retry {
                    Ok(_) => Ok(()),
                    Err(ureq::Error::Status(code, response)) => {
                        Err(describe_api_error(code, response))
                    }
                    Err(e) => Err(eyre!("Telegram request failed: {}", e)),
                }
            }
            Err(e) => Err(eyre!("Telegram request failed: {}", e)),
        }
    }
}

impl Dispatch for TelegramClient {
    fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        for chunk in chunk_text(text, TELEGRAM_MAX_CHARS) {
            self.send_chunk(chat_id, &chunk)?;
        }
        Ok(())
    }
}

/// Split into chunks of at most `max_chars` characters.
fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn describe_api_error(code: u16, response: ureq::Response) -> eyre::Report {
    let description = response
        .into_json::<serde_json::Value>()
        .ok()
        .and_then(|v| {
            v.get("description")
                .and_then(|d| d.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| code.to_string());

    if code == 403 && description.to_lowercase().contains("can't initiate conversation") {
        eyre!(
            "Telegram 403: the recipient must message the bot first (send 'hi' to the bot), then run again"
        )
    } else {
        eyre!("Telegram API error: {} {}", code, description)
    }
}
