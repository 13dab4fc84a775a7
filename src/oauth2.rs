// src/oauth2.rs

use base64::{engine::general_purpose::STANDARD, Engine};
use eyre::{eyre, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const CONSENT_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/auth";
const GMAIL_SCOPE: &str = "https://mail.google.com/";

/// Loopback redirect; the user copies the `code` query param out of the
/// address bar after consenting.
const REDIRECT_URI: &str = "http://localhost";

/// The persisted OAuth credential — the one durable artifact of the tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
    token_type: String,
    refresh_token: Option<String>,
}

impl StoredToken {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| eyre!("Failed to read token file {}: {}", path.display(), e))?;
        serde_json::from_str(&content)
            .map_err(|e| eyre!("Failed to parse token file {}: {}", path.display(), e))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| eyre!("Failed to create {}: {}", parent.display(), e))?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize token: {}", e))?;
        fs::write(path, content)
            .map_err(|e| eyre!("Failed to write token file {}: {}", path.display(), e))?;
        info!("Token saved to {}", path.display());
        Ok(())
    }

    /// Refresh the access token using the stored refresh token.
    pub fn refresh_access_token(&self) -> Result<String> {
        info!("Refreshing OAuth2 access token");

        let response = ureq::post(TOKEN_ENDPOINT)
            .send_form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .map_err(|e| eyre!("Failed to refresh OAuth2 token: {}", e))?;

        let token_response: TokenResponse = response
            .into_json()
            .map_err(|e| eyre!("Failed to parse token response: {}", e))?;

        debug!(
            "Got new {} access token (expires in {} seconds)",
            token_response.token_type, token_response.expires_in
        );

        Ok(token_response.access_token)
    }
}

/// Exchange a pasted authorization code for a refresh token.
fn exchange_authorization_code(
    client_id: &str,
    client_secret: &str,
    code: &str,
) -> Result<StoredToken> {
    let response = ureq::post(TOKEN_ENDPOINT)
        .send_form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
            ("grant_type", "authorization_code"),
        ])
        .map_err(|e| eyre!("Failed to exchange authorization code: {}", e))?;

    let token_response: TokenResponse = response
        .into_json()
        .map_err(|e| eyre!("Failed to parse token response: {}", e))?;

    let refresh_token = token_response
        .refresh_token
        .ok_or_else(|| eyre!("Google returned no refresh token; revoke the app's access and retry"))?;

    Ok(StoredToken {
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
        refresh_token,
    })
}

/// URL the user opens in a browser to consent to IMAP access.
pub fn consent_url(client_id: &str) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&prompt=consent",
        CONSENT_ENDPOINT, client_id, REDIRECT_URI, GMAIL_SCOPE
    )
}

/// One-time credential setup: prompt for the OAuth client, exchange a pasted
/// authorization code, and persist the token file.
pub fn run_auth(token_path: &Path) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("One-time Gmail OAuth setup.");
    println!();
    println!("1. Go to https://console.cloud.google.com/");
    println!("2. Create or select a project -> APIs & Services -> Credentials");
    println!("3. Create credentials -> OAuth client ID (Desktop app)");
    println!();

    let client_id = prompt(&mut lines, "Client id: ")?;
    let client_secret = prompt(&mut lines, "Client secret: ")?;

    println!();
    println!("Open this URL, sign in, and allow access:");
    println!("  {}", consent_url(&client_id));
    println!();
    println!("The browser will land on a localhost URL; copy the value of its");
    println!("'code' query parameter and paste it here.");

    let code = prompt(&mut lines, "Authorization code: ")?;

    let token = exchange_authorization_code(&client_id, &client_secret, &code)?;
    token.save(token_path)?;

    println!("Gmail OAuth done. Token saved to {}", token_path.display());
    println!("You can run 'link-relay forward' now; it will use this token instead of a password.");
    Ok(())
}

fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>, label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush().ok();
    let line = lines
        .next()
        .ok_or_else(|| eyre!("stdin closed"))?
        .map_err(|e| eyre!("Failed to read input: {}", e))?;
    let value = line.trim().to_string();
    if value.is_empty() {
        return Err(eyre!("Empty input for {}", label.trim_end_matches(": ")));
    }
    Ok(value)
}

/// Build the XOAUTH2 authentication string for IMAP.
///
/// Format: base64("user=" + email + "\x01auth=Bearer " + access_token + "\x01\x01")
pub fn build_xoauth2_string(email: &str, access_token: &str) -> String {
    let auth_string = format!("user={}\x01auth=Bearer {}\x01\x01", email, access_token);
    STANDARD.encode(auth_string.as_bytes())
}

/// XOAUTH2 authenticator for the imap crate.
pub struct XOAuth2Authenticator {
    response: String,
}

impl XOAuth2Authenticator {
    pub fn new(email: &str, access_token: &str) -> Self {
        Self {
            response: build_xoauth2_string(email, access_token),
        }
    }
}

impl imap::Authenticator for XOAuth2Authenticator {
    type Response = String;

    fn process(&self, _challenge: &[u8]) -> Self::Response {
        self.response.clone()
    }
}
