// src/mail.rs

use eyre::{eyre, Result};
use imap::types::Flag;
use imap::Session;
use log::{debug, info};
use native_tls::{TlsConnector, TlsStream};
use std::net::TcpStream;

use crate::cfg::config::Config;
use crate::client_ops::MailStore;
use crate::message::CandidateMessage;
use crate::oauth2::{StoredToken, XOAuth2Authenticator};

/// IMAP-backed mailbox over TLS.
pub struct ImapMailStore {
    session: Session<TlsStream<TcpStream>>,
}

impl ImapMailStore {
    /// Connect and authenticate. A configured password wins; otherwise the
    /// stored OAuth token is refreshed and used for XOAUTH2.
    pub fn connect(config: &Config) -> Result<Self> {
        let host = config.imap_host();
        let port = config.imap_port();
        let username = config.require_imap_username()?;

        info!("Connecting to {}:{}", host, port);
        let tls = TlsConnector::builder()
            .build()
            .map_err(|e| eyre!("Failed to build TLS connector: {}", e))?;
        let client = imap::connect((host, port), host, &tls)
            .map_err(|e| eyre!("Failed to connect to {}:{}: {}", host, port, e))?;

        let session = if let Some(password) = &config.imap_password {
            debug!("Authenticating with LOGIN as {}", username);
            client
                .login(username, password.unsecure())
                .map_err(|(e, _)| eyre!("IMAP login failed: {}", e))?
        } else {
            let token_path = config.token_file();
            if !token_path.exists() {
                return Err(eyre!(
                    "No credentials: run 'link-relay auth' once or set imap-password"
                ));
            }
            let token = StoredToken::load(&token_path)?;
            let access_token = token.refresh_access_token().map_err(|e| {
                eyre!("OAuth refresh failed (run 'link-relay auth' again): {}", e)
            })?;
            debug!("Authenticating with XOAUTH2 as {}", username);
            let authenticator = XOAuth2Authenticator::new(username, &access_token);
            client
                .authenticate("XOAUTH2", &authenticator)
                .map_err(|(e, _)| eyre!("IMAP XOAUTH2 authentication failed: {}", e))?
        };

        info!("Authenticated.");
        Ok(ImapMailStore { session })
    }
}

impl MailStore for ImapMailStore {
    fn select(&mut self, folder: &str, readonly: bool) -> Result<()> {
        debug!("Selecting {} (readonly={})", folder, readonly);
        if readonly {
            self.session
                .examine(folder)
                .map_err(|e| eyre!("Failed to examine {}: {}", folder, e))?;
        } else {
            self.session
                .select(folder)
                .map_err(|e| eyre!("Failed to select {}: {}", folder, e))?;
        }
        Ok(())
    }

    fn search(&mut self, query: &str) -> Result<Vec<u32>> {
        debug!("SEARCH {}", query);
        let uids = self
            .session
            .uid_search(query)
            .map_err(|e| eyre!("IMAP search failed: {}", e))?;
        let mut uids: Vec<u32> = uids.into_iter().collect();
        uids.sort_unstable();
        debug!("SEARCH returned {} uid(s)", uids.len());
        Ok(uids)
    }

    fn fetch(&mut self, uid: u32) -> Result<Option<CandidateMessage>> {
        // PEEK so the \Seen flag stays ours to manage
        let fetches = self
            .session
            .uid_fetch(uid.to_string(), "(UID BODY.PEEK[] INTERNALDATE FLAGS)")
            .map_err(|e| eyre!("Fetch failed for uid {}: {}", uid, e))?;

        let fetch = match fetches.iter().next() {
            Some(f) => f,
            None => return Ok(None),
        };
        let raw = match fetch.body() {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let date = fetch
            .internal_date()
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();
        let unread = !fetch.flags().iter().any(|f| matches!(f, Flag::Seen));

        let msg = CandidateMessage::from_rfc822(uid, raw, date, unread)?;
        debug!("Fetched uid {} ({})", uid, msg.subject);
        Ok(Some(msg))
    }

    fn mark_seen(&mut self, uid: u32) -> Result<()> {
        // SILENT to suppress the untagged FETCH
        self.session
            .uid_store(uid.to_string(), "+FLAGS.SILENT (\\Seen)")
            .map(|_| ())
            .map_err(|e| eyre!("Failed to mark uid {} as seen: {}", uid, e))
    }

    fn logout(&mut self) -> Result<()> {
        self.session
            .logout()
            .map_err(|e| eyre!("Logout failed: {}", e))
    }
}
