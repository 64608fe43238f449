//! Bearer token storage and lookup
//!
//! Tokens saved with `--login` live in ~/.config/huddle/credentials.json
//! with restricted permissions (0o600).

use chrono::{DateTime, Utc};
use huddle_chat::CredentialSource;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::config::{Config, TOKEN_ENV};

/// A token saved by `--login`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    /// Credential type (always "bearer")
    #[serde(rename = "type")]
    pub cred_type: String,
    pub token: String,
    /// When the token was saved, in milliseconds
    pub saved_at: i64,
}

impl StoredToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            cred_type: "bearer".to_string(),
            token: token.into(),
            saved_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.saved_at)
    }
}

/// File-backed token store
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store next to the config file
    pub fn default_location() -> Self {
        Self::new(Config::config_dir().join("credentials.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved token. A missing or unreadable file means none.
    pub fn load(&self) -> Option<StoredToken> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(stored) => Some(stored),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable credentials file");
                None
            }
        }
    }

    /// Save `token`, replacing any previous one
    pub fn save(&self, token: &str) -> io::Result<StoredToken> {
        if let Some(dir) = self.path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
                #[cfg(unix)]
                fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
            }
        }

        let stored = StoredToken::new(token.trim());
        let content = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, content)?;

        #[cfg(unix)]
        fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;

        Ok(stored)
    }

    /// Remove the saved token. Returns whether one existed.
    pub fn remove(&self) -> io::Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Where the active token came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Flag,
    Env,
    Store,
    Config,
}

impl TokenSource {
    pub fn describe(&self) -> &'static str {
        match self {
            TokenSource::Flag => "--token flag",
            TokenSource::Env => TOKEN_ENV,
            TokenSource::Store => "saved login",
            TokenSource::Config => "config file",
        }
    }
}

/// Credential lookup for the CLI, consulted again on every turn so a
/// `--login` from another terminal applies to the next message.
pub struct CliCredentials {
    flag: Option<String>,
    store: TokenStore,
    config_token: Option<String>,
    env: fn(&str) -> Option<String>,
}

impl CliCredentials {
    pub fn new(flag: Option<String>, store: TokenStore, config_token: Option<String>) -> Self {
        Self {
            flag,
            store,
            config_token,
            env: |key| std::env::var(key).ok(),
        }
    }

    pub fn with_env(mut self, env: fn(&str) -> Option<String>) -> Self {
        self.env = env;
        self
    }

    /// The active token and its source
    pub fn lookup(&self) -> Option<(String, TokenSource)> {
        let non_blank = |t: &String| !t.trim().is_empty();

        if let Some(token) = self.flag.clone().filter(non_blank) {
            return Some((token, TokenSource::Flag));
        }
        if let Some(token) = (self.env)(TOKEN_ENV).filter(non_blank) {
            return Some((token, TokenSource::Env));
        }
        if let Some(stored) = self.store.load().filter(|s| non_blank(&s.token)) {
            return Some((stored.token, TokenSource::Store));
        }
        self.config_token
            .clone()
            .filter(non_blank)
            .map(|token| (token, TokenSource::Config))
    }
}

impl CredentialSource for CliCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.lookup().map(|(token, _)| token)
    }
}

/// Shorten a token for display
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
