//! Credential store shared by the HTTP client and the session operations.
//!
//! Every write replaces the state under a single lock, so readers see
//! either the old or the new session, never a mix. When a persistence
//! path is configured the whole state is written to disk after each
//! change (temp file + rename), whatever the remember-me flag says: the
//! flag is a stored preference that front ends read to decide whether to
//! keep the login password. Disk failures are logged and do not fail the
//! in-memory update.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::session::{SessionData, DEFAULT_TOKEN_LIFETIME_MINUTES};
use crate::i18n::{Language, DEFAULT_LANGUAGE};
use crate::models::UserProfile;

/// Session file name in the cache directory
pub const SESSION_FILE: &str = "session.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode session file: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Everything the store keeps, persisted as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    pub session: Option<SessionData>,
    #[serde(default)]
    pub remember_me: bool,
    pub user: Option<UserProfile>,
    pub company_tax_id: Option<String>,
    /// Short-lived token from OTP validation, only valid for password reset.
    pub temp_token: Option<String>,
    pub language: Option<Language>,
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    state: Arc<RwLock<StoredState>>,
    path: Option<PathBuf>,
    token_lifetime: Duration,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl CredentialStore {
    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            state: Arc::new(RwLock::new(StoredState::default())),
            path: None,
            token_lifetime: Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES),
        }
    }

    /// Open a store persisted at `path`, loading whatever is already there.
    /// A corrupt file is discarded rather than failing startup.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<StoredState>(&contents) {
                Ok(state) => state,
                Err(e) => {
                    warn!(error = %e, path = %path.display(), "Discarding unreadable session file");
                    StoredState::default()
                }
            }
        } else {
            StoredState::default()
        };

        debug!(path = %path.display(), has_session = state.session.is_some(), "Credential store opened");

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
            path: Some(path),
            token_lifetime: Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES),
        })
    }

    pub fn with_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.token_lifetime = lifetime;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the full state, for a consistent multi-field read.
    pub fn snapshot(&self) -> StoredState {
        match self.state.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut StoredState) -> R) -> R {
        let mut guard = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let result = f(&mut guard);
        if let Some(ref path) = self.path {
            if let Err(e) = persist(path, &guard) {
                warn!(error = %e, "Failed to save session");
            }
        }
        result
    }

    // ===== Session =====

    pub fn set(&self, session: SessionData) {
        self.update(|s| s.session = Some(session));
    }

    pub fn get(&self) -> Option<SessionData> {
        self.snapshot().session
    }

    /// Store a fresh login: session, profile and company tax id together.
    pub fn set_login(&self, session: SessionData, user: Option<UserProfile>, company_tax_id: Option<String>) {
        self.update(|s| {
            s.session = Some(session);
            s.user = user;
            s.company_tax_id = company_tax_id;
            s.temp_token = None;
        });
    }

    /// Drop the session and everything tied to it. Language and the
    /// remember-me flag are preferences and survive.
    pub fn clear(&self) {
        self.update(|s| {
            s.session = None;
            s.user = None;
            s.company_tax_id = None;
            s.temp_token = None;
        });
    }

    pub fn access_token(&self) -> Option<String> {
        self.snapshot().session.map(|s| s.access_token)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.snapshot().session.map(|s| s.refresh_token)
    }

    pub fn token_lifetime(&self) -> Duration {
        self.token_lifetime
    }

    /// Pure expiry check; an absent session counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.get() {
            Some(session) => session.is_expired_at(now, self.token_lifetime),
            None => true,
        }
    }

    // ===== Companions =====

    pub fn language(&self) -> Language {
        self.snapshot().language.unwrap_or(DEFAULT_LANGUAGE)
    }

    pub fn set_language(&self, language: Language) {
        self.update(|s| s.language = Some(language));
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.snapshot().user
    }

    pub fn company_tax_id(&self) -> Option<String> {
        self.snapshot().company_tax_id
    }

    pub fn remember_me(&self) -> bool {
        self.snapshot().remember_me
    }

    pub fn set_remember_me(&self, remember: bool) {
        self.update(|s| s.remember_me = remember);
    }

    pub fn temp_token(&self) -> Option<String> {
        self.snapshot().temp_token
    }

    pub fn set_temp_token(&self, token: impl Into<String>) {
        let token = token.into();
        self.update(|s| s.temp_token = Some(token));
    }

    /// Remove and return the temporary token.
    pub fn take_temp_token(&self) -> Option<String> {
        self.update(|s| s.temp_token.take())
    }
}

fn persist(path: &Path, state: &StoredState) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
