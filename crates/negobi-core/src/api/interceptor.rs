//! Request augmentation and response inspection.
//!
//! `RequestInterceptor` turns the credential store into headers.
//! `classify` decides whether a response invalidates the session;
//! `SessionGuard` performs the consequences (notify, clear, redirect).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::auth::{CredentialStore, StoredState};
use crate::effects::{Effects, Level, Route};
use crate::i18n::{Language, Message, DEFAULT_LANGUAGE};

pub const API_KEY_HEADER: &str = "x-api-key";
pub const LANGUAGE_HEADER: &str = "language";

/// Delay before leaving for the login screen once a session is invalid.
pub const DEFAULT_SESSION_EXPIRED_REDIRECT: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone)]
pub struct RequestInterceptor {
    api_key: String,
}

impl RequestInterceptor {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Headers for a request made with the stored session.
    pub fn headers(&self, state: &StoredState) -> HeaderMap {
        let token = state.session.as_ref().map(|s| s.access_token.as_str());
        self.build(state.language.unwrap_or(DEFAULT_LANGUAGE), token)
    }

    /// Headers for an explicit bearer token (or none). The API key only
    /// travels together with a token.
    pub fn build(&self, language: Language, token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(LANGUAGE_HEADER),
            HeaderValue::from_static(language.code()),
        );

        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return headers;
        };

        match (
            HeaderValue::from_str(&format!("Bearer {}", token)),
            HeaderValue::from_str(&self.api_key),
        ) {
            (Ok(bearer), Ok(key)) => {
                headers.insert(AUTHORIZATION, bearer);
                headers.insert(HeaderName::from_static(API_KEY_HEADER), key);
            }
            _ => warn!("Token or API key is not a valid header value; sending request unauthenticated"),
        }
        headers
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Pass,
    SessionInvalid,
}

/// Pure classification of a response status.
pub fn classify(status: StatusCode) -> Disposition {
    if status == StatusCode::UNAUTHORIZED {
        Disposition::SessionInvalid
    } else {
        Disposition::Pass
    }
}

#[derive(Debug, Clone)]
pub struct SessionGuard {
    store: CredentialStore,
    effects: Effects,
    redirect_delay: Duration,
    pending_redirect: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SessionGuard {
    pub fn new(store: CredentialStore, effects: Effects) -> Self {
        Self {
            store,
            effects,
            redirect_delay: DEFAULT_SESSION_EXPIRED_REDIRECT,
            pending_redirect: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    /// Inspect a response status. On an invalid session: notify once,
    /// clear the store and schedule one navigation to the login screen.
    pub fn inspect(&self, status: StatusCode) -> Disposition {
        let disposition = classify(status);
        if disposition == Disposition::SessionInvalid {
            warn!(status = status.as_u16(), "Session rejected by backend, clearing credentials");
            let language = self.store.language();
            self.effects
                .notify(Level::Error, Message::SessionExpired.text(language));
            self.store.clear();
            // The caller gets its error now, the redirect fires later.
            let handle = self.effects.navigate_after(Route::Login, self.redirect_delay);
            let previous = self.lock_pending().replace(handle);
            if let Some(previous) = previous {
                previous.abort();
            }
        }
        disposition
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.pending_redirect.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Wait for a scheduled login redirect to fire. Returns immediately when
    /// none is pending. Short-lived front ends call this before exiting.
    pub async fn wait_for_redirect(&self) {
        let pending = self.lock_pending().take();
        if let Some(handle) = pending {
            debug!("Waiting for scheduled login redirect");
            if let Err(e) = handle.await {
                warn!(error = %e, "Login redirect did not complete");
            }
        }
    }
}
