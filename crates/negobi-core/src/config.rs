//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: backend
//! URL and API key, language, currency defaults and exchange rates, timing
//! knobs and the last used email.
//!
//! Configuration is stored at `~/.config/negobi/config.json`; the session
//! lives separately in the cache directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::client::REQUEST_TIMEOUT_SECS;
use crate::api::interceptor::DEFAULT_SESSION_EXPIRED_REDIRECT;
use crate::api::{ClientSettings, DEFAULT_API_BASE_URL};
use crate::auth::store::SESSION_FILE;
use crate::auth::{CredentialStore, DEFAULT_LOGOUT_REDIRECT, DEFAULT_TOKEN_LIFETIME_MINUTES};
use crate::currency::{Currency, CurrencyContext, RateTable, DEFAULT_BASE_CURRENCY, DEFAULT_CURRENCY};
use crate::i18n::Language;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "negobi";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_URL: &str = "NEGOBI_API_URL";
pub const ENV_API_KEY: &str = "NEGOBI_API_KEY";
pub const ENV_LANGUAGE: &str = "NEGOBI_LANGUAGE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub api_key: String,
    pub language: Language,
    pub base_currency: Currency,
    pub default_currency: Currency,
    /// Units of each currency per one unit of the base currency.
    pub rates: BTreeMap<Currency, f64>,
    pub request_timeout_secs: u64,
    pub session_expired_redirect_ms: u64,
    pub logout_redirect_ms: u64,
    pub token_lifetime_minutes: i64,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: String::new(),
            language: Language::default(),
            base_currency: DEFAULT_BASE_CURRENCY,
            default_currency: DEFAULT_CURRENCY,
            rates: BTreeMap::new(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            session_expired_redirect_ms: DEFAULT_SESSION_EXPIRED_REDIRECT.as_millis() as u64,
            logout_redirect_ms: DEFAULT_LOGOUT_REDIRECT.as_millis() as u64,
            token_lifetime_minutes: DEFAULT_TOKEN_LIFETIME_MINUTES,
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config = serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))?;
            debug!(path = %path.display(), "Config loaded");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Override fields from `NEGOBI_*` environment variables.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY) {
            self.api_key = key;
        }
        if let Some(language) = lookup(ENV_LANGUAGE) {
            match language.parse() {
                Ok(language) => self.language = language,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_LANGUAGE),
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn session_path(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join(SESSION_FILE))
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.api_base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            session_expired_redirect: Duration::from_millis(self.session_expired_redirect_ms),
        }
    }

    pub fn logout_redirect(&self) -> Duration {
        Duration::from_millis(self.logout_redirect_ms)
    }

    /// Fallback session lifetime. Values that are not positive or do not fit
    /// a duration are replaced by the default.
    pub fn token_lifetime(&self) -> chrono::Duration {
        match chrono::Duration::try_minutes(self.token_lifetime_minutes) {
            Some(lifetime) if self.token_lifetime_minutes > 0 => lifetime,
            _ => {
                warn!(minutes = self.token_lifetime_minutes, "Ignoring invalid token lifetime");
                chrono::Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES)
            }
        }
    }

    /// Open the persisted credential store with this config's token lifetime.
    /// The configured language is only applied when none was stored yet.
    pub fn open_store(&self) -> Result<CredentialStore> {
        let path = self.session_path()?;
        let store = CredentialStore::open(&path)
            .with_context(|| format!("Failed to open session file {}", path.display()))?
            .with_token_lifetime(self.token_lifetime());
        if store.snapshot().language.is_none() {
            store.set_language(self.language);
        }
        Ok(store)
    }

    /// Currency context seeded from the configured rates. Invalid rates are
    /// skipped with a warning.
    pub fn currency_context(&self) -> CurrencyContext {
        let mut table = RateTable::new(self.base_currency);
        for (currency, rate) in &self.rates {
            if let Err(e) = table.set(*currency, *rate) {
                warn!(error = %e, "Skipping configured rate");
            }
        }
        CurrencyContext::new(self.default_currency, table)
    }
}
