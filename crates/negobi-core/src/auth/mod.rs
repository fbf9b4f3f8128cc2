//! Authentication module for managing user sessions and credentials.
//!
//! This module provides:
//! - `CredentialStore`: the single source of truth for tokens, profile and language
//! - `SessionService`: login, refresh, logout, password change and recovery calls
//! - `RecoveryFlow`: ordered password recovery on top of `SessionService`
//! - `Keychain`: OS-level storage of a remembered password via keyring
//! - `Role` / `Permission`: the static role table

pub mod credentials;
pub mod recovery;
pub mod roles;
pub mod service;
pub mod session;
pub mod store;

pub use credentials::Keychain;
pub use recovery::{RecoveryError, RecoveryFlow, RecoveryState};
pub use roles::{Permission, Role};
pub use service::{SessionService, DEFAULT_LOGOUT_REDIRECT};
pub use session::{SessionData, DEFAULT_TOKEN_LIFETIME_MINUTES};
pub use store::{CredentialStore, StoreError, StoredState};
