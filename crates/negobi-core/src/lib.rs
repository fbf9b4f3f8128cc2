//! Negobi client core.
//!
//! HTTP client for the Negobi back-office API with request and response
//! interception, the credential store, session and recovery operations,
//! the shared currency context and typed CRUD resources. Front ends supply
//! their own [`effects::Notifier`] and [`effects::Navigator`].

pub mod api;
pub mod auth;
pub mod config;
pub mod currency;
pub mod effects;
pub mod hooks;
pub mod i18n;
pub mod models;
pub mod resources;
pub mod utils;

pub use api::{ApiClient, ApiError, ClientSettings, ListQuery, Page};
pub use auth::{CredentialStore, RecoveryFlow, Role, SessionService};
pub use config::Config;
pub use currency::{Currency, CurrencyContext};
pub use effects::{Effects, Level, Navigator, Notifier, Route};
pub use hooks::{BusyFlag, HookOutcome};
pub use i18n::Language;
pub use resources::{ListController, Resource, ResourceKind, ResourceService};
