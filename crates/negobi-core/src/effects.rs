//! User-visible side effects: notifications and navigation.
//!
//! The core never prints or redirects by itself. Front ends inject a
//! `Notifier` and a `Navigator`; the in-memory implementations record
//! what happened so it can be inspected.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Url;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Screens the client can send the user to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    NewPassword { email: String, tax_id: String },
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::NewPassword { email, tax_id } => {
                let mut url = match Url::parse("http://negobi.local/new-password") {
                    Ok(url) => url,
                    Err(_) => return "/new-password".to_string(),
                };
                url.query_pairs_mut()
                    .append_pair("email", email)
                    .append_pair("taxId", tax_id);
                format!("{}?{}", url.path(), url.query().unwrap_or_default())
            }
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Notifier and navigator bundled for injection. Cheap to clone.
#[derive(Clone)]
pub struct Effects {
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl Effects {
    pub fn new(notifier: Arc<dyn Notifier>, navigator: Arc<dyn Navigator>) -> Self {
        Self { notifier, navigator }
    }

    /// Effects that only emit tracing events.
    pub fn logging() -> Self {
        Self::new(Arc::new(LogNotifier), Arc::new(LogNavigator))
    }

    pub fn notify(&self, level: Level, message: impl Into<String>) {
        self.notifier.notify(Notification::new(level, message));
    }

    pub fn navigate(&self, route: Route) {
        debug!(route = %route, "Navigating");
        self.navigator.navigate(route);
    }

    /// Navigate once after `delay` on the current tokio runtime.
    pub fn navigate_after(&self, route: Route, delay: Duration) -> JoinHandle<()> {
        debug!(route = %route, delay_ms = delay.as_millis() as u64, "Navigation scheduled");
        let navigator = Arc::clone(&self.navigator);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(route);
        })
    }
}

impl fmt::Debug for Effects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effects").finish_non_exhaustive()
    }
}

pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Error => error!(message = %notification.message, "Notification"),
            _ => info!(message = %notification.message, "Notification"),
        }
    }
}

pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: Route) {
        info!(route = %route, "Navigation requested");
    }
}

/// Records notifications in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub fn notifications(&self) -> Vec<Notification> {
        match self.notifications.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn errors(&self) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|n| n.level == Level::Error)
            .map(|n| n.message)
            .collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        match self.notifications.lock() {
            Ok(mut guard) => guard.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}

/// Records navigations in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryNavigator {
    routes: Arc<Mutex<Vec<Route>>>,
}

impl MemoryNavigator {
    pub fn routes(&self) -> Vec<Route> {
        match self.routes.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Navigator for MemoryNavigator {
    fn navigate(&self, route: Route) {
        match self.routes.lock() {
            Ok(mut guard) => guard.push(route),
            Err(poisoned) => poisoned.into_inner().push(route),
        }
    }
}

/// Effects backed by fresh in-memory recorders.
pub fn recording() -> (Effects, MemoryNotifier, MemoryNavigator) {
    let notifier = MemoryNotifier::default();
    let navigator = MemoryNavigator::default();
    let effects = Effects::new(Arc::new(notifier.clone()), Arc::new(navigator.clone()));
    (effects, notifier, navigator)
}
