//! Terminal implementations of the core's notification and navigation hooks,
//! plus prompt helpers.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use negobi_core::effects::{Navigator, Notification};
use negobi_core::{Level, Notifier, Route};
use tracing::info;

/// Prints notifications to stderr so stdout stays machine-readable.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let prefix = match notification.level {
            Level::Success => "ok",
            Level::Info => "info",
            Level::Error => "error",
        };
        eprintln!("{}: {}", prefix, notification.message);
    }
}

/// There are no screens in a terminal; the target path is shown instead.
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: Route) {
        info!(route = %route, "Navigation");
        eprintln!("-> {}", route.path());
    }
}

pub fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim().to_string())
}

/// Use `value` if given, otherwise ask for it.
pub fn value_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => prompt(label),
    }
}

pub fn password(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{}: ", label)).context("Failed to read password")
}

/// Ask twice and insist both entries match.
pub fn new_password() -> Result<String> {
    let first = password("New password")?;
    let second = password("Repeat new password")?;
    if first != second {
        bail!("Passwords do not match");
    }
    if first.is_empty() {
        bail!("Password cannot be empty");
    }
    Ok(first)
}
