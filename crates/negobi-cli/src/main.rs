//! negobi - command-line front end for the Negobi back office.
//!
//! Logs in against the REST backend, keeps the session in the cache
//! directory, and exposes the back-office collections, password recovery
//! and currency conversion as subcommands.

mod commands;
mod console;

use std::io;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use negobi_core::currency::Currency;
use negobi_core::{ApiClient, Config, Effects, ResourceKind, SessionService};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Context;
use console::{ConsoleNavigator, ConsoleNotifier};

// ============================================================================
// Constants
// ============================================================================

/// Directory for an additional daily-rolling log file.
const LOG_DIR_ENV: &str = "NEGOBI_LOG_DIR";

const LOG_FILE_PREFIX: &str = "negobi.log";

#[derive(Parser)]
#[command(name = "negobi")]
#[command(about = "Command-line client for the Negobi back office")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides config)
    #[arg(long, env = "NEGOBI_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Keep the password in the OS keychain
        #[arg(long)]
        remember: bool,
    },
    /// Forget the stored session
    Logout,
    /// Show the stored session and settings
    Status,
    /// Exchange the refresh token for a new session
    Refresh,
    /// Change the password of the logged-in user
    ChangePassword,
    /// Recover a forgotten password
    Recover {
        #[command(subcommand)]
        step: RecoverCommands,
    },
    /// List a collection
    List {
        resource: ResourceKind,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        per_page: u32,
    },
    /// Show one record
    Get { resource: ResourceKind, id: i64 },
    /// Delete one record
    Delete { resource: ResourceKind, id: i64 },
    /// Record counts per collection
    Summary,
    /// Convert an amount into the base currency
    Convert { amount: f64, from: Currency },
    /// Select the display currency
    Currency { code: Currency },
    /// Set the exchange rate of a currency against the base
    Rate { code: Currency, rate: f64 },
    /// List assignable roles
    Roles,
}

#[derive(Subcommand)]
enum RecoverCommands {
    /// Send a one-time code to the user's email
    Request {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        tax_id: Option<String>,
    },
    /// Validate the one-time code
    Verify {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        tax_id: Option<String>,
        #[arg(long)]
        otp: Option<String>,
    },
    /// Set the new password
    Reset {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        tax_id: Option<String>,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` controls the level (default `warn`). When `NEGOBI_LOG_DIR` is
/// set, events are also written to a daily file there; the returned guard
/// must live until exit so buffered lines are flushed.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

fn build_context(cli_api_url: Option<String>) -> Result<Context> {
    let mut config = Config::load().context("Failed to load config")?;
    config.apply_env();
    if let Some(url) = cli_api_url {
        config.api_base_url = url;
    }

    let store = config.open_store()?;
    let effects = Effects::new(Arc::new(ConsoleNotifier), Arc::new(ConsoleNavigator));
    let api = ApiClient::new(config.client_settings(), store, effects.clone())
        .context("Failed to build HTTP client")?;
    let sessions = SessionService::new(api.clone(), effects.clone())
        .with_logout_redirect(config.logout_redirect());
    let currency = config.currency_context();

    Ok(Context {
        config,
        api,
        sessions,
        currency,
        effects,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing();

    let mut ctx = build_context(cli.api_url)?;
    info!(api = %ctx.api.base_url(), "negobi starting");

    let result = match cli.command {
        Commands::Login { email, remember } => commands::login(&mut ctx, email, remember).await,
        Commands::Logout => commands::logout(&ctx).await,
        Commands::Status => commands::status(&ctx),
        Commands::Refresh => commands::refresh(&ctx).await,
        Commands::ChangePassword => commands::change_password(&ctx).await,
        Commands::Recover { step } => match step {
            RecoverCommands::Request { email, tax_id } => commands::recover_request(&ctx, email, tax_id).await,
            RecoverCommands::Verify { email, tax_id, otp } => {
                commands::recover_verify(&ctx, email, tax_id, otp).await
            }
            RecoverCommands::Reset { email, tax_id } => commands::recover_reset(&ctx, email, tax_id).await,
        },
        Commands::List {
            resource,
            search,
            page,
            per_page,
        } => commands::list(&ctx, resource, search, page, per_page).await,
        Commands::Get { resource, id } => commands::get(&ctx, resource, id).await,
        Commands::Delete { resource, id } => commands::delete(&ctx, resource, id).await,
        Commands::Summary => commands::summary(&ctx).await,
        Commands::Convert { amount, from } => commands::convert(&ctx, amount, from),
        Commands::Currency { code } => commands::set_currency(&mut ctx, code),
        Commands::Rate { code, rate } => commands::set_rate(&mut ctx, code, rate),
        Commands::Roles => commands::roles(&ctx).await,
    };

    // An expired session schedules a redirect to the login screen; let it
    // print before the process exits.
    ctx.api.wait_for_redirect().await;
    result
}
