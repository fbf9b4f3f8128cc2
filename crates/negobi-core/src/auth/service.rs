//! Session operations: login, refresh, logout, password change and the
//! individual password-recovery steps.
//!
//! Each operation marks the service busy, makes at most one backend call,
//! stores tokens on success and notifies on failure. Failures resolve to
//! `HookOutcome::Failure`; nothing is retried.

use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::api::{ApiClient, ApiError};
use crate::effects::{Effects, Level, Route};
use crate::hooks::{BusyFlag, HookOutcome};
use crate::i18n::{Language, Message};
use crate::models::UserProfile;

use super::{CredentialStore, SessionData};

/// Delay between logging out and leaving for the login screen.
pub const DEFAULT_LOGOUT_REDIRECT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct SessionService {
    api: ApiClient,
    effects: Effects,
    busy: BusyFlag,
    logout_redirect: Duration,
}

impl SessionService {
    pub fn new(api: ApiClient, effects: Effects) -> Self {
        Self {
            api,
            effects,
            busy: BusyFlag::new(),
            logout_redirect: DEFAULT_LOGOUT_REDIRECT,
        }
    }

    pub fn with_logout_redirect(mut self, delay: Duration) -> Self {
        self.logout_redirect = delay;
        self
    }

    pub fn busy(&self) -> &BusyFlag {
        &self.busy
    }

    pub fn store(&self) -> &CredentialStore {
        self.api.store()
    }

    fn language(&self) -> Language {
        self.store().language()
    }

    fn fail<T>(&self, operation: &str, err: ApiError) -> HookOutcome<T> {
        error!(operation = operation, error = %err, "Session operation failed");
        let message = err.user_message(self.language());
        if !err.is_notified() {
            self.effects.notify(Level::Error, message.clone());
        }
        HookOutcome::Failure {
            status: err.status(),
            message,
        }
    }

    fn fail_local<T>(&self, operation: &str, message: Message) -> HookOutcome<T> {
        warn!(operation = operation, reason = ?message, "Session operation refused");
        let text = message.text(self.language()).to_string();
        self.effects.notify(Level::Error, text.clone());
        HookOutcome::Failure {
            status: None,
            message: text,
        }
    }

    fn succeed(&self, backend_message: Option<String>, fallback: Message) {
        let text = backend_message.unwrap_or_else(|| fallback.text(self.language()).to_string());
        self.effects.notify(Level::Success, text);
    }

    /// Authenticate and store the new session. Navigates to the dashboard.
    pub async fn login(&self, email: &str, password: &str, remember_me: bool) -> HookOutcome<Option<UserProfile>> {
        let _busy = self.busy.enter();

        if email.trim().is_empty() || password.is_empty() {
            return self.fail_local("login", Message::CredentialsRequired);
        }

        let mutation = match self.api.login(email.trim(), password).await {
            Ok(mutation) => mutation,
            Err(e) => return self.fail("login", e),
        };

        let data = mutation.data;
        if data.access_token.is_empty() || data.refresh_token.is_empty() {
            return self.fail("login", ApiError::InvalidResponse("Login response without tokens".to_string()));
        }

        let mut session = SessionData::new(data.access_token, data.refresh_token, Utc::now());
        if let Some(seconds) = data.expires_in {
            session = session.expiring_in(seconds);
        }
        let tax_id = data.user.as_ref().and_then(|u| u.company_tax_id.clone());

        self.store().set_remember_me(remember_me);
        self.store().set_login(session, data.user.clone(), tax_id);

        info!(remember_me = remember_me, "Login successful");
        self.succeed(mutation.message, Message::LoginSucceeded);
        self.effects.navigate(Route::Dashboard);

        HookOutcome::Success {
            status: mutation.status,
            value: data.user,
        }
    }

    /// Exchange the refresh token for a new session, overwriting the old one.
    pub async fn refresh(&self) -> HookOutcome<SessionData> {
        let _busy = self.busy.enter();

        let Some(refresh_token) = self.store().refresh_token() else {
            return self.fail_local("refresh", Message::NoSession);
        };

        let mutation = match self.api.refresh_session(&refresh_token).await {
            Ok(mutation) => mutation,
            Err(e) => return self.fail("refresh", e),
        };

        let data = mutation.data;
        if data.access_token.is_empty() {
            return self.fail("refresh", ApiError::InvalidResponse("Refresh response without token".to_string()));
        }
        // Some backends rotate the refresh token, others keep it.
        let refresh = if data.refresh_token.is_empty() {
            refresh_token
        } else {
            data.refresh_token
        };

        let mut session = SessionData::new(data.access_token, refresh, Utc::now());
        if let Some(seconds) = data.expires_in {
            session = session.expiring_in(seconds);
        }
        self.store().set(session.clone());
        info!("Session refreshed");

        HookOutcome::Success {
            status: mutation.status,
            value: session,
        }
    }

    /// Local logout: clear credentials, then leave for the login screen
    /// after a short delay. The backend is not contacted.
    pub async fn logout(&self) -> HookOutcome<()> {
        let _busy = self.busy.enter();

        self.store().clear();
        info!("Logged out");
        self.effects
            .notify(Level::Info, Message::LoggedOut.text(self.language()));
        let _ = self
            .effects
            .navigate_after(Route::Login, self.logout_redirect);

        HookOutcome::Success {
            status: 200,
            value: (),
        }
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> HookOutcome<()> {
        let _busy = self.busy.enter();

        if self.store().get().is_none() {
            return self.fail_local("change_password", Message::NoSession);
        }

        match self.api.change_password(current_password, new_password).await {
            Ok(ack) => {
                info!("Password changed");
                self.succeed(ack.message, Message::PasswordChanged);
                HookOutcome::Success {
                    status: ack.status,
                    value: (),
                }
            }
            Err(e) => self.fail("change_password", e),
        }
    }

    /// First recovery step: ask the backend to email a one-time code.
    pub async fn request_recovery(&self, email: &str, tax_id: &str) -> HookOutcome<()> {
        let _busy = self.busy.enter();

        match self.api.request_recovery(email.trim(), tax_id.trim()).await {
            Ok(ack) => {
                info!("Recovery code requested");
                self.succeed(ack.message, Message::RecoveryRequested);
                HookOutcome::Success {
                    status: ack.status,
                    value: (),
                }
            }
            Err(e) => self.fail("request_recovery", e),
        }
    }

    /// Validate the one-time code. Stores the exchange token (never the
    /// session) and navigates to the new-password screen.
    pub async fn validate_otp(&self, email: &str, tax_id: &str, otp: &str) -> HookOutcome<()> {
        let _busy = self.busy.enter();

        let mutation = match self.api.validate_otp(email.trim(), tax_id.trim(), otp.trim()).await {
            Ok(mutation) => mutation,
            Err(e) => return self.fail("validate_otp", e),
        };

        if mutation.data.token.is_empty() {
            return self.fail("validate_otp", ApiError::InvalidResponse("OTP response without token".to_string()));
        }

        self.store().set_temp_token(mutation.data.token);
        info!("OTP validated");
        self.succeed(mutation.message, Message::OtpValidated);
        self.effects.navigate(Route::NewPassword {
            email: email.trim().to_string(),
            tax_id: tax_id.trim().to_string(),
        });

        HookOutcome::Success {
            status: mutation.status,
            value: (),
        }
    }

    /// Final recovery step. Consumes the exchange token on success; the
    /// user still has to log in with the new password.
    pub async fn reset_password(&self, email: &str, tax_id: &str, new_password: &str) -> HookOutcome<()> {
        let _busy = self.busy.enter();

        let Some(token) = self.store().temp_token() else {
            return self.fail_local("reset_password", Message::NoRecoveryToken);
        };

        match self
            .api
            .reset_password(&token, email.trim(), tax_id.trim(), new_password)
            .await
        {
            Ok(ack) => {
                self.store().take_temp_token();
                info!("Password reset");
                self.succeed(ack.message, Message::PasswordReset);
                self.effects.navigate(Route::Login);
                HookOutcome::Success {
                    status: ack.status,
                    value: (),
                }
            }
            Err(e) => self.fail("reset_password", e),
        }
    }
}
