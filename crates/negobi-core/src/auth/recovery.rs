//! Password recovery as an explicit sequence of states.
//!
//! `SessionService` exposes the three backend calls individually; this type
//! enforces their order. The OTP exchange token itself stays in the
//! credential store.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::hooks::HookOutcome;

use super::SessionService;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum RecoveryState {
    Requested,
    #[serde(rename_all = "camelCase")]
    OtpPending { email: String, tax_id: String },
    #[serde(rename_all = "camelCase")]
    OtpValidated { email: String, tax_id: String },
    PasswordSet,
}

impl RecoveryState {
    fn name(&self) -> &'static str {
        match self {
            RecoveryState::Requested => "requested",
            RecoveryState::OtpPending { .. } => "otpPending",
            RecoveryState::OtpValidated { .. } => "otpValidated",
            RecoveryState::PasswordSet => "passwordSet",
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("Cannot {step} while recovery is at {state}")]
    OutOfOrder { step: &'static str, state: &'static str },

    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryFlow {
    state: RecoveryState,
}

impl Default for RecoveryFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryFlow {
    pub fn new() -> Self {
        Self {
            state: RecoveryState::Requested,
        }
    }

    /// Continue a flow whose state was saved elsewhere (e.g. between CLI runs).
    pub fn resume(state: RecoveryState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &RecoveryState {
        &self.state
    }

    fn out_of_order(&self, step: &'static str) -> RecoveryError {
        RecoveryError::OutOfOrder {
            step,
            state: self.state.name(),
        }
    }

    fn advance(&mut self, next: RecoveryState) {
        debug!(from = self.state.name(), to = next.name(), "Recovery advanced");
        self.state = next;
    }

    /// Ask for a code. Allowed again while waiting for one, e.g. to resend.
    pub async fn request(&mut self, service: &SessionService, email: &str, tax_id: &str) -> Result<(), RecoveryError> {
        if !matches!(self.state, RecoveryState::Requested | RecoveryState::OtpPending { .. }) {
            return Err(self.out_of_order("request a code"));
        }

        settle(service.request_recovery(email, tax_id).await)?;
        self.advance(RecoveryState::OtpPending {
            email: email.trim().to_string(),
            tax_id: tax_id.trim().to_string(),
        });
        Ok(())
    }

    pub async fn validate(&mut self, service: &SessionService, otp: &str) -> Result<(), RecoveryError> {
        let RecoveryState::OtpPending { email, tax_id } = &self.state else {
            return Err(self.out_of_order("validate a code"));
        };
        let (email, tax_id) = (email.clone(), tax_id.clone());

        settle(service.validate_otp(&email, &tax_id, otp).await)?;
        self.advance(RecoveryState::OtpValidated { email, tax_id });
        Ok(())
    }

    pub async fn set_password(&mut self, service: &SessionService, new_password: &str) -> Result<(), RecoveryError> {
        let RecoveryState::OtpValidated { email, tax_id } = &self.state else {
            return Err(self.out_of_order("set a password"));
        };
        let (email, tax_id) = (email.clone(), tax_id.clone());

        settle(service.reset_password(&email, &tax_id, new_password).await)?;
        self.advance(RecoveryState::PasswordSet);
        Ok(())
    }
}

fn settle(outcome: HookOutcome<()>) -> Result<(), RecoveryError> {
    outcome.into_result().map_err(RecoveryError::Failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, ClientSettings};
    use crate::auth::CredentialStore;
    use crate::effects::Effects;

    fn service() -> SessionService {
        // Nothing listens here; out-of-order checks never reach the network.
        let settings = ClientSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            ..ClientSettings::default()
        };
        let api = ApiClient::new(settings, CredentialStore::in_memory(), Effects::logging()).unwrap();
        SessionService::new(api, Effects::logging())
    }

    #[tokio::test]
    async fn test_validate_before_request_is_rejected() {
        let mut flow = RecoveryFlow::new();
        let err = flow.validate(&service(), "123456").await.unwrap_err();
        assert_eq!(
            err,
            RecoveryError::OutOfOrder {
                step: "validate a code",
                state: "requested"
            }
        );
        assert_eq!(flow.state(), &RecoveryState::Requested);
    }

    #[tokio::test]
    async fn test_set_password_requires_validated_otp() {
        let mut flow = RecoveryFlow::resume(RecoveryState::OtpPending {
            email: "ana@negobi.com".to_string(),
            tax_id: "J-1".to_string(),
        });
        assert!(matches!(
            flow.set_password(&service(), "secret").await,
            Err(RecoveryError::OutOfOrder { .. })
        ));
    }

    #[tokio::test]
    async fn test_request_after_completion_is_rejected() {
        let mut flow = RecoveryFlow::resume(RecoveryState::PasswordSet);
        assert!(matches!(
            flow.request(&service(), "ana@negobi.com", "J-1").await,
            Err(RecoveryError::OutOfOrder { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_request_keeps_state() {
        let mut flow = RecoveryFlow::new();
        let result = flow.request(&service(), "ana@negobi.com", "J-1").await;
        assert!(matches!(result, Err(RecoveryError::Failed(_))));
        assert_eq!(flow.state(), &RecoveryState::Requested);
    }

    #[test]
    fn test_state_serde() {
        let state = RecoveryState::OtpValidated {
            email: "ana@negobi.com".to_string(),
            tax_id: "J-1".to_string(),
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["step"], "otpValidated");
        assert_eq!(json["taxId"], "J-1");
        let back: RecoveryState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
