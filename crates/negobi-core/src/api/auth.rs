//! Authentication endpoints: login, token refresh, password change and the
//! recovery sequence (request code, validate OTP, reset password).

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::models::UserProfile;

use super::client::Auth;
use super::envelope::{Ack, Mutation};
use super::{ApiClient, ApiError};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub access_token: String,
    pub refresh_token: String,
    /// Token lifetime in seconds, when the backend sends it.
    pub expires_in: Option<i64>,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecoveryRequest<'a> {
    email: &'a str,
    tax_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateOtpRequest<'a> {
    email: &'a str,
    tax_id: &'a str,
    otp: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpData {
    /// Exchange token accepted only by the password reset endpoint.
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    email: &'a str,
    tax_id: &'a str,
    password: &'a str,
}

impl ApiClient {
    pub async fn login(&self, email: &str, password: &str) -> Result<Mutation<LoginData>, ApiError> {
        let body = LoginRequest { email, password };
        self.mutate(Method::POST, "auth/login", Some(&body), Auth::Public)
            .await
    }

    /// Exchange the refresh token. Sent with the stored session, so a
    /// rejected refresh ends the session like any other 401.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Mutation<LoginData>, ApiError> {
        let body = RefreshRequest { refresh_token };
        self.mutate(Method::POST, "auth/refresh", Some(&body), Auth::Session)
            .await
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<Ack, ApiError> {
        let body = ChangePasswordRequest {
            current_password,
            new_password,
        };
        self.acknowledge(Method::POST, "auth/change-password", Some(&body), Auth::Session)
            .await
    }

    pub async fn request_recovery(&self, email: &str, tax_id: &str) -> Result<Ack, ApiError> {
        let body = RecoveryRequest { email, tax_id };
        self.acknowledge(Method::POST, "auth/recover-password", Some(&body), Auth::Public)
            .await
    }

    pub async fn validate_otp(&self, email: &str, tax_id: &str, otp: &str) -> Result<Mutation<OtpData>, ApiError> {
        let body = ValidateOtpRequest { email, tax_id, otp };
        self.mutate(Method::POST, "auth/validate-otp", Some(&body), Auth::Public)
            .await
    }

    /// Set a new password using the OTP exchange token.
    pub async fn reset_password(
        &self,
        temp_token: &str,
        email: &str,
        tax_id: &str,
        password: &str,
    ) -> Result<Ack, ApiError> {
        let body = ResetPasswordRequest {
            email,
            tax_id,
            password,
        };
        self.acknowledge(Method::POST, "auth/reset-password", Some(&body), Auth::Bearer(temp_token))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_data() {
        let json = r#"{"accessToken": "a", "refreshToken": "r", "expiresIn": 3600, "user": {"id": 1, "email": "ana@negobi.com", "role": "superAdmin"}}"#;
        let data: LoginData = serde_json::from_str(json).unwrap();
        assert_eq!(data.access_token, "a");
        assert_eq!(data.expires_in, Some(3600));
        assert!(data.user.is_some());
    }

    #[test]
    fn test_request_field_names() {
        let body = serde_json::to_value(ChangePasswordRequest {
            current_password: "old",
            new_password: "new",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"currentPassword": "old", "newPassword": "new"}));

        let body = serde_json::to_value(ValidateOtpRequest {
            email: "a@b.c",
            tax_id: "J-1",
            otp: "123456",
        })
        .unwrap();
        assert_eq!(body["taxId"], "J-1");
    }
}
