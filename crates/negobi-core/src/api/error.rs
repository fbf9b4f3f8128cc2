use serde::Deserialize;
use thiserror::Error;

use crate::i18n::{Language, Message};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 401 on a request that does not use the stored session, e.g. wrong
    /// login credentials. Carries the backend message.
    #[error("Unauthorized")]
    Unauthorized { message: Option<String> },

    /// 401 on a session request. The session guard has already notified,
    /// cleared the store and scheduled the redirect.
    #[error("Session is missing or expired")]
    SessionExpired,

    /// Validation or business rule failure; `message` is shown to the user as is.
    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<MessageField>,
    data: Option<ErrorData>,
}

#[derive(Debug, Deserialize)]
struct ErrorData {
    message: Option<MessageField>,
}

/// Validation errors sometimes arrive as a list of messages.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageField {
    One(String),
    Many(Vec<String>),
}

impl MessageField {
    fn into_text(self) -> Option<String> {
        let text = match self {
            MessageField::One(s) => s,
            MessageField::Many(v) => v.join(", "),
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Message carried by a backend error body, if any.
    pub fn extract_message(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        parsed
            .message
            .and_then(MessageField::into_text)
            .or_else(|| parsed.data.and_then(|d| d.message).and_then(MessageField::into_text))
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized {
                message: Self::extract_message(body),
            },
            code => match Self::extract_message(body) {
                Some(message) => ApiError::Rejected { status: code, message },
                None => ApiError::Unexpected(format!("Status {}: {}", status, Self::truncate_body(body))),
            },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            ApiError::Unauthorized { .. } | ApiError::SessionExpired => Some(401),
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Unexpected(_) | ApiError::InvalidResponse(_) => None,
        }
    }

    /// Whether the user has already been told about this failure.
    pub fn is_notified(&self) -> bool {
        matches!(self, ApiError::SessionExpired)
    }

    /// Text to show the user for this failure.
    pub fn user_message(&self, language: Language) -> String {
        match self {
            ApiError::Network(_) => Message::NetworkFailure.text(language).to_string(),
            ApiError::Unauthorized { message: Some(message) } => message.clone(),
            ApiError::Unauthorized { message: None } | ApiError::SessionExpired => {
                Message::SessionExpired.text(language).to_string()
            }
            ApiError::Rejected { message, .. } => message.clone(),
            ApiError::Unexpected(_) | ApiError::InvalidResponse(_) => {
                Message::UnexpectedFailure.text(language).to_string()
            }
        }
    }
}
