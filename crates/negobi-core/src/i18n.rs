//! Display language and the fixed user-facing messages.
//!
//! The backend localizes its own messages from the `language` request
//! header; the messages here cover faults the client has to phrase itself.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Language sent on every request when none has been chosen.
pub const DEFAULT_LANGUAGE: Language = Language::Es;

#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    /// Code used in the `language` header.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" => Ok(Language::Es),
            "en" => Ok(Language::En),
            other => Err(format!("unsupported language: {}", other)),
        }
    }
}

/// Messages the client produces without a backend message to relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    SessionExpired,
    LoggedOut,
    LoginSucceeded,
    NetworkFailure,
    UnexpectedFailure,
    PasswordChanged,
    RecoveryRequested,
    OtpValidated,
    PasswordReset,
    NoSession,
    NoRecoveryToken,
    CredentialsRequired,
    Saved,
    Deleted,
}

impl Message {
    pub fn text(&self, language: Language) -> &'static str {
        use Message::*;
        match (self, language) {
            (SessionExpired, Language::Es) => "Su sesión ha expirado. Inicie sesión nuevamente.",
            (SessionExpired, Language::En) => "Your session has expired. Please log in again.",
            (LoggedOut, Language::Es) => "Sesión cerrada",
            (LoggedOut, Language::En) => "Logged out",
            (LoginSucceeded, Language::Es) => "Bienvenido",
            (LoginSucceeded, Language::En) => "Welcome",
            (NetworkFailure, Language::Es) => "No se pudo conectar con el servidor",
            (NetworkFailure, Language::En) => "Unable to reach the server",
            (UnexpectedFailure, Language::Es) => "Ocurrió un error inesperado",
            (UnexpectedFailure, Language::En) => "An unexpected error occurred",
            (PasswordChanged, Language::Es) => "Contraseña actualizada",
            (PasswordChanged, Language::En) => "Password updated",
            (RecoveryRequested, Language::Es) => "Se envió un código a su correo",
            (RecoveryRequested, Language::En) => "A code was sent to your email",
            (OtpValidated, Language::Es) => "Código validado",
            (OtpValidated, Language::En) => "Code validated",
            (PasswordReset, Language::Es) => "Contraseña restablecida",
            (PasswordReset, Language::En) => "Password reset",
            (NoSession, Language::Es) => "No hay una sesión activa",
            (NoSession, Language::En) => "There is no active session",
            (NoRecoveryToken, Language::Es) => "Debe validar el código antes de continuar",
            (NoRecoveryToken, Language::En) => "Validate the code before continuing",
            (CredentialsRequired, Language::Es) => "Correo y contraseña son obligatorios",
            (CredentialsRequired, Language::En) => "Email and password are required",
            (Saved, Language::Es) => "Registro guardado",
            (Saved, Language::En) => "Record saved",
            (Deleted, Language::Es) => "Registro eliminado",
            (Deleted, Language::En) => "Record deleted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("es".parse::<Language>(), Ok(Language::Es));
        assert_eq!(" EN ".parse::<Language>(), Ok(Language::En));
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_default_language_is_spanish() {
        assert_eq!(Language::default(), DEFAULT_LANGUAGE);
        assert_eq!(DEFAULT_LANGUAGE.code(), "es");
    }

    #[test]
    fn test_language_serde() {
        assert_eq!(serde_json::to_string(&Language::En).unwrap(), "\"en\"");
        let parsed: Language = serde_json::from_str("\"es\"").unwrap();
        assert_eq!(parsed, Language::Es);
    }
}
