//! Shared shape of a front-end operation: a busy flag that is always
//! released, and an outcome that never propagates as an error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Busy indicator shared between an operation and whoever renders it.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag {
    busy: Arc<AtomicBool>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Mark busy until the returned guard is dropped.
    pub fn enter(&self) -> BusyGuard {
        self.busy.store(true, Ordering::SeqCst);
        BusyGuard {
            busy: Arc::clone(&self.busy),
        }
    }
}

pub struct BusyGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Result of an operation after it has already notified the user.
#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome<T> {
    Success { status: u16, value: T },
    /// `status` is `None` when no response was received.
    Failure { status: Option<u16>, message: String },
}

impl<T> HookOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, HookOutcome::Success { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            HookOutcome::Success { status, .. } => Some(*status),
            HookOutcome::Failure { status, .. } => *status,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            HookOutcome::Success { value, .. } => Some(value),
            HookOutcome::Failure { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            HookOutcome::Success { .. } => None,
            HookOutcome::Failure { message, .. } => Some(message),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> HookOutcome<U> {
        match self {
            HookOutcome::Success { status, value } => HookOutcome::Success {
                status,
                value: f(value),
            },
            HookOutcome::Failure { status, message } => HookOutcome::Failure { status, message },
        }
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            HookOutcome::Success { value, .. } => Ok(value),
            HookOutcome::Failure { message, .. } => Err(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_guard_releases_on_drop() {
        let flag = BusyFlag::new();
        {
            let _guard = flag.enter();
            assert!(flag.is_busy());
        }
        assert!(!flag.is_busy());
    }

    #[test]
    fn test_busy_guard_releases_on_panic() {
        let flag = BusyFlag::new();
        let cloned = flag.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = cloned.enter();
            panic!("fault");
        });
        assert!(result.is_err());
        assert!(!flag.is_busy());
    }

    #[test]
    fn test_outcome_accessors() {
        let ok: HookOutcome<u8> = HookOutcome::Success { status: 200, value: 1 };
        assert!(ok.is_success());
        assert_eq!(ok.status(), Some(200));
        assert_eq!(ok.clone().map(|v| v + 1).value(), Some(&2));

        let failed: HookOutcome<u8> = HookOutcome::Failure {
            status: None,
            message: "offline".to_string(),
        };
        assert_eq!(failed.status(), None);
        assert_eq!(failed.message(), Some("offline"));
        assert_eq!(failed.into_result(), Err("offline".to_string()));
    }
}
