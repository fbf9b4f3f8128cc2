use chrono::{DateTime, Duration, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Token lifetime assumed when the backend does not send an expiry.
pub const DEFAULT_TOKEN_LIFETIME_MINUTES: i64 = 12 * 60;

/// Buffer before expiry at which a refresh should be attempted.
const TOKEN_REFRESH_BUFFER_MINUTES: i64 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SessionData {
    pub fn new(access_token: String, refresh_token: String, issued_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            refresh_token,
            issued_at,
            expires_at: None,
        }
    }

    /// Set the expiry from a lifetime in seconds, as sent by the backend.
    /// A lifetime past chrono's range leaves the expiry unset, so the
    /// configured token lifetime applies.
    pub fn expiring_in(mut self, seconds: i64) -> Self {
        self.expires_at = TimeDelta::try_seconds(seconds).and_then(|d| self.issued_at.checked_add_signed(d));
        self
    }

    /// Expiry instant, falling back to `issued_at + lifetime`.
    pub fn expiry(&self, lifetime: Duration) -> DateTime<Utc> {
        self.expires_at.unwrap_or_else(|| {
            self.issued_at
                .checked_add_signed(lifetime)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>, lifetime: Duration) -> bool {
        now >= self.expiry(lifetime)
    }

    /// Whether the session is close enough to expiry to refresh it.
    pub fn needs_refresh_at(&self, now: DateTime<Utc>, lifetime: Duration) -> bool {
        let buffer = Duration::minutes(TOKEN_REFRESH_BUFFER_MINUTES);
        match self.expiry(lifetime).checked_sub_signed(buffer) {
            Some(threshold) => now >= threshold,
            None => true,
        }
    }

    /// Minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self, now: DateTime<Utc>, lifetime: Duration) -> i64 {
        self.expiry(lifetime).signed_duration_since(now).num_minutes().max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifetime() -> Duration {
        Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES)
    }

    #[test]
    fn test_explicit_expiry() {
        let now = Utc::now();
        let session = SessionData::new("a".into(), "r".into(), now).expiring_in(3600);
        assert!(!session.is_expired_at(now, lifetime()));
        assert!(session.is_expired_at(now + Duration::seconds(3600), lifetime()));
        assert_eq!(session.minutes_until_expiry(now, lifetime()), 60);
    }

    #[test]
    fn test_fallback_lifetime() {
        let issued = Utc::now() - Duration::minutes(DEFAULT_TOKEN_LIFETIME_MINUTES + 1);
        let session = SessionData::new("a".into(), "r".into(), issued);
        assert!(session.is_expired_at(Utc::now(), lifetime()));
        assert_eq!(session.minutes_until_expiry(Utc::now(), lifetime()), 0);
    }

    #[test]
    fn test_needs_refresh() {
        let now = Utc::now();
        let session = SessionData::new("a".into(), "r".into(), now).expiring_in(4 * 60);
        assert!(session.needs_refresh_at(now, lifetime()));
        assert!(!session.is_expired_at(now, lifetime()));
    }

    #[test]
    fn test_out_of_range_lifetime_falls_back() {
        let now = Utc::now();
        let session = SessionData::new("a".into(), "r".into(), now).expiring_in(i64::MAX);
        assert_eq!(session.expires_at, None);
        assert!(!session.is_expired_at(now, lifetime()));
        assert_eq!(session.minutes_until_expiry(now, lifetime()), DEFAULT_TOKEN_LIFETIME_MINUTES);

        let huge = Duration::MAX;
        assert!(!session.is_expired_at(now, huge));
        assert!(!session.needs_refresh_at(now, huge));
    }
}
