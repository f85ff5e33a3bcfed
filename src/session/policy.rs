//! Session expiry and sliding refresh policy
//!
//! Deciding whether a session is still valid is kept apart from deciding
//! whether its timestamps should move. Both are pure functions of the record
//! and the current time so that the manager can evaluate them once per request
//! and issue at most one store write.

use crate::models::SessionRecord;
use crate::session::errors::AuthError;
use chrono::{DateTime, Duration, Utc};

/// Outcome of the expiry check for a verified session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryState {
    /// Non-OIDC session whose `expires_at` is still ahead
    NotExpired,
    /// OIDC session whose upstream token is still valid, or which has no
    /// upstream expiry and an `expires_at` still ahead
    OidcNotExpired,
    /// OIDC session whose upstream token has lapsed and must be exchanged
    OidcNeedsRefresh,
}

/// Which timestamps a sliding refresh moved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlideOutcome {
    pub last_used: bool,
    pub expires_at: bool,
}

impl SlideOutcome {
    #[must_use]
    pub fn changed(self) -> bool {
        self.last_used || self.expires_at
    }
}

/// Thresholds for expiry extension and usage tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Minimum age of `last_used` before it is rewritten
    pub refresh_interval: Duration,
    /// Remaining lifetime below which `expires_at` is pushed out
    pub expiry_low_water: Duration,
    /// Lifetime granted when `expires_at` is pushed out
    pub session_duration: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        // With these values an active session has its expiry extended at
        // most once an hour.
        Self {
            refresh_interval: Duration::hours(1),
            expiry_low_water: Duration::hours(23),
            session_duration: Duration::hours(24),
        }
    }
}

impl SessionPolicy {
    /// Decide whether a verified session may be used at `now`
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Expired` when `expires_at` is at or before `now` for
    /// a non-OIDC session, or for an OIDC session without an upstream expiry
    pub fn evaluate(
        &self,
        record: &SessionRecord,
        now: DateTime<Utc>,
    ) -> Result<ExpiryState, AuthError> {
        if record.login_type.is_oidc() {
            match record.oidc_expiry {
                Some(expiry) if expiry <= now => return Ok(ExpiryState::OidcNeedsRefresh),
                Some(_) => return Ok(ExpiryState::OidcNotExpired),
                None if record.expires_at > now => return Ok(ExpiryState::OidcNotExpired),
                None => return Err(AuthError::Expired),
            }
        }

        if record.expires_at <= now {
            return Err(AuthError::Expired);
        }
        Ok(ExpiryState::NotExpired)
    }

    /// Advance stale timestamps on `record` in place
    ///
    /// `last_used` moves once it is older than the refresh interval.
    /// `expires_at` is extended once its remaining lifetime drops below the
    /// low-water mark, except for OIDC sessions whose deadline only moves when
    /// the upstream token is refreshed.
    pub fn slide(&self, record: &mut SessionRecord, now: DateTime<Utc>) -> SlideOutcome {
        let mut outcome = SlideOutcome::default();

        if now - record.last_used > self.refresh_interval {
            record.last_used = now;
            outcome.last_used = true;
        }

        if !record.login_type.is_oidc() && record.expires_at - now < self.expiry_low_water {
            record.expires_at = now + self.session_duration;
            outcome.expires_at = true;
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoginType;
    use crate::utils::crypto::hash_secret;

    fn session(login_type: LoginType, now: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            id: "abcdefghij".to_string(),
            secret_hash: hash_secret("secret"),
            login_type,
            last_used: now,
            expires_at: now + Duration::days(1),
            oidc_access_token: String::new(),
            oidc_refresh_token: String::new(),
            oidc_expiry: None,
        }
    }

    #[test]
    fn test_non_oidc_expiry() {
        let policy = SessionPolicy::default();
        let now = Utc::now();
        let mut record = session(LoginType::Password, now);

        assert_eq!(policy.evaluate(&record, now).unwrap(), ExpiryState::NotExpired);

        record.expires_at = now - Duration::seconds(1);
        assert!(matches!(policy.evaluate(&record, now), Err(AuthError::Expired)));

        // Exactly at the deadline counts as expired
        record.expires_at = now;
        assert!(matches!(policy.evaluate(&record, now), Err(AuthError::Expired)));
    }

    #[test]
    fn test_federated_sessions_use_local_expiry() {
        let policy = SessionPolicy::default();
        let now = Utc::now();
        let mut record = session(LoginType::Github, now);
        record.expires_at = now - Duration::minutes(1);
        record.oidc_expiry = Some(now + Duration::days(1));
        assert!(matches!(policy.evaluate(&record, now), Err(AuthError::Expired)));
    }

    #[test]
    fn test_oidc_expiry_states() {
        let policy = SessionPolicy::default();
        let now = Utc::now();
        let mut record = session(LoginType::Oidc, now);

        // Unset upstream expiry never triggers a refresh
        assert_eq!(
            policy.evaluate(&record, now).unwrap(),
            ExpiryState::OidcNotExpired
        );

        record.oidc_expiry = Some(now + Duration::minutes(5));
        assert_eq!(
            policy.evaluate(&record, now).unwrap(),
            ExpiryState::OidcNotExpired
        );

        record.oidc_expiry = Some(now - Duration::days(1));
        assert_eq!(
            policy.evaluate(&record, now).unwrap(),
            ExpiryState::OidcNeedsRefresh
        );

        record.oidc_expiry = Some(now);
        assert_eq!(
            policy.evaluate(&record, now).unwrap(),
            ExpiryState::OidcNeedsRefresh
        );
    }

    #[test]
    fn test_oidc_local_expiry_not_rechecked() {
        let policy = SessionPolicy::default();
        let now = Utc::now();
        let mut record = session(LoginType::Oidc, now);
        record.expires_at = now - Duration::hours(1);
        record.oidc_expiry = Some(now + Duration::hours(1));
        assert_eq!(
            policy.evaluate(&record, now).unwrap(),
            ExpiryState::OidcNotExpired
        );
    }

    #[test]
    fn test_oidc_without_upstream_expiry_uses_local_deadline() {
        let policy = SessionPolicy::default();
        let now = Utc::now();
        let mut record = session(LoginType::Oidc, now);
        record.expires_at = now - Duration::days(365);
        assert!(matches!(policy.evaluate(&record, now), Err(AuthError::Expired)));

        record.expires_at = now;
        assert!(matches!(policy.evaluate(&record, now), Err(AuthError::Expired)));
    }

    #[test]
    fn test_slide_fresh_session_is_untouched() {
        let policy = SessionPolicy::default();
        let now = Utc::now();
        let mut record = session(LoginType::Password, now);
        let before = record.clone();

        let outcome = policy.slide(&mut record, now + Duration::seconds(1));
        assert!(!outcome.changed());
        assert_eq!(record, before);
    }

    #[test]
    fn test_slide_updates_stale_last_used_only() {
        let policy = SessionPolicy::default();
        let now = Utc::now();
        let mut record = session(LoginType::Password, now);
        record.last_used = now - Duration::days(1);
        let expires_at = record.expires_at;

        let outcome = policy.slide(&mut record, now);
        assert_eq!(
            outcome,
            SlideOutcome {
                last_used: true,
                expires_at: false
            }
        );
        assert_eq!(record.last_used, now);
        assert_eq!(record.expires_at, expires_at);
    }

    #[test]
    fn test_slide_extends_imminent_expiry_only() {
        let policy = SessionPolicy::default();
        let now = Utc::now();
        let mut record = session(LoginType::Password, now);
        record.expires_at = now + Duration::minutes(1);

        let outcome = policy.slide(&mut record, now);
        assert_eq!(
            outcome,
            SlideOutcome {
                last_used: false,
                expires_at: true
            }
        );
        assert_eq!(record.last_used, now);
        assert_eq!(record.expires_at, now + Duration::hours(24));
    }

    #[test]
    fn test_slide_both_thresholds() {
        let policy = SessionPolicy::default();
        let now = Utc::now();
        let mut record = session(LoginType::Password, now);
        record.last_used = now - Duration::hours(2);
        record.expires_at = now + Duration::hours(3);

        let outcome = policy.slide(&mut record, now);
        assert!(outcome.last_used && outcome.expires_at);
    }

    #[test]
    fn test_slide_never_extends_oidc_deadline() {
        let policy = SessionPolicy::default();
        let now = Utc::now();
        let mut record = session(LoginType::Oidc, now);
        record.expires_at = now + Duration::minutes(1);

        let outcome = policy.slide(&mut record, now);
        assert!(!outcome.expires_at);
        assert_eq!(record.expires_at, now + Duration::minutes(1));
    }

    #[test]
    fn test_slide_is_idempotent() {
        let policy = SessionPolicy::default();
        let now = Utc::now();
        let mut record = session(LoginType::Password, now);
        record.last_used = now - Duration::days(1);
        record.expires_at = now + Duration::minutes(1);

        assert!(policy.slide(&mut record, now).changed());
        assert!(!policy.slide(&mut record, now + Duration::seconds(1)).changed());
    }

    #[test]
    fn test_custom_thresholds() {
        let policy = SessionPolicy {
            refresh_interval: Duration::minutes(5),
            expiry_low_water: Duration::minutes(10),
            session_duration: Duration::minutes(30),
        };
        let now = Utc::now();
        let mut record = session(LoginType::Password, now);
        record.last_used = now - Duration::minutes(6);
        record.expires_at = now + Duration::minutes(9);

        let outcome = policy.slide(&mut record, now);
        assert!(outcome.last_used && outcome.expires_at);
        assert_eq!(record.expires_at, now + Duration::minutes(30));
    }
}
