//! Fluent builder for session records

use crate::models::{LoginType, SessionRecord};
use crate::utils::crypto::hash_secret;
use chrono::{DateTime, Duration, Utc};

use super::constants::{TEST_ACCESS_TOKEN, TEST_REFRESH_TOKEN};

/// Builder for session records whose stored digest matches a presented secret
///
/// Defaults: password login, used just now, expiring in 24 hours, no
/// upstream OIDC expiry.
pub struct TestSessionBuilder {
    id: String,
    hashed_secret: String,
    login_type: LoginType,
    last_used: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    oidc_access_token: String,
    oidc_refresh_token: String,
    oidc_expiry: Option<DateTime<Utc>>,
}

impl TestSessionBuilder {
    #[must_use]
    pub fn new(id: &str, secret: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            hashed_secret: secret.to_string(),
            login_type: LoginType::Password,
            last_used: now,
            expires_at: now + Duration::hours(24),
            oidc_access_token: TEST_ACCESS_TOKEN.to_string(),
            oidc_refresh_token: TEST_REFRESH_TOKEN.to_string(),
            oidc_expiry: None,
        }
    }

    /// Store the digest of a different secret than the one presented
    #[must_use]
    pub fn hashed_secret(mut self, secret: &str) -> Self {
        self.hashed_secret = secret.to_string();
        self
    }

    #[must_use]
    pub fn login_type(mut self, login_type: LoginType) -> Self {
        self.login_type = login_type;
        self
    }

    #[must_use]
    pub fn last_used(mut self, last_used: DateTime<Utc>) -> Self {
        self.last_used = last_used;
        self
    }

    #[must_use]
    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Set the expiry relative to now; negative values give an expired session
    #[must_use]
    pub fn expires_in_hours(mut self, hours: i64) -> Self {
        self.expires_at = Utc::now() + Duration::hours(hours);
        self
    }

    #[must_use]
    pub fn oidc_expiry(mut self, oidc_expiry: DateTime<Utc>) -> Self {
        self.oidc_expiry = Some(oidc_expiry);
        self
    }

    #[must_use]
    pub fn build(self) -> SessionRecord {
        SessionRecord {
            id: self.id,
            secret_hash: hash_secret(&self.hashed_secret),
            login_type: self.login_type,
            last_used: self.last_used,
            expires_at: self.expires_at,
            oidc_access_token: self.oidc_access_token,
            oidc_refresh_token: self.oidc_refresh_token,
            oidc_expiry: self.oidc_expiry,
        }
    }
}
