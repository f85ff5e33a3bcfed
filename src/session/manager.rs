//! Session Manager - API key authentication pipeline
//!
//! The `SessionManager` resolves the API key cookie of a request to a session
//! record. Each call runs the same strictly ordered pipeline:
//!
//! 1. **Parse** - shape check of the cookie value, no I/O
//! 2. **Lookup** - read the record by its public ID
//! 3. **Verify** - constant-time comparison of the secret digest
//! 4. **Expiry** - local deadline, or upstream token refresh for OIDC sessions
//! 5. **Slide** - advance stale usage/expiry timestamps
//! 6. **Persist** - at most one store write, and only if something changed
//!
//! Nothing is cached between requests. Two requests carrying the same key may
//! both decide to write; the store keeps whichever lands last, which only
//! costs a redundant write.

use crate::models::{SessionRecord, SessionUpdate};
use crate::oauth::{OidcRefresher, TokenSource};
use crate::session::credential::{ApiKeyCredential, CredentialFormat};
use crate::session::errors::AuthError;
use crate::session::policy::{ExpiryState, SessionPolicy};
use crate::session::store::SessionStore;
use crate::utils::crypto::verify_secret;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Name of the cookie carrying the API key unless configured otherwise
pub const DEFAULT_COOKIE_NAME: &str = "session_token";

/// Runtime configuration of the authentication pipeline
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub credential_format: CredentialFormat,
    pub policy: SessionPolicy,
    /// Upper bound for each store call and each token exchange
    pub timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            credential_format: CredentialFormat::default(),
            policy: SessionPolicy::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Clone)]
pub struct SessionManager {
    config: AuthConfig,
    store: Arc<dyn SessionStore>,
    refresher: OidcRefresher,
}

impl SessionManager {
    #[must_use]
    pub fn new(config: AuthConfig, store: Arc<dyn SessionStore>) -> Self {
        let refresher = OidcRefresher::new(None, config.timeout);
        Self {
            config,
            store,
            refresher,
        }
    }

    /// Configure the token source used to refresh OIDC sessions
    #[must_use]
    pub fn with_token_source(mut self, token_source: Arc<dyn TokenSource>) -> Self {
        self.refresher = OidcRefresher::new(Some(token_source), self.config.timeout);
        self
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.config.cookie_name
    }

    /// Whether expired OIDC sessions can be refreshed
    #[must_use]
    pub fn oidc_refresh_enabled(&self) -> bool {
        self.refresher.is_configured()
    }

    /// Authenticate a raw cookie value against the store at the current time
    ///
    /// # Errors
    ///
    /// Returns the `AuthError` of the first pipeline stage that rejects the key
    pub async fn authenticate(&self, cookie: Option<&str>) -> Result<SessionRecord, AuthError> {
        self.authenticate_at(cookie, Utc::now()).await
    }

    /// Authenticate a raw cookie value as if the current time were `now`
    ///
    /// # Errors
    ///
    /// Returns the `AuthError` of the first pipeline stage that rejects the key
    pub async fn authenticate_at(
        &self,
        cookie: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord, AuthError> {
        let value = cookie.ok_or(AuthError::MissingCredential)?;
        let credential = ApiKeyCredential::parse(value, &self.config.credential_format)?;

        let mut record = self
            .with_deadline("session lookup", self.store.get_session_by_id(&credential.id))
            .await??
            .ok_or(AuthError::NotFound)?;

        if !verify_secret(credential.secret(), &record.secret_hash) {
            return Err(AuthError::SecretMismatch);
        }

        let policy = &self.config.policy;
        let refreshed = match policy.evaluate(&record, now)? {
            ExpiryState::OidcNeedsRefresh => {
                record = self.refresher.refresh(&record).await?;
                if record.expires_at <= now {
                    return Err(AuthError::Expired);
                }
                true
            }
            ExpiryState::NotExpired | ExpiryState::OidcNotExpired => false,
        };

        let slid = policy.slide(&mut record, now);
        if refreshed || slid.changed() {
            log::debug!(
                "Persisting session {} (oidc_refreshed={refreshed}, last_used={}, expires_at={})",
                record.id,
                slid.last_used,
                slid.expires_at
            );
            self.with_deadline(
                "session update",
                self.store
                    .update_session_by_id(&record.id, &SessionUpdate::from(&record)),
            )
            .await??;
        }

        Ok(record)
    }

    async fn with_deadline<T>(
        &self,
        operation: &'static str,
        future: impl Future<Output = T>,
    ) -> Result<T, AuthError> {
        tokio::time::timeout(self.config.timeout, future)
            .await
            .map_err(|_| AuthError::Cancelled(operation))
    }
}
