//! Refresh of OIDC-backed sessions
//!
//! Produces the refreshed copy of a session record; persisting it is left to
//! the caller so that a failed exchange never leaves partial state behind.

use crate::models::SessionRecord;
use crate::oauth::service::TokenSource;
use crate::session::errors::AuthError;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct OidcRefresher {
    token_source: Option<Arc<dyn TokenSource>>,
    timeout: Duration,
}

impl OidcRefresher {
    #[must_use]
    pub fn new(token_source: Option<Arc<dyn TokenSource>>, timeout: Duration) -> Self {
        Self {
            token_source,
            timeout,
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.token_source.is_some()
    }

    /// Exchange the session's refresh token and return the refreshed record
    ///
    /// The access token, upstream expiry and session deadline all take the new
    /// values. The refresh token is replaced only when the provider rotated it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::RefreshFailed` if no token source is configured or
    /// the exchange fails, and `AuthError::Cancelled` if the exchange outlives
    /// the deadline
    pub async fn refresh(&self, record: &SessionRecord) -> Result<SessionRecord, AuthError> {
        let Some(token_source) = &self.token_source else {
            return Err(AuthError::RefreshFailed(
                "no OIDC token source configured".to_string(),
            ));
        };

        let token = tokio::time::timeout(
            self.timeout,
            token_source.exchange(&record.oidc_refresh_token),
        )
        .await
        .map_err(|_| AuthError::Cancelled("OIDC token exchange"))?
        .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        log::debug!(
            "Refreshed OIDC token for session {} (expires {})",
            record.id,
            token.expiry
        );

        let mut refreshed = record.clone();
        refreshed.oidc_access_token = token.access_token;
        if let Some(rotated) = token.refresh_token {
            refreshed.oidc_refresh_token = rotated;
        }
        refreshed.oidc_expiry = Some(token.expiry);
        refreshed.expires_at = token.expiry;
        Ok(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LoginType;
    use crate::oauth::service::{OAuthError, OidcToken};
    use crate::utils::crypto::hash_secret;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    struct StaticSource(Result<OidcToken, ()>);

    #[async_trait]
    impl TokenSource for StaticSource {
        async fn exchange(&self, refresh_token: &str) -> Result<OidcToken, OAuthError> {
            assert_eq!(refresh_token, "stored-refresh");
            self.0
                .clone()
                .map_err(|()| OAuthError::Rejected {
                    status: 400,
                    body: "invalid_grant".to_string(),
                })
        }
    }

    struct HangingSource;

    #[async_trait]
    impl TokenSource for HangingSource {
        async fn exchange(&self, _refresh_token: &str) -> Result<OidcToken, OAuthError> {
            std::future::pending().await
        }
    }

    fn oidc_session(now: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            id: "abcdefghij".to_string(),
            secret_hash: hash_secret("secret"),
            login_type: LoginType::Oidc,
            last_used: now,
            expires_at: now,
            oidc_access_token: "stale-access".to_string(),
            oidc_refresh_token: "stored-refresh".to_string(),
            oidc_expiry: Some(now - chrono::Duration::days(1)),
        }
    }

    fn refresher(source: impl TokenSource + 'static) -> OidcRefresher {
        OidcRefresher::new(Some(Arc::new(source)), Duration::from_secs(5))
    }

    #[actix_web::test]
    async fn test_refresh_replaces_tokens_and_deadline() {
        let now = Utc::now();
        let expiry = now + chrono::Duration::days(1);
        let refresher = refresher(StaticSource(Ok(OidcToken {
            access_token: "wow".to_string(),
            refresh_token: Some("moo".to_string()),
            expiry,
        })));

        let record = oidc_session(now);
        let refreshed = refresher.refresh(&record).await.unwrap();
        assert_eq!(refreshed.oidc_access_token, "wow");
        assert_eq!(refreshed.oidc_refresh_token, "moo");
        assert_eq!(refreshed.oidc_expiry, Some(expiry));
        assert_eq!(refreshed.expires_at, expiry);
        assert_eq!(refreshed.last_used, record.last_used);
    }

    #[actix_web::test]
    async fn test_refresh_keeps_unrotated_refresh_token() {
        let now = Utc::now();
        let refresher = refresher(StaticSource(Ok(OidcToken {
            access_token: "wow".to_string(),
            refresh_token: None,
            expiry: now + chrono::Duration::hours(1),
        })));

        let refreshed = refresher.refresh(&oidc_session(now)).await.unwrap();
        assert_eq!(refreshed.oidc_refresh_token, "stored-refresh");
    }

    #[actix_web::test]
    async fn test_refresh_failure() {
        let refresher = refresher(StaticSource(Err(())));
        let err = refresher.refresh(&oidc_session(Utc::now())).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshFailed(msg) if msg.contains("invalid_grant")));
    }

    #[actix_web::test]
    async fn test_refresh_without_token_source() {
        let refresher = OidcRefresher::new(None, Duration::from_secs(5));
        assert!(!refresher.is_configured());
        let err = refresher.refresh(&oidc_session(Utc::now())).await.unwrap_err();
        assert!(matches!(err, AuthError::RefreshFailed(_)));
    }

    #[actix_web::test]
    async fn test_refresh_times_out() {
        let refresher = OidcRefresher::new(Some(Arc::new(HangingSource)), Duration::from_millis(20));
        let err = refresher.refresh(&oidc_session(Utc::now())).await.unwrap_err();
        assert!(matches!(err, AuthError::Cancelled("OIDC token exchange")));
    }
}
