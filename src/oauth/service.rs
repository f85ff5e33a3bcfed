//! Upstream OIDC token exchange
//!
//! [`TokenSource`] is the only way the authentication core talks to an
//! identity provider. [`HttpTokenSource`] implements it with the OAuth2
//! `refresh_token` grant against the provider's token endpoint.

use crate::settings::OidcSettings;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Lifetime assumed when the provider does not send `expires_in`
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;

/// OAuth token exchange errors
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Token endpoint rejected refresh with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Tokens returned by a successful refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcToken {
    pub access_token: String,
    /// Present only when the provider rotated the refresh token
    pub refresh_token: Option<String>,
    pub expiry: DateTime<Utc>,
}

/// Capability to exchange a refresh token for a fresh access token
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Exchange `refresh_token` for a new token set
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable, rejects the refresh
    /// token, or answers with something that is not a token response
    async fn exchange(&self, refresh_token: &str) -> Result<OidcToken, OAuthError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_token(self, now: DateTime<Utc>) -> Result<OidcToken, OAuthError> {
        if self.access_token.is_empty() {
            return Err(OAuthError::InvalidResponse(
                "token response has an empty access_token".to_string(),
            ));
        }
        if let Some(token_type) = &self.token_type {
            if !token_type.eq_ignore_ascii_case("bearer") {
                log::debug!("Token endpoint returned token_type {token_type}");
            }
        }

        let expires_in = self.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        if expires_in < 0 {
            return Err(OAuthError::InvalidResponse(format!(
                "token response has a negative expires_in ({expires_in})"
            )));
        }
        let expiry = Duration::try_seconds(expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                OAuthError::InvalidResponse(format!(
                    "token response expires_in {expires_in} is out of range"
                ))
            })?;

        Ok(OidcToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.filter(|token| !token.is_empty()),
            expiry,
        })
    }
}

/// Token source backed by an OAuth2 token endpoint
#[derive(Clone)]
pub struct HttpTokenSource {
    http_client: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: Option<String>,
}

impl HttpTokenSource {
    #[must_use]
    pub fn new(token_url: &str, client_id: &str, client_secret: Option<&str>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            token_url: token_url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.map(ToString::to_string),
        }
    }

    /// Build a token source from settings, `Ok(None)` when OIDC is not configured
    ///
    /// # Errors
    ///
    /// Returns an error if a client ID is configured but no token endpoint can
    /// be determined, or discovery fails
    pub async fn from_settings(settings: &OidcSettings) -> Result<Option<Self>, OAuthError> {
        let Some(client_id) = settings.client_id.as_deref().filter(|id| !id.is_empty()) else {
            log::info!("❌ OIDC token refresh not configured - missing client_id");
            return Ok(None);
        };

        let token_url = match (&settings.token_endpoint, &settings.discovery_url) {
            (Some(token_endpoint), _) => token_endpoint.clone(),
            (None, Some(discovery_url)) => Self::resolve_from_discovery(discovery_url).await?,
            (None, None) => {
                return Err(OAuthError::Configuration(
                    "OIDC client_id set but neither token_endpoint nor discovery_url".to_string(),
                ))
            }
        };

        url::Url::parse(&token_url).map_err(|e| {
            OAuthError::Configuration(format!("Invalid token endpoint {token_url}: {e}"))
        })?;

        log::info!("✅ OIDC token refresh configured against {token_url}");
        Ok(Some(Self::new(
            &token_url,
            client_id,
            settings.client_secret.as_deref(),
        )))
    }

    async fn resolve_from_discovery(discovery_url: &str) -> Result<String, OAuthError> {
        log::debug!("Fetching discovery document from: {discovery_url}");

        let response = reqwest::get(discovery_url)
            .await
            .map_err(|e| OAuthError::Network(format!("Failed to fetch discovery document: {e}")))?;
        if !response.status().is_success() {
            return Err(OAuthError::Network(format!(
                "Discovery document request failed with status: {}",
                response.status()
            )));
        }

        let document: serde_json::Value = response.json().await.map_err(|e| {
            OAuthError::InvalidResponse(format!("Failed to parse discovery document JSON: {e}"))
        })?;
        document["token_endpoint"]
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| {
                OAuthError::InvalidResponse(
                    "Missing token_endpoint in discovery document".to_string(),
                )
            })
    }

    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl TokenSource for HttpTokenSource {
    async fn exchange(&self, refresh_token: &str) -> Result<OidcToken, OAuthError> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.as_str()));
        }

        log::debug!("Refreshing OIDC token via {}", self.token_url);
        let response = self
            .http_client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::Network(format!("Failed to refresh token: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(OAuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::InvalidResponse(format!("Failed to parse token response: {e}")))?;

        token_response.into_token(Utc::now())
    }
}
