//! Authentication failure taxonomy
//!
//! Every variant is handled inside the middleware. On the wire the routine
//! failures collapse to one uniform 401 so that the response never tells a
//! client whether a key was unknown, wrong or expired. Infrastructure faults
//! answer with a server error instead, since they say nothing about the key.

use crate::session::store::StoreError;
use crate::utils::responses::ResponseBuilder;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no API key cookie present")]
    MissingCredential,

    #[error("malformed API key: {0}")]
    MalformedCredential(&'static str),

    #[error("no session found for API key")]
    NotFound,

    #[error("API key secret does not match")]
    SecretMismatch,

    #[error("session has expired")]
    Expired,

    #[error("OIDC token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("session store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("request deadline exceeded during {0}")]
    Cancelled(&'static str),
}

impl AuthError {
    /// Whether the failure comes from infrastructure rather than the credential
    #[must_use]
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, AuthError::StoreUnavailable(_) | AuthError::Cancelled(_))
    }

    /// Log the failure at the level matching its kind
    pub fn log(&self) {
        match self {
            AuthError::StoreUnavailable(_) => log::error!("🔥 API key authentication aborted: {self}"),
            AuthError::Cancelled(_) => log::warn!("⏱️ API key authentication aborted: {self}"),
            AuthError::RefreshFailed(_) => log::info!("API key rejected: {self}"),
            _ => log::debug!("API key rejected: {self}"),
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Cancelled(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AuthError::StoreUnavailable(_) => ResponseBuilder::internal_server_error().build(),
            AuthError::Cancelled(_) => ResponseBuilder::service_unavailable().build(),
            _ => ResponseBuilder::unauthorized().build(),
        }
    }
}
