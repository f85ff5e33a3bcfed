//! OIDC token refresh
//!
//! - [`service`] - the token-source capability and its HTTP implementation
//! - [`refresher`] - applies a token exchange to a session record

pub mod refresher;
pub mod service;

pub use refresher::OidcRefresher;
pub use service::{HttpTokenSource, OAuthError, OidcToken, TokenSource};
