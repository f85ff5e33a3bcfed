//! API key session authentication
//!
//! # Modules
//!
//! - [`credential`] - cookie value parsing
//! - [`store`] - session store gateway and in-memory store
//! - [`policy`] - expiry decision and sliding refresh
//! - [`manager`] - the authentication pipeline
//! - [`middleware`] - actix-web middleware and request accessor
//! - [`errors`] - failure taxonomy and HTTP mapping

pub mod credential;
pub mod errors;
pub mod manager;
pub mod middleware;
pub mod policy;
pub mod store;

pub use credential::{ApiKeyCredential, CredentialFormat};
pub use errors::AuthError;
pub use manager::{AuthConfig, SessionManager};
pub use middleware::{api_key, ApiKey, ApiKeyAuth};
pub use policy::{ExpiryState, SessionPolicy, SlideOutcome};
pub use store::{MemorySessionStore, SessionStore, StoreError};
