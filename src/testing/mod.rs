//! Testing utilities for Keyward
//!
//! Compiled for unit tests and, behind the `testing` feature, for the
//! integration tests under `tests/`.
//!
//! ## Organization
//!
//! - [`fixtures`] - API keys, configurations and ready-made sessions
//! - [`builders`] - Fluent builder for session records
//! - [`mock`] - Instrumented and failing stores, scripted token source
//! - [`requests`] - Drive a protected route end to end
//! - [`assertions`] - Checks for the uniform rejection response
//!
//! ## Usage
//!
//! ```rust,ignore
//! use keyward::testing::{TestFixtures, TestSessionBuilder};
//!
//! let (id, secret) = TestFixtures::random_api_key_parts();
//! let session = TestSessionBuilder::new(&id, &secret)
//!     .expires_in_hours(2)
//!     .build();
//! ```

pub mod assertions;
pub mod builders;
pub mod fixtures;
pub mod mock;
pub mod requests;

pub use assertions::*;
pub use builders::TestSessionBuilder;
pub use fixtures::TestFixtures;
pub use requests::{call_protected, ProtectedResponse};

/// Common test constants
pub mod constants {
    /// Route the protected test app serves
    pub const PROTECTED_PATH: &str = "/api/protected";

    /// Refresh token stored on OIDC test sessions
    pub const TEST_REFRESH_TOKEN: &str = "test_refresh_token";

    /// Access token stored on OIDC test sessions
    pub const TEST_ACCESS_TOKEN: &str = "test_access_token";

    /// Store and token exchange deadline used by test configurations
    pub const TEST_TIMEOUT_MS: u64 = 2_000;
}
