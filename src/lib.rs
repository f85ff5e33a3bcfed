#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the keyward application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod handlers;
pub mod healthcheck;
pub mod models;
pub mod oauth;
pub mod session;
pub mod settings;
pub mod utils;

// Testing utilities - available for unit tests and integration tests
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use models::{LoginType, SessionRecord};
pub use session::{api_key, ApiKey, ApiKeyAuth, AuthError, SessionManager};
pub use settings::KeywardSettings;
