//! Test fixtures providing pre-built test objects

use crate::models::{LoginType, SessionRecord};
use crate::session::credential::{DEFAULT_ID_LENGTH, DEFAULT_SECRET_LENGTH, SEPARATOR};
use crate::session::{AuthConfig, MemorySessionStore, SessionManager};
use chrono::{Duration, Utc};
use rand::distr::{Alphanumeric, SampleString};
use std::sync::Arc;

use super::builders::TestSessionBuilder;
use super::constants::TEST_TIMEOUT_MS;

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// Fresh random `(id, secret)` pair of the default lengths
    #[must_use]
    pub fn random_api_key_parts() -> (String, String) {
        let mut rng = rand::rng();
        (
            Alphanumeric.sample_string(&mut rng, DEFAULT_ID_LENGTH),
            Alphanumeric.sample_string(&mut rng, DEFAULT_SECRET_LENGTH),
        )
    }

    /// Cookie value presenting `id` and `secret`
    #[must_use]
    pub fn cookie_value(id: &str, secret: &str) -> String {
        format!("{id}{SEPARATOR}{secret}")
    }

    /// Default pipeline configuration with a short deadline
    #[must_use]
    pub fn auth_config() -> AuthConfig {
        AuthConfig {
            timeout: std::time::Duration::from_millis(TEST_TIMEOUT_MS),
            ..AuthConfig::default()
        }
    }

    /// Password session used recently and far from expiry
    #[must_use]
    pub fn password_session(id: &str, secret: &str) -> SessionRecord {
        TestSessionBuilder::new(id, secret).build()
    }

    /// OIDC session whose upstream token lapsed a day ago
    #[must_use]
    pub fn expired_oidc_session(id: &str, secret: &str) -> SessionRecord {
        TestSessionBuilder::new(id, secret)
            .login_type(LoginType::Oidc)
            .oidc_expiry(Utc::now() - Duration::days(1))
            .build()
    }

    /// Session manager over a fresh in-memory store holding `sessions`
    pub async fn session_manager(
        sessions: Vec<SessionRecord>,
    ) -> (SessionManager, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        for session in sessions {
            store.insert(session).await;
        }
        (
            SessionManager::new(Self::auth_config(), store.clone()),
            store,
        )
    }
}
