//! Mock stores and token sources for isolated testing

use crate::models::{SessionRecord, SessionUpdate};
use crate::oauth::{OAuthError, OidcToken, TokenSource};
use crate::session::store::{MemorySessionStore, SessionStore, StoreError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory store that counts every lookup and update it serves
#[derive(Default)]
pub struct CountingStore {
    inner: MemorySessionStore,
    lookups: AtomicUsize,
    updates: AtomicUsize,
}

impl CountingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: SessionRecord) {
        self.inner.insert(record).await;
    }

    pub async fn get(&self, id: &str) -> Option<SessionRecord> {
        self.inner.get(id).await
    }

    #[must_use]
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for CountingStore {
    async fn get_session_by_id(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_session_by_id(id).await
    }

    async fn update_session_by_id(
        &self,
        id: &str,
        update: &SessionUpdate,
    ) -> Result<(), StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_session_by_id(id, update).await
    }
}

/// Store whose backend fails on lookup, or serves one record and fails on update
pub struct FailingStore {
    record: Option<SessionRecord>,
}

impl FailingStore {
    #[must_use]
    pub fn on_lookup() -> Self {
        Self { record: None }
    }

    #[must_use]
    pub fn on_update(record: SessionRecord) -> Self {
        Self {
            record: Some(record),
        }
    }
}

#[async_trait]
impl SessionStore for FailingStore {
    async fn get_session_by_id(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        match &self.record {
            Some(record) if record.id == id => Ok(Some(record.clone())),
            Some(_) => Ok(None),
            None => Err(StoreError::Backend("connection refused".to_string())),
        }
    }

    async fn update_session_by_id(
        &self,
        _id: &str,
        _update: &SessionUpdate,
    ) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection reset".to_string()))
    }
}

/// Store that never answers a lookup, or serves one record and never answers
/// the update
pub struct StalledStore {
    record: Option<SessionRecord>,
}

impl StalledStore {
    #[must_use]
    pub fn on_lookup() -> Self {
        Self { record: None }
    }

    #[must_use]
    pub fn on_update(record: SessionRecord) -> Self {
        Self {
            record: Some(record),
        }
    }
}

#[async_trait]
impl SessionStore for StalledStore {
    async fn get_session_by_id(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        match &self.record {
            Some(record) if record.id == id => Ok(Some(record.clone())),
            Some(_) => Ok(None),
            None => std::future::pending().await,
        }
    }

    async fn update_session_by_id(
        &self,
        _id: &str,
        _update: &SessionUpdate,
    ) -> Result<(), StoreError> {
        std::future::pending().await
    }
}

/// Token source answering every exchange with a scripted outcome
pub struct MockTokenSource {
    outcome: Result<OidcToken, String>,
    stalls: bool,
    calls: AtomicUsize,
    last_refresh_token: Mutex<Option<String>>,
}

impl MockTokenSource {
    #[must_use]
    pub fn succeeding(token: OidcToken) -> Self {
        Self::with_outcome(Ok(token))
    }

    #[must_use]
    pub fn failing(reason: &str) -> Self {
        Self::with_outcome(Err(reason.to_string()))
    }

    /// Token source whose exchanges never complete
    #[must_use]
    pub fn stalled() -> Self {
        Self {
            stalls: true,
            ..Self::failing("stalled")
        }
    }

    fn with_outcome(outcome: Result<OidcToken, String>) -> Self {
        Self {
            outcome,
            stalls: false,
            calls: AtomicUsize::new(0),
            last_refresh_token: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Refresh token presented by the most recent exchange
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned
    #[must_use]
    pub fn last_refresh_token(&self) -> Option<String> {
        self.last_refresh_token.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenSource for MockTokenSource {
    async fn exchange(&self, refresh_token: &str) -> Result<OidcToken, OAuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_refresh_token.lock().unwrap() = Some(refresh_token.to_string());
        if self.stalls {
            return std::future::pending().await;
        }
        self.outcome
            .clone()
            .map_err(|body| OAuthError::Rejected { status: 400, body })
    }
}
