//! Count-source trait and implementations.
//!
//! Provides the `CountSource` trait for the single query the publisher
//! performs and an `InMemoryCountSource` implementation for development and
//! testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur when querying a count source.
#[derive(Debug, Error)]
pub enum CountSourceError {
    /// The underlying store could not be queried: connectivity, timeout, or
    /// query error.
    #[error("Count query failed: {0}")]
    QueryFailed(String),
}

/// Trait for counting the documents currently in one collection.
///
/// This is the whole interface the publisher consumes. Implementations must
/// be thread-safe (Send + Sync); a source is shared read-only across refresh
/// cycles.
#[async_trait]
pub trait CountSource: Send + Sync {
    /// Returns the number of documents currently in the collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be queried.
    async fn count(&self) -> Result<u64, CountSourceError>;
}

/// In-memory count source for development and testing.
///
/// The count is a plain atomic that tests drive directly. Failure injection
/// exercises the publisher's error path without a real store.
#[derive(Debug, Default)]
pub struct InMemoryCountSource {
    count: AtomicU64,
    failing: AtomicBool,
    calls: AtomicU64,
}

impl InMemoryCountSource {
    /// Creates a new source reporting a count of zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new source reporting the given count.
    #[must_use]
    pub fn with_count(count: u64) -> Self {
        let source = Self::new();
        source.count.store(count, Ordering::Relaxed);
        source
    }

    /// Sets the count subsequent queries will report.
    pub fn set_count(&self, count: u64) {
        self.count.store(count, Ordering::Relaxed);
    }

    /// Makes subsequent queries fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// Returns how many times `count` has been called.
    #[must_use]
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl CountSource for InMemoryCountSource {
    async fn count(&self) -> Result<u64, CountSourceError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if self.failing.load(Ordering::Relaxed) {
            return Err(CountSourceError::QueryFailed(
                "simulated connectivity failure".to_string(),
            ));
        }

        Ok(self.count.load(Ordering::Relaxed))
    }
}

/// `ClickHouse`-backed count source.
///
/// Issues `SELECT count()` against a single table. One instance is built per
/// monitored collection; they all share the same client.
#[derive(Clone)]
pub struct ClickHouseCountSource {
    client: Arc<clickhouse::Client>,
    collection: String,
}

impl ClickHouseCountSource {
    /// Creates a new source counting the given collection.
    ///
    /// The collection name is interpolated into the query verbatim, so it
    /// must already be validated as an identifier (see
    /// [`CounterSpec::validate_spec`](crate::config::CounterSpec::validate_spec)).
    #[must_use]
    pub fn new(client: Arc<clickhouse::Client>, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }

    /// Returns the collection this source counts.
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl CountSource for ClickHouseCountSource {
    async fn count(&self) -> Result<u64, CountSourceError> {
        let sql = format!("SELECT count() FROM {}", self.collection);
        self.client
            .query(&sql)
            .fetch_one::<u64>()
            .await
            .map_err(|e| CountSourceError::QueryFailed(e.to_string()))
    }
}
