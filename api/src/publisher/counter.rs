//! A single published counter.
//!
//! Binds one gauge to one count source and carries the bookkeeping the
//! publisher exposes about its own refreshes.

use chrono::Utc;
use prometheus::{IntCounter, IntGauge};
use shared::config::CounterSpec;
use shared::source::CountSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One registered counter: the gauge it publishes, the source it counts
/// through, and its per-counter refresh bookkeeping.
pub struct CollectionCounter {
    spec: CounterSpec,
    gauge: IntGauge,
    source: Arc<dyn CountSource>,
    refresh_failures: IntCounter,
    last_refresh: IntGauge,
    in_flight: AtomicBool,
}

impl CollectionCounter {
    pub(crate) fn new(
        spec: CounterSpec,
        gauge: IntGauge,
        source: Arc<dyn CountSource>,
        refresh_failures: IntCounter,
        last_refresh: IntGauge,
    ) -> Self {
        Self {
            spec,
            gauge,
            source,
            refresh_failures,
            last_refresh,
            in_flight: AtomicBool::new(false),
        }
    }

    /// The gauge name this counter publishes under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// The refresh cadence for this counter.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.spec.interval()
    }

    /// The current value of the published gauge.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.gauge.get()
    }

    /// Number of refreshes that have failed since startup.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.refresh_failures.get()
    }

    /// Unix time of the last successful refresh, zero before the first one.
    #[must_use]
    pub fn last_refresh_timestamp(&self) -> i64 {
        self.last_refresh.get()
    }

    /// Perform one refresh cycle: query the source, set the gauge.
    ///
    /// A failed or timed-out query is logged and counted; the gauge keeps
    /// its previous value and the next cycle retries implicitly. If a
    /// previous refresh of this counter is still in flight, the call returns
    /// without querying.
    pub async fn refresh(&self, timeout: Duration) {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::debug!(counter = %self.spec.name, "Previous refresh still in flight, skipping");
            return;
        }

        match tokio::time::timeout(timeout, self.source.count()).await {
            Ok(Ok(count)) => {
                self.gauge.set(i64::try_from(count).unwrap_or(i64::MAX));
                self.last_refresh.set(Utc::now().timestamp());
                tracing::debug!(counter = %self.spec.name, count, "Refreshed collection count");
            }
            Ok(Err(e)) => {
                self.refresh_failures.inc();
                tracing::error!(
                    counter = %self.spec.name,
                    collection = %self.spec.collection,
                    error = %e,
                    "Failed to refresh collection count"
                );
            }
            Err(_) => {
                self.refresh_failures.inc();
                tracing::error!(
                    counter = %self.spec.name,
                    collection = %self.spec.collection,
                    timeout = ?timeout,
                    "Count query timed out"
                );
            }
        }

        self.in_flight.store(false, Ordering::Release);
    }
}
