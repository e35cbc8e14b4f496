//! Periodic scheduling for registered counters.
//!
//! The publisher owns the set of registered counters while the server is
//! assembling; [`CounterPublisher::start`] turns each one into its own
//! background refresh task and hands back the handle that stops them.

use prometheus::{IntCounterVec, IntGaugeVec};
use shared::config::{CounterSpec, CounterSpecError};
use shared::registry::{GaugeRegistry, RegistryError};
use shared::source::CountSource;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::counter::CollectionCounter;

/// Metric family tracking failed refreshes, labeled by counter name.
const REFRESH_FAILURES_NAME: &str = "tallyvane_refresh_failures_total";

/// Metric family tracking the last successful refresh, labeled by counter name.
const LAST_REFRESH_NAME: &str = "tallyvane_last_refresh_timestamp_seconds";

/// Errors that can occur while assembling the publisher.
#[derive(Debug, Error)]
pub enum PublisherError {
    /// A counter with the same gauge name is already registered.
    #[error("Counter '{0}' is already registered")]
    DuplicateCounter(String),

    /// The counter spec failed validation.
    #[error("Invalid counter spec: {0}")]
    InvalidSpec(#[from] CounterSpecError),

    /// The gauge registry rejected a registration.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Collects (spec, source) pairs and runs them on independent schedules.
///
/// Each registered counter refreshes once immediately on start, then on a
/// fixed interval. One counter failing or falling behind never affects the
/// others.
pub struct CounterPublisher {
    registry: Arc<GaugeRegistry>,
    counters: Vec<Arc<CollectionCounter>>,
    count_timeout: Duration,
    refresh_failures: IntCounterVec,
    last_refresh: IntGaugeVec,
}

impl CounterPublisher {
    /// Create a publisher writing into the given registry.
    ///
    /// The publisher registers its own two metric families (refresh failures
    /// and last successful refresh) in the same registry, so a scrape shows
    /// the health of the publisher alongside the counts it publishes.
    ///
    /// # Errors
    ///
    /// Returns an error when those families cannot be registered, which
    /// happens when a second publisher is built over the same registry.
    pub fn new(
        registry: Arc<GaugeRegistry>,
        count_timeout: Duration,
    ) -> Result<Self, PublisherError> {
        let refresh_failures = registry.register_int_counter_vec(
            REFRESH_FAILURES_NAME,
            "Total number of failed count refreshes",
            &["counter"],
        )?;
        let last_refresh = registry.register_int_gauge_vec(
            LAST_REFRESH_NAME,
            "Unix time of the last successful count refresh",
            &["counter"],
        )?;

        Ok(Self {
            registry,
            counters: Vec::new(),
            count_timeout,
            refresh_failures,
            last_refresh,
        })
    }

    /// Register one counter: validate its spec, create its gauge and bind it
    /// to the given source.
    ///
    /// Registration order is the only ordering the publisher preserves;
    /// refresh schedules are independent once started.
    ///
    /// # Errors
    ///
    /// Returns an error if the spec fails validation, if a counter with the
    /// same name is already registered here, or if the registry already
    /// holds a metric under that name.
    pub fn register(
        &mut self,
        spec: CounterSpec,
        source: Arc<dyn CountSource>,
    ) -> Result<(), PublisherError> {
        spec.validate_spec()?;

        if self.counters.iter().any(|c| c.name() == spec.name) {
            return Err(PublisherError::DuplicateCounter(spec.name.clone()));
        }

        let gauge = self.registry.register_int_gauge(&spec.name, &spec.help)?;
        let failures = self.refresh_failures.with_label_values(&[spec.name.as_str()]);
        let last_refresh = self.last_refresh.with_label_values(&[spec.name.as_str()]);

        tracing::info!(counter = %spec.name, collection = %spec.collection, "Registered counter");

        self.counters.push(Arc::new(CollectionCounter::new(
            spec,
            gauge,
            source,
            failures,
            last_refresh,
        )));
        Ok(())
    }

    /// The registered counters, in registration order.
    #[must_use]
    pub fn counters(&self) -> &[Arc<CollectionCounter>] {
        &self.counters
    }

    /// Start one background refresh task per registered counter.
    ///
    /// Every counter refreshes immediately, then on every tick of its own
    /// interval. When a refresh overruns its interval the next tick is
    /// delayed rather than fired in a burst.
    #[must_use]
    pub fn start(self) -> PublisherHandle {
        let token = CancellationToken::new();
        let mut tasks = Vec::with_capacity(self.counters.len());

        for counter in &self.counters {
            let counter = Arc::clone(counter);
            let token = token.clone();
            let timeout = self.count_timeout;

            tasks.push(tokio::spawn(async move {
                let mut tick = interval(counter.interval());
                tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

                tracing::info!(
                    counter = %counter.name(),
                    interval = ?counter.interval(),
                    "Starting counter refresh schedule"
                );

                loop {
                    tokio::select! {
                        () = token.cancelled() => break,
                        _ = tick.tick() => counter.refresh(timeout).await,
                    }
                }

                tracing::debug!(counter = %counter.name(), "Counter refresh schedule stopped");
            }));
        }

        PublisherHandle { token, tasks }
    }
}

/// Handle over the running refresh tasks.
///
/// Dropping the handle without calling [`stop`](Self::stop) leaves the
/// tasks running for the life of the process.
pub struct PublisherHandle {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl PublisherHandle {
    /// Stop every refresh schedule and wait for the tasks to finish.
    ///
    /// A refresh already in flight completes first, bounded by the count
    /// timeout; no refresh starts afterwards. A task that already died, for
    /// example under a panicking source, is reported at warn level here.
    pub async fn stop(self) {
        self.token.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Counter refresh task did not shut down cleanly");
            }
        }
        tracing::info!("Counter publisher stopped");
    }
}
