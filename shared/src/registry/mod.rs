//! Owned Prometheus gauge registry.
//!
//! Wraps a `prometheus::Registry` behind a small typed API. The registry is
//! constructed once at startup and shared explicitly (via `Arc`) between the
//! publisher that writes gauges and the scrape endpoint that encodes them;
//! there is no process-global registry.

use prometheus::core::Collector;
use prometheus::{Encoder, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The underlying Prometheus registry rejected the operation, most
    /// commonly because a metric with the same identity is already
    /// registered.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Encoding gathered metrics into the text format failed.
    #[error("encoding error: {0}")]
    Encode(String),
}

/// The single source of truth for every metric this process exposes.
///
/// # Example
///
/// ```
/// use shared::registry::GaugeRegistry;
///
/// let registry = GaugeRegistry::new();
/// let gauge = registry
///     .register_int_gauge("items_total", "Total number of items")
///     .unwrap();
/// gauge.set(42);
///
/// let text = registry.encode().unwrap();
/// assert!(text.contains("items_total 42"));
/// ```
pub struct GaugeRegistry {
    inner: Registry,
}

impl GaugeRegistry {
    /// Creates a new, empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Registry::new(),
        }
    }

    /// Registers an arbitrary collector and hands it back for use.
    ///
    /// # Errors
    ///
    /// Returns an error if a collector with the same identity is already
    /// registered.
    pub fn register_collector<C>(&self, collector: C) -> Result<C, RegistryError>
    where
        C: Collector + Clone + 'static,
    {
        self.inner.register(Box::new(collector.clone()))?;
        Ok(collector)
    }

    /// Creates and registers an integer gauge.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a valid metric name or if a gauge
    /// with the same name is already registered.
    pub fn register_int_gauge(&self, name: &str, help: &str) -> Result<IntGauge, RegistryError> {
        let gauge = IntGauge::new(name, help)?;
        self.register_collector(gauge)
    }

    /// Creates and registers a labelled integer counter family.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or already registered.
    pub fn register_int_counter_vec(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
    ) -> Result<IntCounterVec, RegistryError> {
        let vec = IntCounterVec::new(Opts::new(name, help), labels)?;
        self.register_collector(vec)
    }

    /// Creates and registers a labelled integer gauge family.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or already registered.
    pub fn register_int_gauge_vec(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
    ) -> Result<IntGaugeVec, RegistryError> {
        let vec = IntGaugeVec::new(Opts::new(name, help), labels)?;
        self.register_collector(vec)
    }

    /// Encodes every registered metric into the Prometheus text exposition
    /// format. This is the string served at the `/metrics` endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode(&self) -> Result<String, RegistryError> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| RegistryError::Encode(e.to_string()))
    }

    /// Returns a reference to the underlying `prometheus::Registry`.
    #[must_use]
    pub fn prometheus_registry(&self) -> &Registry {
        &self.inner
    }
}

impl Default for GaugeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
