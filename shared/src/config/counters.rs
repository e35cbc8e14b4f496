//! Counter specifications for the periodic count publisher.
//!
//! A [`CounterSpec`] describes one published gauge: its stable metric name,
//! help text, the collection whose documents are counted, and the refresh
//! cadence. The default set mirrors the four collections the backend has
//! always published, grouped by [`Subsystem`].

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use validator::Validate;

/// Default refresh cadence in milliseconds (one minute).
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 60_000;

/// The backend subsystem a counter belongs to.
///
/// The publisher treats every counter identically; the subsystem only groups
/// the default set the way the backend is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subsystem {
    /// Menu items and their dietary categories.
    Items,
    /// Discount campaigns and coupons.
    Discounts,
}

impl Subsystem {
    /// Returns the default counters this subsystem publishes.
    ///
    /// # Examples
    ///
    /// ```
    /// use shared::config::Subsystem;
    ///
    /// let specs = Subsystem::Discounts.default_specs();
    /// assert_eq!(specs.len(), 2);
    /// assert_eq!(specs[0].name, "campaigns_total");
    /// ```
    #[must_use]
    pub fn default_specs(self) -> Vec<CounterSpec> {
        // Gauge names are historical; external dashboards scrape them as-is.
        match self {
            Self::Items => vec![
                CounterSpec::new(
                    self,
                    "dietaries_total",
                    "Total number of dietaries",
                    "dietaries",
                ),
                CounterSpec::new(self, "items_total", "Total number of items", "items"),
            ],
            Self::Discounts => vec![
                CounterSpec::new(
                    self,
                    "campaigns_total",
                    "Total number of campaigns",
                    "campaigns",
                ),
                CounterSpec::new(self, "coupons_total", "Total number of coupons", "coupons"),
            ],
        }
    }
}

/// Errors that can occur during counter spec validation.
#[derive(Debug, Error)]
pub enum CounterSpecError {
    /// The gauge name is empty.
    #[error("Counter name cannot be empty")]
    EmptyName,

    /// The collection name is not a plain identifier.
    #[error("Invalid collection name: '{0}'")]
    InvalidCollection(String),

    /// The refresh interval is zero.
    #[error("Refresh interval must be greater than zero")]
    ZeroInterval,

    /// Validation failed with details.
    #[error("Validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

/// Specification of a single published counter.
///
/// # Example
///
/// ```
/// use shared::config::{CounterSpec, Subsystem};
///
/// let spec = CounterSpec::new(
///     Subsystem::Items,
///     "items_total",
///     "Total number of items",
///     "items",
/// )
/// .with_interval_ms(30_000);
///
/// assert!(spec.validate_spec().is_ok());
/// assert_eq!(spec.interval().as_secs(), 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct CounterSpec {
    /// The subsystem this counter belongs to.
    pub subsystem: Subsystem,

    /// The gauge name exposed to scrapers (e.g. "`items_total`").
    #[validate(length(min = 1, message = "Counter name cannot be empty"))]
    pub name: String,

    /// Static help text describing the gauge.
    #[validate(length(min = 1, message = "Help text cannot be empty"))]
    pub help: String,

    /// The collection whose documents are counted.
    #[validate(length(min = 1, message = "Collection name cannot be empty"))]
    pub collection: String,

    /// Refresh cadence in milliseconds.
    pub interval_ms: u64,
}

impl CounterSpec {
    /// Creates a new counter spec with the default refresh cadence.
    ///
    /// # Arguments
    ///
    /// * `subsystem` - The subsystem the counter belongs to
    /// * `name` - The gauge name exposed to scrapers
    /// * `help` - Static help text describing the gauge
    /// * `collection` - The collection whose documents are counted
    #[must_use]
    pub fn new(
        subsystem: Subsystem,
        name: impl Into<String>,
        help: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            subsystem,
            name: name.into(),
            help: help.into(),
            collection: collection.into(),
            interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
        }
    }

    /// Sets the refresh cadence in milliseconds.
    #[must_use]
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Returns the refresh cadence as a `Duration`.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Validates the counter spec.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The gauge name or help text is empty
    /// - The collection name is not a plain identifier
    /// - The refresh interval is zero
    pub fn validate_spec(&self) -> Result<(), CounterSpecError> {
        if self.name.is_empty() {
            return Err(CounterSpecError::EmptyName);
        }

        // Collection names end up in a query verbatim, so they must be
        // identifiers rather than arbitrary strings.
        if !is_identifier(&self.collection) {
            return Err(CounterSpecError::InvalidCollection(self.collection.clone()));
        }

        if self.interval_ms == 0 {
            return Err(CounterSpecError::ZeroInterval);
        }

        self.validate()?;
        Ok(())
    }
}

/// Returns the default counter set: both subsystems' counters, in a stable
/// order.
///
/// # Examples
///
/// ```
/// use shared::config::default_counter_specs;
///
/// let specs = default_counter_specs();
/// assert_eq!(specs.len(), 4);
/// ```
#[must_use]
pub fn default_counter_specs() -> Vec<CounterSpec> {
    [Subsystem::Items, Subsystem::Discounts]
        .into_iter()
        .flat_map(Subsystem::default_specs)
        .collect()
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
