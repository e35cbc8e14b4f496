//! Application state module.
//!
//! Contains shared state accessible to all request handlers.

use shared::registry::GaugeRegistry;
use std::sync::Arc;

/// Application state shared across all request handlers.
///
/// The counter publisher writes into the same registry the scrape endpoint
/// reads, so a clone of this state is all a handler needs.
#[derive(Clone)]
pub struct AppState {
    registry: Arc<GaugeRegistry>,
}

impl AppState {
    /// Create application state around an existing registry.
    pub fn new(registry: Arc<GaugeRegistry>) -> Self {
        Self { registry }
    }

    /// Create application state with a fresh, empty registry.
    ///
    /// This is useful for testing.
    #[must_use]
    pub fn with_fresh_registry() -> Self {
        Self::new(Arc::new(GaugeRegistry::new()))
    }

    /// The gauge registry the scrape endpoint encodes.
    #[must_use]
    pub fn registry(&self) -> &Arc<GaugeRegistry> {
        &self.registry
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_fresh_registry()
    }
}
