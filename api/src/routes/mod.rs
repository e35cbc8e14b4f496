//! API route definitions.
//!
//! This module organizes the HTTP surface of the service: the health check
//! and the Prometheus scrape endpoint.

mod health;
mod metrics;

pub use health::health_routes;
pub use metrics::metrics_routes;
