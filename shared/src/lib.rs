//! Tallyvane Shared Library
//!
//! This crate contains the domain types shared across the Tallyvane
//! collection-count publisher: counter specifications, the owned gauge
//! registry, and the count-source abstraction with its implementations.
//!
//! # Modules
//!
//! - [`config`] - Counter specifications and the default counter set
//! - [`registry`] - Owned Prometheus gauge registry and text encoding
//! - [`source`] - Count-source trait with in-memory and ClickHouse backends
//!
//! # Example
//!
//! ```
//! use shared::config::{CounterSpec, Subsystem};
//!
//! let spec = CounterSpec::new(
//!     Subsystem::Items,
//!     "items_total",
//!     "Total number of items",
//!     "items",
//! );
//!
//! assert!(spec.validate_spec().is_ok());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod registry;
pub mod source;

/// Re-export common dependencies for convenience.
pub use prometheus;
pub use serde;
pub use serde_json;
pub use validator;
