//! Count-source abstraction.
//!
//! This module provides the one capability the publisher consumes from the
//! outside world: counting the documents currently in a named collection.
//! The `CountSource` trait abstracts over backends, with an in-memory
//! implementation for development and testing and a ClickHouse-backed one
//! for production.

pub mod count_source;

pub use count_source::{ClickHouseCountSource, CountSource, CountSourceError, InMemoryCountSource};
