//! Periodic counter publication.
//!
//! The publisher pairs gauge specs with count sources and keeps each gauge
//! updated from its own background task: refresh immediately on start, then
//! on a fixed per-counter interval. Query failures are logged and counted
//! but never stop a schedule; the gauge simply keeps its previous value
//! until a later cycle succeeds.

pub mod counter;
pub mod scheduler;

pub use counter::CollectionCounter;
pub use scheduler::{CounterPublisher, PublisherError, PublisherHandle};
