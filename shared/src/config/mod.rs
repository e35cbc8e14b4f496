//! Configuration module for Tallyvane.
//!
//! This module contains the counter specifications that drive the periodic
//! count publisher and the default set shipped with the service.

pub mod counters;

pub use counters::{
    default_counter_specs, CounterSpec, CounterSpecError, Subsystem, DEFAULT_REFRESH_INTERVAL_MS,
};
