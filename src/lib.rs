//! pumpctl firmware library.
//!
//! Exposes the relay scheduler, cycle tasks and HTTP decoding for
//! integration testing.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod cycle;
pub mod error;
pub mod http;
pub mod pins;
pub mod scheduler;

pub mod adapters;
pub mod drivers;

pub use error::{DurationError, Error, Result};

// Host builds take the timer driver from `embassy-time`'s std backend.
#[cfg(not(target_os = "espidf"))]
use embassy_time as _;
