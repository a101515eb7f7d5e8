//! Unified error types for the relay controller firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! command boundary's error handling uniform.  All variants are `Copy` so
//! they can be handed across the scheduler, cycle tasks and HTTP handlers
//! without allocation.

use core::fmt;

use crate::app::relay::RelayId;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible relay operation funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The raw relay id is outside the configured set.
    UnknownRelay(i64),
    /// A cycle duration was rejected by validation.
    InvalidDuration(DurationError),
    /// The output driver failed to apply a level.
    HardwareWriteFailure(RelayId),
    /// The cycle task thread could not be created.
    TaskSpawn(RelayId),
    /// Configuration is invalid.
    Config(&'static str),
}

impl Error {
    /// True for rejections caused by the caller's parameters, as opposed
    /// to device-side failures.
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::UnknownRelay(_) | Self::InvalidDuration(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownRelay(raw) => write!(f, "no such relay: {raw}"),
            Self::InvalidDuration(e) => write!(f, "invalid duration: {e}"),
            Self::HardwareWriteFailure(relay) => write!(f, "output write failed on {relay}"),
            Self::TaskSpawn(relay) => write!(f, "could not start cycle task for {relay}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Duration validation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationError {
    /// A phase length below zero.
    Negative,
    /// Both phases are zero; the cycle would spin without ever waiting.
    BothZero,
    /// A phase exceeds the configured maximum.
    TooLong { max_ms: u64 },
}

impl fmt::Display for DurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative => write!(f, "duration must not be negative"),
            Self::BothZero => write!(f, "on and off durations cannot both be zero"),
            Self::TooLong { max_ms } => write!(f, "duration exceeds {max_ms} ms"),
        }
    }
}

impl From<DurationError> for Error {
    fn from(e: DurationError) -> Self {
        Self::InvalidDuration(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
