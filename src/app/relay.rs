//! Relay identity and duty-cycle parameters.

use core::fmt;
use core::time::Duration;

use serde::Serialize;

use crate::error::{DurationError, Error, Result};
use crate::pins;

/// Number of relays wired on the board.
pub const RELAY_COUNT: usize = 3;

/// One of the board's relay channels.
///
/// Raw ids from the network are 1-based (`/on1` … `/on3`); anything else
/// is rejected with [`Error::UnknownRelay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u8")]
pub enum RelayId {
    Relay1,
    Relay2,
    Relay3,
}

impl RelayId {
    pub const ALL: [RelayId; RELAY_COUNT] = [Self::Relay1, Self::Relay2, Self::Relay3];

    /// Parse a raw 1-based id.
    pub fn from_raw(raw: i64) -> Result<Self> {
        match raw {
            1 => Ok(Self::Relay1),
            2 => Ok(Self::Relay2),
            3 => Ok(Self::Relay3),
            other => Err(Error::UnknownRelay(other)),
        }
    }

    /// The 1-based id used on the wire.
    pub const fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    /// Zero-based slot index.
    pub const fn index(self) -> usize {
        match self {
            Self::Relay1 => 0,
            Self::Relay2 => 1,
            Self::Relay3 => 2,
        }
    }

    /// GPIO driving this relay.
    pub const fn gpio(self) -> i32 {
        match self {
            Self::Relay1 => pins::RELAY1_GPIO,
            Self::Relay2 => pins::RELAY2_GPIO,
            Self::Relay3 => pins::RELAY3_GPIO,
        }
    }

    /// Null-terminated FreeRTOS task name for this relay's cycle task.
    pub const fn task_name(self) -> &'static str {
        match self {
            Self::Relay1 => "relay1-cycle\0",
            Self::Relay2 => "relay2-cycle\0",
            Self::Relay3 => "relay3-cycle\0",
        }
    }
}

impl From<RelayId> for u8 {
    fn from(id: RelayId) -> Self {
        id.number()
    }
}

impl fmt::Display for RelayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "relay {}", self.number())
    }
}

/// A requested repeating cycle: `on_duration` high, `off_interval` low.
///
/// A zero phase is skipped (no wait, no write).  Both phases zero is
/// rejected, as is any phase above the configured maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSpec {
    pub relay: RelayId,
    pub on_duration: Duration,
    pub off_interval: Duration,
}

impl CycleSpec {
    /// Build and validate a spec from raw millisecond values as they
    /// arrive from the transport.
    pub fn from_millis(relay: RelayId, on_ms: i64, off_ms: i64, max_phase_ms: u64) -> Result<Self> {
        let on = phase_ms(on_ms, max_phase_ms)?;
        let off = phase_ms(off_ms, max_phase_ms)?;
        if on == 0 && off == 0 {
            return Err(DurationError::BothZero.into());
        }
        Ok(Self {
            relay,
            on_duration: Duration::from_millis(on),
            off_interval: Duration::from_millis(off),
        })
    }

    /// Re-check an already-built spec against the configured limits.
    pub fn validate(&self, max_phase_ms: u64) -> Result<()> {
        let max = Duration::from_millis(max_phase_ms);
        if self.on_duration > max || self.off_interval > max {
            return Err(DurationError::TooLong { max_ms: max_phase_ms }.into());
        }
        if self.on_duration.is_zero() && self.off_interval.is_zero() {
            return Err(DurationError::BothZero.into());
        }
        Ok(())
    }

    pub fn on_ms(&self) -> u64 {
        self.on_duration.as_millis() as u64
    }

    pub fn off_ms(&self) -> u64 {
        self.off_interval.as_millis() as u64
    }
}

fn phase_ms(raw: i64, max_phase_ms: u64) -> core::result::Result<u64, DurationError> {
    let ms = u64::try_from(raw).map_err(|_| DurationError::Negative)?;
    if ms > max_phase_ms {
        return Err(DurationError::TooLong { max_ms: max_phase_ms });
    }
    Ok(ms)
}
