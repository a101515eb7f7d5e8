//! Relay pin bank — bridges `embedded-hal` output pins to [`OutputPort`].
//!
//! Owns one output pin per relay, each behind its own mutex so writes to
//! different relays never contend.  On ESP-IDF the pins are
//! `PinDriver<AnyOutputPin, Output>`; host tests plug in any other
//! [`OutputPin`] implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use embedded_hal::digital::{Error as _, OutputPin, PinState};
use log::warn;

use crate::app::ports::OutputPort;
use crate::app::relay::{RELAY_COUNT, RelayId};
use crate::error::{Error, Result};

/// Concrete adapter that owns every relay output pin.
pub struct PinBank<P> {
    pins: [Mutex<P>; RELAY_COUNT],
    /// Last level successfully written per relay.
    levels: [AtomicBool; RELAY_COUNT],
}

impl<P: OutputPin> PinBank<P> {
    /// Take ownership of the relay pins, ordered relay 1 → relay N, and
    /// drive them all low.  Fails if any pin rejects the initial write.
    pub fn new(pins: [P; RELAY_COUNT]) -> Result<Self> {
        let bank = Self {
            pins: pins.map(Mutex::new),
            levels: Default::default(),
        };
        for relay in RelayId::ALL {
            bank.write(relay, false)?;
        }
        Ok(bank)
    }

    /// Last level written to `relay`.
    pub fn is_high(&self, relay: RelayId) -> bool {
        self.levels[relay.index()].load(Ordering::Acquire)
    }

    fn write(&self, relay: RelayId, high: bool) -> Result<()> {
        let mut pin = self.pins[relay.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        pin.set_state(PinState::from(high)).map_err(|e| {
            warn!("{} (GPIO {}): driver error {:?}", relay, relay.gpio(), e.kind());
            Error::HardwareWriteFailure(relay)
        })?;
        self.levels[relay.index()].store(high, Ordering::Release);
        Ok(())
    }
}

impl<P: OutputPin + Send> OutputPort for PinBank<P> {
    fn set_level(&self, relay: RelayId, high: bool) -> Result<()> {
        self.write(relay, high)
    }
}
