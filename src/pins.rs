//! GPIO pin assignments for the relay board.
//!
//! Single source of truth for relay wiring.  `main` takes the matching
//! peripherals and [`RelayId::gpio`](crate::app::relay::RelayId::gpio)
//! reports these numbers in logs and status output.

// ---------------------------------------------------------------------------
// Relay outputs (active HIGH, driven LOW at boot)
// ---------------------------------------------------------------------------

/// Relay 1 — pump / valve channel 1.
pub const RELAY1_GPIO: i32 = 23;
/// Relay 2 — pump / valve channel 2.
pub const RELAY2_GPIO: i32 = 22;
/// Relay 3 — pump / valve channel 3.
pub const RELAY3_GPIO: i32 = 21;
