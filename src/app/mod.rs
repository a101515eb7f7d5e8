//! Application core — relay identity, commands and the output port.
//!
//! Nothing in here touches hardware.  The scheduler and cycle tasks drive
//! relays only through [`ports::OutputPort`], keeping the core testable
//! without real peripherals.

pub mod commands;
pub mod ports;
pub mod relay;
