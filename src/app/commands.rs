//! Inbound commands to the relay scheduler.
//!
//! These represent actions requested by the outside world (HTTP handlers
//! today) that [`RelayScheduler::execute`](crate::scheduler::RelayScheduler::execute)
//! interprets and acts upon.

use super::relay::{CycleSpec, RelayId};

/// Commands that transport adapters can send into the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCommand {
    /// Stop any cycle and drive the relay high.
    TurnOn(RelayId),
    /// Stop any cycle and drive the relay low.
    TurnOff(RelayId),
    /// Replace any cycle on the relay with a new one.
    StartCycle(CycleSpec),
    /// Cancel the relay's cycle (if any) and leave it low.
    Stop(RelayId),
}

impl RelayCommand {
    /// The relay this command targets.
    pub fn relay(&self) -> RelayId {
        match self {
            Self::TurnOn(r) | Self::TurnOff(r) | Self::Stop(r) => *r,
            Self::StartCycle(spec) => spec.relay,
        }
    }

    /// Human-readable acknowledgement sent back to the client.
    pub fn ack(&self) -> &'static str {
        match self {
            Self::TurnOn(_) => "Pump turned on",
            Self::TurnOff(_) => "Pump turned off",
            Self::StartCycle(_) => "Timer set",
            Self::Stop(_) => "Timer stopped",
        }
    }
}
