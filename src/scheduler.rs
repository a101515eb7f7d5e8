//! Relay scheduler — owns the per-relay slot table.
//!
//! Every relay has exactly one slot guarded by its own mutex.  A slot
//! holds the relay's commanded mode and at most one live
//! [`CycleHandle`].  All commands for a relay take that slot's lock, so
//! "cancel old, install new" is atomic with respect to other commands on
//! the same relay, while different relays never contend.
//!
//! ```text
//!  HTTP worker ──▶ RelayScheduler::execute(cmd)
//!                      │
//!        ┌─────────────┼──────────────┐
//!        ▼             ▼              ▼
//!   [slot 1]       [slot 2]       [slot 3]      (Mutex<Slot> each)
//!   CycleHandle    (none)         CycleHandle
//!        │                            │
//!        └──────────▶ OutputPort ◀────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{info, warn};
use serde::Serialize;

use crate::app::commands::RelayCommand;
use crate::app::ports::OutputPort;
use crate::app::relay::{CycleSpec, RELAY_COUNT, RelayId};
use crate::config::SystemConfig;
use crate::cycle::{CycleHandle, TaskOptions};
use crate::error::Result;

// ═══════════════════════════════════════════════════════════════
//  Status types
// ═══════════════════════════════════════════════════════════════

/// What the scheduler last commanded for a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayMode {
    /// Held low.
    Off,
    /// Held high by a manual command.
    On,
    /// A duty cycle is running.
    Cycling { on_ms: u64, off_ms: u64 },
    /// The last manual write failed; the physical level is not known.
    Unknown,
}

/// Point-in-time view of one relay, suitable for the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelayStatus {
    pub relay: RelayId,
    pub gpio: i32,
    pub mode: RelayMode,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// Limits applied to every accepted cycle.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerLimits {
    pub max_phase_ms: u64,
    pub task: TaskOptions,
}

impl From<&SystemConfig> for SchedulerLimits {
    fn from(config: &SystemConfig) -> Self {
        Self {
            max_phase_ms: config.max_phase_ms,
            task: TaskOptions {
                priority: config.cycle_task_priority,
                stack_kb: config.cycle_task_stack_kb,
            },
        }
    }
}

struct Slot {
    mode: RelayMode,
    task: Option<CycleHandle>,
}

impl Slot {
    /// Cancel the running cycle, if any, and wait for it to stop.
    fn cancel_cycle(&mut self, relay: RelayId) -> bool {
        match self.task.take() {
            Some(task) => {
                let spec = task.spec();
                info!(
                    "{}: cancelling cycle (on={}ms, off={}ms)",
                    relay,
                    spec.on_ms(),
                    spec.off_ms()
                );
                task.cancel();
                self.mode = RelayMode::Off;
                true
            }
            None => false,
        }
    }
}

/// Tracks one optional cycle task per relay and serves relay commands.
pub struct RelayScheduler<P: OutputPort + 'static> {
    port: Arc<P>,
    slots: [Mutex<Slot>; RELAY_COUNT],
    limits: SchedulerLimits,
}

impl<P: OutputPort + 'static> RelayScheduler<P> {
    /// Build a scheduler over `port`.  All relays start in [`RelayMode::Off`];
    /// the caller is expected to have driven the outputs low at boot.
    pub fn new(port: Arc<P>, limits: SchedulerLimits) -> Self {
        Self {
            port,
            slots: core::array::from_fn(|_| {
                Mutex::new(Slot {
                    mode: RelayMode::Off,
                    task: None,
                })
            }),
            limits,
        }
    }

    pub fn limits(&self) -> SchedulerLimits {
        self.limits
    }

    // ── Command interface ─────────────────────────────────────

    /// Dispatch a decoded transport command.
    pub fn execute(&self, cmd: RelayCommand) -> Result<()> {
        match cmd {
            RelayCommand::TurnOn(relay) => self.turn_on(relay),
            RelayCommand::TurnOff(relay) => self.turn_off(relay),
            RelayCommand::StartCycle(spec) => self.start_cycle(spec),
            RelayCommand::Stop(relay) => self.stop(relay),
        }
    }

    pub fn turn_on(&self, relay: RelayId) -> Result<()> {
        self.set_level(relay, true)
    }

    pub fn turn_off(&self, relay: RelayId) -> Result<()> {
        self.set_level(relay, false)
    }

    /// Manual override: stop any running cycle on `relay`, then drive it.
    pub fn set_level(&self, relay: RelayId, high: bool) -> Result<()> {
        let mut slot = self.slot(relay);
        info!("{}: set level {}", relay, if high { "HIGH" } else { "LOW" });
        slot.cancel_cycle(relay);
        self.write(&mut slot, relay, high)
    }

    /// Replace any cycle on the relay with a new one built from `spec`.
    ///
    /// The previous task is cancelled and joined before the new one is
    /// spawned, so two tasks never drive the same output.
    pub fn start_cycle(&self, spec: CycleSpec) -> Result<()> {
        spec.validate(self.limits.max_phase_ms)?;
        let relay = spec.relay;

        let mut slot = self.slot(relay);
        info!(
            "{}: start cycle (on={}ms, off={}ms)",
            relay,
            spec.on_ms(),
            spec.off_ms()
        );
        slot.cancel_cycle(relay);

        let task = CycleHandle::spawn(spec, self.port.clone(), self.limits.task)?;
        slot.task = Some(task);
        slot.mode = RelayMode::Cycling {
            on_ms: spec.on_ms(),
            off_ms: spec.off_ms(),
        };
        Ok(())
    }

    /// Cancel the relay's cycle, if any, and leave the output low.
    pub fn stop(&self, relay: RelayId) -> Result<()> {
        let mut slot = self.slot(relay);
        let had_cycle = slot.cancel_cycle(relay);
        info!("{}: stop (cycle was {})", relay, if had_cycle { "active" } else { "idle" });
        self.write(&mut slot, relay, false)
    }

    /// Stop every relay.  Failures are logged and the remaining relays
    /// are still stopped.
    pub fn shutdown(&self) {
        for relay in RelayId::ALL {
            if let Err(e) = self.stop(relay) {
                warn!("{}: shutdown stop failed: {}", relay, e);
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Snapshot of every relay's commanded mode.
    pub fn status(&self) -> [RelayStatus; RELAY_COUNT] {
        RelayId::ALL.map(|relay| RelayStatus {
            relay,
            gpio: relay.gpio(),
            mode: self.slot(relay).mode,
        })
    }

    pub fn mode(&self, relay: RelayId) -> RelayMode {
        self.slot(relay).mode
    }

    /// Whether a live cycle task is installed for `relay`.
    pub fn is_cycling(&self, relay: RelayId) -> bool {
        self.slot(relay)
            .task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Number of installed cycle tasks across all relays.
    pub fn active_cycles(&self) -> usize {
        RelayId::ALL.iter().filter(|r| self.is_cycling(**r)).count()
    }

    // ── Internal ──────────────────────────────────────────────

    fn slot(&self, relay: RelayId) -> MutexGuard<'_, Slot> {
        // The next command overwrites both fields, so a poisoned slot is usable.
        self.slots[relay.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, slot: &mut Slot, relay: RelayId, high: bool) -> Result<()> {
        match self.port.set_level(relay, high) {
            Ok(()) => {
                slot.mode = if high { RelayMode::On } else { RelayMode::Off };
                Ok(())
            }
            Err(e) => {
                warn!("{}: {}", relay, e);
                slot.mode = RelayMode::Unknown;
                Err(e)
            }
        }
    }
}
