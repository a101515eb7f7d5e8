//! Mock relay outputs for integration tests.
//!
//! Records every `set_level` call with the time it happened so tests can
//! assert on the full write history, phase lengths included, without
//! touching real GPIO registers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use pumpctl::app::ports::OutputPort;
use pumpctl::app::relay::{RELAY_COUNT, RelayId};
use pumpctl::config::SystemConfig;
use pumpctl::scheduler::{RelayScheduler, SchedulerLimits};
use pumpctl::{Error, Result};

// ── Write record ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelWrite {
    pub relay: RelayId,
    pub high: bool,
    pub at: Duration,
}

// ── RecordingPort ─────────────────────────────────────────────

pub struct RecordingPort {
    start: Instant,
    writes: Mutex<Vec<LevelWrite>>,
    failing: [AtomicBool; RELAY_COUNT],
}

#[allow(dead_code)]
impl RecordingPort {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            writes: Mutex::new(Vec::new()),
            failing: Default::default(),
        }
    }

    /// Make every write to `relay` fail (or succeed again).
    pub fn set_failing(&self, relay: RelayId, failing: bool) {
        self.failing[relay.index()].store(failing, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<LevelWrite> {
        self.writes.lock().unwrap().clone()
    }

    pub fn writes_for(&self, relay: RelayId) -> Vec<LevelWrite> {
        self.writes()
            .into_iter()
            .filter(|w| w.relay == relay)
            .collect()
    }

    /// Writes to `relay` that changed its level, starting from low.
    pub fn transitions_for(&self, relay: RelayId) -> Vec<LevelWrite> {
        let mut level = false;
        self.writes_for(relay)
            .into_iter()
            .filter(|w| {
                let changed = w.high != level;
                level = w.high;
                changed
            })
            .collect()
    }

    /// Level last written to `relay` (low if never written).
    pub fn level(&self, relay: RelayId) -> bool {
        self.writes_for(relay).last().is_some_and(|w| w.high)
    }

    pub fn write_count(&self, relay: RelayId) -> usize {
        self.writes_for(relay).len()
    }
}

impl OutputPort for RecordingPort {
    fn set_level(&self, relay: RelayId, high: bool) -> Result<()> {
        let at = self.start.elapsed();
        // Failed writes are recorded too; they are still attempts.
        self.writes
            .lock()
            .unwrap()
            .push(LevelWrite { relay, high, at });
        if self.failing[relay.index()].load(Ordering::SeqCst) {
            return Err(Error::HardwareWriteFailure(relay));
        }
        Ok(())
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub fn make_scheduler() -> (Arc<RecordingPort>, RelayScheduler<RecordingPort>) {
    let port = Arc::new(RecordingPort::new());
    let limits = SchedulerLimits::from(&SystemConfig::default());
    (port.clone(), RelayScheduler::new(port, limits))
}
