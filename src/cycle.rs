//! Duty-cycle task — one repeating on/off loop bound to a single relay.
//!
//! Each task runs on its own core-pinned thread.  Inside the thread a
//! `futures-lite` block-on drives the phase loop, and every phase wait
//! races an `async-io-mini` timer against an `embassy-sync` cancellation
//! [`Signal`], so a cancel takes effect immediately instead of after the
//! remaining phase.
//!
//! ```text
//!   Start ──▶ ON ──(on_duration)──▶ OFF ──(off_interval)──▶ ON ...
//!              │                     │
//!              └──── cancel ─────────┴──▶ Stopped (output LOW)
//! ```

use core::time::Duration;
use std::sync::Arc;
use std::thread::JoinHandle;

use async_io_mini::Timer;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::{debug, info, warn};

use crate::app::ports::OutputPort;
use crate::app::relay::CycleSpec;
use crate::drivers::task_pin::{self, Core};
use crate::error::{Error, Result};

/// Cancellation signal shared between the scheduler and one task.
type CancelSignal = Signal<CriticalSectionRawMutex, ()>;

/// Phase of a running cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    On,
    Off,
}

/// Why a phase wait returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Elapsed,
    Cancelled,
}

/// Thread parameters for cycle tasks.
#[derive(Debug, Clone, Copy)]
pub struct TaskOptions {
    pub priority: u8,
    pub stack_kb: usize,
}

// ───────────────────────────────────────────────────────────────
// CycleHandle — the scheduler's owned reference to a running task
// ───────────────────────────────────────────────────────────────

/// Owned handle to a running cycle task.
///
/// Dropping the handle cancels the task and waits for it to exit, so a
/// handle can never outlive its task and leave it running unmanaged.
pub struct CycleHandle {
    spec: CycleSpec,
    cancel: Arc<CancelSignal>,
    thread: Option<JoinHandle<()>>,
}

impl CycleHandle {
    /// Start a task for `spec` on the application core.
    pub fn spawn<P: OutputPort + 'static>(
        spec: CycleSpec,
        port: Arc<P>,
        options: TaskOptions,
    ) -> Result<Self> {
        let cancel = Arc::new(CancelSignal::new());
        let task = CycleTask {
            spec,
            port,
            cancel: cancel.clone(),
            phase: Phase::On,
        };

        let thread = task_pin::spawn_on_core(
            Core::App,
            options.priority,
            options.stack_kb,
            spec.relay.task_name(),
            move || future::block_on(task.run()),
        )
        .map_err(|e| {
            log::error!("{}: cycle task spawn failed: {}", spec.relay, e);
            Error::TaskSpawn(spec.relay)
        })?;

        Ok(Self {
            spec,
            cancel,
            thread: Some(thread),
        })
    }

    pub fn spec(&self) -> CycleSpec {
        self.spec
    }

    /// Whether the task thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Signal cancellation and block until the task has driven its
    /// output low and exited.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        self.cancel.signal(());
        if thread.join().is_err() {
            warn!("{}: cycle task panicked before stopping", self.spec.relay);
        }
    }
}

impl Drop for CycleHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ───────────────────────────────────────────────────────────────
// CycleTask — the loop itself
// ───────────────────────────────────────────────────────────────

struct CycleTask<P> {
    spec: CycleSpec,
    port: Arc<P>,
    cancel: Arc<CancelSignal>,
    phase: Phase,
}

impl<P: OutputPort> CycleTask<P> {
    async fn run(mut self) {
        let relay = self.spec.relay;
        info!(
            "{}: cycle started (on={}ms, off={}ms)",
            relay,
            self.spec.on_ms(),
            self.spec.off_ms()
        );

        loop {
            let (level, length) = match self.phase {
                Phase::On => (true, self.spec.on_duration),
                Phase::Off => (false, self.spec.off_interval),
            };

            // Zero-length phases are skipped outright: no write, no wait.
            if length.is_zero() {
                if self.cancel.signaled() {
                    break;
                }
            } else {
                self.write(level);
                if self.wait(length).await == Wake::Cancelled {
                    break;
                }
            }

            self.phase = match self.phase {
                Phase::On => Phase::Off,
                Phase::Off => Phase::On,
            };
        }

        // Stopped: the output is always left low.
        if let Err(e) = self.port.set_level(relay, false) {
            warn!("{}: final LOW write failed: {}", relay, e);
        }
        info!("{}: cycle stopped in {:?} phase", relay, self.phase);
    }

    /// Wait `length` or until cancelled, whichever comes first.
    async fn wait(&self, length: Duration) -> Wake {
        // `or` polls the cancel arm first, so a cancel that lands on the
        // same tick as the timer still wins.
        future::or(
            async {
                self.cancel.wait().await;
                Wake::Cancelled
            },
            async {
                Timer::after(length).await;
                Wake::Elapsed
            },
        )
        .await
    }

    fn write(&self, high: bool) {
        let relay = self.spec.relay;
        match self.port.set_level(relay, high) {
            Ok(()) => debug!("{}: {}", relay, if high { "ON" } else { "OFF" }),
            // The level is now unknown; the next phase boundary retries.
            Err(e) => warn!("{}: {} (cycle continues)", relay, e),
        }
    }
}
