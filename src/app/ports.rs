//! Port traits — the hexagonal boundary between the scheduler and hardware.
//!
//! ```text
//!   RelayScheduler ──▶ OutputPort ◀── PinBank (adapter)
//!        │
//!        └─▶ CycleTask ──▶ OutputPort
//! ```
//!
//! The scheduler and its cycle tasks share one port instance across
//! threads, so the trait takes `&self` and requires `Send + Sync`.

use super::relay::RelayId;
use crate::error::Result;

// ───────────────────────────────────────────────────────────────
// Output port (driven adapter: domain → relay GPIO)
// ───────────────────────────────────────────────────────────────

/// Write-side port: sets a relay's logic level.
///
/// Calls for different relays may run concurrently and must not contend.
/// Calls for the same relay are serialized by the scheduler, which allows
/// at most one writer per relay at any instant.
pub trait OutputPort: Send + Sync {
    /// Drive `relay` high (`true`) or low (`false`).
    ///
    /// Returns [`Error::HardwareWriteFailure`](crate::error::Error::HardwareWriteFailure)
    /// when the driver rejects the write; the physical level is then unknown.
    fn set_level(&self, relay: RelayId, high: bool) -> Result<()>;
}

impl<P: OutputPort + ?Sized> OutputPort for std::sync::Arc<P> {
    fn set_level(&self, relay: RelayId, high: bool) -> Result<()> {
        (**self).set_level(relay, high)
    }
}
