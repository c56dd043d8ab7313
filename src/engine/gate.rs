// src/engine/gate.rs

use tracing::debug;

/// Serializes build/restart cycles.
///
/// Semantics:
/// - At most one cycle is in flight at any time.
/// - Triggers that arrive while a cycle is in flight are not dropped; they
///   set a single pending flag. However many arrive, they amount to exactly
///   one follow-up cycle once the current one finishes.
///
/// This is the queue-of-length-one policy: the pending slot holds "rebuild
/// again", never a count.
#[derive(Debug, Default)]
pub struct TriggerGate {
    in_flight: bool,
    pending: bool,
}

impl TriggerGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a cycle is running.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// True if a follow-up cycle has been queued.
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Offer a trigger to the gate.
    ///
    /// Returns `true` if the caller should start a cycle now. Otherwise the
    /// trigger has been folded into the pending slot.
    pub fn try_begin(&mut self) -> bool {
        if self.in_flight {
            if !self.pending {
                debug!("cycle in flight; queueing one follow-up");
            }
            self.pending = true;
            return false;
        }

        self.in_flight = true;
        true
    }

    /// Mark the current cycle finished.
    ///
    /// Returns `true` if a follow-up was pending; the gate then stays in
    /// flight and the caller must run that cycle.
    pub fn finish(&mut self) -> bool {
        if self.pending {
            self.pending = false;
            debug!("starting queued follow-up cycle");
            return true;
        }

        self.in_flight = false;
        false
    }
}
