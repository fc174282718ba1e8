//! Pointer-move sampling policy.
//!
//! Hit testing runs on every pointer move during a drag; uncapped, that is
//! a full tree traversal per input event. The sampler bounds the rate to
//! one processed position per interval (one animation frame by default):
//! the first event in a window passes through, faster events are coalesced
//! into a single pending slot holding the most recent position, and the
//! pending position is drained on the trailing edge once the window
//! expires. Time is an explicit argument — no internal clock.

use std::time::{Duration, Instant};

/// One animation frame at 60 Hz.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug)]
pub struct PointerSampler {
    interval: Duration,
    last_emit: Option<Instant>,
    pending: Option<(f32, f32)>,
}

impl PointerSampler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            pending: None,
        }
    }

    /// Submit a pointer position. Returns the position to process now, or
    /// `None` when it was coalesced into the pending slot.
    pub fn offer(&mut self, x: f32, y: f32, now: Instant) -> Option<(f32, f32)> {
        match self.last_emit {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                self.pending = Some((x, y));
                None
            }
            _ => {
                self.last_emit = Some(now);
                self.pending = None;
                Some((x, y))
            }
        }
    }

    /// Drain the coalesced position once the sampling window has expired.
    pub fn take_pending(&mut self, now: Instant) -> Option<(f32, f32)> {
        let elapsed = self
            .last_emit
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if !elapsed {
            return None;
        }
        let pending = self.pending.take()?;
        self.last_emit = Some(now);
        Some(pending)
    }

    /// Whether a coalesced position is waiting for the trailing edge.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn reset(&mut self) {
        self.last_emit = None;
        self.pending = None;
    }
}

impl Default for PointerSampler {
    fn default() -> Self {
        Self::new(FRAME_INTERVAL)
    }
}
