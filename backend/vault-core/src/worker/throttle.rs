//! Rate limiting for progress notifications crossing the thread boundary.

use std::time::{Duration, Instant};

/// Per-task throttle deciding which native progress callbacks become
/// [`Progress`] messages.
///
/// The first step (`current == 1`) and the terminal step
/// (`current == total`) are always emitted; everything in between is emitted
/// at most once per `min_interval`. Suppressed invocations produce no
/// message at all.
///
/// [`Progress`]: crate::protocol::ProtocolMessage::Progress
pub(crate) struct ProgressThrottle {
    min_interval: Duration,
    last_emit: Option<Instant>,
}

impl ProgressThrottle {
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_emit: None,
        }
    }

    /// Decide whether the callback invocation `(current, total)` should cross
    /// the thread boundary. Updates the emission timestamp on every `true`.
    pub(crate) fn should_emit(&mut self, current: u64, total: u64) -> bool {
        self.should_emit_at(Instant::now(), current, total)
    }

    // Split out for tests with explicit instants.
    pub(crate) fn should_emit_at(&mut self, now: Instant, current: u64, total: u64) -> bool {
        let forced = current == 1 || current == total;
        let interval_elapsed = self
            .last_emit
            .is_none_or(|last| now.duration_since(last) >= self.min_interval);

        if forced || interval_elapsed {
            self.last_emit = Some(now);
            true
        } else {
            false
        }
    }
}
