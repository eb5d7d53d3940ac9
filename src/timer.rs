//! Auto-advance timer.

use std::time::Duration;

/// Opaque id of a scheduled one-shot callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// One-shot timers provided by the host event loop.
///
/// When a timer fires, the host reports its id back to the rotation
/// (see `RotatingText::fire`). A cleared timer must never be reported.
/// `set_timeout` returns `None` when the host could not schedule anything.
pub trait TimerHost {
    fn set_timeout(&mut self, delay: Duration) -> Option<TimerId>;
    fn clear_timeout(&mut self, id: TimerId);
}

/// Holds the single live auto-advance timer of a rotation.
///
/// Arming always clears the previous timer first, so at most one is ever
/// pending.
#[derive(Clone, Debug, Default)]
pub struct RotationTimer {
    pending: Option<TimerId>,
}

impl RotationTimer {
    /// Create a timer slot with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the pending timer, if any.
    #[inline]
    pub fn pending(&self) -> Option<TimerId> {
        self.pending
    }

    /// Replace any pending timer with a new one firing after `delay`.
    ///
    /// If the host fails to schedule, nothing is left pending.
    pub fn arm<H: TimerHost + ?Sized>(
        &mut self,
        host: &mut H,
        delay: Duration,
    ) -> Option<TimerId> {
        self.cancel(host);
        self.pending = host.set_timeout(delay);
        match self.pending {
            Some(id) => log::debug!("armed rotation timer {:?} for {:?}", id, delay),
            None => log::warn!("host could not schedule a timer, auto-advance stops"),
        }
        self.pending
    }

    /// Clear the pending timer. Returns true if one was live.
    pub fn cancel<H: TimerHost + ?Sized>(&mut self, host: &mut H) -> bool {
        match self.pending.take() {
            Some(id) => {
                host.clear_timeout(id);
                log::debug!("cancelled rotation timer {:?}", id);
                true
            }
            None => false,
        }
    }

    /// Consume a fired timer. Returns false for stale or unknown ids.
    pub fn fire(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            log::debug!("ignoring stale timer {:?}", id);
            false
        }
    }
}
