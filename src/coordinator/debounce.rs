/// Quiet period before an edit triggers reconciliation.
pub const MARKER_UPDATE_DELAY_MS: u64 = 100;

/// Trailing-edge debounce over explicit millisecond timestamps.
///
/// At most one trigger is pending; queueing again restarts the quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay_ms: u64,
    pending: Option<u64>,
}

impl Debouncer {
    pub const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub const fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub const fn queue(&mut self, now_ms: u64) {
        self.pending = Some(now_ms);
    }

    /// True once the quiet period has elapsed; clears the trigger.
    pub fn take_ready(&mut self, now_ms: u64) -> bool {
        let Some(queued_at) = self.pending else {
            return false;
        };
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Clear the trigger regardless of time. Returns whether one was pending.
    pub const fn take_pending(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub const fn cancel(&mut self) {
        self.pending = None;
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(MARKER_UPDATE_DELAY_MS)
    }
}
