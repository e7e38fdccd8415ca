//! Inactivity Timeout
//!
//! Tracks the time of the last complete command and reports when the peer has
//! been silent for longer than the configured timeout. After firing, the
//! activity clock restarts, so a silent peer triggers at most one stop per
//! timeout interval.

/// Idle-stop policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityMonitor {
    /// Timeout in ms (0 disables)
    timeout_ms: u64,
    /// Clock time of the last recorded activity
    last_activity: u64,
}

impl ActivityMonitor {
    /// Create a monitor whose activity clock starts at `now`
    pub fn new(timeout_ms: u64, now: u64) -> Self {
        ActivityMonitor {
            timeout_ms,
            last_activity: now,
        }
    }

    /// Record a completed command at `now`
    pub fn record(&mut self, now: u64) {
        self.last_activity = now;
    }

    /// Check the timeout.
    ///
    /// Returns `true` exactly when the output should be stopped: the timeout is
    /// enabled and strictly more than `timeout_ms` has passed since the last
    /// activity. The activity clock is reset when it fires.
    pub fn poll(&mut self, now: u64) -> bool {
        if self.timeout_ms == 0 || now.saturating_sub(self.last_activity) <= self.timeout_ms {
            return false;
        }
        self.last_activity = now;
        true
    }

    /// Check if the timeout is enabled
    pub fn is_enabled(&self) -> bool {
        self.timeout_ms > 0
    }

    /// Configured timeout in ms
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Clock time of the last activity
    pub fn last_activity(&self) -> u64 {
        self.last_activity
    }
}
