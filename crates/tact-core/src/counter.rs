use serde::{Deserialize, Serialize};

/// Counter-with-threshold driven by a periodic tick.
///
/// Used two ways:
/// - as a window ("active for the first N ticks after `reset`"), which is the
///   tactile engine's movement boost;
/// - as a divider ("true on every Nth tick"), which is the zone engine's
///   ambient pulse on its 25Hz base timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountedTick {
    count: u32,
    threshold: u32,
}

impl CountedTick {
    /// A counter whose window starts closed.
    pub const fn expired(threshold: u32) -> Self {
        Self {
            count: threshold,
            threshold,
        }
    }

    /// A counter starting at zero.
    pub const fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold,
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn expire(&mut self) {
        self.count = self.threshold;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// True while fewer than `threshold` ticks have passed since `reset`.
    pub fn within_window(&self) -> bool {
        self.count < self.threshold
    }

    /// Count one tick (saturating).
    pub fn advance(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    /// Count one tick; true when the count lands on a multiple of the threshold.
    pub fn advance_periodic(&mut self) -> bool {
        self.advance();
        self.threshold != 0 && self.count % self.threshold == 0
    }
}
