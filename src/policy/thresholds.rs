//! Threshold tables mapping a metric onto `Banned`, `Degraded` or `Active`.

use crate::core::StatusValue;

/// One edge of a threshold table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Holds when the metric is strictly below the value.
    Below(f64),
    /// Holds when the metric is below or equal to the value.
    AtMost(f64),
}

impl Bound {
    /// Returns `true` if `metric` falls on the bad side of this bound.
    pub fn holds(self, metric: f64) -> bool {
        match self {
            Self::Below(limit) => metric < limit,
            Self::AtMost(limit) => metric <= limit,
        }
    }
}

/// A two-edge threshold table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdTable {
    /// Metrics on the bad side of this bound are `Banned`.
    pub banned: Bound,
    /// Metrics on the bad side of this bound (and not banned) are `Degraded`.
    pub degraded: Bound,
}

impl ThresholdTable {
    /// Creates a table.
    pub const fn new(banned: Bound, degraded: Bound) -> Self {
        Self { banned, degraded }
    }

    /// Maps a metric to a status.
    pub fn classify(&self, metric: f64) -> StatusValue {
        if self.banned.holds(metric) {
            StatusValue::Banned
        } else if self.degraded.holds(metric) {
            StatusValue::Degraded
        } else {
            StatusValue::Active
        }
    }
}
