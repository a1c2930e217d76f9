// Epoch - Discrete intervals over which one shared random value is collected
use serde::{Deserialize, Serialize};

/// Maps wall-clock time to epoch numbers from a network start point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EpochSchedule {
    /// Unix timestamp the network started at (epoch 0 begins here)
    pub initial_timestamp: i64,

    /// Epoch length in seconds
    pub epoch_interval: i64,
}

impl EpochSchedule {
    pub fn new(initial_timestamp: i64, epoch_interval: i64) -> Self {
        Self {
            initial_timestamp,
            epoch_interval: epoch_interval.max(1),
        }
    }

    /// Epoch containing the given timestamp; clamped at 0 before start.
    pub fn epoch_at(&self, timestamp: i64) -> i64 {
        if timestamp <= self.initial_timestamp {
            return 0;
        }
        (timestamp - self.initial_timestamp) / self.epoch_interval
    }

    /// Epoch containing the current wall-clock time.
    pub fn current_epoch(&self) -> i64 {
        self.epoch_at(chrono::Utc::now().timestamp())
    }
}
