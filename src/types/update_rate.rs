//! Update rate control for snapshot subscriptions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How often a subscriber wants to see tracker snapshots.
///
/// Snapshots are published once per decoded datagram, which follows the game's
/// send rate. Overlays typically want a fixed lower rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UpdateRate {
    /// Every published snapshot
    Native,

    /// At most this many snapshots per second, latest wins.
    /// A rate at or above the packet rate collapses to Native.
    Max(u32),
}

impl UpdateRate {
    /// Normalize against the expected packet rate.
    pub fn normalize(self, packet_hz: f64) -> Self {
        match self {
            UpdateRate::Native => UpdateRate::Native,
            UpdateRate::Max(0) => UpdateRate::Native,
            UpdateRate::Max(hz) if hz as f64 >= packet_hz => UpdateRate::Native,
            UpdateRate::Max(hz) => UpdateRate::Max(hz),
        }
    }

    /// Throttle interval, if one is needed at this packet rate.
    pub fn throttle_interval(self, packet_hz: f64) -> Option<Duration> {
        match self.normalize(packet_hz) {
            UpdateRate::Native => None,
            UpdateRate::Max(hz) => Some(Duration::from_secs_f64(1.0 / hz as f64)),
        }
    }
}
