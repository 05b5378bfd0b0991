//! Per-corner damage magnitudes

use serde::{Deserialize, Serialize};

/// Damage magnitudes for the four corners of the car.
///
/// The F1 2019 damage packet only reports wing damage, so the rear wing value
/// stands in for both rear corners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageVector {
    pub front_left: f32,
    pub front_right: f32,
    pub rear_left: f32,
    pub rear_right: f32,
}

impl DamageVector {
    /// Build a damage vector from the three wing damage bytes.
    pub fn from_wings(front_left: u8, front_right: u8, rear: u8) -> Self {
        Self {
            front_left: f32::from(front_left),
            front_right: f32::from(front_right),
            rear_left: f32::from(rear),
            rear_right: f32::from(rear),
        }
    }

    /// Channels in front-left, front-right, rear-left, rear-right order.
    pub fn channels(&self) -> [f32; 4] {
        [self.front_left, self.front_right, self.rear_left, self.rear_right]
    }

    /// Total damage gained since `previous`.
    ///
    /// Repairs (decreases) on a channel count as zero, never as a negative
    /// contribution.
    pub fn increase_since(&self, previous: &DamageVector) -> f32 {
        self.channels()
            .iter()
            .zip(previous.channels().iter())
            .map(|(current, before)| (current - before).max(0.0))
            .sum()
    }
}
