//! Incident severities and per-session counters

use serde::{Deserialize, Serialize};
use std::fmt;

/// Incident severity, named after the penalty points it adds to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentSeverity {
    /// Off track ("1x")
    Low,
    /// Spin or loss of control ("2x"). Not observable in the F1 2019 feed.
    Medium,
    /// Collision ("4x")
    High,
}

impl IncidentSeverity {
    pub const ALL: [IncidentSeverity; 3] =
        [IncidentSeverity::Low, IncidentSeverity::Medium, IncidentSeverity::High];

    /// Weight added to the current corner's accumulator.
    pub const fn weight(self) -> u32 {
        match self {
            IncidentSeverity::Low => 1,
            IncidentSeverity::Medium => 2,
            IncidentSeverity::High => 4,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            IncidentSeverity::Low => "1x",
            IncidentSeverity::Medium => "2x",
            IncidentSeverity::High => "4x",
        }
    }
}

impl fmt::Display for IncidentSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A detected incident.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub severity: IncidentSeverity,
    /// Lap the player was on when the incident was detected
    pub lap: u8,
    /// Game clock at detection
    pub session_time: f32,
}

/// Incident counts for the current session, by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentCounts {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
}

impl IncidentCounts {
    pub fn record(&mut self, severity: IncidentSeverity) {
        match severity {
            IncidentSeverity::Low => self.low += 1,
            IncidentSeverity::Medium => self.medium += 1,
            IncidentSeverity::High => self.high += 1,
        }
    }

    pub fn get(&self, severity: IncidentSeverity) -> u32 {
        match severity {
            IncidentSeverity::Low => self.low,
            IncidentSeverity::Medium => self.medium,
            IncidentSeverity::High => self.high,
        }
    }

    /// Number of incidents, regardless of severity.
    pub fn total(&self) -> u32 {
        self.low + self.medium + self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_and_labels() {
        let weights: Vec<_> = IncidentSeverity::ALL.iter().map(|s| s.weight()).collect();
        assert_eq!(weights, vec![1, 2, 4]);
        assert_eq!(IncidentSeverity::High.to_string(), "4x");
    }

    #[test]
    fn total_counts_incidents_not_weight() {
        let mut counts = IncidentCounts::default();
        counts.record(IncidentSeverity::Low);
        counts.record(IncidentSeverity::High);
        counts.record(IncidentSeverity::High);

        assert_eq!(counts.total(), 3);
        assert_eq!(counts.get(IncidentSeverity::High), 2);
        assert_eq!(counts.medium, 0);
    }
}
