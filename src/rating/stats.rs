//! Rating statistics exposed to overlays and dashboards

use serde::Serialize;
use std::fmt;

use super::{IncidentCounts, LicenseTier};

/// Corners per incident for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Cpi {
    /// No incidents this session
    Infinite,
    Finite(f64),
}

impl Cpi {
    pub fn from_counts(corners: u32, incidents: u32) -> Self {
        if incidents == 0 {
            Cpi::Infinite
        } else {
            Cpi::Finite(f64::from(corners) / f64::from(incidents))
        }
    }

    /// Numeric value, `f64::INFINITY` when there were no incidents.
    pub fn value(self) -> f64 {
        match self {
            Cpi::Infinite => f64::INFINITY,
            Cpi::Finite(value) => value,
        }
    }

    pub fn is_infinite(self) -> bool {
        matches!(self, Cpi::Infinite)
    }
}

impl fmt::Display for Cpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cpi::Infinite => f.write_str("inf"),
            Cpi::Finite(value) => write!(f, "{:.1}", value),
        }
    }
}

/// Point-in-time view of the rating engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingStats {
    pub rating: f64,
    pub tier: LicenseTier,
    pub tier_name: &'static str,
    pub tier_color: &'static str,
    pub corners_completed: u32,
    pub incidents: IncidentCounts,
    pub total_incidents: u32,
    pub window_len: usize,
    pub window_weight_sum: u64,
    /// Mean incident weight per window entry
    pub average_weight: f64,
    /// Only reported while a session is active
    pub cpi: Option<Cpi>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_incidents_is_infinite() {
        let cpi = Cpi::from_counts(42, 0);
        assert!(cpi.is_infinite());
        assert_eq!(cpi.value(), f64::INFINITY);
        assert_eq!(cpi.to_string(), "inf");
    }

    #[test]
    fn ninety_corners_three_incidents() {
        assert_eq!(Cpi::from_counts(90, 3), Cpi::Finite(30.0));
        assert_eq!(Cpi::from_counts(90, 3).to_string(), "30.0");
    }
}
