//! License tiers derived from the safety rating

use serde::{Deserialize, Serialize};
use std::fmt;

/// License tier, from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LicenseTier {
    Rookie,
    D,
    C,
    B,
    A,
    SS,
}

/// Inclusive lower bounds, highest tier first. Anything below D is Rookie.
const THRESHOLDS: [(f64, LicenseTier); 5] = [
    (7.0, LicenseTier::SS),
    (6.0, LicenseTier::A),
    (5.0, LicenseTier::B),
    (4.0, LicenseTier::C),
    (3.0, LicenseTier::D),
];

impl LicenseTier {
    pub fn for_rating(rating: f64) -> Self {
        THRESHOLDS
            .iter()
            .find(|(lower, _)| rating >= *lower)
            .map(|(_, tier)| *tier)
            .unwrap_or(LicenseTier::Rookie)
    }

    pub const fn name(self) -> &'static str {
        match self {
            LicenseTier::Rookie => "Rookie",
            LicenseTier::D => "D",
            LicenseTier::C => "C",
            LicenseTier::B => "B",
            LicenseTier::A => "A",
            LicenseTier::SS => "SS",
        }
    }

    /// Display color as `#RRGGBB`.
    pub const fn color(self) -> &'static str {
        match self {
            LicenseTier::Rookie => "#888888",
            LicenseTier::D => "#FF0000",
            LicenseTier::C => "#FFAA00",
            LicenseTier::B => "#00AA00",
            LicenseTier::A => "#0066FF",
            LicenseTier::SS => "#FFD700",
        }
    }
}

impl fmt::Display for LicenseTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
