//! F1 2019 session type codes

use serde::{Deserialize, Serialize};

/// Session type code the game reports for a race.
pub const RACE_SESSION_CODE: u8 = 10;

/// Discrete session categories reported in the session packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionType {
    Unknown,
    Practice1,
    Practice2,
    Practice3,
    ShortPractice,
    Qualifying1,
    Qualifying2,
    Qualifying3,
    ShortQualifying,
    OneShotQualifying,
    Race,
    Race2,
    TimeTrial,
    Other(u8),
}

impl SessionType {
    /// Decode a raw session type code.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => SessionType::Unknown,
            1 => SessionType::Practice1,
            2 => SessionType::Practice2,
            3 => SessionType::Practice3,
            4 => SessionType::ShortPractice,
            5 => SessionType::Qualifying1,
            6 => SessionType::Qualifying2,
            7 => SessionType::Qualifying3,
            8 => SessionType::ShortQualifying,
            9 => SessionType::OneShotQualifying,
            RACE_SESSION_CODE => SessionType::Race,
            11 => SessionType::Race2,
            12 => SessionType::TimeTrial,
            other => SessionType::Other(other),
        }
    }

    /// Human readable label used in log output.
    pub fn label(&self) -> &'static str {
        match self {
            SessionType::Unknown => "Unknown",
            SessionType::Practice1 => "Practice 1",
            SessionType::Practice2 => "Practice 2",
            SessionType::Practice3 => "Practice 3",
            SessionType::ShortPractice => "Short Practice",
            SessionType::Qualifying1 => "Qualifying 1",
            SessionType::Qualifying2 => "Qualifying 2",
            SessionType::Qualifying3 => "Qualifying 3",
            SessionType::ShortQualifying => "Short Qualifying",
            SessionType::OneShotQualifying => "One-Shot Qualifying",
            SessionType::Race => "Race",
            SessionType::Race2 => "Race 2",
            SessionType::TimeTrial => "Time Trial",
            SessionType::Other(_) => "Other",
        }
    }
}
