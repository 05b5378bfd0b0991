//! F1 2019 track catalogue

use serde::Serialize;

/// A circuit known to the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Track {
    pub id: i8,
    pub name: &'static str,
    pub corners: u16,
}

const TRACKS: [Track; 25] = [
    Track { id: 0, name: "Melbourne", corners: 16 },
    Track { id: 1, name: "Paul Ricard", corners: 15 },
    Track { id: 2, name: "Shanghai", corners: 16 },
    Track { id: 3, name: "Sakhir (Bahrain)", corners: 15 },
    Track { id: 4, name: "Catalunya", corners: 16 },
    Track { id: 5, name: "Monaco", corners: 19 },
    Track { id: 6, name: "Montreal", corners: 14 },
    Track { id: 7, name: "Silverstone", corners: 18 },
    Track { id: 8, name: "Hockenheim", corners: 17 },
    Track { id: 9, name: "Hungaroring", corners: 14 },
    Track { id: 10, name: "Spa-Francorchamps", corners: 19 },
    Track { id: 11, name: "Monza", corners: 11 },
    Track { id: 12, name: "Singapore", corners: 23 },
    Track { id: 13, name: "Suzuka", corners: 18 },
    Track { id: 14, name: "Abu Dhabi", corners: 21 },
    Track { id: 15, name: "Texas (COTA)", corners: 20 },
    Track { id: 16, name: "Brazil (Interlagos)", corners: 15 },
    Track { id: 17, name: "Austria", corners: 10 },
    Track { id: 18, name: "Sochi", corners: 18 },
    Track { id: 19, name: "Mexico", corners: 17 },
    Track { id: 20, name: "Baku", corners: 20 },
    Track { id: 21, name: "Sakhir Short", corners: 11 },
    Track { id: 22, name: "Silverstone Short", corners: 13 },
    Track { id: 23, name: "Texas Short", corners: 12 },
    Track { id: 24, name: "Suzuka Short", corners: 13 },
];

/// Look up a track by its game id. The game reports -1 for an unknown track.
pub fn lookup(track_id: i8) -> Option<&'static Track> {
    usize::try_from(track_id).ok().and_then(|index| TRACKS.get(index))
}

/// Display name, or `"Unknown (<id>)"`.
pub fn name(track_id: i8) -> String {
    match lookup(track_id) {
        Some(track) => track.name.to_string(),
        None => format!("Unknown ({})", track_id),
    }
}

pub fn all() -> &'static [Track] {
    &TRACKS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_match_table_positions() {
        for (index, track) in all().iter().enumerate() {
            assert_eq!(track.id as usize, index);
        }
    }

    #[test]
    fn lookup_known_and_unknown() {
        assert_eq!(lookup(11).map(|t| t.name), Some("Monza"));
        assert_eq!(lookup(12).map(|t| t.corners), Some(23));
        assert!(lookup(-1).is_none());
        assert!(lookup(25).is_none());
        assert_eq!(name(-1), "Unknown (-1)");
    }
}
