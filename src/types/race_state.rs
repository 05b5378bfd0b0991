//! Last-known race state merged from partial packet updates

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use super::{DamageVector, SessionType};

/// Unified snapshot of the player's race state.
///
/// Each packet kind owns a disjoint subset of these fields. A snapshot is
/// built up by applying [`StateUpdate`]s in arrival order; fields a packet
/// does not own keep their previous value.
///
/// Two clocks are carried side by side: `session_time` is the game clock from
/// the packet header and can freeze or jump, `received_at` is the wall-clock
/// receipt time of the datagram that produced this snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceState {
    pub session_uid: u64,
    pub session_type: u8,
    pub session_time: f32,
    pub game_paused: bool,
    pub track_id: i8,
    pub current_lap: u8,
    pub is_off_track: bool,
    pub damage: DamageVector,
    pub received_at: SystemTime,
}

/// Fields owned by one packet kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OwnedFields {
    /// Session packet: session type, track and pause flag.
    Session { session_type: u8, track_id: i8, game_paused: bool },
    /// Lap data packet: lap number and the lap-invalid (off track) flag.
    LapData { current_lap: u8, is_off_track: bool },
    /// Car damage packet.
    CarDamage(DamageVector),
}

/// A decoded packet, ready to be merged into a [`RaceState`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateUpdate {
    pub session_uid: u64,
    pub session_time: f32,
    pub received_at: SystemTime,
    pub fields: OwnedFields,
}

impl RaceState {
    /// Create a snapshot from a single update, defaulting every field the
    /// update does not own to zero/false.
    pub fn from_update(update: &StateUpdate) -> Self {
        let mut state = Self {
            session_uid: update.session_uid,
            session_type: 0,
            session_time: update.session_time,
            game_paused: false,
            track_id: 0,
            current_lap: 0,
            is_off_track: false,
            damage: DamageVector::default(),
            received_at: update.received_at,
        };
        state.apply(update);
        state
    }

    /// Merge an update into this snapshot.
    ///
    /// Session id, session time and receipt time are shared header fields and
    /// are always overwritten.
    pub fn apply(&mut self, update: &StateUpdate) {
        self.session_uid = update.session_uid;
        self.session_time = update.session_time;
        self.received_at = update.received_at;

        match update.fields {
            OwnedFields::Session { session_type, track_id, game_paused } => {
                self.session_type = session_type;
                self.track_id = track_id;
                self.game_paused = game_paused;
            }
            OwnedFields::LapData { current_lap, is_off_track } => {
                self.current_lap = current_lap;
                self.is_off_track = is_off_track;
            }
            OwnedFields::CarDamage(damage) => {
                self.damage = damage;
            }
        }
    }

    /// Decoded session type.
    pub fn session_kind(&self) -> SessionType {
        SessionType::from_code(self.session_type)
    }
}
