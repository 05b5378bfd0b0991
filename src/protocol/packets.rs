//! Payload layouts for the session, lap data and car damage packets
//!
//! Only the handful of bytes the tracker needs are read. All offsets are
//! absolute (from the start of the datagram) for the session packet, and
//! relative to the player's record for the per-car packets.

use super::header::{HEADER_SIZE, PacketHeader, read_i8, read_u8};
use crate::types::{DamageVector, OwnedFields};
use crate::{Result, TrackerError};

/// Maximum number of cars in a per-car packet.
pub const MAX_CARS: usize = 20;

/// Minimum length of a session packet.
pub const SESSION_PACKET_MIN_LEN: usize = 240;
/// `m_sessionType` (uint8)
pub const SESSION_TYPE_OFFSET: usize = 24;
/// `m_trackId` (int8)
pub const TRACK_ID_OFFSET: usize = 25;
/// `m_gamePaused` (uint8)
pub const GAME_PAUSED_OFFSET: usize = 239;

/// Size of one car's lap data record.
///
/// ```text
/// struct LapData {
///   float m_lastLapTime;         // +0
///   float m_currentLapTime;      // +4
///   float m_bestLapTime;         // +8
///   float m_sector1Time;         // +12
///   float m_sector2Time;         // +16
///   float m_lapDistance;         // +20
///   float m_totalDistance;       // +24
///   float m_safetyCarDelta;      // +28
///   uint8 m_carPosition;         // +32
///   uint8 m_currentLapNum;       // +33
///   uint8 m_pitStatus;           // +34
///   uint8 m_sector;              // +35
///   uint8 m_currentLapInvalid;   // +36
///   uint8 m_penalties;           // +37
///   uint8 m_gridPosition;        // +38
///   uint8 m_driverStatus;        // +39
///   uint8 m_resultStatus;        // +40
/// }
/// ```
pub const LAP_DATA_RECORD_SIZE: usize = 41;
pub const LAP_NUMBER_OFFSET: usize = 33;
pub const LAP_INVALID_OFFSET: usize = 36;

/// Size of one car's damage record.
///
/// ```text
/// struct CarDamageData {
///   float m_tyresWear[4];        // +0
///   uint8 m_tyresDamage[4];      // +16
///   uint8 m_brakesDamage[4];     // +20
///   uint8 m_frontLeftWingDamage; // +24
///   uint8 m_frontRightWingDamage;// +25
///   uint8 m_rearWingDamage;      // +26
///   ...                          // engine, gearbox, padding to 39
/// }
/// ```
pub const CAR_DAMAGE_RECORD_SIZE: usize = 39;
pub const FRONT_LEFT_WING_OFFSET: usize = 24;
pub const FRONT_RIGHT_WING_OFFSET: usize = 25;
pub const REAR_WING_OFFSET: usize = 26;

/// Offset of the player's record in a per-car packet.
pub fn player_record_offset(header: &PacketHeader, record_size: usize) -> usize {
    HEADER_SIZE + usize::from(header.player_car_index) * record_size
}

/// Fail unless `data` holds the whole record that starts at `offset`.
fn require_record(data: &[u8], offset: usize, record_size: usize, context: &str) -> Result<()> {
    let needed = offset + record_size;
    if data.len() < needed {
        return Err(TrackerError::truncated(context, needed, data.len()));
    }
    Ok(())
}

/// Parse the session packet payload.
pub fn parse_session(data: &[u8]) -> Result<OwnedFields> {
    if data.len() < SESSION_PACKET_MIN_LEN {
        return Err(TrackerError::truncated("session packet", SESSION_PACKET_MIN_LEN, data.len()));
    }

    Ok(OwnedFields::Session {
        session_type: read_u8(data, SESSION_TYPE_OFFSET)?,
        track_id: read_i8(data, TRACK_ID_OFFSET)?,
        game_paused: read_u8(data, GAME_PAUSED_OFFSET)? == 1,
    })
}

/// Parse the player's record from a lap data packet.
///
/// A nonzero lap-invalid byte is taken as the off-track indicator.
pub fn parse_lap_data(data: &[u8], header: &PacketHeader) -> Result<OwnedFields> {
    let record = player_record_offset(header, LAP_DATA_RECORD_SIZE);
    require_record(data, record, LAP_DATA_RECORD_SIZE, "lap data packet")?;

    Ok(OwnedFields::LapData {
        current_lap: read_u8(data, record + LAP_NUMBER_OFFSET)?,
        is_off_track: read_u8(data, record + LAP_INVALID_OFFSET)? != 0,
    })
}

/// Parse the player's record from a car damage packet.
pub fn parse_car_damage(data: &[u8], header: &PacketHeader) -> Result<OwnedFields> {
    let record = player_record_offset(header, CAR_DAMAGE_RECORD_SIZE);
    require_record(data, record, CAR_DAMAGE_RECORD_SIZE, "car damage packet")?;

    Ok(OwnedFields::CarDamage(DamageVector::from_wings(
        read_u8(data, record + FRONT_LEFT_WING_OFFSET)?,
        read_u8(data, record + FRONT_RIGHT_WING_OFFSET)?,
        read_u8(data, record + REAR_WING_OFFSET)?,
    )))
}
