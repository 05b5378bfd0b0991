//! Packet synthesis for simulation, replay and benchmarks
//!
//! Builds byte-exact F1 2019 datagrams for the three packet kinds the tracker
//! consumes. Only the player's record of a per-car packet carries data; the
//! other 19 records are zeroed.

use super::header::{HEADER_SIZE, PacketHeader, PacketKind};
use super::packets::{
    CAR_DAMAGE_RECORD_SIZE, FRONT_LEFT_WING_OFFSET, FRONT_RIGHT_WING_OFFSET, GAME_PAUSED_OFFSET,
    LAP_DATA_RECORD_SIZE, LAP_INVALID_OFFSET, LAP_NUMBER_OFFSET, MAX_CARS, REAR_WING_OFFSET,
    SESSION_PACKET_MIN_LEN, SESSION_TYPE_OFFSET, TRACK_ID_OFFSET, player_record_offset,
};

/// Packet format value the game writes into every 2019 header.
pub const PACKET_FORMAT_2019: u16 = 2019;

/// Builder for F1 2019 datagrams sharing one session header.
///
/// ```rust
/// use pitlane_sr::protocol::PacketBuilder;
///
/// let packets = PacketBuilder::new(0xFEED).at(61.0);
/// let session = packets.session(10, 11, false);
/// let lap = packets.lap_data(2, 0);
/// assert_eq!(session.len(), 240);
/// assert_eq!(lap.len(), 24 + 20 * 41);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PacketBuilder {
    session_uid: u64,
    session_time: f32,
    frame_identifier: u32,
    player_car_index: u8,
}

impl PacketBuilder {
    pub fn new(session_uid: u64) -> Self {
        Self { session_uid, session_time: 0.0, frame_identifier: 0, player_car_index: 0 }
    }

    /// Set the session time (game clock, seconds).
    pub fn at(mut self, session_time: f32) -> Self {
        self.session_time = session_time;
        self
    }

    pub fn player(mut self, player_car_index: u8) -> Self {
        self.player_car_index = player_car_index;
        self
    }

    pub fn frame(mut self, frame_identifier: u32) -> Self {
        self.frame_identifier = frame_identifier;
        self
    }

    fn header(&self, kind: PacketKind) -> PacketHeader {
        PacketHeader {
            packet_format: PACKET_FORMAT_2019,
            game_major_version: 1,
            game_minor_version: 0,
            packet_version: 1,
            packet_id: kind.id(),
            session_uid: self.session_uid,
            session_time: self.session_time,
            frame_identifier: self.frame_identifier,
            player_car_index: self.player_car_index,
        }
    }

    /// Per-car packet buffer large enough for all cars and the player's record.
    fn per_car_buffer(&self, kind: PacketKind, record_size: usize) -> (Vec<u8>, usize) {
        let header = self.header(kind);
        let record = player_record_offset(&header, record_size);
        let len = (HEADER_SIZE + MAX_CARS * record_size).max(record + record_size);

        let mut data = vec![0u8; len];
        data[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        (data, record)
    }

    /// Session packet (id 1).
    pub fn session(&self, session_type: u8, track_id: i8, game_paused: bool) -> Vec<u8> {
        let mut data = vec![0u8; SESSION_PACKET_MIN_LEN];
        data[..HEADER_SIZE].copy_from_slice(&self.header(PacketKind::Session).to_bytes());
        data[SESSION_TYPE_OFFSET] = session_type;
        data[TRACK_ID_OFFSET] = track_id.to_le_bytes()[0];
        data[GAME_PAUSED_OFFSET] = u8::from(game_paused);
        data
    }

    /// Lap data packet (id 2) with the player's lap number and lap-invalid byte.
    pub fn lap_data(&self, current_lap: u8, lap_invalid: u8) -> Vec<u8> {
        let (mut data, record) = self.per_car_buffer(PacketKind::LapData, LAP_DATA_RECORD_SIZE);
        data[record + LAP_NUMBER_OFFSET] = current_lap;
        data[record + LAP_INVALID_OFFSET] = lap_invalid;
        data
    }

    /// Car damage packet (id 6) with the player's wing damage.
    pub fn car_damage(&self, front_left: u8, front_right: u8, rear: u8) -> Vec<u8> {
        let (mut data, record) =
            self.per_car_buffer(PacketKind::CarDamage, CAR_DAMAGE_RECORD_SIZE);
        data[record + FRONT_LEFT_WING_OFFSET] = front_left;
        data[record + FRONT_RIGHT_WING_OFFSET] = front_right;
        data[record + REAR_WING_OFFSET] = rear;
        data
    }

    /// A packet with an arbitrary id and no payload, for exercising the
    /// unknown-packet path.
    pub fn raw(&self, packet_id: u8, payload_len: usize) -> Vec<u8> {
        let mut header = self.header(PacketKind::Session);
        header.packet_id = packet_id;
        let mut data = vec![0u8; HEADER_SIZE + payload_len];
        data[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_car_packets_cover_twenty_cars() {
        let packets = PacketBuilder::new(9);
        assert_eq!(packets.lap_data(1, 0).len(), HEADER_SIZE + 20 * LAP_DATA_RECORD_SIZE);
        assert_eq!(packets.car_damage(0, 0, 0).len(), HEADER_SIZE + 20 * CAR_DAMAGE_RECORD_SIZE);
    }

    #[test]
    fn headers_carry_builder_settings() {
        let data = PacketBuilder::new(77).at(12.0).player(3).frame(500).car_damage(1, 2, 3);
        let header = PacketHeader::parse(&data).expect("header parses");

        assert_eq!(header.packet_format, PACKET_FORMAT_2019);
        assert_eq!(header.packet_id, 6);
        assert_eq!(header.session_uid, 77);
        assert_eq!(header.session_time, 12.0);
        assert_eq!(header.frame_identifier, 500);
        assert_eq!(header.player_car_index, 3);
    }
}
