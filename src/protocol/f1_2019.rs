//! F1 2019 UDP telemetry decoder

use std::time::SystemTime;
use tracing::trace;

use super::header::{PacketHeader, PacketKind};
use super::packets::{parse_car_damage, parse_lap_data, parse_session};
use crate::Result;
use crate::decoder::TelemetryDecoder;
use crate::types::{RaceState, StateUpdate};

/// Decoder for the F1 2019 packet format (session, lap data and damage packets).
#[derive(Debug, Default)]
pub struct F12019Decoder {
    /// Last known snapshot, merged from every packet decoded so far
    last_known: Option<RaceState>,
}

impl F12019Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a datagram into the update it carries, without merging.
    pub fn parse_update(bytes: &[u8], received_at: SystemTime) -> Result<StateUpdate> {
        let header = PacketHeader::parse(bytes)?;

        let fields = match header.kind()? {
            PacketKind::Session => parse_session(bytes)?,
            PacketKind::LapData => parse_lap_data(bytes, &header)?,
            PacketKind::CarDamage => parse_car_damage(bytes, &header)?,
        };

        Ok(StateUpdate {
            session_uid: header.session_uid,
            session_time: header.session_time,
            received_at,
            fields,
        })
    }

    /// Forget the last known snapshot.
    pub fn reset(&mut self) {
        self.last_known = None;
    }
}

impl TelemetryDecoder for F12019Decoder {
    fn decode_at(&mut self, bytes: &[u8], received_at: SystemTime) -> Option<RaceState> {
        let update = match Self::parse_update(bytes, received_at) {
            Ok(update) => update,
            Err(e) => {
                trace!(len = bytes.len(), "Dropping datagram: {}", e);
                return None;
            }
        };

        match self.last_known.as_mut() {
            Some(state) => state.apply(&update),
            None => self.last_known = Some(RaceState::from_update(&update)),
        }

        self.last_known.clone()
    }

    fn protocol(&self) -> &'static str {
        "F1 2019"
    }

    fn last_known(&self) -> Option<&RaceState> {
        self.last_known.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{HEADER_SIZE, PacketBuilder};
    use crate::types::DamageVector;
    use proptest::prelude::*;
    use std::time::Duration;

    #[test]
    fn short_buffers_decode_to_none() {
        let mut decoder = F12019Decoder::new();
        for len in 0..HEADER_SIZE {
            assert!(decoder.decode(&vec![0u8; len]).is_none());
        }
        assert!(decoder.last_known().is_none());
    }

    #[test]
    fn session_packet_reports_track_and_pause_bytes() {
        let mut decoder = F12019Decoder::new();
        let mut data = PacketBuilder::new(5).at(1.5).session(10, 0, false);
        data[25] = (-1i8).to_le_bytes()[0];
        data[239] = 1;

        let state = decoder.decode(&data).expect("session packet decodes");
        assert_eq!(state.track_id, -1);
        assert!(state.game_paused);
        assert_eq!(state.session_type, 10);
        assert_eq!(state.session_uid, 5);
        assert_eq!(state.session_time, 1.5);
    }

    #[test]
    fn lap_packet_for_player_zero() {
        let mut decoder = F12019Decoder::new();
        let data = PacketBuilder::new(1).player(0).lap_data(3, 1);

        let state = decoder.decode(&data).expect("lap packet decodes");
        assert_eq!(state.current_lap, 3);
        assert!(state.is_off_track);
    }

    #[test]
    fn unknown_and_truncated_packets_leave_state_untouched() {
        let mut decoder = F12019Decoder::new();
        let packets = PacketBuilder::new(8).at(3.0);
        decoder.decode(&packets.lap_data(4, 0)).expect("lap packet decodes");

        assert!(decoder.decode(&packets.raw(0, 1300)).is_none());
        assert!(decoder.decode(&packets.raw(7, 1300)).is_none());
        let damage = packets.car_damage(9, 9, 9);
        assert!(decoder.decode(&damage[..HEADER_SIZE + 20]).is_none());

        let known = decoder.last_known().expect("state retained");
        assert_eq!(known.current_lap, 4);
        assert_eq!(known.damage, DamageVector::default());
    }

    #[test]
    fn packets_merge_into_one_snapshot() {
        let mut decoder = F12019Decoder::new();
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
        let packets = PacketBuilder::new(11);

        decoder.decode_at(&packets.at(1.0).session(10, 13, false), t0);
        decoder.decode_at(&packets.at(2.0).lap_data(2, 0), t0 + Duration::from_millis(50));
        let state = decoder
            .decode_at(&packets.at(3.0).car_damage(6, 0, 2), t0 + Duration::from_millis(100))
            .expect("damage packet decodes");

        assert_eq!(state.session_type, 10);
        assert_eq!(state.track_id, 13);
        assert_eq!(state.current_lap, 2);
        assert_eq!(state.damage.channels(), [6.0, 0.0, 2.0, 2.0]);
        assert_eq!(state.session_time, 3.0);
        assert_eq!(state.received_at, t0 + Duration::from_millis(100));
        assert_eq!(decoder.protocol(), "F1 2019");
    }

    proptest! {
        #[test]
        fn prop_arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..1200)) {
            let mut decoder = F12019Decoder::new();
            let decoded = decoder.decode(&data);
            if data.len() < HEADER_SIZE {
                prop_assert!(decoded.is_none());
            }
        }

        #[test]
        fn prop_lap_fields_round_trip_for_any_player(
            player in 0u8..20,
            lap in any::<u8>(),
            invalid in any::<u8>(),
        ) {
            let mut decoder = F12019Decoder::new();
            let state = decoder.decode(&PacketBuilder::new(2).player(player).lap_data(lap, invalid));
            let state = state.expect("well-formed lap packet decodes");
            prop_assert_eq!(state.current_lap, lap);
            prop_assert_eq!(state.is_off_track, invalid != 0);
        }
    }
}
