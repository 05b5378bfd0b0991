//! Packet header shared by every F1 2019 packet kind

use crate::{Result, TrackerError};
use tracing::trace;

/// Size of the packet header in bytes.
pub const HEADER_SIZE: usize = 24;

/// Packet kinds the tracker consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketKind {
    /// Session info: session type, track, pause flag
    Session = 1,
    /// Per-car lap data: lap number, lap-invalid flag
    LapData = 2,
    /// Per-car damage: wing damage
    CarDamage = 6,
}

impl PacketKind {
    /// Raw discriminator as it appears on the wire.
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for PacketKind {
    type Error = TrackerError;

    fn try_from(packet_id: u8) -> Result<Self> {
        match packet_id {
            1 => Ok(PacketKind::Session),
            2 => Ok(PacketKind::LapData),
            6 => Ok(PacketKind::CarDamage),
            other => Err(TrackerError::UnknownPacket { packet_id: other }),
        }
    }
}

/// Packet header structure
///
/// ```text
/// struct PacketHeader {
///   uint16 m_packetFormat;          // offset 0
///   uint8  m_gameMajorVersion;      // offset 2
///   uint8  m_gameMinorVersion;      // offset 3
///   uint8  m_packetVersion;         // offset 4
///   uint8  m_packetId;              // offset 5
///   uint64 m_sessionUID;            // offset 6
///   float  m_sessionTime;           // offset 14
///   uint32 m_frameIdentifier;       // offset 18
///   uint8  m_playerCarIndex;        // offset 22
///   uint8  pad;                     // offset 23
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacketHeader {
    pub packet_format: u16,
    pub game_major_version: u8,
    pub game_minor_version: u8,
    pub packet_version: u8,
    pub packet_id: u8,
    pub session_uid: u64,
    pub session_time: f32,
    pub frame_identifier: u32,
    pub player_car_index: u8,
}

impl PacketHeader {
    pub const SIZE: usize = HEADER_SIZE;

    /// Parse the header from the start of a datagram.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(TrackerError::truncated("packet header", HEADER_SIZE, data.len()));
        }

        let header = Self {
            packet_format: read_u16_le(data, 0)?,
            game_major_version: read_u8(data, 2)?,
            game_minor_version: read_u8(data, 3)?,
            packet_version: read_u8(data, 4)?,
            packet_id: read_u8(data, 5)?,
            session_uid: read_u64_le(data, 6)?,
            session_time: read_f32_le(data, 14)?,
            frame_identifier: read_u32_le(data, 18)?,
            player_car_index: read_u8(data, 22)?,
        };

        trace!(
            packet_id = header.packet_id,
            session_uid = header.session_uid,
            session_time = header.session_time,
            player = header.player_car_index,
            "Parsed packet header"
        );

        Ok(header)
    }

    /// The packet kind, if it is one the tracker consumes.
    pub fn kind(&self) -> Result<PacketKind> {
        PacketKind::try_from(self.packet_id)
    }

    /// Encode the header into its 24-byte wire form.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..2].copy_from_slice(&self.packet_format.to_le_bytes());
        bytes[2] = self.game_major_version;
        bytes[3] = self.game_minor_version;
        bytes[4] = self.packet_version;
        bytes[5] = self.packet_id;
        bytes[6..14].copy_from_slice(&self.session_uid.to_le_bytes());
        bytes[14..18].copy_from_slice(&self.session_time.to_le_bytes());
        bytes[18..22].copy_from_slice(&self.frame_identifier.to_le_bytes());
        bytes[22] = self.player_car_index;
        bytes
    }
}

fn slice_at<const N: usize>(data: &[u8], offset: usize, what: &str) -> Result<[u8; N]> {
    data.get(offset..offset + N).and_then(|bytes| bytes.try_into().ok()).ok_or_else(|| {
        TrackerError::parse(
            "field read",
            format!(
                "insufficient data for {} at offset {} (need {} bytes, have {})",
                what,
                offset,
                N,
                data.len().saturating_sub(offset)
            ),
        )
    })
}

pub(crate) fn read_u8(data: &[u8], offset: usize) -> Result<u8> {
    slice_at::<1>(data, offset, "u8").map(|b| b[0])
}

pub(crate) fn read_i8(data: &[u8], offset: usize) -> Result<i8> {
    slice_at::<1>(data, offset, "i8").map(i8::from_le_bytes)
}

pub(crate) fn read_u16_le(data: &[u8], offset: usize) -> Result<u16> {
    slice_at::<2>(data, offset, "u16").map(u16::from_le_bytes)
}

pub(crate) fn read_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    slice_at::<4>(data, offset, "u32").map(u32::from_le_bytes)
}

pub(crate) fn read_u64_le(data: &[u8], offset: usize) -> Result<u64> {
    slice_at::<8>(data, offset, "u64").map(u64::from_le_bytes)
}

pub(crate) fn read_f32_le(data: &[u8], offset: usize) -> Result<f32> {
    slice_at::<4>(data, offset, "f32").map(f32::from_le_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_header() -> PacketHeader {
        PacketHeader {
            packet_format: 2019,
            game_major_version: 1,
            game_minor_version: 22,
            packet_version: 1,
            packet_id: 2,
            session_uid: 0x0123_4567_89AB_CDEF,
            session_time: 754.25,
            frame_identifier: 99,
            player_car_index: 19,
        }
    }

    #[test]
    fn header_fields_sit_at_fixed_offsets() {
        let bytes = sample_header().to_bytes();

        assert_eq!(&bytes[0..2], &2019u16.to_le_bytes());
        assert_eq!(bytes[5], 2);
        assert_eq!(&bytes[6..14], &0x0123_4567_89AB_CDEFu64.to_le_bytes());
        assert_eq!(&bytes[14..18], &754.25f32.to_le_bytes());
        assert_eq!(bytes[22], 19);
        assert_eq!(bytes[23], 0);

        let parsed = PacketHeader::parse(&bytes).expect("header parses");
        assert_eq!(parsed, sample_header());
        assert_eq!(parsed.kind().expect("lap data is known"), PacketKind::LapData);
    }

    #[test]
    fn unknown_packet_ids_are_rejected() {
        for id in [0u8, 3, 4, 5, 7, 255] {
            assert!(matches!(
                PacketKind::try_from(id),
                Err(TrackerError::UnknownPacket { packet_id }) if packet_id == id
            ));
        }
    }

    proptest! {
        #[test]
        fn prop_short_buffers_never_parse(data in prop::collection::vec(any::<u8>(), 0..HEADER_SIZE)) {
            let result = PacketHeader::parse(&data);
            let is_parse_err = matches!(result, Err(TrackerError::Parse { .. }));
            prop_assert!(is_parse_err);
        }

        #[test]
        fn prop_reads_past_the_end_fail(len in 0usize..16, offset in 0usize..32) {
            let data = vec![0u8; len];
            let read = read_u64_le(&data, offset);
            prop_assert_eq!(read.is_ok(), offset + 8 <= len);
        }
    }
}
