//! Decoder trait for telemetry protocols

use std::time::SystemTime;

use crate::types::RaceState;

/// Turns raw datagrams into merged race state snapshots.
///
/// A decoder owns the "last known" snapshot for its stream: each packet kind
/// only carries part of the state, so every successful decode merges into
/// that snapshot and returns a copy of the result.
///
/// Decoding never fails loudly. Short, truncated or unrecognized datagrams
/// return `None` and leave the last known snapshot untouched; UDP loss,
/// duplication and reordering are expected.
pub trait TelemetryDecoder: Send + 'static {
    /// Decode a datagram received at `received_at` (wall clock).
    fn decode_at(&mut self, bytes: &[u8], received_at: SystemTime) -> Option<RaceState>;

    /// Decode a datagram received now.
    fn decode(&mut self, bytes: &[u8]) -> Option<RaceState> {
        self.decode_at(bytes, SystemTime::now())
    }

    /// Name of the protocol this decoder understands (e.g. "F1 2019").
    fn protocol(&self) -> &'static str;

    /// The merged snapshot after the last successful decode.
    fn last_known(&self) -> Option<&RaceState>;
}
