//! Datagram source trait

use std::time::SystemTime;

use crate::Result;

/// One received datagram and its wall-clock receipt time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub bytes: Vec<u8>,
    pub received_at: SystemTime,
}

impl Datagram {
    pub fn new(bytes: Vec<u8>, received_at: SystemTime) -> Self {
        Self { bytes, received_at }
    }
}

/// Trait for telemetry datagram sources
///
/// Sources abstract over where datagrams come from (the game's UDP stream, a
/// scripted replay) and handle their own timing internally.
#[async_trait::async_trait]
pub trait DatagramSource: Send + 'static {
    /// Wait for the next datagram
    ///
    /// Returns:
    /// - `Ok(Some(datagram))` - Datagram received
    /// - `Ok(None)` - Source exhausted (normal termination)
    /// - `Err(TrackerError::Timeout { .. })` - Nothing arrived within the
    ///   receive timeout; the caller may simply try again
    /// - `Err(e)` - Any other error
    async fn next_datagram(&mut self) -> Result<Option<Datagram>>;

    /// Expected datagram rate in Hz
    fn packet_rate(&self) -> f64;
}
