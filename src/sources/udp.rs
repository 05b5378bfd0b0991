//! UDP source for live game telemetry

use std::net::SocketAddr;
use std::time::{Duration, SystemTime};
use tokio::net::UdpSocket;
use tracing::{info, trace};

use crate::config::NetworkConfig;
use crate::source::{Datagram, DatagramSource};
use crate::{Result, TrackerError};

/// Receives datagrams from the game on a bound UDP socket.
///
/// Every receive is bounded by the configured timeout so the caller regains
/// control even when the game is not sending.
#[derive(Debug)]
pub struct UdpSource {
    socket: UdpSocket,
    buffer: Vec<u8>,
    receive_timeout: Duration,
    packet_rate: f64,
    local_addr: SocketAddr,
}

impl UdpSource {
    /// Bind the socket described by `config`.
    pub async fn bind(config: &NetworkConfig) -> Result<Self> {
        let addr = config.socket_addr();
        let socket =
            UdpSocket::bind(addr).await.map_err(|e| TrackerError::bind_failed(addr, e))?;
        let local_addr = socket.local_addr()?;

        info!(%local_addr, timeout = ?config.receive_timeout(), "Listening for telemetry");

        Ok(Self {
            socket,
            buffer: vec![0u8; config.max_datagram_size],
            receive_timeout: config.receive_timeout(),
            packet_rate: config.packet_rate_hz,
            local_addr,
        })
    }

    /// Address actually bound (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait::async_trait]
impl DatagramSource for UdpSource {
    async fn next_datagram(&mut self) -> Result<Option<Datagram>> {
        let received =
            tokio::time::timeout(self.receive_timeout, self.socket.recv_from(&mut self.buffer))
                .await;

        match received {
            Ok(Ok((len, from))) => {
                trace!(len, %from, "Datagram received");
                Ok(Some(Datagram::new(self.buffer[..len].to_vec(), SystemTime::now())))
            }
            Ok(Err(e)) => Err(TrackerError::Socket { source: e }),
            Err(_) => Err(TrackerError::Timeout { duration: self.receive_timeout }),
        }
    }

    fn packet_rate(&self) -> f64 {
        self.packet_rate
    }
}
