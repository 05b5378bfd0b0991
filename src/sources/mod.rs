//! Datagram source implementations

pub mod replay;
pub mod udp;

pub use replay::{RaceScript, ReplaySource};
pub use udp::UdpSource;
