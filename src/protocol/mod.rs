//! F1 2019 UDP wire format
//!
//! Every datagram starts with a 24-byte little-endian [`PacketHeader`] followed
//! by a payload whose layout depends on the packet id. The tracker consumes
//! three kinds:
//!
//! | id | kind      | fields used                                  |
//! |----|-----------|----------------------------------------------|
//! | 1  | session   | session type, track id, game paused          |
//! | 2  | lap data  | player's current lap, lap-invalid flag       |
//! | 6  | car damage| player's front-left, front-right, rear wing  |
//!
//! All other ids are ignored.

mod builder;
mod f1_2019;
mod header;
pub mod packets;

pub use builder::{PACKET_FORMAT_2019, PacketBuilder};
pub use f1_2019::F12019Decoder;
pub use header::{HEADER_SIZE, PacketHeader, PacketKind};
