//! Session notification listeners

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

/// Receives race start and end notifications.
///
/// Called synchronously from the packet loop, after the rating store has
/// been updated. Implementations must not block.
pub trait SessionListener: Send + 'static {
    fn on_start(&mut self, session_uid: u64, track_id: i8);

    fn on_end(&mut self, session_uid: u64);
}

/// Notification forwarded by [`ChannelListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionNotification {
    Started { session_uid: u64, track_id: i8 },
    Ended { session_uid: u64 },
}

/// Forwards notifications into an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    tx: mpsc::UnboundedSender<SessionNotification>,
}

impl ChannelListener {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, notification: SessionNotification) {
        if self.tx.send(notification).is_err() {
            debug!(?notification, "Session notification receiver dropped");
        }
    }
}

impl SessionListener for ChannelListener {
    fn on_start(&mut self, session_uid: u64, track_id: i8) {
        self.forward(SessionNotification::Started { session_uid, track_id });
    }

    fn on_end(&mut self, session_uid: u64) {
        self.forward(SessionNotification::Ended { session_uid });
    }
}
