//! Race session detection
//!
//! The game never announces "race started" or "race finished". The
//! [`SessionTracker`] infers both from the session type, session id, session
//! clock and pause flag carried by every snapshot.

mod tracker;

pub use tracker::{EndReason, SessionEvent, SessionRecord, SessionTracker, TrackerState};
