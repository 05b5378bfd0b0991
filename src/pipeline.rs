//! Per-datagram processing: decode, session check, rating update

use serde::Serialize;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, trace, warn};

use crate::config::TrackerConfig;
use crate::decoder::TelemetryDecoder;
use crate::listener::SessionListener;
use crate::protocol::F12019Decoder;
use crate::rating::{RatingEngine, RatingStats, RatingUpdate};
use crate::session::{SessionEvent, SessionRecord, SessionTracker, TrackerState};
use crate::store::RatingStore;
use crate::tracks;
use crate::types::RaceState;

/// Immutable view of the tracker, published after every datagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackerSnapshot {
    pub tracker_state: TrackerState,
    pub session: Option<SessionRecord>,
    /// Last merged race state
    pub race: Option<RaceState>,
    pub stats: RatingStats,
    pub datagrams_received: u64,
    pub datagrams_decoded: u64,
}

/// What one datagram did.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketOutcome {
    pub state: RaceState,
    pub event: Option<SessionEvent>,
    /// Present while a session is active
    pub rating: Option<RatingUpdate>,
}

/// Owns the decoder, session tracker, rating engine and collaborators, and
/// runs one datagram at a time through them.
pub struct Pipeline {
    decoder: Box<dyn TelemetryDecoder>,
    tracker: SessionTracker,
    engine: RatingEngine,
    store: Box<dyn RatingStore>,
    listeners: Vec<Box<dyn SessionListener>>,
    sync_interval: Duration,
    last_sync: Option<SystemTime>,
    datagrams_received: u64,
    datagrams_decoded: u64,
}

impl Pipeline {
    /// Pipeline with the F1 2019 decoder.
    pub fn new(config: &TrackerConfig, store: Box<dyn RatingStore>) -> Self {
        Self::with_decoder(config, Box::new(F12019Decoder::new()), store)
    }

    pub fn with_decoder(
        config: &TrackerConfig,
        decoder: Box<dyn TelemetryDecoder>,
        store: Box<dyn RatingStore>,
    ) -> Self {
        Self {
            decoder,
            tracker: SessionTracker::new(config.session.clone()),
            engine: RatingEngine::new(config.rating.clone()),
            store,
            listeners: Vec::new(),
            sync_interval: config.sync_interval(),
            last_sync: None,
            datagrams_received: 0,
            datagrams_decoded: 0,
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn SessionListener>) {
        self.listeners.push(listener);
    }

    /// Adopt the rating persisted by the store, if it has one.
    pub fn load_stored_rating(&mut self) -> f64 {
        match self.store.current_rating() {
            Ok(stored) => {
                let rating = self.engine.adopt_stored_rating(stored);
                info!(stored, rating, tier = %self.engine.tier(), "Loaded stored rating");
            }
            Err(e) => {
                warn!("Could not read stored rating, starting at {}: {}", self.engine.rating(), e);
            }
        }
        self.engine.rating()
    }

    /// Run one datagram through decode, session check and rating update.
    ///
    /// Returns `None` when the datagram did not decode.
    pub fn handle_datagram(&mut self, bytes: &[u8], received_at: SystemTime) -> Option<PacketOutcome> {
        self.datagrams_received += 1;
        let state = self.decoder.decode_at(bytes, received_at)?;
        self.datagrams_decoded += 1;

        let event = self.tracker.process(&state);
        if let Some(event) = event {
            self.dispatch(event, received_at);
        }

        let rating = if self.tracker.is_active() {
            let update = self.engine.process(&state);
            self.report(&update);
            self.maybe_sync(received_at);
            Some(update)
        } else {
            None
        };

        Some(PacketOutcome { state, event, rating })
    }

    fn dispatch(&mut self, event: SessionEvent, at: SystemTime) {
        match event {
            SessionEvent::Started { session_uid, track_id, .. } => {
                self.engine.reset_session();
                let rating = self.engine.rating();

                match self.store.start_session(session_uid, track_id, rating) {
                    Ok(true) => {}
                    Ok(false) => warn!(session_uid, "Store already knows this session"),
                    Err(e) => warn!(session_uid, "Failed to record session start: {}", e),
                }
                for listener in &mut self.listeners {
                    listener.on_start(session_uid, track_id);
                }
                self.last_sync = Some(at);

                info!(
                    session_uid,
                    track = %tracks::name(track_id),
                    rating,
                    tier = %self.engine.tier(),
                    "Race started"
                );
            }
            SessionEvent::Ended { session_uid, duration_secs, reason } => {
                let rating = self.engine.rating();

                match self.store.end_session(session_uid, rating) {
                    Ok(true) => {}
                    Ok(false) => warn!(session_uid, "Store does not know this session"),
                    Err(e) => warn!(session_uid, "Failed to record session end: {}", e),
                }
                self.sync_rating(at);
                for listener in &mut self.listeners {
                    listener.on_end(session_uid);
                }

                let counts = self.engine.counts();
                info!(
                    session_uid,
                    duration_secs,
                    ?reason,
                    rating,
                    tier = %self.engine.tier(),
                    corners = self.engine.corners_completed(),
                    low = counts.low,
                    medium = counts.medium,
                    high = counts.high,
                    cpi = %self.engine.cpi(),
                    "Race ended"
                );
            }
            SessionEvent::Discarded { session_uid, duration_secs, .. } => {
                debug!(session_uid, duration_secs, "Race too short, not recorded");
            }
        }
    }

    fn report(&self, update: &RatingUpdate) {
        for incident in &update.incidents {
            info!(
                severity = %incident.severity,
                lap = incident.lap,
                session_time = incident.session_time,
                "Incident"
            );
        }
        if update.tier_changed() {
            info!(
                from = update.previous_rating,
                to = update.rating,
                tier = %self.engine.tier(),
                "License tier changed"
            );
        }
        trace!(rating = update.rating, recomputed = update.recomputed, "Rating step");
    }

    fn maybe_sync(&mut self, now: SystemTime) {
        let due = match self.last_sync {
            Some(last) => now.duration_since(last).unwrap_or_default() >= self.sync_interval,
            None => true,
        };
        if due {
            self.sync_rating(now);
        }
    }

    fn sync_rating(&mut self, now: SystemTime) {
        let rating = self.engine.rating();
        if let Err(e) = self.store.set_rating(rating) {
            warn!(rating, "Failed to sync rating: {}", e);
        }
        self.last_sync = Some(now);
    }

    /// Force-end an active session and write the final rating.
    pub fn shutdown(&mut self) -> Option<SessionEvent> {
        let now = SystemTime::now();
        let event = self.tracker.force_end();
        match event {
            Some(event) => self.dispatch(event, now),
            None => self.sync_rating(now),
        }
        event
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        let active = self.tracker.is_active();
        TrackerSnapshot {
            tracker_state: self.tracker.state(),
            session: self.tracker.record().cloned(),
            race: self.decoder.last_known().cloned(),
            stats: self.engine.stats(active),
            datagrams_received: self.datagrams_received,
            datagrams_decoded: self.datagrams_decoded,
        }
    }

    pub fn engine(&self) -> &RatingEngine {
        &self.engine
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn protocol(&self) -> &'static str {
        self.decoder.protocol()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("protocol", &self.decoder.protocol())
            .field("tracker", &self.tracker.state())
            .field("rating", &self.engine.rating())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
