//! Race session lifecycle detection

use serde::Serialize;
use std::time::SystemTime;
use tracing::{debug, trace};

use crate::config::SessionConfig;
use crate::types::RaceState;

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackerState {
    Idle,
    Active,
}

/// Why an active session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EndReason {
    /// The session type moved away from race
    SessionTypeChanged,
    /// A different session id appeared
    SessionChanged,
    /// The game stayed paused longer than the pause threshold
    PauseTimeout,
    /// The host shut the tracker down
    Forced,
}

/// Transition emitted by [`SessionTracker::process`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SessionEvent {
    Started { session_uid: u64, track_id: i8, session_time: f32 },
    Ended { session_uid: u64, duration_secs: f32, reason: EndReason },
    /// Ended before the minimum race duration; listeners are not told
    Discarded { session_uid: u64, duration_secs: f32, reason: EndReason },
}

/// Bookkeeping for the active session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub session_uid: u64,
    pub track_id: i8,
    /// Game clock when the session started
    pub started_at: f32,
    /// Game clock of the latest snapshot
    pub last_session_time: f32,
    /// Wall-clock receipt time of the first packet of the current pause
    pub pause_started: Option<SystemTime>,
}

impl SessionRecord {
    fn duration_secs(&self) -> f32 {
        self.last_session_time - self.started_at
    }
}

/// Two-state machine turning the snapshot stream into race start and end
/// events.
///
/// The signal is implicit: a race starts when a race-type session with a
/// running clock shows up, and ends when the session type changes, a new
/// session id appears, or the game stays paused for too long.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    config: SessionConfig,
    record: Option<SessionRecord>,
    last_session_type: Option<u8>,
}

impl SessionTracker {
    pub fn new(config: SessionConfig) -> Self {
        Self { config, record: None, last_session_type: None }
    }

    /// Feed one snapshot. At most one transition happens per snapshot.
    pub fn process(&mut self, state: &RaceState) -> Option<SessionEvent> {
        let event =
            if self.record.is_some() { self.check_end(state) } else { self.check_start(state) };
        self.last_session_type = Some(state.session_type);
        event
    }

    fn check_start(&mut self, state: &RaceState) -> Option<SessionEvent> {
        let race = self.config.race_session_type;
        if state.session_type != race || !(state.session_time > 0.0) {
            return None;
        }

        debug!(
            session_uid = state.session_uid,
            track_id = state.track_id,
            session_time = state.session_time,
            "Idle -> Active"
        );
        self.record = Some(SessionRecord {
            session_uid: state.session_uid,
            track_id: state.track_id,
            started_at: state.session_time,
            last_session_time: state.session_time,
            pause_started: None,
        });

        Some(SessionEvent::Started {
            session_uid: state.session_uid,
            track_id: state.track_id,
            session_time: state.session_time,
        })
    }

    fn check_end(&mut self, state: &RaceState) -> Option<SessionEvent> {
        let race = self.config.race_session_type;
        let threshold = self.config.pause_threshold();
        let record = self.record.as_mut()?;

        // Every end condition measures duration with the incoming packet's clock.
        record.last_session_time = state.session_time;

        if state.session_uid != record.session_uid {
            return self.end(EndReason::SessionChanged);
        }

        if self.last_session_type == Some(race) && state.session_type != race {
            return self.end(EndReason::SessionTypeChanged);
        }

        if !state.game_paused {
            record.pause_started = None;
            return None;
        }

        let pause_started = *record.pause_started.get_or_insert(state.received_at);
        let paused_for = state.received_at.duration_since(pause_started).unwrap_or_default();
        trace!(?paused_for, "Game paused");

        if paused_for > threshold {
            return self.end(EndReason::PauseTimeout);
        }
        None
    }

    fn end(&mut self, reason: EndReason) -> Option<SessionEvent> {
        let record = self.record.take()?;
        let duration_secs = record.duration_secs();
        let session_uid = record.session_uid;

        // NaN durations are discarded too
        if !(duration_secs >= self.config.min_race_duration_secs) {
            debug!(session_uid, duration_secs, ?reason, "Discarding short session");
            return Some(SessionEvent::Discarded { session_uid, duration_secs, reason });
        }

        debug!(session_uid, duration_secs, ?reason, "Active -> Idle");
        Some(SessionEvent::Ended { session_uid, duration_secs, reason })
    }

    /// End the active session unconditionally, bypassing the duration check.
    pub fn force_end(&mut self) -> Option<SessionEvent> {
        let record = self.record.take()?;
        debug!(session_uid = record.session_uid, "Forcing session end");
        Some(SessionEvent::Ended {
            session_uid: record.session_uid,
            duration_secs: record.duration_secs(),
            reason: EndReason::Forced,
        })
    }

    pub fn state(&self) -> TrackerState {
        match self.record {
            Some(_) => TrackerState::Active,
            None => TrackerState::Idle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.record.is_some()
    }

    pub fn record(&self) -> Option<&SessionRecord> {
        self.record.as_ref()
    }

    pub fn active_session(&self) -> Option<u64> {
        self.record.as_ref().map(|record| record.session_uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DamageVector;
    use std::time::Duration;

    const RACE: u8 = 10;
    const QUALIFYING: u8 = 8;

    fn at(uid: u64, session_type: u8, session_time: f32, wall_secs: u64) -> RaceState {
        RaceState {
            session_uid: uid,
            session_type,
            session_time,
            game_paused: false,
            track_id: 11,
            current_lap: 1,
            is_off_track: false,
            damage: DamageVector::default(),
            received_at: SystemTime::UNIX_EPOCH + Duration::from_secs(wall_secs),
        }
    }

    fn paused(mut state: RaceState) -> RaceState {
        state.game_paused = true;
        state
    }

    fn tracker() -> SessionTracker {
        SessionTracker::new(SessionConfig::default())
    }

    #[test]
    fn race_with_running_clock_starts() {
        let mut tracker = tracker();
        assert_eq!(tracker.process(&at(1, QUALIFYING, 5.0, 0)), None);
        assert_eq!(tracker.process(&at(1, RACE, 0.0, 1)), None, "clock not running yet");

        let event = tracker.process(&at(1, RACE, 0.5, 2));
        assert_eq!(
            event,
            Some(SessionEvent::Started { session_uid: 1, track_id: 11, session_time: 0.5 })
        );
        assert_eq!(tracker.state(), TrackerState::Active);
        assert_eq!(tracker.process(&at(1, RACE, 1.0, 3)), None);
    }

    #[test]
    fn short_session_is_discarded() {
        let mut tracker = tracker();
        tracker.process(&at(1, RACE, 10.0, 0));

        let event = tracker.process(&at(1, QUALIFYING, 40.0, 30));
        assert!(matches!(event, Some(SessionEvent::Discarded { session_uid: 1, .. })));
        assert_eq!(tracker.state(), TrackerState::Idle);
    }

    #[test]
    fn session_type_change_ends_race() {
        let mut tracker = tracker();
        tracker.process(&at(1, RACE, 10.0, 0));
        tracker.process(&at(1, RACE, 200.0, 190));

        let event = tracker.process(&at(1, 11, 201.0, 191));
        assert_eq!(
            event,
            Some(SessionEvent::Ended {
                session_uid: 1,
                duration_secs: 191.0,
                reason: EndReason::SessionTypeChanged,
            })
        );
        assert!(!tracker.is_active());
    }

    #[test]
    fn new_session_id_measures_with_incoming_clock() {
        let mut tracker = tracker();
        tracker.process(&at(1, RACE, 10.0, 0));
        tracker.process(&at(1, RACE, 95.0, 85));

        let event = tracker.process(&at(2, RACE, 0.5, 90));
        assert_eq!(
            event,
            Some(SessionEvent::Discarded {
                session_uid: 1,
                duration_secs: -9.5,
                reason: EndReason::SessionChanged,
            })
        );
        assert!(!tracker.is_active());

        let event = tracker.process(&at(2, RACE, 0.6, 90));
        assert!(matches!(event, Some(SessionEvent::Started { session_uid: 2, .. })));
    }

    #[test]
    fn new_session_id_with_later_clock_ends_race() {
        let mut tracker = tracker();
        tracker.process(&at(1, RACE, 10.0, 0));

        let event = tracker.process(&at(2, RACE, 100.0, 90));
        assert_eq!(
            event,
            Some(SessionEvent::Ended {
                session_uid: 1,
                duration_secs: 90.0,
                reason: EndReason::SessionChanged,
            })
        );
    }

    #[test]
    fn nan_session_time_never_starts_a_race() {
        let mut tracker = tracker();
        assert_eq!(tracker.process(&at(1, RACE, f32::NAN, 0)), None);
        assert_eq!(tracker.state(), TrackerState::Idle);
        assert_eq!(tracker.process(&at(1, QUALIFYING, 80.0, 1)), None);
    }

    #[test]
    fn nan_clock_mid_race_is_discarded() {
        let mut tracker = tracker();
        tracker.process(&at(1, RACE, 10.0, 0));
        tracker.process(&at(1, RACE, 200.0, 190));

        let event = tracker.process(&at(1, QUALIFYING, f32::NAN, 191));
        assert!(matches!(
            event,
            Some(SessionEvent::Discarded { session_uid: 1, reason: EndReason::SessionTypeChanged, .. })
        ));
        assert!(!tracker.is_active());
    }

    #[test]
    fn long_pause_ends_race_without_type_change() {
        let mut tracker = tracker();
        tracker.process(&at(1, RACE, 10.0, 0));
        tracker.process(&at(1, RACE, 100.0, 90));

        // Game clock frozen while paused; only the wall clock moves.
        assert_eq!(tracker.process(&paused(at(1, RACE, 100.0, 100))), None);
        assert_eq!(tracker.process(&paused(at(1, RACE, 100.0, 130))), None, "exactly 30 s");

        let event = tracker.process(&paused(at(1, RACE, 100.0, 131)));
        assert!(matches!(
            event,
            Some(SessionEvent::Ended { session_uid: 1, reason: EndReason::PauseTimeout, .. })
        ));
    }

    #[test]
    fn unpausing_resets_the_pause_clock() {
        let mut tracker = tracker();
        tracker.process(&at(1, RACE, 10.0, 0));

        tracker.process(&paused(at(1, RACE, 20.0, 10)));
        tracker.process(&paused(at(1, RACE, 20.0, 35)));
        tracker.process(&at(1, RACE, 21.0, 36));
        tracker.process(&paused(at(1, RACE, 22.0, 37)));

        assert_eq!(tracker.process(&paused(at(1, RACE, 22.0, 60))), None);
        assert!(tracker.is_active());
        assert_eq!(
            tracker.record().and_then(|r| r.pause_started),
            Some(SystemTime::UNIX_EPOCH + Duration::from_secs(37))
        );
    }

    #[test]
    fn forced_end_bypasses_duration_check() {
        let mut tracker = tracker();
        assert_eq!(tracker.force_end(), None);

        tracker.process(&at(7, RACE, 5.0, 0));
        tracker.process(&at(7, RACE, 8.0, 3));

        let event = tracker.force_end();
        assert_eq!(
            event,
            Some(SessionEvent::Ended { session_uid: 7, duration_secs: 3.0, reason: EndReason::Forced })
        );
        assert_eq!(tracker.active_session(), None);
    }

    #[test]
    fn non_race_packets_after_an_end_stay_idle() {
        let mut tracker = tracker();
        tracker.process(&at(1, RACE, 10.0, 0));
        let event = tracker.process(&at(1, QUALIFYING, 100.0, 90));
        assert!(matches!(event, Some(SessionEvent::Ended { .. })));
        assert_eq!(tracker.process(&at(1, QUALIFYING, 101.0, 91)), None);
    }
}
