//! Persistence collaborator for ratings and session history

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::{Result, TrackerError};

/// Where ratings and session boundaries are persisted.
///
/// Called synchronously from the packet loop at session boundaries and on the
/// periodic sync. Implementations should be quick; failures are logged by the
/// caller and never retried.
pub trait RatingStore: Send + 'static {
    /// Last persisted rating.
    fn current_rating(&self) -> Result<f64>;

    fn set_rating(&mut self, rating: f64) -> Result<()>;

    /// Record a session start. `Ok(false)` if the session id is already known.
    fn start_session(&mut self, session_uid: u64, track_id: i8, starting_rating: f64)
    -> Result<bool>;

    /// Record a session end. `Ok(false)` if the session id is unknown.
    fn end_session(&mut self, session_uid: u64, final_rating: f64) -> Result<bool>;
}

/// A session as recorded by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSession {
    pub track_id: i8,
    pub starting_rating: f64,
    pub final_rating: Option<f64>,
}

#[derive(Debug, Default)]
struct MemoryState {
    rating: Option<f64>,
    sessions: HashMap<u64, StoredSession>,
    rating_writes: u64,
}

/// In-memory [`RatingStore`].
///
/// Clones share the same state, so a host or test can keep one clone for
/// inspection while the tracker owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds a persisted rating.
    pub fn with_rating(rating: f64) -> Self {
        let store = Self::default();
        if let Ok(mut state) = store.state.lock() {
            state.rating = Some(rating);
        }
        store
    }

    fn lock(&self, operation: &str) -> Result<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| TrackerError::store(operation, "state lock poisoned"))
    }

    pub fn session(&self, session_uid: u64) -> Option<StoredSession> {
        self.lock("session").ok()?.sessions.get(&session_uid).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.lock("session_count").map(|state| state.sessions.len()).unwrap_or(0)
    }

    /// Number of `set_rating` calls so far.
    pub fn rating_writes(&self) -> u64 {
        self.lock("rating_writes").map(|state| state.rating_writes).unwrap_or(0)
    }

    pub fn stored_rating(&self) -> Option<f64> {
        self.lock("stored_rating").ok()?.rating
    }
}

impl RatingStore for MemoryStore {
    fn current_rating(&self) -> Result<f64> {
        self.lock("current_rating")?
            .rating
            .ok_or_else(|| TrackerError::store("current_rating", "no rating stored yet"))
    }

    fn set_rating(&mut self, rating: f64) -> Result<()> {
        let mut state = self.lock("set_rating")?;
        state.rating = Some(rating);
        state.rating_writes += 1;
        Ok(())
    }

    fn start_session(
        &mut self,
        session_uid: u64,
        track_id: i8,
        starting_rating: f64,
    ) -> Result<bool> {
        let mut state = self.lock("start_session")?;
        if state.sessions.contains_key(&session_uid) {
            return Ok(false);
        }
        state
            .sessions
            .insert(session_uid, StoredSession { track_id, starting_rating, final_rating: None });
        Ok(true)
    }

    fn end_session(&mut self, session_uid: u64, final_rating: f64) -> Result<bool> {
        let mut state = self.lock("end_session")?;
        match state.sessions.get_mut(&session_uid) {
            Some(session) => {
                session.final_rating = Some(final_rating);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
