//! Incident detection and incremental rating recomputation

use serde::Serialize;
use tracing::{debug, trace};

use super::{
    Cpi, Incident, IncidentCounts, IncidentSeverity, IncidentWindow, LicenseTier, RatingStats,
};
use crate::config::RatingConfig;
use crate::types::{DamageVector, RaceState};

/// What one snapshot did to the rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingUpdate {
    /// Incidents detected in this snapshot
    pub incidents: Vec<Incident>,
    pub corner_completed: bool,
    pub previous_rating: f64,
    pub rating: f64,
    /// False while the window is still empty
    pub recomputed: bool,
}

impl RatingUpdate {
    pub fn tier_changed(&self) -> bool {
        LicenseTier::for_rating(self.previous_rating) != LicenseTier::for_rating(self.rating)
    }
}

/// Stateful safety rating calculator.
///
/// The rating and the incident window persist across sessions; everything
/// else is per-session bookkeeping and is cleared by [`reset_session`].
///
/// A "corner" is a completed lap. Incidents seen while a lap is in progress
/// accumulate and are pushed into the window as one entry when the lap
/// counter advances.
///
/// [`reset_session`]: RatingEngine::reset_session
#[derive(Debug, Clone)]
pub struct RatingEngine {
    config: RatingConfig,
    rating: f64,
    window: IncidentWindow,
    accumulator: u32,
    counts: IncidentCounts,
    corners_completed: u32,
    last_lap: u8,
    last_off_track: bool,
    last_damage: DamageVector,
}

impl RatingEngine {
    /// Create an engine at the minimum rating.
    pub fn new(config: RatingConfig) -> Self {
        let rating = config.min_rating;
        Self::with_rating(config, rating)
    }

    pub fn with_rating(config: RatingConfig, rating: f64) -> Self {
        let window = IncidentWindow::with_capacity(config.window_size);
        let rating = rating.clamp(config.min_rating, config.max_rating);
        Self {
            config,
            rating,
            window,
            accumulator: 0,
            counts: IncidentCounts::default(),
            corners_completed: 0,
            last_lap: 0,
            last_off_track: false,
            last_damage: DamageVector::default(),
        }
    }

    /// Feed one snapshot from an active session.
    pub fn process(&mut self, state: &RaceState) -> RatingUpdate {
        let previous_rating = self.rating;

        let corner_completed = self.detect_corner(state.current_lap);
        let incidents = self.detect_incidents(state);
        let recomputed = self.recompute();

        RatingUpdate { incidents, corner_completed, previous_rating, rating: self.rating, recomputed }
    }

    fn detect_corner(&mut self, lap: u8) -> bool {
        if lap <= self.last_lap || lap == 0 {
            return false;
        }

        self.window.push(self.accumulator);
        self.corners_completed += 1;
        trace!(
            lap,
            weight = self.accumulator,
            window = self.window.len(),
            "Corner completed"
        );
        self.accumulator = 0;
        self.last_lap = lap;
        true
    }

    fn detect_incidents(&mut self, state: &RaceState) -> Vec<Incident> {
        let mut incidents = Vec::new();

        if state.is_off_track && !self.last_off_track {
            incidents.push(self.record(IncidentSeverity::Low, state));
        }
        self.last_off_track = state.is_off_track;

        let increase = state.damage.increase_since(&self.last_damage);
        if increase > self.config.damage_threshold {
            debug!(increase, "Damage increase above collision threshold");
            incidents.push(self.record(IncidentSeverity::High, state));
        }
        self.last_damage = state.damage;

        incidents
    }

    fn record(&mut self, severity: IncidentSeverity, state: &RaceState) -> Incident {
        self.accumulator += severity.weight();
        self.counts.record(severity);
        Incident { severity, lap: state.current_lap, session_time: state.session_time }
    }

    fn recompute(&mut self) -> bool {
        if self.window.is_empty() {
            return false;
        }

        let config = &self.config;
        let weight_sum = self.window.weight_sum();
        let index = if weight_sum == 0 {
            config.clean_index
        } else {
            self.window.len() as f64 / weight_sum.max(1) as f64
        };

        let delta = (index / config.target_index - 1.0) * config.rate_constant;
        let old = self.rating;
        let mut new = (old + delta).clamp(config.min_rating, config.max_rating);

        if new.floor() != old.floor() {
            let direction = if new > old { 1.0 } else { -1.0 };
            new = (new + direction * config.boundary_bonus)
                .clamp(config.min_rating, config.max_rating);
            debug!(from = old, to = new, "Rating crossed an integer boundary");
        }

        self.rating = new;
        true
    }

    /// Clear per-session bookkeeping. The rating and window persist.
    pub fn reset_session(&mut self) {
        self.counts = IncidentCounts::default();
        self.corners_completed = 0;
        self.accumulator = 0;
        self.last_lap = 0;
        self.last_off_track = false;
    }

    /// Map a rating on the legacy 0-100 scale onto the rating range.
    pub fn import_legacy(&mut self, legacy: f64) -> f64 {
        let config = &self.config;
        let mapped =
            config.min_rating + (legacy / 100.0) * (config.max_rating - config.min_rating);
        self.rating = mapped.clamp(config.min_rating, config.max_rating);
        self.rating
    }

    /// Adopt a rating read back from persistence.
    ///
    /// Values above the maximum can only come from the legacy 0-100 scale and
    /// are remapped; anything else is clamped into range.
    pub fn adopt_stored_rating(&mut self, stored: f64) -> f64 {
        if stored > self.config.max_rating {
            debug!(stored, "Stored rating is on the legacy scale, converting");
            self.import_legacy(stored)
        } else {
            self.set_rating(stored)
        }
    }

    pub fn set_rating(&mut self, rating: f64) -> f64 {
        self.rating = rating.clamp(self.config.min_rating, self.config.max_rating);
        self.rating
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn tier(&self) -> LicenseTier {
        LicenseTier::for_rating(self.rating)
    }

    pub fn counts(&self) -> IncidentCounts {
        self.counts
    }

    pub fn corners_completed(&self) -> u32 {
        self.corners_completed
    }

    pub fn window(&self) -> &IncidentWindow {
        &self.window
    }

    pub fn cpi(&self) -> Cpi {
        Cpi::from_counts(self.corners_completed, self.counts.total())
    }

    pub fn stats(&self, session_active: bool) -> RatingStats {
        let tier = self.tier();
        RatingStats {
            rating: self.rating,
            tier,
            tier_name: tier.name(),
            tier_color: tier.color(),
            corners_completed: self.corners_completed,
            incidents: self.counts,
            total_incidents: self.counts.total(),
            window_len: self.window.len(),
            window_weight_sum: self.window.weight_sum(),
            average_weight: self.window.average_weight(),
            cpi: session_active.then(|| self.cpi()),
        }
    }
}
