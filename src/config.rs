//! Tracker configuration
//!
//! Every section has defaults matching the F1 2019 game and the rating model,
//! so an empty YAML document is a valid configuration:
//!
//! ```yaml
//! network:
//!   port: 20777
//!   receive_timeout_secs: 1.0
//! session:
//!   pause_threshold_secs: 30.0
//!   min_race_duration_secs: 60.0
//! rating:
//!   window_size: 100
//!   rate_constant: 0.05
//! sync_interval_secs: 2.0
//! ```

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::types::RACE_SESSION_CODE;
use crate::{Result, TrackerError};

/// Default UDP port the game sends telemetry to.
pub const DEFAULT_UDP_PORT: u16 = 20777;

/// Complete tracker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub network: NetworkConfig,
    pub session: SessionConfig,
    pub rating: RatingConfig,
    /// Interval between rating writes to the store while a race is active
    pub sync_interval_secs: f64,
}

/// UDP receive settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub bind_address: IpAddr,
    pub port: u16,
    /// Upper bound on a single receive, so the loop can observe shutdown
    pub receive_timeout_secs: f64,
    pub max_datagram_size: usize,
    /// Expected game send rate, used to normalize subscriber update rates
    pub packet_rate_hz: f64,
}

/// Session lifecycle thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub race_session_type: u8,
    /// Wall-clock pause length after which an active race is ended
    pub pause_threshold_secs: f64,
    /// Races shorter than this (game clock) are discarded without notification
    pub min_race_duration_secs: f32,
}

/// Rating model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub min_rating: f64,
    pub max_rating: f64,
    /// Corners kept in the sliding incident window
    pub window_size: usize,
    /// Rating change per recomputation at twice the target cleanliness
    pub rate_constant: f64,
    /// Corners per incident point considered "on target"
    pub target_index: f64,
    /// Cleanliness index used when the window holds no incident weight
    pub clean_index: f64,
    /// Summed damage increase that counts as a collision
    pub damage_threshold: f32,
    /// Extra rating applied when the integer part of the rating changes
    pub boundary_bonus: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            session: SessionConfig::default(),
            rating: RatingConfig::default(),
            sync_interval_secs: 2.0,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_UDP_PORT,
            receive_timeout_secs: 1.0,
            max_datagram_size: 2048,
            packet_rate_hz: 60.0,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            race_session_type: RACE_SESSION_CODE,
            pause_threshold_secs: 30.0,
            min_race_duration_secs: 60.0,
        }
    }
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            min_rating: 2.50,
            max_rating: 7.99,
            window_size: 100,
            rate_constant: 0.05,
            target_index: 30.0,
            clean_index: 100.0,
            damage_threshold: 5.0,
            boundary_bonus: 0.40,
        }
    }
}

impl NetworkConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.receive_timeout_secs)
    }
}

impl SessionConfig {
    pub fn pause_threshold(&self) -> Duration {
        Duration::from_secs_f64(self.pause_threshold_secs)
    }
}

impl TrackerConfig {
    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: TrackerConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| TrackerError::config(None, format!("YAML parse failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading tracker configuration from {}", path.display());

        let yaml = std::fs::read_to_string(path).map_err(|e| {
            TrackerError::config(Some(path.to_path_buf()), format!("unreadable: {}", e))
        })?;

        Self::from_yaml_str(&yaml).map_err(|e| match e {
            TrackerError::Config { details, .. } => {
                TrackerError::config(Some(path.to_path_buf()), details)
            }
            other => other,
        })
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs_f64(self.sync_interval_secs)
    }

    /// Reject configurations the tracker cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |details: &str| Err(TrackerError::config(None, details));
        let rating = &self.rating;

        if !(rating.min_rating < rating.max_rating) {
            return invalid("rating.min_rating must be below rating.max_rating");
        }
        if rating.window_size == 0 {
            return invalid("rating.window_size must be at least 1");
        }
        if !(rating.target_index > 0.0) {
            return invalid("rating.target_index must be positive");
        }
        if !(rating.clean_index > 0.0) {
            return invalid("rating.clean_index must be positive");
        }
        if !(rating.damage_threshold >= 0.0) || !(rating.boundary_bonus >= 0.0) {
            return invalid("rating thresholds and bonus must not be negative");
        }
        if !(self.network.receive_timeout_secs > 0.0) || !self.network.receive_timeout_secs.is_finite() {
            return invalid("network.receive_timeout_secs must be positive and finite");
        }
        if self.network.max_datagram_size < crate::protocol::packets::SESSION_PACKET_MIN_LEN {
            return invalid("network.max_datagram_size cannot hold a session packet");
        }
        for (name, secs) in [
            ("session.pause_threshold_secs", self.session.pause_threshold_secs),
            ("sync_interval_secs", self.sync_interval_secs),
        ] {
            if !(secs >= 0.0) || !secs.is_finite() {
                return invalid(format!("{} must be finite and not negative", name).as_str());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() -> anyhow::Result<()> {
        let config = TrackerConfig::from_yaml_str("{}")?;
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.network.port, 20777);
        assert_eq!(config.session.race_session_type, 10);
        assert_eq!(config.session.pause_threshold(), Duration::from_secs(30));
        assert_eq!(config.sync_interval(), Duration::from_secs(2));
        Ok(())
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() -> anyhow::Result<()> {
        let yaml = "network:\n  port: 30000\nrating:\n  window_size: 20\n";
        let config = TrackerConfig::from_yaml_str(yaml)?;

        assert_eq!(config.network.port, 30000);
        assert_eq!(config.network.max_datagram_size, 2048);
        assert_eq!(config.rating.window_size, 20);
        assert_eq!(config.rating.max_rating, 7.99);
        Ok(())
    }

    #[test]
    fn inverted_rating_bounds_are_rejected() {
        let yaml = "rating:\n  min_rating: 8.0\n  max_rating: 2.0\n";
        let error = TrackerConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(error, TrackerError::Config { .. }));
        assert!(error.to_string().contains("min_rating"));
    }

    #[test]
    fn infinite_durations_are_rejected() {
        for yaml in [
            "network:\n  receive_timeout_secs: .inf\n",
            "session:\n  pause_threshold_secs: .inf\n",
            "sync_interval_secs: .inf\n",
        ] {
            let error = TrackerConfig::from_yaml_str(yaml).unwrap_err();
            assert!(error.to_string().contains("finite"), "{yaml}: {error}");
        }

        let mut config = TrackerConfig::default();
        config.session.pause_threshold_secs = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let error = TrackerConfig::from_yaml_str("network: [1, 2").unwrap_err();
        assert!(matches!(error, TrackerError::Config { path: None, .. }));
    }

    #[test]
    fn missing_file_reports_its_path() {
        let error = TrackerConfig::load("/nonexistent/tracker.yaml").unwrap_err();
        assert!(error.to_string().contains("/nonexistent/tracker.yaml"));
    }

    #[test]
    fn config_round_trips_through_yaml() -> anyhow::Result<()> {
        let mut config = TrackerConfig::default();
        config.session.min_race_duration_secs = 120.0;
        let yaml = serde_yaml_ng::to_string(&config)?;
        assert_eq!(TrackerConfig::from_yaml_str(&yaml)?, config);
        Ok(())
    }
}
