//! Error types for the safety rating tracker.
//!
//! Decoding, session tracking and rating updates never surface errors to the
//! packet loop: malformed datagrams are dropped and collaborator failures are
//! logged. The errors in this module describe the things a host application
//! does need to react to: binding the socket, loading configuration, and
//! the internal parse results that the decoder collapses to "no snapshot".
//!
//! ## Error Categories
//!
//! - **Network Errors**: the UDP socket could not be bound or read
//! - **Parse Errors**: a datagram was too short or carried an unknown packet id
//! - **Config Errors**: a YAML configuration file was unreadable or invalid
//! - **Store Errors**: a persistence collaborator reported a failure
//!
//! ```rust
//! use pitlane_sr::TrackerError;
//!
//! let error = TrackerError::parse("packet header", "need 24 bytes, have 12");
//! assert!(!error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for tracker operations.
pub type Result<T, E = TrackerError> = std::result::Result<T, E>;

/// Main error type for tracker operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TrackerError {
    #[error("Failed to bind telemetry socket on {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Telemetry socket error")]
    Socket {
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Unrecognized packet id {packet_id}")]
    UnknownPacket { packet_id: u8 },

    #[error("Invalid configuration ({}): {details}", display_path(.path))]
    Config { path: Option<PathBuf>, details: String },

    #[error("Rating store operation '{operation}' failed: {reason}")]
    Store { operation: String, reason: String },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },
}

impl TrackerError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TrackerError::Bind { .. } => true,
            TrackerError::Socket { .. } => true,
            TrackerError::Timeout { .. } => true,
            TrackerError::Store { .. } => true,
            TrackerError::Parse { .. } => false,
            TrackerError::UnknownPacket { .. } => false,
            TrackerError::Config { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TrackerError::Bind { .. } => vec![
                "Check that no other telemetry tool is bound to the same UDP port",
                "Choose a different port in the network configuration",
                "Verify the bind address exists on this machine",
            ],
            TrackerError::Socket { .. } => vec![
                "Check network interface availability",
                "Restart the tracker to re-open the socket",
            ],
            TrackerError::Parse { .. } => vec![
                "Enable UDP telemetry in the game and select the 2019 packet format",
                "Verify no proxy is truncating datagrams",
            ],
            TrackerError::UnknownPacket { .. } => vec![
                "Packets other than session, lap data and car damage are ignored",
            ],
            TrackerError::Config { .. } => vec![
                "Check the YAML syntax of the configuration file",
                "Ensure rating bounds are ordered and the window is non-empty",
                "Remove unknown keys or fall back to the defaults",
            ],
            TrackerError::Store { .. } => vec![
                "Check that the persistence backend is reachable",
                "The next session boundary will write the rating again",
            ],
            TrackerError::Timeout { .. } => vec![
                "Verify the game is sending telemetry to this host and port",
                "Increase the receive timeout",
            ],
        }
    }

    /// Helper constructor for parse errors.
    pub fn parse(context: impl Into<String>, details: impl Into<String>) -> Self {
        TrackerError::Parse { context: context.into(), details: details.into() }
    }

    /// Helper constructor for socket bind errors.
    pub fn bind_failed(addr: SocketAddr, source: std::io::Error) -> Self {
        TrackerError::Bind { addr, source }
    }

    /// Helper constructor for configuration errors.
    pub fn config(path: Option<PathBuf>, details: impl Into<String>) -> Self {
        TrackerError::Config { path, details: details.into() }
    }

    /// Helper constructor for persistence collaborator failures.
    pub fn store(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        TrackerError::Store { operation: operation.into(), reason: reason.into() }
    }

    /// Helper constructor for insufficient-data parse failures.
    pub fn truncated(context: impl Into<String>, needed: usize, available: usize) -> Self {
        TrackerError::Parse {
            context: context.into(),
            details: format!("need {} bytes, have {}", needed, available),
        }
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "<inline>".to_string())
}

impl From<std::io::Error> for TrackerError {
    fn from(err: std::io::Error) -> Self {
        TrackerError::Socket { source: err }
    }
}
