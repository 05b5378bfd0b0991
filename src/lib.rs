//! Safety rating tracker for F1 2019 UDP telemetry.
//!
//! Pitlane SR listens to the game's UDP telemetry, detects when a race starts
//! and ends, and maintains a bounded safety rating driven by the incidents it
//! sees: off-track excursions and collisions.
//!
//! # Features
//!
//! - **Packet decoding**: session, lap data and car damage packets merged into
//!   one [`RaceState`] snapshot
//! - **Session detection**: race start/end inferred from session type, session
//!   id and pause state, with short sessions discarded
//! - **Rating engine**: sliding window of per-corner incident weight, license
//!   tiers from Rookie to SS
//! - **Async delivery**: snapshots over a watch channel, throttled streams for
//!   overlays
//!
//! # Architecture
//!
//! One receive task reads a datagram, then runs decode, session check and
//! rating update before reading the next. Persistence and session listeners
//! are injected collaborators, called synchronously at session boundaries.
//!
//! ## Example (live)
//!
//! ```rust,no_run
//! use pitlane_sr::{SafetyTracker, TrackerConfig, UpdateRate};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tracker = SafetyTracker::listen(TrackerConfig::default()).await?;
//!     let mut overlay = tracker.subscribe(UpdateRate::Max(10));
//!
//!     while let Some(snapshot) = overlay.next().await {
//!         println!("{:.2} ({})", snapshot.stats.rating, snapshot.stats.tier_name);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
pub mod logging;
pub mod types;

// Decoding
pub mod decoder;
pub mod protocol;

// Session and rating logic
pub mod pipeline;
pub mod rating;
pub mod session;
pub mod tracks;

// Collaborators
pub mod listener;
pub mod store;

// Stream-based delivery
mod builder;
pub mod driver;
pub mod handle;
pub mod source;
pub mod sources;
pub mod stream;

// Core exports
pub use config::TrackerConfig;
pub use error::*;
pub use types::*;

// Main API exports
pub use builder::TrackerBuilder;
pub use decoder::TelemetryDecoder;
pub use handle::TrackerHandle;
pub use listener::{ChannelListener, SessionListener, SessionNotification};
pub use pipeline::{Pipeline, TrackerSnapshot};
pub use protocol::F12019Decoder;
pub use rating::{Cpi, LicenseTier, RatingEngine, RatingStats};
pub use session::{SessionEvent, SessionTracker};
pub use source::{Datagram, DatagramSource};
pub use store::{MemoryStore, RatingStore};

/// Unified entry point for starting a tracker.
///
/// # Examples
///
/// ## Live telemetry
/// ```rust,no_run
/// use pitlane_sr::{SafetyTracker, TrackerConfig};
///
/// #[tokio::main]
/// async fn main() -> pitlane_sr::Result<()> {
///     let tracker = SafetyTracker::listen(TrackerConfig::default()).await?;
///     // Use tracker...
///     Ok(())
/// }
/// ```
///
/// ## Scripted replay
/// ```rust
/// use pitlane_sr::sources::RaceScript;
/// use pitlane_sr::{SafetyTracker, TrackerConfig};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> pitlane_sr::Result<()> {
///     let script = RaceScript::new(1, 7).drive(2.0).complete_lap().drive(70.0).session_type(0);
///     let tracker = SafetyTracker::replay(TrackerConfig::default(), script.into_source())?;
///     let last = tracker.finished().await;
///     assert!(last.session.is_none());
///     assert_eq!(last.stats.corners_completed, 1);
///     Ok(())
/// }
/// ```
pub struct SafetyTracker;

impl SafetyTracker {
    /// Configure a tracker with custom collaborators.
    pub fn builder(config: TrackerConfig) -> TrackerBuilder {
        TrackerBuilder::new(config)
    }

    /// Bind the configured UDP port and start tracking with an in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The UDP port cannot be bound
    pub async fn listen(config: TrackerConfig) -> Result<TrackerHandle> {
        TrackerBuilder::new(config).listen().await
    }

    /// Track a replayed or otherwise custom datagram source.
    ///
    /// Must be called from within a tokio runtime.
    pub fn replay<S: DatagramSource>(config: TrackerConfig, source: S) -> Result<TrackerHandle> {
        TrackerBuilder::new(config).spawn(source)
    }
}
