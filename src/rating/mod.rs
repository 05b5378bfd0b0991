//! Safety rating engine
//!
//! The rating is a bounded score moved by the cleanliness of the most recent
//! corners. Each completed corner contributes the summed weight of the
//! incidents seen while driving it; the window's corners-per-weight index is
//! compared against a target, and the rating drifts up or down in proportion.
//! Crossing an integer boundary adds a one-off bonus in the direction of
//! travel, which makes tier changes sticky.
//!
//! ```rust
//! use pitlane_sr::config::RatingConfig;
//! use pitlane_sr::rating::{LicenseTier, RatingEngine};
//!
//! let mut engine = RatingEngine::new(RatingConfig::default());
//! engine.import_legacy(50.0);
//! assert_eq!(engine.tier(), LicenseTier::B);
//! ```

mod engine;
mod incident;
mod license;
mod stats;
mod window;

pub use engine::{RatingEngine, RatingUpdate};
pub use incident::{Incident, IncidentCounts, IncidentSeverity};
pub use license::LicenseTier;
pub use stats::{Cpi, RatingStats};
pub use window::IncidentWindow;
