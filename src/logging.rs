//! Logging setup for host applications
//!
//! The library only emits `tracing` events. Hosts that do not install their
//! own subscriber can call [`init_tracing`] once at start-up; `RUST_LOG`
//! overrides the default directive.

use tracing::info;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

/// Install a global fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"pitlane_sr=info"`).
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(default_directive: &str) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .try_init()?;

    info!(default_directive, "Tracing initialized");
    Ok(())
}
