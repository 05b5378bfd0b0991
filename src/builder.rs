//! Tracker assembly

use tracing::info;

use crate::Result;
use crate::config::TrackerConfig;
use crate::decoder::TelemetryDecoder;
use crate::driver::Driver;
use crate::handle::TrackerHandle;
use crate::listener::SessionListener;
use crate::pipeline::Pipeline;
use crate::source::DatagramSource;
use crate::sources::UdpSource;
use crate::store::{MemoryStore, RatingStore};

/// Assembles a tracker from configuration and injected collaborators.
pub struct TrackerBuilder {
    config: TrackerConfig,
    store: Option<Box<dyn RatingStore>>,
    decoder: Option<Box<dyn TelemetryDecoder>>,
    listeners: Vec<Box<dyn SessionListener>>,
    load_stored_rating: bool,
}

impl TrackerBuilder {
    pub fn new(config: TrackerConfig) -> Self {
        Self { config, store: None, decoder: None, listeners: Vec::new(), load_stored_rating: true }
    }

    /// Persistence collaborator. Defaults to a fresh [`MemoryStore`].
    pub fn store(mut self, store: impl RatingStore) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    /// Decoder for a different protocol. Defaults to F1 2019.
    pub fn decoder(mut self, decoder: impl TelemetryDecoder) -> Self {
        self.decoder = Some(Box::new(decoder));
        self
    }

    pub fn listener(mut self, listener: impl SessionListener) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Whether to adopt the store's rating before the first datagram.
    pub fn load_stored_rating(mut self, load: bool) -> Self {
        self.load_stored_rating = load;
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Build the synchronous pipeline without spawning anything.
    pub fn build_pipeline(self) -> Result<Pipeline> {
        self.config.validate()?;

        let store = self.store.unwrap_or_else(|| Box::new(MemoryStore::new()));
        let mut pipeline = match self.decoder {
            Some(decoder) => Pipeline::with_decoder(&self.config, decoder, store),
            None => Pipeline::new(&self.config, store),
        };
        for listener in self.listeners {
            pipeline.add_listener(listener);
        }
        if self.load_stored_rating {
            pipeline.load_stored_rating();
        }
        Ok(pipeline)
    }

    /// Bind the configured UDP port and start tracking.
    pub async fn listen(self) -> Result<TrackerHandle> {
        self.config.validate()?;
        let source = UdpSource::bind(&self.config.network).await?;
        self.spawn(source)
    }

    /// Start tracking datagrams from `source`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S: DatagramSource>(self, source: S) -> Result<TrackerHandle> {
        let packet_rate = source.packet_rate();
        let pipeline = self.build_pipeline()?;
        info!(protocol = pipeline.protocol(), "Starting safety rating tracker");

        let channels = Driver::spawn(source, pipeline);
        Ok(TrackerHandle::new(channels, packet_rate))
    }
}
