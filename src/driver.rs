//! Driver spawns and manages the datagram receive task

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use crate::TrackerError;
use crate::pipeline::{Pipeline, TrackerSnapshot};
use crate::source::DatagramSource;

/// Consecutive source errors (timeouts excluded) before the task gives up.
const MAX_ERRORS: u32 = 10;

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Latest tracker snapshot, replaced after every datagram
    pub snapshots: watch::Receiver<Arc<TrackerSnapshot>>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// Resolves to the final snapshot once the task has shut down
    pub handle: JoinHandle<Arc<TrackerSnapshot>>,
}

/// Driver spawns and manages the receive task
///
/// The task owns the source and the pipeline. Each datagram runs through
/// decode, session check and rating update before the next one is read.
pub struct Driver;

impl Driver {
    /// Spawn the receive task for the given source and pipeline
    pub fn spawn<S>(source: S, pipeline: Pipeline) -> DriverChannels
    where
        S: DatagramSource,
    {
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(pipeline.snapshot()));
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        let handle = tokio::spawn(async move {
            Self::receive_task(source, pipeline, snapshot_tx, cancel_task).await
        });

        DriverChannels { snapshots: snapshot_rx, cancel, handle }
    }

    /// Receive task - reads datagrams until cancelled or the source ends
    async fn receive_task<S>(
        mut source: S,
        mut pipeline: Pipeline,
        snapshot_tx: watch::Sender<Arc<TrackerSnapshot>>,
        cancel: CancellationToken,
    ) -> Arc<TrackerSnapshot>
    where
        S: DatagramSource,
    {
        info!(protocol = pipeline.protocol(), "Receive task started");
        let mut error_count = 0u32;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Receive task cancelled");
                    break;
                }
                result = source.next_datagram() => result,
            };

            match result {
                Ok(Some(datagram)) => {
                    error_count = 0;
                    let step = catch_unwind(AssertUnwindSafe(|| {
                        pipeline.handle_datagram(&datagram.bytes, datagram.received_at)
                    }));
                    if let Err(panic) = step {
                        error!(
                            len = datagram.bytes.len(),
                            "Datagram processing panicked, dropping datagram: {}",
                            panic_message(panic.as_ref())
                        );
                    }

                    snapshot_tx.send_replace(Arc::new(pipeline.snapshot()));
                }
                Ok(None) => {
                    info!("Datagram source exhausted");
                    break;
                }
                Err(TrackerError::Timeout { duration }) => {
                    trace!(?duration, "No telemetry within receive timeout");
                }
                Err(e) => {
                    // Source error - don't crash on transient failures
                    error_count += 1;
                    error!("Source error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if error_count >= MAX_ERRORS || !e.is_retryable() {
                        error!("Giving up on datagram source");
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ...
                    let backoff = Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        if let Some(event) = pipeline.shutdown() {
            debug!(?event, "Active session closed on shutdown");
        }
        let last = Arc::new(pipeline.snapshot());
        snapshot_tx.send_replace(Arc::clone(&last));

        info!(
            received = last.datagrams_received,
            decoded = last.datagrams_decoded,
            rating = last.stats.rating,
            "Receive task ended"
        );
        last
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use crate::decoder::TelemetryDecoder;
    use crate::source::Datagram;
    use crate::sources::RaceScript;
    use crate::store::MemoryStore;
    use crate::types::RaceState;
    use std::time::SystemTime;

    /// Panics on the datagram `[0xFF]`, otherwise defers to the F1 2019 decoder.
    struct Exploding(crate::protocol::F12019Decoder);

    impl TelemetryDecoder for Exploding {
        fn decode_at(&mut self, bytes: &[u8], received_at: SystemTime) -> Option<RaceState> {
            if bytes == [0xFF] {
                panic!("decoder blew up");
            }
            self.0.decode_at(bytes, received_at)
        }

        fn protocol(&self) -> &'static str {
            "exploding"
        }

        fn last_known(&self) -> Option<&RaceState> {
            self.0.last_known()
        }
    }

    struct Failing;

    #[async_trait::async_trait]
    impl DatagramSource for Failing {
        async fn next_datagram(&mut self) -> crate::Result<Option<Datagram>> {
            Err(TrackerError::Socket { source: std::io::Error::other("interface down") })
        }

        fn packet_rate(&self) -> f64 {
            60.0
        }
    }

    #[tokio::test]
    async fn panicking_step_drops_only_that_datagram() -> anyhow::Result<()> {
        let _ = tracing_subscriber::fmt::try_init();
        let config = TrackerConfig::default();
        let decoder = Box::new(Exploding(crate::protocol::F12019Decoder::new()));
        let pipeline = Pipeline::with_decoder(&config, decoder, Box::new(MemoryStore::new()));

        let script = RaceScript::new(1, 2).drive(1.0).raw(vec![0xFF]).drive(1.0);
        let total = script.len() as u64;
        let channels = Driver::spawn(script.into_source(), pipeline);

        let last = channels.handle.await?;
        assert_eq!(last.datagrams_received, total);
        assert_eq!(last.datagrams_decoded, total - 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_source_errors_stop_the_task() -> anyhow::Result<()> {
        let pipeline = Pipeline::new(&TrackerConfig::default(), Box::new(MemoryStore::new()));
        let channels = Driver::spawn(Failing, pipeline);

        let last = channels.handle.await?;
        assert_eq!(last.datagrams_received, 0);
        Ok(())
    }

    #[tokio::test]
    async fn cancellation_force_ends_active_session() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let pipeline = Pipeline::new(&TrackerConfig::default(), Box::new(store.clone()));
        let source = RaceScript::new(77, 3).drive(5.0).into_source().paced(1.0);
        let mut channels = Driver::spawn(source, pipeline);

        channels
            .snapshots
            .wait_for(|snapshot| snapshot.session.is_some())
            .await?;
        channels.cancel.cancel();

        let last = channels.handle.await?;
        assert!(last.session.is_none());
        let session = store.session(77).expect("session recorded");
        assert!(session.final_rating.is_some(), "forced end bypasses the duration check");
        Ok(())
    }
}
