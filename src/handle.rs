//! Handle to a running tracker

use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::driver::DriverChannels;
use crate::pipeline::TrackerSnapshot;
use crate::rating::RatingStats;
use crate::stream::ThrottleExt;
use crate::types::UpdateRate;

/// Handle to a running tracker task.
///
/// Dropping the handle cancels the task, which force-ends an active session
/// and writes the final rating before exiting.
pub struct TrackerHandle {
    /// Snapshot watch receiver
    snapshots: watch::Receiver<Arc<TrackerSnapshot>>,

    /// Expected datagram rate of the source
    packet_rate: f64,

    /// Cancellation token for stopping the task
    cancel: CancellationToken,

    task: Option<JoinHandle<Arc<TrackerSnapshot>>>,
}

impl TrackerHandle {
    pub(crate) fn new(channels: DriverChannels, packet_rate: f64) -> Self {
        info!(packet_rate, "Tracker running");
        Self {
            snapshots: channels.snapshots,
            packet_rate,
            cancel: channels.cancel,
            task: Some(channels.handle),
        }
    }

    /// Latest published snapshot.
    pub fn current(&self) -> Arc<TrackerSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Latest rating statistics. CPI is only present while a race is active.
    pub fn stats(&self) -> RatingStats {
        self.snapshots.borrow().stats.clone()
    }

    /// Subscribe to snapshots
    ///
    /// Starts with the current snapshot. `UpdateRate::Max(hz)` below the
    /// source's packet rate throttles with latest-wins semantics.
    pub fn subscribe(
        &self,
        rate: UpdateRate,
    ) -> impl Stream<Item = Arc<TrackerSnapshot>> + Send + 'static {
        let snapshots = WatchStream::new(self.snapshots.clone());

        match rate.throttle_interval(self.packet_rate) {
            None => snapshots.boxed(),
            Some(interval) => snapshots.throttle(interval).boxed(),
        }
    }

    /// Get the source packet rate
    pub fn packet_rate(&self) -> f64 {
        self.packet_rate
    }

    /// Whether the receive task is still running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the tracker and wait for the final snapshot.
    pub async fn shutdown(mut self) -> Arc<TrackerSnapshot> {
        self.cancel.cancel();
        self.join().await
    }

    /// Wait for the source to run out (replays), without cancelling.
    pub async fn finished(mut self) -> Arc<TrackerSnapshot> {
        self.join().await
    }

    async fn join(&mut self) -> Arc<TrackerSnapshot> {
        let Some(task) = self.task.take() else {
            return self.current();
        };
        match task.await {
            Ok(last) => last,
            Err(e) => {
                error!("Tracker task failed: {}", e);
                self.current()
            }
        }
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        debug!("Dropping tracker handle");
        // Cancel the task on drop for clean shutdown
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for TrackerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerHandle")
            .field("packet_rate", &self.packet_rate)
            .field("running", &self.is_running())
            .finish()
    }
}
