//! Stream throttling utilities

use futures::{Stream, ready};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};

/// Extension trait to add throttling to any Stream
pub trait ThrottleExt: Stream {
    /// Throttle the stream to emit at most once per interval
    ///
    /// Uses "latest-wins" semantics - if multiple items arrive
    /// during an interval, only the latest is emitted.
    fn throttle(self, duration: Duration) -> Throttle<Self>
    where
        Self: Sized,
    {
        Throttle::new(self, duration)
    }
}

impl<T: Stream> ThrottleExt for T {}

pin_project! {
    /// A stream combinator that throttles emission rate
    pub struct Throttle<S: Stream> {
        #[pin]
        stream: S,
        interval: Interval,
        pending: Option<S::Item>,
        exhausted: bool,
    }
}

impl<S: Stream> Throttle<S> {
    /// Create a new throttled stream
    pub fn new(stream: S, duration: Duration) -> Self {
        let mut interval = interval(duration);
        // Delay rather than burst after a quiet period
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self { stream, interval, pending: None, exhausted: false }
    }
}

impl<S: Stream> Stream for Throttle<S> {
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        // Drain all available items, keeping only the latest
        while !*this.exhausted {
            match this.stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => *this.pending = Some(item),
                Poll::Ready(None) => *this.exhausted = true,
                Poll::Pending => break,
            }
        }

        if this.pending.is_none() {
            // Nothing to emit: either the inner stream ended, or it has
            // registered the waker and we wait for its next item.
            return if *this.exhausted { Poll::Ready(None) } else { Poll::Pending };
        }

        ready!(this.interval.poll_tick(cx));
        Poll::Ready(this.pending.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::sync::watch;
    use tokio_stream::wrappers::WatchStream;

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_latest() {
        let items: Vec<u32> = futures::stream::iter(0..10).throttle(Duration::from_millis(100)).collect().await;
        assert_eq!(items, vec![9]);
    }

    #[tokio::test(start_paused = true)]
    async fn quiet_source_does_not_end_stream() {
        let (tx, rx) = watch::channel(0u32);
        let mut stream = WatchStream::new(rx).throttle(Duration::from_millis(100));

        assert_eq!(stream.next().await, Some(0));

        let producer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(350)).await;
            tx.send_replace(1);
            tx.send_replace(2);
            tokio::time::sleep(Duration::from_millis(50)).await;
        });

        assert_eq!(stream.next().await, Some(2));
        producer.await.ok();
        assert_eq!(stream.next().await, None, "sender dropped");
    }

    #[tokio::test(start_paused = true)]
    async fn emissions_are_spaced_by_interval() {
        let (tx, rx) = watch::channel(0u32);
        let mut stream = WatchStream::new(rx).throttle(Duration::from_millis(100));
        let start = tokio::time::Instant::now();

        assert_eq!(stream.next().await, Some(0));
        tx.send_replace(1);
        assert_eq!(stream.next().await, Some(1));
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
