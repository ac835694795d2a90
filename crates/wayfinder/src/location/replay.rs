//! A location source that replays a recorded track.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, trace, warn};

use super::{LiveLocation, LocationError, LocationEvent, LocationSource, SubscriptionHandle};

/// Replays a fixed sequence of samples at a steady interval.
///
/// The replay runs on a tokio task. When the track runs out the source
/// reports [`LocationError::SignalLost`] and closes its channel. The
/// subscription stays active until [`LocationSource::stop`] releases it.
#[derive(Debug)]
pub struct ReplaySource {
    track: Vec<LiveLocation>,
    interval: Duration,
    next_id: u64,
    current: Option<SubscriptionHandle>,
}

impl ReplaySource {
    /// Create a replay of `track`, one sample every `interval`.
    #[must_use]
    pub fn new(track: Vec<LiveLocation>, interval: Duration) -> Self {
        Self {
            track,
            interval,
            next_id: 1,
            current: None,
        }
    }

    /// Number of samples in the track.
    #[must_use]
    pub fn len(&self) -> usize {
        self.track.len()
    }

    /// Whether the track is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.track.is_empty()
    }

    /// Check if a subscription is currently live.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(SubscriptionHandle::is_active)
    }
}

impl LocationSource for ReplaySource {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn start(
        &mut self,
        tx: mpsc::Sender<LocationEvent>,
    ) -> Result<SubscriptionHandle, LocationError> {
        if self.is_running() {
            warn!("Replay source already running");
            return Err(LocationError::AlreadyRunning);
        }
        if self.track.is_empty() {
            return Err(LocationError::unavailable("replay track is empty"));
        }
        if self.interval.is_zero() {
            return Err(LocationError::unavailable("replay interval must be non-zero"));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| LocationError::unavailable(format!("no async runtime: {e}")))?;

        let handle = SubscriptionHandle::new(self.next_id);
        self.next_id += 1;

        debug!(
            id = handle.id(),
            samples = self.track.len(),
            interval_ms = self.interval.as_millis(),
            "Starting replay source"
        );

        let track = self.track.clone();
        let period = self.interval;
        let task_handle = handle.clone();
        runtime.spawn(async move {
            let mut ticker = interval(period);
            for sample in track {
                ticker.tick().await;
                if !task_handle.is_active() {
                    debug!(id = task_handle.id(), "Replay stopped");
                    return;
                }
                trace!(lat = sample.lat, lng = sample.lng, "Replaying sample");
                if tx.send(LocationEvent::Sample(sample)).await.is_err() {
                    debug!("Location channel closed, ending replay");
                    return;
                }
            }

            ticker.tick().await;
            if task_handle.is_active() {
                let lost = LocationEvent::Error(LocationError::signal_lost("replay track exhausted"));
                if tx.send(lost).await.is_err() {
                    debug!("Location channel closed before signal loss report");
                }
            }
            debug!(id = task_handle.id(), "Replay finished");
        });

        self.current = Some(handle.clone());
        Ok(handle)
    }

    fn stop(&mut self, handle: &SubscriptionHandle) {
        if handle.release() {
            debug!(id = handle.id(), "Released replay subscription");
        } else {
            trace!(id = handle.id(), "Replay subscription already released");
        }
        if self.current.as_ref().is_some_and(|h| h.id() == handle.id()) {
            self.current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    fn track(n: usize) -> Vec<LiveLocation> {
        (0..n)
            .map(|i| LiveLocation::at(GeoPoint::new(0.0, i as f64 * 0.0001), 5.0))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_delivers_in_order_then_signal_lost() {
        let mut source = ReplaySource::new(track(3), Duration::from_millis(100));
        let (tx, mut rx) = mpsc::channel(8);
        let handle = source.start(tx).unwrap();
        assert!(source.is_running());

        for expected in track(3) {
            assert_eq!(rx.recv().await, Some(LocationEvent::Sample(expected)));
        }
        match rx.recv().await {
            Some(LocationEvent::Error(err)) => assert!(err.is_transient()),
            other => panic!("expected signal lost, got {other:?}"),
        }
        assert_eq!(rx.recv().await, None);
        assert!(source.is_running());
        assert!(handle.is_active());

        source.stop(&handle);
        assert!(!source.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_ends_quietly_when_receiver_dropped() {
        let mut source = ReplaySource::new(track(1), Duration::from_millis(100));
        let (tx, mut rx) = mpsc::channel(8);
        let handle = source.start(tx).unwrap();

        assert!(matches!(rx.recv().await, Some(LocationEvent::Sample(_))));
        drop(rx);
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(handle.is_active());
        source.stop(&handle);
        assert!(!source.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_stop_halts_delivery() {
        let mut source = ReplaySource::new(track(10), Duration::from_millis(100));
        let (tx, mut rx) = mpsc::channel(8);
        let handle = source.start(tx).unwrap();

        assert!(matches!(rx.recv().await, Some(LocationEvent::Sample(_))));
        source.stop(&handle);

        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_replay_rejects_second_start() {
        let mut source = ReplaySource::new(track(2), Duration::from_millis(100));
        let (tx, _rx) = mpsc::channel(8);
        let handle = source.start(tx.clone()).unwrap();

        assert_eq!(source.start(tx).unwrap_err(), LocationError::AlreadyRunning);
        source.stop(&handle);
    }

    #[tokio::test]
    async fn test_replay_empty_track_unavailable() {
        let mut source = ReplaySource::new(Vec::new(), Duration::from_millis(100));
        let (tx, _rx) = mpsc::channel(8);
        assert!(matches!(
            source.start(tx),
            Err(LocationError::Unavailable(_))
        ));
        assert!(source.is_empty());
    }

    #[test]
    fn test_replay_without_runtime_unavailable() {
        let mut source = ReplaySource::new(track(1), Duration::from_millis(100));
        let (tx, _rx) = mpsc::channel(8);
        assert!(matches!(
            source.start(tx),
            Err(LocationError::Unavailable(_))
        ));
    }

    #[test]
    fn test_stop_is_idempotent_without_start() {
        let mut source = ReplaySource::new(track(1), Duration::from_millis(100));
        let handle = SubscriptionHandle::new(99);
        source.stop(&handle);
        source.stop(&handle);
        assert!(!source.is_running());
        assert_eq!(source.len(), 1);
    }
}
