//! Progress relay: fans frames and the terminal outcome out to any number of
//! attached listeners over a broadcast channel.
//!
//! There is no replay. A listener that subscribes after frames have been
//! emitted misses them and only sees what arrives afterwards. Exactly one
//! terminal event is delivered per assembly run no matter how many listeners
//! are attached.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::warn;

use crate::engine::wire::{GenerationOutcome, ProgressEvent};

const RELAY_CAPACITY: usize = 256;

/// One event on the relay: a progress frame, or the run's terminal outcome.
#[derive(Debug, Clone)]
pub enum AssemblyEvent {
    Progress(ProgressEvent),
    Finished(GenerationOutcome),
}

/// Multi-consumer fan-out for one in-flight assembly. Cheap to clone; all
/// clones share the same channel and terminal guard.
#[derive(Debug, Clone)]
pub struct ProgressRelay {
    tx: broadcast::Sender<AssemblyEvent>,
    finished: Arc<AtomicBool>,
    malformed: Arc<AtomicU64>,
}

impl ProgressRelay {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(RELAY_CAPACITY);
        ProgressRelay {
            tx,
            finished: Arc::new(AtomicBool::new(false)),
            malformed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Attach a listener. It receives every event emitted after this call and
    /// nothing emitted before it.
    pub fn subscribe(&self) -> ProgressSubscription {
        ProgressSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Forward one progress frame. Frames sent after the terminal event are
    /// discarded.
    pub fn emit(&self, event: ProgressEvent) {
        if self.finished.load(Ordering::SeqCst) {
            return;
        }
        // send errors only when no listener is attached
        let _ = self.tx.send(AssemblyEvent::Progress(event));
    }

    /// Deliver the terminal outcome. The first call wins; any later call is
    /// ignored so listeners see exactly one terminal event per run.
    pub fn finish(&self, outcome: GenerationOutcome) {
        if self.finished.swap(true, Ordering::SeqCst) {
            warn!("discarding duplicate terminal outcome");
            return;
        }
        let _ = self.tx.send(AssemblyEvent::Finished(outcome));
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Count a progress frame that failed to parse. The frame itself is
    /// dropped; the channel stays open.
    pub fn count_malformed(&self) {
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn malformed_frames(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }
}

impl Default for ProgressRelay {
    fn default() -> Self {
        Self::new()
    }
}

/// A listener's end of the relay. Stays attached until dropped; the relay
/// never removes listeners on its own.
pub struct ProgressSubscription {
    rx: broadcast::Receiver<AssemblyEvent>,
}

impl ProgressSubscription {
    /// Next event, or `None` once the relay is gone. A slow listener that
    /// lags behind skips the overwritten events and keeps reading.
    pub async fn next(&mut self) -> Option<AssemblyEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "listener lagged behind progress stream");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::wire::Phase;

    fn frame(step: u64) -> ProgressEvent {
        ProgressEvent {
            step,
            total: 5,
            message: format!("step {step}"),
            phase: Phase::Merging,
            file: None,
        }
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_frames() {
        let relay = ProgressRelay::new();
        let mut early = relay.subscribe();
        relay.emit(frame(1));

        let mut late = relay.subscribe();
        relay.emit(frame(2));
        relay.finish(GenerationOutcome::Failure {
            message: "x".into(),
        });

        match early.next().await.unwrap() {
            AssemblyEvent::Progress(p) => assert_eq!(p.step, 1),
            other => panic!("unexpected event: {other:?}"),
        }

        // the late listener's first event is frame 2, not frame 1
        match late.next().await.unwrap() {
            AssemblyEvent::Progress(p) => assert_eq!(p.step, 2),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(
            late.next().await.unwrap(),
            AssemblyEvent::Finished(_)
        ));
    }

    #[tokio::test]
    async fn terminal_event_is_delivered_once_per_listener() {
        let relay = ProgressRelay::new();
        let mut a = relay.subscribe();
        let mut b = relay.subscribe();

        relay.finish(GenerationOutcome::Failure {
            message: "first".into(),
        });
        relay.finish(GenerationOutcome::Failure {
            message: "second".into(),
        });
        relay.emit(frame(9));
        drop(relay);

        for sub in [&mut a, &mut b] {
            match sub.next().await.unwrap() {
                AssemblyEvent::Finished(GenerationOutcome::Failure { message }) => {
                    assert_eq!(message, "first");
                }
                other => panic!("unexpected event: {other:?}"),
            }
            // nothing after the terminal event, channel closes
            assert!(sub.next().await.is_none());
        }
    }

    #[tokio::test]
    async fn emitting_without_listeners_does_not_fail() {
        let relay = ProgressRelay::new();
        relay.emit(frame(1));
        relay.finish(GenerationOutcome::Failure {
            message: "done".into(),
        });
        assert!(relay.is_finished());
    }

    #[test]
    fn malformed_counter_accumulates() {
        let relay = ProgressRelay::new();
        relay.count_malformed();
        relay.count_malformed();
        assert_eq!(relay.malformed_frames(), 2);
    }
}
