use crate::domain::errors::EmitError;
use crate::domain::ports::Emitter;
use crate::domain::sample::Sample;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tracing::warn;

/// Emitter backed by a bounded channel to the exporter.
///
/// Publishing never waits: when the channel is full or closed the sample is
/// dropped and counted.
pub struct ChannelEmitter {
    tx: Sender<Sample>,
    dropped: AtomicU64,
}

impl ChannelEmitter {
    pub fn new(tx: Sender<Sample>) -> Self {
        Self {
            tx,
            dropped: AtomicU64::new(0),
        }
    }

    /// Creates an emitter together with the receiving end of its channel
    pub fn channel(capacity: usize) -> (Self, Receiver<Sample>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Number of samples dropped because the pipeline could not take them
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Emitter for ChannelEmitter {
    fn publish(&self, sample: Sample) {
        let key = sample.publication_key.clone();

        let reason = match self.tx.try_send(sample) {
            Ok(()) => return,
            Err(TrySendError::Full(_)) => "channel full",
            Err(TrySendError::Closed(_)) => "channel closed",
        };

        self.dropped.fetch_add(1, Ordering::Relaxed);
        let error = EmitError::Unavailable {
            key,
            reason: reason.to_string(),
        };
        warn!("ChannelEmitter: Dropping sample: {}", error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_forwards_sample() {
        let (emitter, mut rx) = ChannelEmitter::channel(4);

        emitter.publish(Sample::new("vm.internal.uptime").measure("milliseconds", 10.0));

        let received = rx.recv().await.expect("sample");
        assert_eq!(received.publication_key, "vm.internal.uptime");
        assert_eq!(emitter.dropped(), 0);
    }

    #[tokio::test]
    async fn test_full_channel_drops_without_blocking() {
        let (emitter, mut rx) = ChannelEmitter::channel(1);

        emitter.publish(Sample::new("vm.a").measure("count", 1.0));
        emitter.publish(Sample::new("vm.b").measure("count", 2.0));

        assert_eq!(emitter.dropped(), 1);
        assert_eq!(rx.recv().await.unwrap().publication_key, "vm.a");
    }

    #[test]
    fn test_closed_channel_drops() {
        let (emitter, rx) = ChannelEmitter::channel(8);
        drop(rx);

        emitter.publish(Sample::new("vm.a").measure("count", 1.0));
        assert_eq!(emitter.dropped(), 1);
    }
}
