use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use sensorhub_frame::{HubNotice, LibraryHandler, ReportSink, SensorSample};
use tokio::sync::mpsc;
use tracing::warn;

/// Everything a session hands to its consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HubEvent {
    Sample(SensorSample),
    Library { payload: Vec<u8> },
    Notice { notice: HubNotice },
}

/// Reporting sink and library hand-off publishing onto a bounded channel.
///
/// Never blocks the parse path: when the channel is full or closed the
/// event is dropped and counted.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::Sender<HubEvent>,
    dropped: AtomicU64,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<HubEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            rx,
        )
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Acquire)
    }

    fn publish(&self, event: HubEvent) {
        if let Err(err) = self.tx.try_send(event) {
            let dropped = self.dropped.fetch_add(1, Ordering::AcqRel) + 1;
            let reason = match err {
                mpsc::error::TrySendError::Full(_) => "full",
                mpsc::error::TrySendError::Closed(_) => "closed",
            };
            warn!(reason, dropped, "event channel rejected event");
        }
    }
}

impl ReportSink for ChannelSink {
    fn report(&self, sample: &SensorSample) {
        self.publish(HubEvent::Sample(sample.clone()));
    }

    fn notice(&self, notice: HubNotice) {
        self.publish(HubEvent::Notice { notice });
    }
}

impl LibraryHandler for ChannelSink {
    fn handle(&self, payload: &[u8]) {
        self.publish(HubEvent::Library {
            payload: payload.to_vec(),
        });
    }
}
