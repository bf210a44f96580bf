//! Collaborator interfaces the dispatcher calls out to.
//!
//! The core decodes and routes; publishing samples, running bulk jobs and
//! interpreting library payloads belong to whoever embeds the session.

use serde::Serialize;

use crate::bulk::BulkJob;
use crate::sensor::SensorSample;

/// Out-of-band notices delivered to the report sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HubNotice {
    /// The hub was re-initialized by the recovery path.
    Reset,
}

/// Publishes decoded samples to consumers.
pub trait ReportSink: Send + Sync {
    fn report(&self, sample: &SensorSample);

    fn notice(&self, notice: HubNotice) {
        let _ = notice;
    }
}

/// Asynchronous execution service for bulk transfer jobs.
///
/// `submit` must not block: the job runs elsewhere and owns itself from
/// here on. There is no return channel to the parser.
pub trait JobService: Send + Sync {
    fn submit(&self, job: BulkJob);
}

/// Gesture/motion classifier consulted for Library-Data in low-power mode.
pub trait MotionClassifier: Send + Sync {
    /// Returns true when the payload was recognized and consumed.
    fn classify(&self, payload: &[u8]) -> bool;
}

/// Classifier that declines everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMotionClassifier;

impl MotionClassifier for NoMotionClassifier {
    fn classify(&self, _payload: &[u8]) -> bool {
        false
    }
}

/// Receives Library-Data payloads the motion classifier did not claim.
pub trait LibraryHandler: Send + Sync {
    fn handle(&self, payload: &[u8]);
}

/// Consumes a Debug-Data payload.
pub trait DebugExtractor: Send + Sync {
    /// `rest` runs from just after the tag to the end of the transfer.
    /// Returns how many bytes were consumed, or why the payload is malformed.
    fn extract(&self, rest: &[u8]) -> Result<usize, String>;
}
