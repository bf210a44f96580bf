use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::bulk::{BulkDispatcher, BulkHeader};
use crate::config::HubConfig;
use crate::cursor::FrameCursor;
use crate::debug::McuDebugText;
use crate::error::{FrameError, Result};
use crate::hooks::{
    DebugExtractor, JobService, LibraryHandler, MotionClassifier, NoMotionClassifier, ReportSink,
};
use crate::registry::DecoderRegistry;
use crate::sensor::{SensorKind, SensorSample};
use crate::timestamp::{Clock, SystemClock, TimeBase};
use crate::wire::{tag_name, Instruction};

/// What one successful parse call did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParseSummary {
    /// Bytes walked. Equals the transfer length.
    pub consumed: usize,
    pub samples: usize,
    pub library_payloads: usize,
    pub bulk_submitted: usize,
    pub bulk_rejected: usize,
    pub unknown_tags: usize,
    /// A Time-Sync tag was seen and the time base was re-anchored.
    pub time_synced: bool,
}

/// Cumulative counters over the lifetime of a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub transfers: u64,
    pub bytes: u64,
    pub samples: u64,
    pub library_payloads: u64,
    pub bulk_submitted: u64,
    pub bulk_rejected: u64,
    pub unknown_tags: u64,
    pub time_syncs: u64,
    pub frame_errors: u64,
}

impl SessionStats {
    fn absorb(&mut self, summary: &ParseSummary) {
        self.transfers += 1;
        self.bytes += summary.consumed as u64;
        self.samples += summary.samples as u64;
        self.library_payloads += summary.library_payloads as u64;
        self.bulk_submitted += summary.bulk_submitted as u64;
        self.bulk_rejected += summary.bulk_rejected as u64;
        self.unknown_tags += summary.unknown_tags as u64;
        self.time_syncs += u64::from(summary.time_synced);
    }
}

/// One hub session: the frame dispatcher plus the state it owns.
///
/// `parse` takes `&mut self`, so the borrow checker serializes parse calls
/// per session. Share a session across threads behind a mutex.
pub struct HubSession {
    name: Arc<str>,
    registry: DecoderRegistry,
    bulk: BulkDispatcher,
    time_base: TimeBase,
    low_power: bool,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn ReportSink>,
    jobs: Arc<dyn JobService>,
    classifier: Arc<dyn MotionClassifier>,
    library: Option<Arc<dyn LibraryHandler>>,
    debug_text: Arc<dyn DebugExtractor>,
    stats: SessionStats,
}

impl HubSession {
    /// Create a session. The time base starts at the current system time.
    pub fn new(config: &HubConfig, sink: Arc<dyn ReportSink>, jobs: Arc<dyn JobService>) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let time_base = TimeBase::new(clock.now_ns());
        Self {
            name: Arc::from(config.session_name.as_str()),
            registry: DecoderRegistry::from_config(config),
            bulk: BulkDispatcher::from_config(config),
            time_base,
            low_power: config.low_power_mode,
            clock,
            sink,
            jobs,
            classifier: Arc::new(NoMotionClassifier),
            library: None,
            debug_text: Arc::new(McuDebugText),
            stats: SessionStats::default(),
        }
    }

    /// Replace the clock and re-anchor the time base on it.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.time_base.resync(&*clock);
        self.clock = clock;
        self
    }

    pub fn with_motion_classifier(mut self, classifier: Arc<dyn MotionClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_library_handler(mut self, handler: Arc<dyn LibraryHandler>) -> Self {
        self.library = Some(handler);
        self
    }

    pub fn with_debug_extractor(mut self, extractor: Arc<dyn DebugExtractor>) -> Self {
        self.debug_text = extractor;
        self
    }

    /// Walk one transfer, dispatching every frame unit in it.
    ///
    /// Stops at the first fatal [`FrameError`]; frames before it have already
    /// been reported and the time base is left untouched. A Time-Sync tag
    /// anywhere in the transfer re-anchors the time base once, after the walk,
    /// so every sample in the transfer sees the same base.
    pub fn parse(&mut self, transfer: &[u8]) -> Result<ParseSummary> {
        let mut cursor = FrameCursor::new(transfer);
        let mut summary = ParseSummary::default();

        let walked = self.walk(&mut cursor, &mut summary);
        summary.consumed = cursor.position();

        if let Err(err) = walked {
            summary.time_synced = false;
            self.stats.absorb(&summary);
            self.stats.frame_errors += 1;
            warn!(session = %self.name, offset = err.offset(), error = %err, "dropping rest of transfer");
            return Err(err);
        }

        self.stats.absorb(&summary);
        if summary.time_synced {
            self.time_base.resync(&*self.clock);
            debug!(session = %self.name, time_base = self.time_base.as_nanos(), "time base resynchronized");
        }

        Ok(summary)
    }

    fn walk(&self, cursor: &mut FrameCursor<'_>, summary: &mut ParseSummary) -> Result<()> {
        while let Some(tag) = cursor.next_tag() {
            match Instruction::from_byte(tag) {
                Instruction::BypassData => {
                    self.bypass_data(cursor)?;
                    summary.samples += 1;
                }
                Instruction::DebugData => {
                    let offset = cursor.tag_offset();
                    let consumed = self
                        .debug_text
                        .extract(cursor.rest())
                        .map_err(|reason| FrameError::MalformedDebug { offset, reason })?;
                    cursor.advance(consumed)?;
                }
                Instruction::LibraryData => {
                    let len = cursor.read_u16_le()? as usize;
                    let payload = cursor.take(len)?;
                    self.library_data(payload);
                    summary.library_payloads += 1;
                }
                Instruction::BigData => {
                    let header = BulkHeader::read(cursor)?;
                    match self.bulk.dispatch(header, &self.name, &*self.jobs) {
                        Ok(_) => summary.bulk_submitted += 1,
                        Err(_) => summary.bulk_rejected += 1,
                    }
                }
                Instruction::TimeSync => summary.time_synced = true,
                Instruction::Unknown(tag) => {
                    trace!(
                        tag,
                        name = tag_name(tag),
                        offset = cursor.tag_offset(),
                        "skipping instruction"
                    );
                    summary.unknown_tags += 1;
                }
            }
        }
        Ok(())
    }

    // [sensor index][fixed payload][i32 offset_us]
    fn bypass_data(&self, cursor: &mut FrameCursor<'_>) -> Result<()> {
        let index = cursor.read_u8()?;
        let kind = SensorKind::from_index(index).ok_or(FrameError::SensorKindOutOfRange {
            offset: cursor.tag_offset(),
            index,
        })?;
        let payload = self.registry.decode(kind, cursor)?;
        let timestamp_ns = self.time_base.read_timestamp(cursor)?;

        let sample = SensorSample {
            kind,
            payload,
            timestamp_ns,
        };
        self.registry.report(&sample, &*self.sink);
        Ok(())
    }

    fn library_data(&self, payload: &[u8]) {
        if self.low_power && self.classifier.classify(payload) {
            trace!(len = payload.len(), "library payload claimed by motion classifier");
            return;
        }
        match &self.library {
            Some(handler) => handler.handle(payload),
            None => trace!(len = payload.len(), "no library handler, dropping payload"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }

    pub fn set_time_base(&mut self, time_base: TimeBase) {
        self.time_base = time_base;
    }

    pub fn low_power_mode(&self) -> bool {
        self.low_power
    }

    /// Toggled by the command path when the host enters or leaves
    /// low-power/gesture mode.
    pub fn set_low_power_mode(&mut self, enabled: bool) {
        self.low_power = enabled;
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn registry(&self) -> &DecoderRegistry {
        &self.registry
    }

    pub fn bulk_dispatcher(&self) -> &BulkDispatcher {
        &self.bulk
    }
}

impl std::fmt::Debug for HubSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubSession")
            .field("name", &self.name)
            .field("time_base", &self.time_base)
            .field("low_power", &self.low_power)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::bulk::{BulkJob, BulkJobKind};
    use crate::sensor::SamplePayload;

    const BASE: u64 = 1_000_000_000;

    #[derive(Default)]
    struct Samples(Mutex<Vec<SensorSample>>);

    impl Samples {
        fn taken(&self) -> Vec<SensorSample> {
            self.0.lock().unwrap().clone()
        }
    }

    impl ReportSink for Samples {
        fn report(&self, sample: &SensorSample) {
            self.0.lock().unwrap().push(sample.clone());
        }
    }

    #[derive(Default)]
    struct Jobs(Mutex<Vec<BulkJob>>);

    impl JobService for Jobs {
        fn submit(&self, job: BulkJob) {
            self.0.lock().unwrap().push(job);
        }
    }

    struct TestClock(AtomicU64);

    impl Clock for TestClock {
        fn now_ns(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct Library(Mutex<Vec<Vec<u8>>>);

    impl LibraryHandler for Library {
        fn handle(&self, payload: &[u8]) {
            self.0.lock().unwrap().push(payload.to_vec());
        }
    }

    struct Classifier {
        accept: AtomicBool,
        calls: AtomicUsize,
    }

    impl Classifier {
        fn new(accept: bool) -> Self {
            Self {
                accept: AtomicBool::new(accept),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl MotionClassifier for Classifier {
        fn classify(&self, _payload: &[u8]) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.accept.load(Ordering::SeqCst)
        }
    }

    struct Harness {
        session: HubSession,
        samples: Arc<Samples>,
        jobs: Arc<Jobs>,
        clock: Arc<TestClock>,
    }

    fn harness(config: HubConfig) -> Harness {
        let samples = Arc::new(Samples::default());
        let jobs = Arc::new(Jobs::default());
        let clock = Arc::new(TestClock(AtomicU64::new(BASE)));
        let session = HubSession::new(&config, samples.clone(), jobs.clone())
            .with_clock(clock.clone());
        Harness {
            session,
            samples,
            jobs,
            clock,
        }
    }

    fn accel_frame(raw: [u8; 6], offset_us: i32) -> Vec<u8> {
        let mut frame = vec![0x37, 0x00];
        frame.extend_from_slice(&raw);
        frame.extend_from_slice(&offset_us.to_le_bytes());
        frame
    }

    #[test]
    fn accelerometer_frame_is_reported_with_absolute_timestamp() {
        let mut h = harness(HubConfig::default());
        let buf = accel_frame([0x10, 0x00, 0xF0, 0xFF, 0x00, 0x04], 500);

        let summary = h.session.parse(&buf).unwrap();

        assert_eq!(summary.consumed, 12);
        assert_eq!(summary.samples, 1);
        let samples = h.samples.taken();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].kind, SensorKind::Accelerometer);
        assert_eq!(samples[0].timestamp_ns, 1_000_500_000);
        assert_eq!(
            samples[0].payload,
            SamplePayload::Motion {
                x: 16,
                y: -16,
                z: 1024
            }
        );
    }

    #[test]
    fn bypass_consumes_index_payload_and_offset() {
        let mut h = harness(HubConfig::default());
        let mut buf = vec![0x37, 18];
        buf.extend_from_slice(&[0u8; 36]);
        buf.extend_from_slice(&(-2i32).to_le_bytes());

        let summary = h.session.parse(&buf).unwrap();
        assert_eq!(summary.consumed, 1 + 1 + 36 + 4);
        assert_eq!(h.samples.taken()[0].timestamp_ns, BASE - 2_000);
    }

    #[test]
    fn unrecognized_bulk_type_is_skipped_without_failing() {
        let config = HubConfig {
            voice_enabled: false,
            ..HubConfig::default()
        };
        let mut h = harness(config);
        let buf = [0x04, 0x02, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x20];

        let summary = h.session.parse(&buf).unwrap();

        assert_eq!(summary.consumed, 1 + 9);
        assert_eq!(summary.bulk_rejected, 1);
        assert_eq!(summary.bulk_submitted, 0);
        assert!(h.jobs.0.lock().unwrap().is_empty());
    }

    #[test]
    fn big_data_always_consumes_nine_bytes() {
        let mut h = harness(HubConfig::default());
        let mut buf = vec![0x04, 0xFF, 1, 0, 0, 0, 2, 0, 0, 0];
        buf.extend_from_slice(&[0x04, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x30]);
        buf.extend_from_slice(&accel_frame([0; 6], 0));

        let summary = h.session.parse(&buf).unwrap();

        assert_eq!(summary.bulk_rejected, 1);
        assert_eq!(summary.bulk_submitted, 1);
        assert_eq!(summary.samples, 1);

        let jobs = h.jobs.0.lock().unwrap();
        assert_eq!(jobs[0].kind, BulkJobKind::DumpState);
        assert_eq!(jobs[0].length, 256);
        assert_eq!(jobs[0].address, 0x3000_0000);
        assert_eq!(&*jobs[0].session, "hub0");
    }

    #[test]
    fn truncated_big_data_header_is_fatal() {
        let mut h = harness(HubConfig::default());
        let err = h.session.parse(&[0x04, 0x00, 0x01]).unwrap_err();
        assert_eq!(
            err,
            FrameError::Truncated {
                offset: 0,
                needed: 9,
                remaining: 2
            }
        );
        assert!(h.jobs.0.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_tags_are_skipped() {
        let mut h = harness(HubConfig::default());
        let mut buf = vec![0xFF, 0x05, 0x07];
        buf.extend_from_slice(&accel_frame([1, 0, 2, 0, 3, 0], 10));

        let summary = h.session.parse(&buf).unwrap();

        assert_eq!(summary.unknown_tags, 3);
        assert_eq!(summary.samples, 1);
        assert_eq!(summary.consumed, buf.len());
    }

    #[test]
    fn out_of_range_sensor_index_aborts_parse() {
        let mut h = harness(HubConfig::default());
        let mut buf = accel_frame([0; 6], 0);
        buf.extend_from_slice(&[0x37, 20, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        buf.extend_from_slice(&accel_frame([0; 6], 0));

        let first = h.session.parse(&buf).unwrap_err();
        assert_eq!(
            first,
            FrameError::SensorKindOutOfRange {
                offset: 12,
                index: 20
            }
        );
        assert_eq!(h.samples.taken().len(), 1);

        // The buffer is untouched, so a second look fails identically.
        let second = h.session.parse(&buf).unwrap_err();
        assert_eq!(first, second);
        assert_eq!(h.session.stats().frame_errors, 2);
    }

    #[test]
    fn unsupported_sensor_kind_is_fatal() {
        let mut h = harness(HubConfig::default());
        let buf = [0x37, SensorKind::Light.index(), 0, 0, 0, 0];
        let err = h.session.parse(&buf).unwrap_err();
        assert_eq!(
            err,
            FrameError::UnsupportedSensorKind {
                offset: 0,
                kind: SensorKind::Light
            }
        );
    }

    #[test]
    fn heart_rate_frames_unsupported_when_disabled() {
        let config = HubConfig {
            heart_rate_enabled: false,
            ..HubConfig::default()
        };
        let mut h = harness(config);
        let mut buf = vec![0x37, SensorKind::HeartRateRaw.index()];
        buf.extend_from_slice(&[0u8; 12]);
        assert!(matches!(
            h.session.parse(&buf),
            Err(FrameError::UnsupportedSensorKind { .. })
        ));
    }

    #[test]
    fn truncated_sample_is_fatal_and_not_reported() {
        let mut h = harness(HubConfig::default());
        let err = h.session.parse(&[0x37, 0x00, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { offset: 0, needed: 6, .. }));

        let mut buf = accel_frame([0; 6], 0);
        buf.truncate(10);
        let err = h.session.parse(&buf).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { needed: 4, remaining: 2, .. }));
        assert!(h.samples.taken().is_empty());
    }

    #[test]
    fn time_sync_applies_after_the_walk() {
        let mut h = harness(HubConfig::default());
        h.clock.0.store(5_000_000_000, Ordering::SeqCst);

        let mut buf = accel_frame([0; 6], 1);
        buf.push(0x06);
        buf.extend_from_slice(&accel_frame([0; 6], 2));

        let summary = h.session.parse(&buf).unwrap();
        assert!(summary.time_synced);

        let stamps: Vec<u64> = h.samples.taken().iter().map(|s| s.timestamp_ns).collect();
        assert_eq!(stamps, vec![BASE + 1_000, BASE + 2_000]);
        assert_eq!(h.session.time_base().as_nanos(), 5_000_000_000);
    }

    #[test]
    fn time_sync_position_does_not_change_sample_timestamps() {
        let frames = accel_frame([9; 6], 250);

        let mut first = harness(HubConfig::default());
        first.clock.0.store(7_000_000_000, Ordering::SeqCst);
        let mut sync_first = vec![0x06];
        sync_first.extend_from_slice(&frames);
        first.session.parse(&sync_first).unwrap();

        let mut last = harness(HubConfig::default());
        last.clock.0.store(7_000_000_000, Ordering::SeqCst);
        let mut sync_last = frames.clone();
        sync_last.push(0x06);
        last.session.parse(&sync_last).unwrap();

        assert_eq!(first.samples.taken(), last.samples.taken());
        assert_eq!(first.session.time_base(), last.session.time_base());
        assert!(first.session.time_base().as_nanos() >= 7_000_000_000);
    }

    #[test]
    fn failed_parse_does_not_resync() {
        let mut h = harness(HubConfig::default());
        h.clock.0.store(9, Ordering::SeqCst);
        assert!(h.session.parse(&[0x06, 0x37, 0xEE]).is_err());
        assert_eq!(h.session.time_base().as_nanos(), BASE);
        assert_eq!(h.session.stats().time_syncs, 0);
        assert_eq!(h.session.stats().frame_errors, 1);
    }

    #[test]
    fn library_data_goes_to_handler_outside_low_power() {
        let library = Arc::new(Library::default());
        let classifier = Arc::new(Classifier::new(true));
        let mut h = harness(HubConfig::default());
        h.session = h
            .session
            .with_library_handler(library.clone())
            .with_motion_classifier(classifier.clone());

        let buf = [0x01, 0x03, 0x00, 0xA, 0xB, 0xC, 0x06];
        let summary = h.session.parse(&buf).unwrap();

        assert_eq!(summary.library_payloads, 1);
        assert!(summary.time_synced);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(*library.0.lock().unwrap(), vec![vec![0xA, 0xB, 0xC]]);
    }

    #[test]
    fn low_power_classifier_claims_payload_first() {
        let library = Arc::new(Library::default());
        let classifier = Arc::new(Classifier::new(true));
        let mut h = harness(HubConfig {
            low_power_mode: true,
            ..HubConfig::default()
        });
        h.session = h
            .session
            .with_library_handler(library.clone())
            .with_motion_classifier(classifier.clone());

        h.session.parse(&[0x01, 0x02, 0x00, 0x11, 0x22]).unwrap();
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert!(library.0.lock().unwrap().is_empty());

        classifier.accept.store(false, Ordering::SeqCst);
        h.session.parse(&[0x01, 0x02, 0x00, 0x11, 0x22]).unwrap();
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
        assert_eq!(*library.0.lock().unwrap(), vec![vec![0x11, 0x22]]);
    }

    #[test]
    fn low_power_mode_toggles_at_runtime() {
        let mut h = harness(HubConfig::default());
        assert!(!h.session.low_power_mode());
        h.session.set_low_power_mode(true);
        assert!(h.session.low_power_mode());
    }

    #[test]
    fn library_length_past_end_is_fatal() {
        let mut h = harness(HubConfig::default());
        let err = h.session.parse(&[0x01, 0x10, 0x00, 0x01]).unwrap_err();
        assert_eq!(
            err,
            FrameError::Truncated {
                offset: 0,
                needed: 16,
                remaining: 1
            }
        );
    }

    #[test]
    fn debug_text_is_consumed() {
        let mut h = harness(HubConfig::default());
        let mut buf = vec![0x03, 0x05, b'r', b'e', b'a', b'd', b'y'];
        buf.extend_from_slice(&accel_frame([0; 6], 0));

        let summary = h.session.parse(&buf).unwrap();
        assert_eq!(summary.samples, 1);
        assert_eq!(summary.consumed, buf.len());
    }

    #[test]
    fn malformed_debug_text_aborts_parse() {
        let mut h = harness(HubConfig::default());
        let mut buf = accel_frame([0; 6], 0);
        buf.extend_from_slice(&[0x03, 0x40, b'x']);

        let err = h.session.parse(&buf).unwrap_err();
        assert!(matches!(err, FrameError::MalformedDebug { offset: 12, .. }));
    }

    #[test]
    fn stats_accumulate_across_calls() {
        let mut h = harness(HubConfig::default());
        h.session.parse(&accel_frame([0; 6], 0)).unwrap();
        h.session.parse(&[0x06, 0xFF]).unwrap();
        let _ = h.session.parse(&[0x37, 0xFF]);

        let stats = h.session.stats();
        assert_eq!(stats.transfers, 3);
        assert_eq!(stats.samples, 1);
        assert_eq!(stats.time_syncs, 1);
        assert_eq!(stats.unknown_tags, 1);
        assert_eq!(stats.frame_errors, 1);
        assert_eq!(stats.bytes, 12 + 2 + 2);
    }

    #[test]
    fn empty_transfer_is_a_no_op() {
        let mut h = harness(HubConfig::default());
        assert_eq!(h.session.parse(&[]).unwrap(), ParseSummary::default());
    }
}
