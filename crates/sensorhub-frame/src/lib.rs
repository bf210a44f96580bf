//! Instruction-tag frame dispatch for sensor hub streams.
//!
//! This is the core of sensorhub. The hub multiplexes everything it has to
//! say into one byte stream where each unit is:
//! - A 1-byte instruction tag selecting the payload shape
//! - A fixed or length-prefixed payload (little-endian integers)
//!
//! [`HubSession::parse`] walks one transfer, decodes sensor samples through
//! the [`DecoderRegistry`], hands bulk transfers to a [`JobService`] and
//! keeps the host-relative [`TimeBase`] current.

pub mod bulk;
pub mod config;
pub mod cursor;
pub mod debug;
pub mod dispatcher;
pub mod error;
pub mod hooks;
pub mod registry;
pub mod sensor;
pub mod timestamp;
pub mod wire;

pub use bulk::{
    BulkDispatcher, BulkHeader, BulkJob, BulkJobKind, BulkType, BULK_HEADER_SIZE, BULK_TYPE_COUNT,
};
pub use config::HubConfig;
pub use cursor::FrameCursor;
pub use debug::McuDebugText;
pub use dispatcher::{HubSession, ParseSummary, SessionStats};
pub use error::{BulkTypeError, FrameError, Result};
pub use hooks::{
    DebugExtractor, HubNotice, JobService, LibraryHandler, MotionClassifier, NoMotionClassifier,
    ReportSink,
};
pub use registry::{Decoder, DecoderRegistry};
pub use sensor::{SamplePayload, SensorKind, SensorSample, SENSOR_KIND_COUNT};
pub use timestamp::{Clock, SystemClock, TimeBase, NANOS_PER_OFFSET_TICK};
pub use wire::{
    Instruction, BIG_DATA, BYPASS_DATA, DEBUG_DATA, LIBRARY_DATA, META_DATA, RESET, TIME_SYNC,
};
