use crate::sensor::SensorKind;

/// Errors that abort one parse call.
///
/// Every variant carries `offset`, the position of the instruction tag whose
/// payload could not be consumed. Bytes before that tag have already been
/// dispatched; nothing after it is looked at.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// A Bypass-Data frame named a sensor index outside the sensor table.
    #[error("sensor index {index} out of range at offset {offset}")]
    SensorKindOutOfRange { offset: usize, index: u8 },

    /// A Bypass-Data frame named a sensor kind with no known payload size.
    #[error("no decoder for {kind} at offset {offset}")]
    UnsupportedSensorKind { offset: usize, kind: SensorKind },

    /// The tag claims more payload bytes than remain in the transfer.
    #[error("truncated frame at offset {offset} (needed {needed} bytes, {remaining} remaining)")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// The debug-text extractor rejected its payload.
    #[error("malformed debug text at offset {offset}: {reason}")]
    MalformedDebug { offset: usize, reason: String },
}

impl FrameError {
    /// Offset of the instruction tag that failed.
    pub fn offset(&self) -> usize {
        match self {
            FrameError::SensorKindOutOfRange { offset, .. }
            | FrameError::UnsupportedSensorKind { offset, .. }
            | FrameError::Truncated { offset, .. }
            | FrameError::MalformedDebug { offset, .. } => *offset,
        }
    }
}

/// A Big-Data header named a bulk type with no registered job.
///
/// Not fatal: the header is consumed and parsing continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown bulk type {bulk_type}")]
pub struct BulkTypeError {
    pub bulk_type: u8,
}

pub type Result<T> = std::result::Result<T, FrameError>;
