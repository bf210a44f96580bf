use bytes::Buf;
use tracing::trace;

use crate::config::HubConfig;
use crate::cursor::FrameCursor;
use crate::error::{FrameError, Result};
use crate::hooks::ReportSink;
use crate::sensor::{SamplePayload, SensorKind, SensorSample, SENSOR_KIND_COUNT};

/// Payload decoder assigned to a sensor kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    Motion,
    HeartRateRaw,
    HeartRateRawFactory,
    HeartRateLibrary,
    /// Placeholder for kinds whose payload layout is not known to the host.
    Unsupported,
}

impl Decoder {
    /// Fixed payload size in bytes, or `None` for unsupported kinds.
    pub fn payload_size(self) -> Option<usize> {
        match self {
            Decoder::Motion => Some(6),
            Decoder::HeartRateRaw => Some(8),
            Decoder::HeartRateRawFactory => Some(36),
            Decoder::HeartRateLibrary => Some(8),
            Decoder::Unsupported => None,
        }
    }

    // `raw` is exactly `payload_size()` bytes.
    fn decode_exact(self, mut raw: &[u8]) -> Option<SamplePayload> {
        let payload = match self {
            Decoder::Motion => SamplePayload::Motion {
                x: raw.get_i16_le(),
                y: raw.get_i16_le(),
                z: raw.get_i16_le(),
            },
            Decoder::HeartRateRaw => SamplePayload::HeartRateRaw {
                ch_a: raw.get_u32_le(),
                ch_b: raw.get_u32_le(),
            },
            Decoder::HeartRateRawFactory => {
                let mut values = [0u32; 9];
                for value in &mut values {
                    *value = raw.get_u32_le();
                }
                SamplePayload::HeartRateRawFactory { values }
            }
            Decoder::HeartRateLibrary => SamplePayload::HeartRateLibrary {
                heart_rate: raw.get_u16_le(),
                rr_interval: raw.get_u16_le(),
                snr: raw.get_i32_le(),
            },
            Decoder::Unsupported => return None,
        };
        Some(payload)
    }
}

/// Immutable sensor-kind → decoder table, built once per session.
#[derive(Debug, Clone)]
pub struct DecoderRegistry {
    table: [Decoder; SENSOR_KIND_COUNT],
}

impl DecoderRegistry {
    /// Build the table. Without heart-rate support the three HRM kinds fall
    /// back to [`Decoder::Unsupported`].
    pub fn new(heart_rate_enabled: bool) -> Self {
        let table = SensorKind::ALL.map(|kind| match kind {
            SensorKind::Accelerometer | SensorKind::Gyroscope => Decoder::Motion,
            SensorKind::HeartRateRaw if heart_rate_enabled => Decoder::HeartRateRaw,
            SensorKind::HeartRateRawFactory if heart_rate_enabled => Decoder::HeartRateRawFactory,
            SensorKind::HeartRateLibrary if heart_rate_enabled => Decoder::HeartRateLibrary,
            _ => Decoder::Unsupported,
        });
        Self { table }
    }

    pub fn from_config(config: &HubConfig) -> Self {
        Self::new(config.heart_rate_enabled)
    }

    pub fn decoder(&self, kind: SensorKind) -> Decoder {
        self.table[kind.index() as usize]
    }

    /// Decode the payload for `kind` at the cursor, consuming exactly the
    /// kind's payload size.
    ///
    /// Unsupported kinds consume nothing and fail with
    /// [`FrameError::UnsupportedSensorKind`]: their wire size is unknown, so
    /// continuing would desynchronize the rest of the transfer.
    pub fn decode(&self, kind: SensorKind, cursor: &mut FrameCursor<'_>) -> Result<SamplePayload> {
        let decoder = self.decoder(kind);
        let offset = cursor.tag_offset();
        let unsupported = move || FrameError::UnsupportedSensorKind { offset, kind };
        let size = decoder.payload_size().ok_or_else(unsupported)?;
        let raw = cursor.take(size)?;
        decoder.decode_exact(raw).ok_or_else(unsupported)
    }

    /// Route a finished sample to the sink.
    pub fn report(&self, sample: &SensorSample, sink: &dyn ReportSink) {
        match self.decoder(sample.kind) {
            Decoder::Unsupported => trace!(kind = %sample.kind, "not supported"),
            _ => sink.report(sample),
        }
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::new(true)
    }
}
