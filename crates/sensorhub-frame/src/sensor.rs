//! Sensor kinds and decoded samples.

use std::fmt;

use serde::Serialize;

/// Number of entries in the hub's sensor table. Wire indices at or above this
/// value are out of range.
pub const SENSOR_KIND_COUNT: usize = 20;

/// The closed set of sensors the hub can report, indexed by their wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SensorKind {
    Accelerometer = 0,
    Gyroscope = 1,
    GeomagneticUncalibrated = 2,
    GeomagneticRaw = 3,
    Geomagnetic = 4,
    Pressure = 5,
    Gesture = 6,
    Proximity = 7,
    ProximityRaw = 8,
    Light = 9,
    TemperatureHumidity = 10,
    RotationVector = 11,
    GameRotationVector = 12,
    StepDetector = 13,
    SignificantMotion = 14,
    GyroscopeUncalibrated = 15,
    StepCounter = 16,
    HeartRateRaw = 17,
    HeartRateRawFactory = 18,
    HeartRateLibrary = 19,
}

impl SensorKind {
    /// Every kind, in wire-index order.
    pub const ALL: [SensorKind; SENSOR_KIND_COUNT] = [
        SensorKind::Accelerometer,
        SensorKind::Gyroscope,
        SensorKind::GeomagneticUncalibrated,
        SensorKind::GeomagneticRaw,
        SensorKind::Geomagnetic,
        SensorKind::Pressure,
        SensorKind::Gesture,
        SensorKind::Proximity,
        SensorKind::ProximityRaw,
        SensorKind::Light,
        SensorKind::TemperatureHumidity,
        SensorKind::RotationVector,
        SensorKind::GameRotationVector,
        SensorKind::StepDetector,
        SensorKind::SignificantMotion,
        SensorKind::GyroscopeUncalibrated,
        SensorKind::StepCounter,
        SensorKind::HeartRateRaw,
        SensorKind::HeartRateRawFactory,
        SensorKind::HeartRateLibrary,
    ];

    /// Look up a kind by its wire index.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// True for the optical heart-rate sensors.
    pub fn is_heart_rate(self) -> bool {
        matches!(
            self,
            SensorKind::HeartRateRaw
                | SensorKind::HeartRateRawFactory
                | SensorKind::HeartRateLibrary
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Gyroscope => "gyroscope",
            SensorKind::GeomagneticUncalibrated => "geomagnetic_uncalibrated",
            SensorKind::GeomagneticRaw => "geomagnetic_raw",
            SensorKind::Geomagnetic => "geomagnetic",
            SensorKind::Pressure => "pressure",
            SensorKind::Gesture => "gesture",
            SensorKind::Proximity => "proximity",
            SensorKind::ProximityRaw => "proximity_raw",
            SensorKind::Light => "light",
            SensorKind::TemperatureHumidity => "temperature_humidity",
            SensorKind::RotationVector => "rotation_vector",
            SensorKind::GameRotationVector => "game_rotation_vector",
            SensorKind::StepDetector => "step_detector",
            SensorKind::SignificantMotion => "significant_motion",
            SensorKind::GyroscopeUncalibrated => "gyroscope_uncalibrated",
            SensorKind::StepCounter => "step_counter",
            SensorKind::HeartRateRaw => "heart_rate_raw",
            SensorKind::HeartRateRawFactory => "heart_rate_raw_factory",
            SensorKind::HeartRateLibrary => "heart_rate_library",
        }
    }
}

impl TryFrom<u8> for SensorKind {
    type Error = u8;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::from_index(index).ok_or(index)
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw sample values, decoded field by field from little-endian payload bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum SamplePayload {
    /// 3-axis motion reading (accelerometer, gyroscope). 6 bytes.
    Motion { x: i16, y: i16, z: i16 },
    /// Optical HRM channel sums. 8 bytes.
    HeartRateRaw { ch_a: u32, ch_b: u32 },
    /// Optical HRM factory test block. 36 bytes.
    HeartRateRawFactory { values: [u32; 9] },
    /// Heart-rate library output. 8 bytes.
    HeartRateLibrary {
        heart_rate: u16,
        rr_interval: u16,
        snr: i32,
    },
}

/// One decoded sensor sample with its absolute host timestamp.
///
/// Samples are handed to the report sink and then dropped; the session keeps
/// none of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SensorSample {
    pub kind: SensorKind,
    pub payload: SamplePayload,
    /// Nanoseconds on the session time base.
    pub timestamp_ns: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_indices_match_table_order() {
        for (index, kind) in SensorKind::ALL.iter().enumerate() {
            assert_eq!(kind.index() as usize, index);
            assert_eq!(SensorKind::from_index(index as u8), Some(*kind));
        }
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        assert_eq!(SensorKind::try_from(20), Err(20));
        assert_eq!(SensorKind::try_from(0xFF), Err(0xFF));
        assert_eq!(SensorKind::try_from(0), Ok(SensorKind::Accelerometer));
    }

    #[test]
    fn heart_rate_kinds() {
        let hrm: Vec<_> = SensorKind::ALL
            .iter()
            .filter(|kind| kind.is_heart_rate())
            .collect();
        assert_eq!(hrm.len(), 3);
    }

    #[test]
    fn sample_serializes_with_kind_and_shape() {
        let sample = SensorSample {
            kind: SensorKind::Gyroscope,
            payload: SamplePayload::Motion { x: 1, y: -2, z: 3 },
            timestamp_ns: 42,
        };
        let json = serde_json::to_value(&sample).unwrap();
        assert_eq!(json["kind"], "gyroscope");
        assert_eq!(json["payload"]["shape"], "motion");
        assert_eq!(json["payload"]["y"], -2);
        assert_eq!(json["timestamp_ns"], 42);
    }
}
