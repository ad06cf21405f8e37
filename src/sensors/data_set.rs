use crate::data_types::{Provenance, SensorSample, TrackPoint};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading<T> {
    pub value: T,
    pub captured_at_ms: i64,
    pub provenance: Provenance,
}

impl<T: Copy> Reading<T> {
    fn from_sample(value: Option<T>, sample: &SensorSample) -> Option<Self> {
        value.map(|value| Reading {
            value,
            captured_at_ms: sample.captured_at_ms,
            provenance: sample.provenance,
        })
    }

    fn recent(reading: &Option<Self>, max_age_ms: i64, now_ms: i64) -> Option<T> {
        reading
            .filter(|r| now_ms < r.captured_at_ms.saturating_add(max_age_ms))
            .map(|r| r.value)
    }
}

/// Latest reading of each quantity across all connected sensors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorDataSet {
    pub heart_rate: Option<Reading<u16>>,
    pub cadence: Option<Reading<f64>>,
    pub power: Option<Reading<f64>>,
    pub battery: Option<Reading<u8>>,
    pub speed: Option<Reading<f64>>,
    pub distance: Option<Reading<f64>>,
}

impl SensorDataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites every quantity the sample carries; others keep their
    /// previous reading.
    pub fn set(&mut self, sample: &SensorSample) {
        macro_rules! take {
            ($field:ident) => {
                if let Some(reading) = Reading::from_sample(sample.$field, sample) {
                    self.$field = Some(reading);
                }
            };
        }

        take!(heart_rate);
        take!(cadence);
        take!(power);
        take!(battery);
        take!(speed);
        take!(distance);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Copies readings younger than `max_age_ms` into `point`.
    pub fn fill_track_point(&self, point: &mut TrackPoint, max_age_ms: i64, now_ms: i64) {
        macro_rules! fill {
            ($field:ident => $target:expr) => {
                if let Some(value) = Reading::recent(&self.$field, max_age_ms, now_ms) {
                    $target = Some(value);
                }
            };
        }

        fill!(heart_rate => point.heart_rate);
        fill!(cadence => point.cadence);
        fill!(power => point.power);
        fill!(battery => point.battery);
        fill!(speed => point.fix.speed);
        fill!(distance => point.sensor_distance);
    }
}
