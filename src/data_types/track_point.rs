use geo_types::Coord;
use serde_derive::{Deserialize, Serialize};

use super::fix::Fix;

/// An accepted fix plus whatever sensor readings were current when it was
/// accepted.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub struct TrackPoint {
    #[serde(flatten)]
    pub fix: Fix,
    /// Elevation gained since the previous point, if the source measured it.
    pub altitude_gain: Option<f64>,
    pub altitude_loss: Option<f64>,
    pub heart_rate: Option<u16>,
    /// rpm
    pub cadence: Option<f64>,
    /// W
    pub power: Option<f64>,
    /// %
    pub battery: Option<u8>,
    /// Distance reported by a wheel or foot-pod sensor, in meters.
    pub sensor_distance: Option<f64>,
}

impl From<Fix> for TrackPoint {
    fn from(fix: Fix) -> Self {
        Self {
            fix,
            ..Default::default()
        }
    }
}

impl TrackPoint {
    pub fn time_ms(&self) -> i64 {
        self.fix.time_ms
    }

    pub fn coord(&self) -> Coord {
        self.fix.coord()
    }

    pub fn latitude(&self) -> f64 {
        self.fix.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.fix.longitude
    }

    pub fn altitude(&self) -> Option<f64> {
        self.fix.altitude
    }

    pub fn speed(&self) -> Option<f64> {
        self.fix.speed
    }

    pub fn with_altitude_change(mut self, gain: f64, loss: f64) -> Self {
        self.altitude_gain = Some(gain);
        self.altitude_loss = Some(loss);
        self
    }
}
