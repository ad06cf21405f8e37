use geo_types::Coord;
use serde_derive::{Deserialize, Serialize};

/// One raw location reading as delivered by the location source.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub struct Fix {
    pub time_ms: i64,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Horizontal accuracy radius in meters.
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub bearing: Option<f64>,
    /// Instantaneous speed in m/s as reported by the receiver.
    #[serde(default)]
    pub speed: Option<f64>,
}

impl Fix {
    pub fn new(time_ms: i64, latitude: f64, longitude: f64) -> Self {
        Self {
            time_ms,
            latitude,
            longitude,
            ..Default::default()
        }
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn with_bearing(mut self, bearing: f64) -> Self {
        self.bearing = Some(bearing);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn coord(&self) -> Coord {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}
