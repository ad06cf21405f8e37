use serde_derive::{Deserialize, Serialize};

/// One fixed-distance slice of a track.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub struct Interval {
    pub start_distance_m: f64,
    pub distance_m: f64,
    pub duration_ms: f64,
    /// `None` when no point of the whole track carried gain data.
    pub gain_m: Option<f64>,
    pub loss_m: Option<f64>,
    pub average_heart_rate: Option<f64>,
}

impl Interval {
    pub fn end_distance_m(&self) -> f64 {
        self.start_distance_m + self.distance_m
    }

    /// Average speed in m/s, 0 for an interval without elapsed time.
    pub fn speed(&self) -> f64 {
        if self.duration_ms <= 0.0 {
            return 0.0;
        }

        self.distance_m / (self.duration_ms / 1000.0)
    }
}
