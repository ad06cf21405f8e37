use std::fmt::Display;

use serde_derive::{Deserialize, Serialize};

use crate::{
    data_types::TrackPoint,
    logvbln,
    stats::extremity::ExtremityMonitor,
    util::DateTimeUtils,
};

/// Cumulative statistics of a track, or of one segment of it.
///
/// Distances are meters, times milliseconds and speeds m/s.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct TripStatistics {
    pub start_time_ms: Option<i64>,
    pub stop_time_ms: Option<i64>,
    pub total_distance_m: f64,
    pub total_time_ms: i64,
    pub moving_time_ms: i64,
    pub max_speed_mps: f64,
    pub total_elevation_gain_m: f64,
    pub total_elevation_loss_m: f64,
    pub latitude_extremities: ExtremityMonitor,
    pub longitude_extremities: ExtremityMonitor,
    pub altitude_extremities: ExtremityMonitor,
    pub grade_extremities: ExtremityMonitor,
}

impl TripStatistics {
    const CC: &str = "TripStatistics";

    pub const MAX_NO_MOVEMENT_SPEED: f64 = 0.224;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(time_ms: i64) -> Self {
        Self {
            start_time_ms: Some(time_ms),
            stop_time_ms: Some(time_ms),
            ..Default::default()
        }
    }

    /// Widens the time range and the latitude/longitude span to cover
    /// `point`.
    pub fn add_location(&mut self, point: &TrackPoint) {
        let time_ms = point.time_ms();
        self.start_time_ms = Some(self.start_time_ms.map_or(time_ms, |start| start.min(time_ms)));
        self.stop_time_ms = Some(self.stop_time_ms.map_or(time_ms, |stop| stop.max(time_ms)));

        self.latitude_extremities.update(point.latitude());
        self.longitude_extremities.update(point.longitude());
    }

    /// Accounts for the time and distance between two consecutive points.
    /// Only `moving` steps count towards moving time.
    pub fn add_step(&mut self, elapsed_ms: i64, distance_m: f64, moving: bool) {
        if elapsed_ms <= 0 {
            logvbln!("Ignoring step with non-increasing time ({} ms)", elapsed_ms);
            return;
        }

        self.total_distance_m += distance_m;
        self.total_time_ms += elapsed_ms;
        if moving {
            self.moving_time_ms += elapsed_ms;
        }
    }

    pub fn add_elevation(&mut self, gain_m: f64, loss_m: f64) {
        self.total_elevation_gain_m += gain_m.max(0.0);
        self.total_elevation_loss_m += loss_m.max(0.0);
    }

    pub fn update_max_speed(&mut self, speed_mps: f64) {
        if speed_mps > self.max_speed_mps {
            self.max_speed_mps = speed_mps;
        }
    }

    /// Combines two aggregates covering disjoint time ranges. Overlapping
    /// ranges are not detected and give an undefined result.
    ///
    /// An unset start or stop time on either side is ignored rather than
    /// treated as the earliest/latest instant.
    pub fn merge(&mut self, other: &TripStatistics) {
        self.start_time_ms = match (self.start_time_ms, other.start_time_ms) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.stop_time_ms = match (self.stop_time_ms, other.stop_time_ms) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        self.total_distance_m += other.total_distance_m;
        self.total_time_ms += other.total_time_ms;
        self.moving_time_ms += other.moving_time_ms;
        self.total_elevation_gain_m += other.total_elevation_gain_m;
        self.total_elevation_loss_m += other.total_elevation_loss_m;
        self.max_speed_mps = self.max_speed_mps.max(other.max_speed_mps);

        self.latitude_extremities.absorb(&other.latitude_extremities);
        self.longitude_extremities.absorb(&other.longitude_extremities);
        self.altitude_extremities.absorb(&other.altitude_extremities);
        self.grade_extremities.absorb(&other.grade_extremities);
    }

    /// Extends the covered time range up to `time_ms` without a new point,
    /// e.g. while standing still and no fix arrives.
    pub fn extend_to(&mut self, time_ms: i64) {
        let start = *self.start_time_ms.get_or_insert(time_ms);
        self.stop_time_ms = Some(self.stop_time_ms.map_or(time_ms, |stop| stop.max(time_ms)));
        self.total_time_ms = self.total_time_ms.max(time_ms - start);
    }

    pub fn has_data(&self) -> bool {
        self.start_time_ms.is_some()
    }

    pub fn average_speed(&self) -> f64 {
        TripStatistics::speed_over(self.total_distance_m, self.total_time_ms)
    }

    pub fn average_moving_speed(&self) -> f64 {
        TripStatistics::speed_over(self.total_distance_m, self.moving_time_ms)
    }

    fn speed_over(distance_m: f64, time_ms: i64) -> f64 {
        if time_ms <= 0 {
            return 0.0;
        }

        distance_m / (time_ms as f64 / 1000.0)
    }

    pub fn stopped_time_ms(&self) -> i64 {
        self.total_time_ms - self.moving_time_ms
    }

    pub fn top_degrees(&self) -> f64 {
        self.latitude_extremities.max()
    }

    pub fn bottom_degrees(&self) -> f64 {
        self.latitude_extremities.min()
    }

    pub fn left_degrees(&self) -> f64 {
        self.longitude_extremities.min()
    }

    pub fn right_degrees(&self) -> f64 {
        self.longitude_extremities.max()
    }

    pub fn mean_latitude(&self) -> Option<f64> {
        self.latitude_extremities
            .has_data()
            .then(|| (self.bottom_degrees() + self.top_degrees()) / 2.0)
    }

    pub fn mean_longitude(&self) -> Option<f64> {
        self.longitude_extremities
            .has_data()
            .then(|| (self.left_degrees() + self.right_degrees()) / 2.0)
    }
}

impl Display for TripStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let start = self
            .start_time_ms
            .map_or_else(|| "-".to_string(), DateTimeUtils::timestamp_to_str);

        write!(
            f,
            "{} | {:.3} km in {} (moving {}) | avg {:.2} m/s, max {:.2} m/s | +{:.0} m / -{:.0} m",
            start,
            self.total_distance_m / 1000.0,
            DateTimeUtils::duration_to_str(self.total_time_ms),
            DateTimeUtils::duration_to_str(self.moving_time_ms),
            self.average_speed(),
            self.max_speed_mps,
            self.total_elevation_gain_m,
            self.total_elevation_loss_m,
        )
    }
}
