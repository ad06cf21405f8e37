use crate::{
    data_types::TrackPoint,
    logln, logvbln,
    stats::{smoothing::MovingAverage, trip_statistics::TripStatistics},
    util::geo::GeoUtils,
};

/// Thresholds that decide how a pair of points contributes to the totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionThresholds {
    /// Below this speed (m/s) the speed smoothing restarts.
    pub min_moving_speed_mps: f64,
    /// Grade is only sampled once the smoothed run is at least this long (m).
    pub min_grade_distance_m: f64,
    /// Stationary points closer than this (m) to the last moving point add
    /// time but no distance.
    pub min_recording_distance_m: f64,
    /// Speed readings implying a larger change (m/s²) are ignored for max
    /// speed.
    pub max_acceleration_mps2: f64,
}

impl Default for MotionThresholds {
    fn default() -> Self {
        Self {
            min_moving_speed_mps: TripStatistics::MAX_NO_MOVEMENT_SPEED,
            min_grade_distance_m: 5.0,
            min_recording_distance_m: 5.0,
            // roughly 2g
            max_acceleration_mps2: 20.0,
        }
    }
}

/// Smoothed elevation change an accepted point contributed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationChange {
    pub gain_m: f64,
    pub loss_m: f64,
}

/// Owns the statistics of a recording: the completed segments folded into
/// one aggregate plus the segment currently being recorded.
///
/// Elevation, run, grade and speed are noisy, so they go through moving
/// averages before they reach gain, grade and max speed. The averages
/// restart with every segment.
///
/// Readers get copies through [`TripStatisticsUpdater::snapshot`], never a
/// reference to the live aggregate.
#[derive(Debug, Clone)]
pub struct TripStatisticsUpdater {
    completed: TripStatistics,
    current_segment: TripStatistics,
    last_point: Option<TrackPoint>,
    last_moving_point: Option<TrackPoint>,
    thresholds: MotionThresholds,
    paused: bool,
    elevation: MovingAverage,
    run: MovingAverage,
    grade: MovingAverage,
    speed: MovingAverage,
}

impl TripStatisticsUpdater {
    const CC: &str = "TripStatisticsUpdater";

    pub const ELEVATION_SMOOTHING_FACTOR: usize = 25;
    pub const RUN_SMOOTHING_FACTOR: usize = 25;
    pub const GRADE_SMOOTHING_FACTOR: usize = 5;
    pub const SPEED_SMOOTHING_FACTOR: usize = 25;

    /// Some receivers report 128 m/s as an error code.
    const ERROR_CODE_SPEED: f64 = 128.0;
    /// A speed this many times the smoothed one is a glitch.
    const MAX_SPEED_RATIO: f64 = 10.0;

    pub fn new(start_time_ms: i64, thresholds: MotionThresholds) -> Self {
        Self {
            completed: TripStatistics::starting_at(start_time_ms),
            current_segment: TripStatistics::starting_at(start_time_ms),
            last_point: None,
            last_moving_point: None,
            thresholds,
            paused: false,
            elevation: MovingAverage::new(TripStatisticsUpdater::ELEVATION_SMOOTHING_FACTOR),
            run: MovingAverage::new(TripStatisticsUpdater::RUN_SMOOTHING_FACTOR),
            grade: MovingAverage::new(TripStatisticsUpdater::GRADE_SMOOTHING_FACTOR),
            speed: MovingAverage::new(TripStatisticsUpdater::SPEED_SMOOTHING_FACTOR),
        }
    }

    /// Folds an accepted point into the current segment. `moving` is the
    /// location filter's classification of the point.
    ///
    /// Returns the elevation change the point contributed, `None` when it
    /// carries no altitude data or arrives while paused.
    pub fn add_point(&mut self, point: &TrackPoint, moving: bool) -> Option<ElevationChange> {
        if self.paused {
            return None;
        }

        self.current_segment.add_location(point);
        let elevation_change = self.update_elevation(point);

        let (Some(last), Some(last_moving)) = (self.last_point, self.last_moving_point) else {
            self.last_point = Some(*point);
            self.last_moving_point = Some(*point);
            return elevation_change;
        };

        let elapsed_ms = point.time_ms() - last.time_ms();
        if elapsed_ms <= 0 {
            logvbln!("Ignoring point at {}, not after {}", point.time_ms(), last.time_ms());
            return elevation_change;
        }

        let moving_distance = GeoUtils::distance(last_moving.coord(), point.coord());
        if !moving && moving_distance < self.thresholds.min_recording_distance_m {
            // Standing still: position jitter is not distance
            self.speed.reset();
            self.current_segment.add_step(elapsed_ms, 0.0, false);
            self.last_point = Some(*point);
            return elevation_change;
        }

        self.current_segment.add_step(elapsed_ms, moving_distance, moving);

        let run = GeoUtils::distance(last.coord(), point.coord());
        if let Some(change) = elevation_change {
            self.update_grade(run, change.gain_m - change.loss_m);
        }

        let elapsed_s = elapsed_ms as f64 / 1000.0;
        let speed = point.speed().unwrap_or(run / elapsed_s);
        self.update_speed(speed, last.speed(), elapsed_s);

        self.last_point = Some(*point);
        self.last_moving_point = Some(*point);

        elevation_change
    }

    /// Measured gain/loss on the point wins over the smoothed altitude
    /// delta. Altitude extremities always follow the smoothed altitude.
    fn update_elevation(&mut self, point: &TrackPoint) -> Option<ElevationChange> {
        let smoothed = point.altitude().map(|altitude| {
            let previous = self.elevation.average_if_any();
            self.elevation.push(altitude);
            let current = self.elevation.average();
            self.current_segment.altitude_extremities.update(current);

            let delta = previous.map_or(0.0, |previous| current - previous);
            ElevationChange {
                gain_m: delta.max(0.0),
                loss_m: (-delta).max(0.0),
            }
        });

        let measured = (point.altitude_gain.is_some() || point.altitude_loss.is_some()).then(|| {
            ElevationChange {
                gain_m: point.altitude_gain.unwrap_or_default(),
                loss_m: point.altitude_loss.unwrap_or_default(),
            }
        });

        let change = measured.or(smoothed)?;
        self.current_segment.add_elevation(change.gain_m, change.loss_m);
        Some(change)
    }

    fn update_grade(&mut self, run_m: f64, rise_m: f64) {
        self.run.push(run_m);
        let smoothed_run = self.run.average();

        // Altitude error dominates over short runs
        if smoothed_run < self.thresholds.min_grade_distance_m {
            return;
        }

        self.grade.push(rise_m / smoothed_run);
        self.current_segment
            .grade_extremities
            .update(self.grade.average());
    }

    fn update_speed(&mut self, speed: f64, last_speed: Option<f64>, elapsed_s: f64) {
        if speed < self.thresholds.min_moving_speed_mps {
            self.speed.reset();
            return;
        }

        if !self.is_valid_speed(speed, last_speed, elapsed_s) {
            logvbln!("Invalid speed {:.2} m/s (last {:?})", speed, last_speed);
            return;
        }

        self.speed.push(speed);
        self.current_segment.update_max_speed(self.speed.average());
    }

    fn is_valid_speed(&self, speed: f64, last_speed: Option<f64>, elapsed_s: f64) -> bool {
        if speed == 0.0 || (speed - TripStatisticsUpdater::ERROR_CODE_SPEED).abs() < 1.0 {
            return false;
        }

        let max_change = self.thresholds.max_acceleration_mps2 * elapsed_s;
        if last_speed.is_some_and(|last| (last - speed).abs() > max_change) {
            return false;
        }

        if self.speed.is_full() {
            let average = self.speed.average();
            return speed < average * TripStatisticsUpdater::MAX_SPEED_RATIO
                && (average - speed).abs() < max_change;
        }

        true
    }

    /// Advances the clock of the current segment without a point.
    pub fn update_time(&mut self, time_ms: i64) {
        if !self.paused {
            self.current_segment.extend_to(time_ms);
        }
    }

    /// Closes the current segment. The gap until [`resume`](Self::resume) is
    /// not counted as distance or time.
    pub fn pause(&mut self, time_ms: i64) {
        if self.paused {
            return;
        }

        self.current_segment.extend_to(time_ms);
        self.completed.merge(&self.current_segment);
        self.current_segment = TripStatistics::new();
        self.reset_segment_state();
        self.paused = true;

        logln!("Segment closed at {}: {}", time_ms, self.completed);
    }

    pub fn resume(&mut self, time_ms: i64) {
        if !self.paused {
            return;
        }

        self.current_segment = TripStatistics::starting_at(time_ms);
        self.reset_segment_state();
        self.paused = false;
    }

    fn reset_segment_state(&mut self) {
        self.last_point = None;
        self.last_moving_point = None;
        self.elevation.reset();
        self.run.reset();
        self.grade.reset();
        self.speed.reset();
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn last_point(&self) -> Option<&TrackPoint> {
        self.last_point.as_ref()
    }

    pub fn smoothed_elevation(&self) -> Option<f64> {
        self.elevation.average_if_any()
    }

    pub fn smoothed_speed(&self) -> f64 {
        self.speed.average()
    }

    pub fn snapshot(&self) -> TripStatistics {
        let mut stats = self.completed.clone();
        stats.merge(&self.current_segment);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::Fix;
    use approx::assert_relative_eq;

    // ~5.56 m per 0.00005 degree of latitude
    const STEP_DEGREES: f64 = 0.00005;

    fn point(time_ms: i64, latitude: f64) -> TrackPoint {
        TrackPoint::from(Fix::new(time_ms, latitude, 8.0).with_speed(5.0))
    }

    fn updater() -> TripStatisticsUpdater {
        TripStatisticsUpdater::new(0, MotionThresholds::default())
    }

    /// One point per second along a straight line, altitude from `altitude`.
    fn ride<F: Fn(i64) -> f64>(updater: &mut TripStatisticsUpdater, seconds: i64, altitude: F) {
        for t in 0..=seconds {
            let point = point(t * 1_000, 47.0 + t as f64 * STEP_DEGREES);
            let point = TrackPoint::from(point.fix.with_altitude(altitude(t)));
            updater.add_point(&point, true);
        }
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut updater = updater();
        updater.add_point(&point(0, 47.0), true);
        updater.add_point(&point(1_000, 47.0001), true);

        let before = updater.snapshot();
        updater.add_point(&point(2_000, 47.0002), true);
        let after = updater.snapshot();

        assert_eq!(before.total_time_ms, 1_000);
        assert_eq!(after.total_time_ms, 2_000);
        assert!(after.total_distance_m > before.total_distance_m);
    }

    #[test]
    fn test_moving_time_follows_classification() {
        let mut updater = updater();
        updater.add_point(&point(0, 47.0), true);
        updater.add_point(&point(10_000, 47.0001), true);
        // Far enough to count as distance, but classified as stationary
        updater.add_point(&point(20_000, 47.0002), false);

        let stats = updater.snapshot();
        assert_eq!(stats.total_time_ms, 20_000);
        assert_eq!(stats.moving_time_ms, 10_000);
        assert_relative_eq!(stats.total_distance_m, 2.0 * 11.1195, epsilon = 1e-2);
    }

    #[test]
    fn test_stationary_jitter_adds_no_distance() {
        let mut updater = updater();
        updater.add_point(&point(0, 47.0), true);
        for i in 1..=5 {
            // 1 m back and forth around the same spot
            let latitude = 47.0 + (i % 2) as f64 * 0.00001;
            updater.add_point(&point(i * 1_000, latitude), false);
        }

        let stats = updater.snapshot();
        assert_eq!(stats.total_distance_m, 0.0);
        assert_eq!(stats.total_time_ms, 5_000);
        assert_eq!(stats.moving_time_ms, 0);
    }

    #[test]
    fn test_altitude_spike_is_damped() {
        let mut updater = updater();
        ride(&mut updater, 40, |t| if t == 20 { 450.0 } else { 400.0 });

        let stats = updater.snapshot();
        // A raw delta would add the whole 50 m
        assert!(stats.total_elevation_gain_m < 3.0, "gain {}", stats.total_elevation_gain_m);
        assert!(stats.altitude_extremities.max() < 403.0);
        assert_relative_eq!(stats.altitude_extremities.min(), 400.0);
        assert!(stats.grade_extremities.max() < 0.5);
    }

    #[test]
    fn test_steady_climb_keeps_gain_and_grade() {
        let mut updater = updater();
        // 0.5 m per ~5.56 m step, about 9 %
        ride(&mut updater, 60, |t| 400.0 + t as f64 * 0.5);

        let stats = updater.snapshot();
        let smoothed_top = updater.smoothed_elevation().unwrap();
        assert_relative_eq!(stats.total_elevation_gain_m, smoothed_top - 400.0, epsilon = 1e-9);
        assert_eq!(stats.total_elevation_loss_m, 0.0);
        assert_relative_eq!(stats.grade_extremities.max(), 0.5 / 5.5597, epsilon = 1e-2);
    }

    #[test]
    fn test_speed_spike_is_damped() {
        let mut updater = updater();
        for t in 0..30 {
            updater.add_point(&point(t * 1_000, 47.0 + t as f64 * STEP_DEGREES), true);
        }

        // Plausible enough to pass validation, so it is averaged in
        let spike = TrackPoint::from(Fix::new(30_000, 47.0 + 30.0 * STEP_DEGREES, 8.0).with_speed(20.0));
        updater.add_point(&spike, true);
        updater.add_point(&point(31_000, 47.0 + 31.0 * STEP_DEGREES), true);

        assert_relative_eq!(updater.snapshot().max_speed_mps, 5.6, epsilon = 1e-9);
    }

    #[test]
    fn test_implausible_speed_is_ignored() {
        let mut updater = updater();
        for t in 0..30 {
            updater.add_point(&point(t * 1_000, 47.0 + t as f64 * STEP_DEGREES), true);
        }

        let spike = TrackPoint::from(Fix::new(30_000, 47.0 + 30.0 * STEP_DEGREES, 8.0).with_speed(45.0));
        updater.add_point(&spike, true);

        assert_relative_eq!(updater.snapshot().max_speed_mps, 5.0, epsilon = 1e-9);
        assert_relative_eq!(updater.smoothed_speed(), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_error_code_speed_is_ignored() {
        let mut updater = updater();
        updater.add_point(&point(0, 47.0), true);
        let glitch = TrackPoint::from(Fix::new(10_000, 47.0001, 8.0).with_speed(128.2));
        updater.add_point(&glitch, true);

        assert_eq!(updater.snapshot().max_speed_mps, 0.0);
    }

    #[test]
    fn test_measured_gain_wins() {
        let mut updater = updater();
        let p0 = TrackPoint::from(Fix::new(0, 47.0, 8.0).with_altitude(400.0));
        let p1 = TrackPoint::from(Fix::new(1_000, 47.00003, 8.0).with_altitude(450.0))
            .with_altitude_change(0.5, 0.0);

        assert_eq!(
            updater.add_point(&p0, true),
            Some(ElevationChange { gain_m: 0.0, loss_m: 0.0 })
        );
        assert_eq!(
            updater.add_point(&p1, true),
            Some(ElevationChange { gain_m: 0.5, loss_m: 0.0 })
        );
        assert_eq!(updater.snapshot().total_elevation_gain_m, 0.5);
    }

    #[test]
    fn test_pause_excludes_gap() {
        let mut updater = updater();
        updater.add_point(&point(0, 47.0), true);
        updater.add_point(&point(10_000, 47.0005), true);
        updater.pause(10_000);

        assert!(updater.is_paused());
        assert_eq!(updater.add_point(&point(20_000, 47.0010), true), None);

        updater.resume(60_000);
        updater.add_point(&point(60_000, 47.0100), true);
        updater.add_point(&point(70_000, 47.0105), true);

        let stats = updater.snapshot();
        assert_eq!(stats.start_time_ms, Some(0));
        assert_eq!(stats.stop_time_ms, Some(70_000));
        assert_eq!(stats.total_time_ms, 20_000);
        assert_eq!(stats.moving_time_ms, 20_000);
        assert_relative_eq!(stats.total_distance_m, 2.0 * 55.5975, epsilon = 1e-2);
    }

    #[test]
    fn test_update_time_without_points() {
        let mut updater = TripStatisticsUpdater::new(1_000, MotionThresholds::default());
        updater.update_time(31_000);

        let stats = updater.snapshot();
        assert_eq!(stats.total_time_ms, 30_000);
        assert_eq!(stats.moving_time_ms, 0);
        assert_eq!(stats.average_speed(), 0.0);
    }
}
