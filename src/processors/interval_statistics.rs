use crate::{
    data_types::{Interval, TrackPoint},
    logvbln,
};

/// Per-interval accumulator; gain, loss and heart rate are only exposed as
/// `Option` once the interval is handed out.
#[derive(Debug, Clone, Copy, Default)]
struct IntervalAccumulator {
    start_distance_m: f64,
    distance_m: f64,
    duration_ms: f64,
    gain_m: f64,
    loss_m: f64,
    heart_rate_weighted: f64,
    heart_rate_weight: f64,
}

impl IntervalAccumulator {
    fn starting_at(start_distance_m: f64) -> Self {
        Self {
            start_distance_m,
            ..Default::default()
        }
    }

    fn add_share(&mut self, step: &Step, share: f64) {
        self.duration_ms += step.duration_ms * share;
        self.gain_m += step.gain_m * share;
        self.loss_m += step.loss_m * share;
        if let Some(heart_rate) = step.heart_rate {
            let weight = step.duration_ms * share;
            self.heart_rate_weighted += heart_rate * weight;
            self.heart_rate_weight += weight;
        }
    }

    fn to_interval(self, has_gain: bool, has_loss: bool) -> Interval {
        Interval {
            start_distance_m: self.start_distance_m,
            distance_m: self.distance_m,
            duration_ms: self.duration_ms,
            gain_m: has_gain.then_some(self.gain_m),
            loss_m: has_loss.then_some(self.loss_m),
            average_heart_rate: (self.heart_rate_weight > 0.0)
                .then(|| self.heart_rate_weighted / self.heart_rate_weight),
        }
    }
}

/// What one point adds on top of the previous one.
struct Step {
    distance_m: f64,
    duration_ms: f64,
    gain_m: f64,
    loss_m: f64,
    heart_rate: Option<f64>,
}

/// Partitions a stream of accepted points into fixed-distance intervals.
///
/// Boundaries depend on cumulative distance only. A step that crosses a
/// boundary is split proportionally to the distance on each side, so every
/// closed interval is exactly `interval_distance_m` long.
#[derive(Debug, Clone)]
pub struct IntervalStatistics {
    interval_distance_m: f64,
    completed: Vec<IntervalAccumulator>,
    current: IntervalAccumulator,
    /// (distance from start, time) of the previous point in this segment.
    last: Option<(f64, i64)>,
    has_gain: bool,
    has_loss: bool,
}

impl IntervalStatistics {
    const CC: &str = "IntervalStatistics";

    /// Remainders below this are rounding noise, not distance.
    const DISTANCE_EPSILON_M: f64 = 1e-9;

    /// A non-positive interval distance never closes an interval.
    pub fn new(interval_distance_m: f64) -> Self {
        let interval_distance_m = if interval_distance_m > 0.0 {
            interval_distance_m
        } else {
            f64::INFINITY
        };

        Self {
            interval_distance_m,
            completed: Vec::new(),
            current: IntervalAccumulator::starting_at(0.0),
            last: None,
            has_gain: false,
            has_loss: false,
        }
    }

    pub fn interval_distance_m(&self) -> f64 {
        self.interval_distance_m
    }

    /// Adds `point`, located `distance_from_start_m` along the track.
    pub fn add(&mut self, point: &TrackPoint, distance_from_start_m: f64) {
        self.has_gain |= point.altitude_gain.is_some();
        self.has_loss |= point.altitude_loss.is_some();

        let (distance_m, duration_ms) = match self.last {
            Some((last_distance, last_time)) => (
                (distance_from_start_m - last_distance).max(0.0),
                (point.time_ms() - last_time).max(0) as f64,
            ),
            None => (0.0, 0.0),
        };
        self.last = Some((distance_from_start_m, point.time_ms()));

        self.split(Step {
            distance_m,
            duration_ms,
            gain_m: point.altitude_gain.unwrap_or_default(),
            loss_m: point.altitude_loss.unwrap_or_default(),
            heart_rate: point.heart_rate.map(f64::from),
        });
    }

    fn split(&mut self, step: Step) {
        if step.distance_m <= 0.0 {
            self.current.add_share(&step, 1.0);
            return;
        }

        let mut remaining_m = step.distance_m;
        while self.current.distance_m + remaining_m >= self.interval_distance_m {
            let room_m = self.interval_distance_m - self.current.distance_m;
            self.current.add_share(&step, room_m / step.distance_m);
            self.current.distance_m = self.interval_distance_m;
            remaining_m -= room_m;

            let next_start = self.current.start_distance_m + self.interval_distance_m;
            self.completed.push(self.current);
            self.current = IntervalAccumulator::starting_at(next_start);

            logvbln!(
                "Interval {} closed at {:.1} m",
                self.completed.len(),
                next_start
            );
        }

        if remaining_m > IntervalStatistics::DISTANCE_EPSILON_M {
            self.current.add_share(&step, remaining_m / step.distance_m);
            self.current.distance_m += remaining_m;
        }
    }

    /// Starts a new segment: the next point contributes no distance or time
    /// relative to the last one, so a pause gap is not counted.
    pub fn break_segment(&mut self) {
        self.last = None;
    }

    /// Closed intervals followed by the running one, if it covers any
    /// distance yet.
    pub fn intervals(&self) -> Vec<Interval> {
        let mut intervals: Vec<Interval> = self
            .completed
            .iter()
            .map(|acc| acc.to_interval(self.has_gain, self.has_loss))
            .collect();

        if self.current.distance_m > IntervalStatistics::DISTANCE_EPSILON_M {
            intervals.push(self.current.to_interval(self.has_gain, self.has_loss));
        }

        intervals
    }

    /// The most recent interval that reached the full interval distance.
    pub fn last_completed(&self) -> Option<Interval> {
        self.completed
            .last()
            .map(|acc| acc.to_interval(self.has_gain, self.has_loss))
    }

    pub fn total_distance_m(&self) -> f64 {
        self.current.start_distance_m + self.current.distance_m
    }
}
