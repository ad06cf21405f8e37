use std::fmt::Display;

use crate::{data_types::Fix, logvbln, util::geo::GeoUtils};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    /// Fixes with a larger accuracy radius (m) are dropped.
    pub max_accuracy_m: f64,
    /// Largest plausible change of speed between two fixes (m/s²).
    pub max_acceleration_mps2: f64,
    pub min_moving_speed_mps: f64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            max_accuracy_m: 50.0,
            // 0.02 m/s per ms, roughly 2g
            max_acceleration_mps2: 20.0,
            min_moving_speed_mps: 0.224,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    InvalidCoordinate,
    MissingAccuracy,
    PoorAccuracy(f64),
    NonIncreasingTime,
    ImplausibleAcceleration(f64),
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::InvalidCoordinate => write!(f, "coordinate out of range"),
            RejectReason::MissingAccuracy => write!(f, "no accuracy reported"),
            RejectReason::PoorAccuracy(accuracy) => write!(f, "accuracy {:.1} m", accuracy),
            RejectReason::NonIncreasingTime => write!(f, "timestamp not after previous fix"),
            RejectReason::ImplausibleAcceleration(acceleration) => {
                write!(f, "implied acceleration {:.1} m/s²", acceleration)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// `moving` is false when the fix counts as stationary time.
    Accepted { moving: bool },
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted { .. })
    }
}

/// Decides whether a raw fix is trustworthy enough to advance statistics.
///
/// Checks run in order: coordinate range, accuracy, plausibility against the
/// last accepted fix. A rejected fix leaves the filter untouched.
#[derive(Debug, Clone)]
pub struct LocationFilter {
    settings: FilterSettings,
    last_accepted: Option<Fix>,
    /// Speed at the last accepted fix, reported or implied.
    last_speed: Option<f64>,
}

impl LocationFilter {
    const CC: &str = "LocationFilter";

    pub fn new(settings: FilterSettings) -> Self {
        Self {
            settings,
            last_accepted: None,
            last_speed: None,
        }
    }

    pub fn settings(&self) -> &FilterSettings {
        &self.settings
    }

    pub fn last_accepted(&self) -> Option<&Fix> {
        self.last_accepted.as_ref()
    }

    pub fn accept(&mut self, fix: &Fix) -> bool {
        self.evaluate(fix).is_accepted()
    }

    pub fn evaluate(&mut self, fix: &Fix) -> Verdict {
        match self.check(fix) {
            Ok((moving, speed)) => {
                self.last_accepted = Some(*fix);
                self.last_speed = speed;
                Verdict::Accepted { moving }
            }
            Err(reason) => {
                logvbln!("Rejected fix at {}: {}", fix.time_ms, reason);
                Verdict::Rejected(reason)
            }
        }
    }

    /// Forgets the previous fix, e.g. after a pause, so the next fix is not
    /// compared across the gap.
    pub fn reset(&mut self) {
        self.last_accepted = None;
        self.last_speed = None;
    }

    fn check(&self, fix: &Fix) -> Result<(bool, Option<f64>), RejectReason> {
        if !GeoUtils::is_valid_coordinate(fix.latitude, fix.longitude) {
            return Err(RejectReason::InvalidCoordinate);
        }

        match fix.accuracy {
            None => return Err(RejectReason::MissingAccuracy),
            Some(accuracy) if !(accuracy <= self.settings.max_accuracy_m) => {
                return Err(RejectReason::PoorAccuracy(accuracy));
            }
            _ => {}
        }

        let Some(previous) = self.last_accepted.as_ref() else {
            let moving = fix
                .speed
                .map_or(false, |speed| speed >= self.settings.min_moving_speed_mps);
            return Ok((moving, fix.speed));
        };

        let elapsed_ms = fix.time_ms - previous.time_ms;
        if elapsed_ms <= 0 {
            return Err(RejectReason::NonIncreasingTime);
        }

        let elapsed_s = elapsed_ms as f64 / 1000.0;
        let implied_speed = GeoUtils::distance(previous.coord(), fix.coord()) / elapsed_s;

        if let Some(previous_speed) = previous.speed.or(self.last_speed) {
            let acceleration = (implied_speed - previous_speed).abs() / elapsed_s;
            if acceleration > self.settings.max_acceleration_mps2 {
                return Err(RejectReason::ImplausibleAcceleration(acceleration));
            }
        }

        let speed = fix.speed.unwrap_or(implied_speed);
        Ok((speed >= self.settings.min_moving_speed_mps, Some(speed)))
    }
}
