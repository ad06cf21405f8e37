pub mod extremity;
pub mod smoothing;
pub mod trip_statistics;
pub mod updater;

pub use extremity::ExtremityMonitor;
pub use smoothing::MovingAverage;
pub use trip_statistics::TripStatistics;
pub use updater::{ElevationChange, MotionThresholds, TripStatisticsUpdater};
