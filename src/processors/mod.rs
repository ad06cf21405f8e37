pub mod interval_statistics;
pub mod location_filter;

pub use interval_statistics::IntervalStatistics;
pub use location_filter::{FilterSettings, LocationFilter, RejectReason, Verdict};
