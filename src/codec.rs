//! JSON encoding of statistics snapshots and intervals for hand-off to
//! storage or another process.

use crate::{
    data_types::Interval,
    error::Result,
    stats::TripStatistics,
};

pub fn encode_statistics(stats: &TripStatistics) -> Result<String> {
    Ok(serde_json::to_string(stats)?)
}

pub fn decode_statistics(encoded: &str) -> Result<TripStatistics> {
    Ok(serde_json::from_str(encoded)?)
}

pub fn encode_intervals(intervals: &[Interval]) -> Result<String> {
    Ok(serde_json::to_string(intervals)?)
}

pub fn decode_intervals(encoded: &str) -> Result<Vec<Interval>> {
    Ok(serde_json::from_str(encoded)?)
}
