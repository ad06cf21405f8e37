use chrono::{DateTime, SecondsFormat, Utc};

pub mod counters;
pub mod facilities;
pub mod geo;
pub mod logging;
pub mod ring_buffer;
pub mod time;

pub struct DateTimeUtils {}

impl DateTimeUtils {
    /// Formats a millisecond epoch timestamp, falling back to the raw number
    /// when it is out of chrono's range.
    pub fn timestamp_to_str(timestamp_ms: i64) -> String {
        match DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
            Some(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format!("{}ms", timestamp_ms),
        }
    }

    pub fn timestamp_to_zulu(timestamp_ms: i64) -> Option<String> {
        DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
            .map(|datetime| datetime.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn zulu2ts(zulu_datetime: &str) -> Option<i64> {
        DateTime::parse_from_rfc3339(zulu_datetime)
            .ok()
            .map(|datetime| datetime.timestamp_millis())
    }

    pub fn duration_to_str(duration_ms: i64) -> String {
        let secs = duration_ms.max(0) / 1000;
        format!("{:0>2}:{:0>2}:{:0>2}", secs / 3600, (secs / 60) % 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zulu_round_trip() {
        let ts = DateTimeUtils::zulu2ts("2023-05-14T07:30:00.250Z");
        assert_eq!(ts, Some(1_684_049_400_250));
        assert_eq!(
            DateTimeUtils::timestamp_to_zulu(1_684_049_400_250).as_deref(),
            Some("2023-05-14T07:30:00.250Z")
        );
        assert_eq!(DateTimeUtils::zulu2ts("not a date"), None);
    }

    #[test]
    fn test_timestamp_to_str() {
        assert_eq!(
            DateTimeUtils::timestamp_to_str(1_684_049_400_250),
            "2023-05-14 07:30:00"
        );
    }

    #[test]
    fn test_duration_to_str() {
        assert_eq!(DateTimeUtils::duration_to_str(3_723_000), "01:02:03");
        assert_eq!(DateTimeUtils::duration_to_str(-5), "00:00:00");
    }
}
