use std::path::Path;

use serde_derive::{Deserialize, Serialize};

use crate::{
    error::Result,
    processors::location_filter::FilterSettings,
    stats::updater::MotionThresholds,
};

/// Tunables of one recording, read from TOML. Every key is optional.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RecordingConfig {
    pub max_accuracy_m: f64,
    pub min_moving_speed_mps: f64,
    pub max_acceleration_mps2: f64,
    pub interval_distance_m: f64,
    pub sensor_max_age_ms: i64,
    pub wheel_circumference_m: f64,
    pub min_grade_distance_m: f64,
    pub min_recording_distance_m: f64,
    pub verbose_logging: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        let filter = FilterSettings::default();
        let thresholds = MotionThresholds::default();

        Self {
            max_accuracy_m: filter.max_accuracy_m,
            min_moving_speed_mps: thresholds.min_moving_speed_mps,
            max_acceleration_mps2: filter.max_acceleration_mps2,
            interval_distance_m: 1000.0,
            sensor_max_age_ms: 5_000,
            wheel_circumference_m: 2.1,
            min_grade_distance_m: thresholds.min_grade_distance_m,
            min_recording_distance_m: thresholds.min_recording_distance_m,
            verbose_logging: false,
        }
    }
}

impl RecordingConfig {
    pub const DEFAULT_FILE_NAME: &str = "recording.toml";

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        RecordingConfig::from_toml_str(&content)
    }

    /// `recording.toml` from the working directory, or the defaults when
    /// there is none.
    pub fn from_current_dir() -> Result<Self> {
        let path = std::env::current_dir()?.join(RecordingConfig::DEFAULT_FILE_NAME);
        if path.exists() {
            RecordingConfig::load(path)
        } else {
            Ok(RecordingConfig::default())
        }
    }

    pub fn filter_settings(&self) -> FilterSettings {
        FilterSettings {
            max_accuracy_m: self.max_accuracy_m,
            max_acceleration_mps2: self.max_acceleration_mps2,
            min_moving_speed_mps: self.min_moving_speed_mps,
        }
    }

    pub fn motion_thresholds(&self) -> MotionThresholds {
        MotionThresholds {
            min_moving_speed_mps: self.min_moving_speed_mps,
            min_grade_distance_m: self.min_grade_distance_m,
            min_recording_distance_m: self.min_recording_distance_m,
            max_acceleration_mps2: self.max_acceleration_mps2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TelemetryError;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = RecordingConfig::from_toml_str("").unwrap();
        assert_eq!(config, RecordingConfig::default());
        assert_eq!(config.min_moving_speed_mps, 0.224);
        assert_eq!(config.max_acceleration_mps2, 20.0);
    }

    #[test]
    fn test_partial_override() {
        let config = RecordingConfig::from_toml_str(
            r#"
            max_accuracy_m = 25.0
            interval_distance_m = 1609.344
            verbose_logging = true
            "#,
        )
        .unwrap();

        assert_eq!(config.max_accuracy_m, 25.0);
        assert_eq!(config.interval_distance_m, 1609.344);
        assert!(config.verbose_logging);
        assert_eq!(config.sensor_max_age_ms, 5_000);
        assert_eq!(config.filter_settings().max_accuracy_m, 25.0);
    }

    #[test]
    fn test_thresholds_share_speed_and_acceleration_with_filter() {
        let config = RecordingConfig::from_toml_str(
            r#"
            min_moving_speed_mps = 0.5
            max_acceleration_mps2 = 8.0
            min_recording_distance_m = 10.0
            "#,
        )
        .unwrap();

        let thresholds = config.motion_thresholds();
        let filter = config.filter_settings();
        assert_eq!(thresholds.min_moving_speed_mps, filter.min_moving_speed_mps);
        assert_eq!(thresholds.max_acceleration_mps2, filter.max_acceleration_mps2);
        assert_eq!(thresholds.min_recording_distance_m, 10.0);
        assert_eq!(thresholds.min_grade_distance_m, 5.0);
    }

    #[test]
    fn test_bad_value_is_config_error() {
        let err = RecordingConfig::from_toml_str("max_accuracy_m = \"far\"").unwrap_err();
        assert!(matches!(err, TelemetryError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = RecordingConfig::load("/nonexistent/recording.toml").unwrap_err();
        assert!(matches!(err, TelemetryError::Io(_)));
    }
}
