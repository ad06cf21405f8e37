//! One recording, from track start to track stop.
//!
//! A [`RecordingSession`] is the single owner and writer of the statistics
//! of a track. Fixes and sensor buffers are pushed into it by the caller,
//! readers only ever get copies.

use std::collections::HashMap;

use geo_types::Coord;

use crate::{
    config::RecordingConfig,
    data_types::{Fix, Interval, Protocol, SensorSample, SensorState, TrackPoint},
    error::DecodeError,
    logging, logln, logvbln,
    processors::{
        interval_statistics::IntervalStatistics,
        location_filter::{LocationFilter, Verdict},
    },
    sensors::{ble::BleDecoder, data_set::SensorDataSet, SensorDecoder},
    stats::{TripStatistics, TripStatisticsUpdater},
    util::geo::GeoUtils,
};

pub struct RecordingSession {
    config: RecordingConfig,
    filter: LocationFilter,
    updater: TripStatisticsUpdater,
    intervals: IntervalStatistics,
    decoders: HashMap<Protocol, SensorDecoder>,
    ble: Option<BleDecoder>,
    sensor_states: HashMap<Protocol, SensorState>,
    sensor_data: SensorDataSet,
    path: Vec<Coord>,
    rejected_fixes: usize,
}

impl RecordingSession {
    const CC: &str = "RecordingSession";

    pub fn new(config: RecordingConfig, start_time_ms: i64) -> Self {
        if config.verbose_logging {
            logging::set_global_level(logging::LogLevel::VERBOSE);
        }

        logln!("Recording started at {}", start_time_ms);

        Self {
            filter: LocationFilter::new(config.filter_settings()),
            updater: TripStatisticsUpdater::new(start_time_ms, config.motion_thresholds()),
            intervals: IntervalStatistics::new(config.interval_distance_m),
            decoders: HashMap::new(),
            ble: None,
            sensor_states: HashMap::new(),
            sensor_data: SensorDataSet::new(),
            path: Vec::new(),
            rejected_fixes: 0,
            config,
        }
    }

    pub fn config(&self) -> &RecordingConfig {
        &self.config
    }

    /// Sets up a fresh decoder for `protocol`, replacing any previous one so
    /// no state leaks from an earlier connection.
    pub fn connect_sensor(&mut self, protocol: Protocol) {
        let wheel_circumference_m = self.config.wheel_circumference_m;
        match SensorDecoder::for_protocol(protocol, wheel_circumference_m) {
            Some(decoder) => {
                self.decoders.insert(protocol, decoder);
            }
            None => self.ble = Some(BleDecoder::new(wheel_circumference_m)),
        }
        self.sensor_states.insert(protocol, SensorState::Connecting);

        logln!("Connected {:?} sensor", protocol);
    }

    pub fn disconnect_sensor(&mut self, protocol: Protocol) {
        let removed = match protocol {
            Protocol::Ble => self.ble.take().is_some(),
            _ => self.decoders.remove(&protocol).is_some(),
        };

        if removed {
            self.sensor_states.insert(protocol, SensorState::Disconnected);
            logln!("Disconnected {:?} sensor", protocol);
        }
    }

    /// Protocols with a live decoder, in a stable order.
    pub fn connected_sensors(&self) -> Vec<Protocol> {
        Protocol::ALL
            .into_iter()
            .filter(|protocol| match protocol {
                Protocol::Ble => self.ble.is_some(),
                _ => self.decoders.contains_key(protocol),
            })
            .collect()
    }

    pub fn sensor_state(&self, protocol: Protocol) -> SensorState {
        self.sensor_states
            .get(&protocol)
            .copied()
            .unwrap_or_default()
    }

    pub fn sensor_data(&self) -> &SensorDataSet {
        &self.sensor_data
    }

    /// Runs a raw fix through the filter. An accepted fix becomes a track
    /// point, enriched with recent sensor readings, and advances the
    /// statistics and intervals. Rejected fixes and fixes arriving while
    /// paused yield `None`.
    pub fn on_fix(&mut self, fix: &Fix) -> Option<TrackPoint> {
        if self.updater.is_paused() {
            logvbln!("Paused, dropping fix at {}", fix.time_ms);
            return None;
        }

        let moving = match self.filter.evaluate(fix) {
            Verdict::Accepted { moving } => moving,
            Verdict::Rejected(_) => {
                self.rejected_fixes += 1;
                return None;
            }
        };

        let mut point = TrackPoint::from(*fix);
        self.sensor_data
            .fill_track_point(&mut point, self.config.sensor_max_age_ms, fix.time_ms);

        if let Some(change) = self.updater.add_point(&point, moving) {
            point = point.with_altitude_change(change.gain_m, change.loss_m);
        }
        self.intervals
            .add(&point, self.updater.snapshot().total_distance_m);
        self.path.push(point.coord());

        Some(point)
    }

    /// Decodes a buffer from a framed sensor. `Ok(None)` is the normal "no
    /// frame this time" outcome.
    pub fn on_sensor_buffer(
        &mut self,
        protocol: Protocol,
        buffer: &[u8],
        now_ms: i64,
    ) -> Result<Option<SensorSample>, DecodeError> {
        let decoder = self
            .decoders
            .get_mut(&protocol)
            .ok_or(DecodeError::NoDecoder(protocol))?;

        let sample = decoder.decode(buffer, now_ms)?;
        if let Some(sample) = &sample {
            self.record_sample(sample);
        }

        Ok(sample)
    }

    /// Decodes one BLE characteristic notification.
    pub fn on_ble_characteristic(
        &mut self,
        uuid: u16,
        value: &[u8],
        now_ms: i64,
    ) -> Result<SensorSample, DecodeError> {
        let decoder = self
            .ble
            .as_mut()
            .ok_or(DecodeError::NoDecoder(Protocol::Ble))?;

        let sample = decoder.decode(uuid, value, now_ms)?;
        self.record_sample(&sample);

        Ok(sample)
    }

    fn record_sample(&mut self, sample: &SensorSample) {
        self.sensor_states.insert(sample.protocol, sample.state);
        if sample.has_values() {
            self.sensor_data.set(sample);
        }
    }

    /// Advances the clock while no fix arrives.
    pub fn update_time(&mut self, now_ms: i64) {
        self.updater.update_time(now_ms);
    }

    /// The gap until [`resume`](Self::resume) counts neither as time nor as
    /// distance, and the next fix is not checked against the last one.
    pub fn pause(&mut self, time_ms: i64) {
        if self.updater.is_paused() {
            return;
        }

        self.updater.pause(time_ms);
        self.filter.reset();
        self.intervals.break_segment();
    }

    pub fn resume(&mut self, time_ms: i64) {
        self.updater.resume(time_ms);
    }

    pub fn is_paused(&self) -> bool {
        self.updater.is_paused()
    }

    pub fn statistics(&self) -> TripStatistics {
        self.updater.snapshot()
    }

    pub fn intervals(&self) -> Vec<Interval> {
        self.intervals.intervals()
    }

    pub fn last_completed_interval(&self) -> Option<Interval> {
        self.intervals.last_completed()
    }

    pub fn accepted_points(&self) -> usize {
        self.path.len()
    }

    pub fn rejected_fixes(&self) -> usize {
        self.rejected_fixes
    }

    pub fn encoded_path(&self) -> Option<String> {
        GeoUtils::encode_path(&self.path)
    }

    /// (left-bottom, right-top) of the accepted points.
    pub fn bounding_box(&self) -> Option<(Coord, Coord)> {
        GeoUtils::bounding_box(&self.path)
    }

    /// Ends the recording and hands out the final statistics.
    pub fn finish(mut self, stop_time_ms: i64) -> TripStatistics {
        self.updater.update_time(stop_time_ms);
        let stats = self.updater.snapshot();

        logln!(
            "Recording finished: {} ({} points, {} rejected)",
            stats,
            self.path.len(),
            self.rejected_fixes
        );

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::ble::characteristic;
    use approx::assert_relative_eq;

    fn session() -> RecordingSession {
        RecordingSession::new(RecordingConfig::default(), 0)
    }

    fn fix(time_ms: i64, latitude: f64) -> Fix {
        Fix::new(time_ms, latitude, 8.0).with_accuracy(5.0)
    }

    #[test]
    fn test_rejected_fix_does_not_advance_statistics() {
        let mut session = session();
        assert!(session.on_fix(&fix(0, 47.0)).is_some());
        assert!(session.on_fix(&Fix::new(1_000, 47.0001, 8.0)).is_none());

        assert_eq!(session.rejected_fixes(), 1);
        assert_eq!(session.accepted_points(), 1);
        assert_eq!(session.statistics().total_distance_m, 0.0);
    }

    #[test]
    fn test_smoothed_altitude_change_is_attached_to_points() {
        let mut session = session();
        session.on_fix(&fix(0, 47.0).with_altitude(400.0));
        let up = session.on_fix(&fix(1_000, 47.00001).with_altitude(403.0)).unwrap();
        let down = session.on_fix(&fix(2_000, 47.00002).with_altitude(401.0)).unwrap();

        // Averages go 400, 401.5, 401.33
        assert_relative_eq!(up.altitude_gain.unwrap(), 1.5);
        assert_eq!(up.altitude_loss, Some(0.0));
        assert_eq!(down.altitude_gain, Some(0.0));
        assert_relative_eq!(down.altitude_loss.unwrap(), 1.5 - 4.0 / 3.0, epsilon = 1e-9);

        let stats = session.statistics();
        assert_relative_eq!(stats.total_elevation_gain_m, 1.5);
        assert_relative_eq!(stats.total_elevation_loss_m, 1.5 - 4.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_speed_at_threshold_counts_as_moving() {
        let mut session = session();
        session.on_fix(&fix(0, 47.0).with_speed(0.224));
        session.on_fix(&fix(10_000, 47.00002).with_speed(0.224));

        let stats = session.statistics();
        assert_eq!(stats.total_time_ms, 10_000);
        assert_eq!(stats.moving_time_ms, 10_000);
    }

    #[test]
    fn test_slow_fixes_in_place_count_as_stopped() {
        let mut session = session();
        session.on_fix(&fix(0, 47.0).with_speed(0.1));
        session.on_fix(&fix(10_000, 47.00001).with_speed(0.1));

        let stats = session.statistics();
        assert_eq!(stats.total_time_ms, 10_000);
        assert_eq!(stats.moving_time_ms, 0);
        assert_eq!(stats.total_distance_m, 0.0);
    }

    #[test]
    fn test_sensor_buffer_without_decoder() {
        let mut session = session();
        assert_eq!(
            session.on_sensor_buffer(Protocol::Zephyr, &[0u8; 60], 0),
            Err(DecodeError::NoDecoder(Protocol::Zephyr))
        );
        assert!(matches!(
            session.on_ble_characteristic(characteristic::BATTERY_LEVEL, &[80], 0),
            Err(DecodeError::NoDecoder(Protocol::Ble))
        ));
    }

    #[test]
    fn test_ble_heart_rate_enriches_next_point() {
        let mut session = session();
        session.connect_sensor(Protocol::Ble);

        let sample = session
            .on_ble_characteristic(characteristic::HEART_RATE_MEASUREMENT, &[0x00, 128], 500)
            .unwrap();
        assert_eq!(sample.heart_rate, Some(128));
        assert_eq!(session.sensor_state(Protocol::Ble), SensorState::Sending);

        let point = session.on_fix(&fix(1_000, 47.0)).unwrap();
        assert_eq!(point.heart_rate, Some(128));

        // Older than the default 5 s
        let point = session.on_fix(&fix(6_000, 47.00001)).unwrap();
        assert_eq!(point.heart_rate, None);
    }

    #[test]
    fn test_disconnect_forgets_decoder() {
        let mut session = session();
        session.connect_sensor(Protocol::Polar);
        assert_eq!(session.sensor_state(Protocol::Polar), SensorState::Connecting);

        session.disconnect_sensor(Protocol::Polar);
        assert!(session.connected_sensors().is_empty());
        assert_eq!(session.sensor_state(Protocol::Polar), SensorState::Disconnected);
        assert_eq!(session.sensor_state(Protocol::Ant), SensorState::None);
    }

    #[test]
    fn test_paused_fixes_are_dropped() {
        let mut session = session();
        session.on_fix(&fix(0, 47.0));
        session.pause(1_000);

        assert!(session.is_paused());
        assert!(session.on_fix(&fix(2_000, 47.001)).is_none());
        assert_eq!(session.rejected_fixes(), 0);

        session.resume(3_000);
        assert!(session.on_fix(&fix(3_000, 47.01)).is_some());
        assert_eq!(session.statistics().total_distance_m, 0.0);
    }

    #[test]
    fn test_path_and_bounding_box() {
        let mut session = session();
        assert!(session.bounding_box().is_none());

        session.on_fix(&fix(0, 47.0));
        session.on_fix(&fix(10_000, 47.0005));

        let (left_bottom, right_top) = session.bounding_box().unwrap();
        assert_relative_eq!(left_bottom.y, 47.0);
        assert_relative_eq!(right_top.y, 47.0005);

        let decoded = GeoUtils::get_coords_from_poly(&session.encoded_path().unwrap());
        assert_eq!(decoded.len(), 2);
    }
}
