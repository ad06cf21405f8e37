use chrono::Utc;

use crate::{config::RecordingConfig, data_types::Protocol, session::RecordingSession};

/// Assembles a [`RecordingSession`] from a configuration and the set of
/// sensors connected at track start.
pub struct SessionBuilder {
    config: RecordingConfig,
    sensors: Vec<Protocol>,
    start_time_ms: Option<i64>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            config: RecordingConfig::default(),
            sensors: Vec::new(),
            start_time_ms: None,
        }
    }

    pub fn with_config(&mut self, config: RecordingConfig) -> &mut SessionBuilder {
        self.config = config;
        self
    }

    /// Registers one decoder for `protocol`. Registering a protocol twice
    /// keeps a single decoder.
    pub fn with_sensor(&mut self, protocol: Protocol) -> &mut SessionBuilder {
        if !self.sensors.contains(&protocol) {
            self.sensors.push(protocol);
        }
        self
    }

    pub fn starting_at(&mut self, start_time_ms: i64) -> &mut SessionBuilder {
        self.start_time_ms = Some(start_time_ms);
        self
    }

    /// Builds the session, starting now unless a start time was given.
    pub fn build(&self) -> RecordingSession {
        let start_time_ms = self
            .start_time_ms
            .unwrap_or_else(|| Utc::now().timestamp_millis());

        let mut session = RecordingSession::new(self.config.clone(), start_time_ms);
        for protocol in &self.sensors {
            session.connect_sensor(*protocol);
        }

        session
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        SessionBuilder::new()
    }
}
