use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Zephyr,
    Polar,
    Ant,
    Ble,
}

impl Protocol {
    pub const ALL: [Protocol; 4] = [Protocol::Zephyr, Protocol::Polar, Protocol::Ant, Protocol::Ble];
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorState {
    #[default]
    None,
    Connecting,
    Connected,
    Disconnected,
    Sending,
}

/// Whether a value was decoded from a fresh frame or estimated from an
/// earlier one.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provenance {
    #[default]
    Live,
    Decayed,
}

/// A normalized reading produced by one of the sensor decoders.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub protocol: Protocol,
    pub state: SensorState,
    pub provenance: Provenance,
    pub captured_at_ms: i64,
    pub heart_rate: Option<u16>,
    pub cadence: Option<f64>,
    pub power: Option<f64>,
    pub battery: Option<u8>,
    /// m/s
    pub speed: Option<f64>,
    /// m, cumulative
    pub distance: Option<f64>,
}

impl SensorSample {
    pub fn new(protocol: Protocol, captured_at_ms: i64) -> Self {
        Self {
            protocol,
            state: SensorState::Sending,
            provenance: Provenance::Live,
            captured_at_ms,
            heart_rate: None,
            cadence: None,
            power: None,
            battery: None,
            speed: None,
            distance: None,
        }
    }

    pub fn with_state(mut self, state: SensorState) -> Self {
        self.state = state;
        self
    }

    pub fn is_live(&self) -> bool {
        self.provenance == Provenance::Live
    }

    pub fn has_values(&self) -> bool {
        self.heart_rate.is_some()
            || self.cadence.is_some()
            || self.power.is_some()
            || self.battery.is_some()
            || self.speed.is_some()
            || self.distance.is_some()
    }

    /// True while `now_ms` is still before `captured_at_ms + max_age_ms`.
    pub fn is_recent(&self, max_age_ms: i64, now_ms: i64) -> bool {
        now_ms < self.captured_at_ms.saturating_add(max_age_ms)
    }
}
