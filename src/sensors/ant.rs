//! ANT+ messages as delivered by the radio: `[length, message id, data...]`
//! where `length` counts the data bytes only.

use std::collections::HashMap;

use crate::{
    data_types::{Protocol, SensorSample, SensorState},
    error::DecodeError,
    logln, logvbln,
    sensors::{event_counter::RevolutionRateCounter, MessageParser},
};

pub mod message_id {
    pub const CHANNEL_EVENT: u8 = 0x01;
    pub const CHANNEL_RESPONSE: u8 = 0x40;
    pub const UNASSIGN_CHANNEL: u8 = 0x41;
    pub const BROADCAST_DATA: u8 = 0x4E;
    pub const CHANNEL_ID: u8 = 0x51;
    pub const STARTUP: u8 = 0x6F;
}

pub mod event_code {
    pub const RESPONSE_NO_ERROR: u8 = 0x00;
    pub const RX_SEARCH_TIMEOUT: u8 = 0x01;
    pub const RX_FAIL: u8 = 0x02;
    pub const TX: u8 = 0x03;
    pub const CHANNEL_CLOSED: u8 = 0x07;
    pub const RX_FAIL_GO_TO_SEARCH: u8 = 0x08;
    pub const CHANNEL_COLLISION: u8 = 0x09;
}

pub mod device_type {
    pub const HEART_RATE: u8 = 120;
    pub const SPEED_AND_CADENCE: u8 = 121;
    pub const CADENCE: u8 = 122;
    pub const SPEED: u8 = 123;
}

const CHANNEL_NUMBER_MASK: u8 = 0x1F;
const HEADER_SIZE: usize = 2;
const PAYLOAD_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelId {
    pub channel: u8,
    pub device_number: u16,
    pub device_type: u8,
    pub transmission_type: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntMessage {
    ChannelId(ChannelId),
    /// Reply to `message_id`, or an RF event when `message_id` is
    /// [`message_id::CHANNEL_EVENT`].
    ChannelResponse {
        channel: u8,
        message_id: u8,
        code: u8,
    },
    BroadcastData {
        channel: u8,
        payload: [u8; PAYLOAD_SIZE],
    },
    Startup {
        reason: u8,
    },
}

impl AntMessage {
    /// `buffer` must hold exactly one message.
    pub fn decode(buffer: &[u8]) -> Result<Self, DecodeError> {
        if !AntMessage::is_well_formed(buffer) {
            return Err(DecodeError::InvalidFrame {
                protocol: Protocol::Ant,
                offset: 0,
            });
        }

        let data = &buffer[HEADER_SIZE..];
        let too_short = || DecodeError::TooShort {
            protocol: Protocol::Ant,
            expected: HEADER_SIZE + AntMessage::data_size(buffer[1]),
            actual: buffer.len(),
        };
        if data.len() < AntMessage::data_size(buffer[1]) {
            return Err(too_short());
        }

        match buffer[1] {
            message_id::CHANNEL_ID => Ok(AntMessage::ChannelId(ChannelId {
                channel: data[0] & CHANNEL_NUMBER_MASK,
                device_number: u16::from_le_bytes([data[1], data[2]]),
                device_type: data[3],
                transmission_type: data[4],
            })),
            message_id::CHANNEL_RESPONSE => Ok(AntMessage::ChannelResponse {
                channel: data[0] & CHANNEL_NUMBER_MASK,
                message_id: data[1],
                code: data[2],
            }),
            message_id::BROADCAST_DATA => {
                let mut payload = [0u8; PAYLOAD_SIZE];
                payload.copy_from_slice(&data[1..1 + PAYLOAD_SIZE]);
                Ok(AntMessage::BroadcastData {
                    channel: data[0] & CHANNEL_NUMBER_MASK,
                    payload,
                })
            }
            message_id::STARTUP => Ok(AntMessage::Startup { reason: data[0] }),
            other => Err(DecodeError::UnknownAntMessage(other)),
        }
    }

    fn is_well_formed(buffer: &[u8]) -> bool {
        buffer.len() > HEADER_SIZE && buffer[0] as usize == buffer.len() - HEADER_SIZE
    }

    fn data_size(id: u8) -> usize {
        match id {
            message_id::CHANNEL_ID => 5,
            message_id::CHANNEL_RESPONSE => 3,
            message_id::BROADCAST_DATA => 1 + PAYLOAD_SIZE,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RevolutionSource {
    Crank,
    Wheel,
}

/// Decodes ANT+ messages for every channel of one radio. Devices are learned
/// from channel-id messages; broadcast data is interpreted according to the
/// device type paired on its channel.
#[derive(Debug, Clone)]
pub struct AntParser {
    devices: HashMap<u8, ChannelId>,
    counters: HashMap<(u8, RevolutionSource), RevolutionRateCounter>,
    wheel_circumference_m: f64,
}

impl Default for AntParser {
    fn default() -> Self {
        Self::new(AntParser::DEFAULT_WHEEL_CIRCUMFERENCE_M)
    }
}

impl AntParser {
    const CC: &str = "AntParser";

    pub const DEFAULT_WHEEL_CIRCUMFERENCE_M: f64 = 2.1;
    /// Smallest message: header plus one data byte.
    pub const MIN_MESSAGE_SIZE: usize = HEADER_SIZE + 1;

    pub fn new(wheel_circumference_m: f64) -> Self {
        Self {
            devices: HashMap::new(),
            counters: HashMap::new(),
            wheel_circumference_m,
        }
    }

    pub fn device_on(&self, channel: u8) -> Option<&ChannelId> {
        self.devices.get(&(channel & CHANNEL_NUMBER_MASK))
    }

    fn revolutions_per_minute(
        &mut self,
        channel: u8,
        source: RevolutionSource,
        payload: &[u8; PAYLOAD_SIZE],
        time_offset: usize,
        captured_at_ms: i64,
    ) -> f64 {
        let sensor_time = u16::from_le_bytes([payload[time_offset], payload[time_offset + 1]]);
        let count = u16::from_le_bytes([payload[time_offset + 2], payload[time_offset + 3]]);

        self.counters
            .entry((channel, source))
            .or_default()
            .events_per_minute(count, sensor_time, captured_at_ms)
    }

    fn wheel_speed(&self, revolutions_per_minute: f64) -> f64 {
        revolutions_per_minute * self.wheel_circumference_m / 60.0
    }

    fn on_broadcast(
        &mut self,
        channel: u8,
        payload: &[u8; PAYLOAD_SIZE],
        sample: &mut SensorSample,
        captured_at_ms: i64,
    ) {
        let Some(device) = self.devices.get(&channel).copied() else {
            logvbln!("Broadcast on unpaired channel {}", channel);
            sample.state = SensorState::Connecting;
            return;
        };

        match device.device_type {
            device_type::HEART_RATE => {
                sample.heart_rate = Some(payload[7] as u16);
            }
            device_type::CADENCE => {
                sample.cadence = Some(self.revolutions_per_minute(
                    channel,
                    RevolutionSource::Crank,
                    payload,
                    4,
                    captured_at_ms,
                ));
            }
            device_type::SPEED => {
                let rpm = self.revolutions_per_minute(
                    channel,
                    RevolutionSource::Wheel,
                    payload,
                    4,
                    captured_at_ms,
                );
                sample.speed = Some(self.wheel_speed(rpm));
            }
            device_type::SPEED_AND_CADENCE => {
                sample.cadence = Some(self.revolutions_per_minute(
                    channel,
                    RevolutionSource::Crank,
                    payload,
                    0,
                    captured_at_ms,
                ));
                let rpm = self.revolutions_per_minute(
                    channel,
                    RevolutionSource::Wheel,
                    payload,
                    4,
                    captured_at_ms,
                );
                sample.speed = Some(self.wheel_speed(rpm));
            }
            other => logvbln!("Unsupported device type {} on channel {}", other, channel),
        }
    }

    fn state_for_response(message_id: u8, code: u8) -> SensorState {
        if message_id != message_id::CHANNEL_EVENT {
            return SensorState::Connecting;
        }

        match code {
            event_code::RX_SEARCH_TIMEOUT | event_code::CHANNEL_CLOSED => SensorState::Disconnected,
            event_code::RX_FAIL_GO_TO_SEARCH => SensorState::Connecting,
            _ => SensorState::Connected,
        }
    }
}

impl MessageParser for AntParser {
    fn protocol(&self) -> Protocol {
        Protocol::Ant
    }

    /// A buffer is valid when it holds exactly one message.
    fn is_valid(&self, buffer: &[u8]) -> bool {
        AntMessage::is_well_formed(buffer)
    }

    fn parse_buffer(&mut self, buffer: &[u8], captured_at_ms: i64) -> Result<SensorSample, DecodeError> {
        let mut sample = SensorSample::new(Protocol::Ant, captured_at_ms);

        match AntMessage::decode(buffer)? {
            AntMessage::ChannelId(channel_id) => {
                logln!(
                    "Channel {} paired with device {} (type {})",
                    channel_id.channel,
                    channel_id.device_number,
                    channel_id.device_type
                );
                self.devices.insert(channel_id.channel, channel_id);
                sample.state = SensorState::Connected;
            }
            AntMessage::ChannelResponse {
                channel,
                message_id,
                code,
            } => {
                sample.state = AntParser::state_for_response(message_id, code);
                if sample.state == SensorState::Disconnected {
                    self.devices.remove(&channel);
                    self.counters.retain(|(c, _), _| *c != channel);
                }
            }
            AntMessage::BroadcastData { channel, payload } => {
                self.on_broadcast(channel, &payload, &mut sample, captured_at_ms);
            }
            AntMessage::Startup { reason } => {
                logln!("Radio restarted (reason 0x{:02X})", reason);
                self.devices.clear();
                self.counters.clear();
                sample.state = SensorState::Disconnected;
            }
        }

        Ok(sample)
    }

    fn frame_size(&self) -> usize {
        AntParser::MIN_MESSAGE_SIZE
    }
}
