//! Bluetooth LE GATT characteristic values for heart rate, battery, cycling
//! power, cycling speed & cadence and running speed & cadence.

use crate::{
    data_types::{Protocol, SensorSample},
    error::DecodeError,
    logvbln,
    sensors::crc::verify_trailing_crc8,
    util::counters::WrapAwareCounter,
};

/// 16-bit assigned numbers of the supported characteristics.
pub mod characteristic {
    pub const BATTERY_LEVEL: u16 = 0x2A19;
    pub const HEART_RATE_MEASUREMENT: u16 = 0x2A37;
    pub const RSC_MEASUREMENT: u16 = 0x2A53;
    pub const CSC_MEASUREMENT: u16 = 0x2A5B;
    pub const CYCLING_POWER_MEASUREMENT: u16 = 0x2A63;
}

/// Cumulative revolution count and its event time in 1/1024 s.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Revolutions {
    count: u32,
    time: u16,
}

/// Decoder state for one BLE sensor connection. Crank and wheel rates are
/// derived from consecutive notifications, so the previous readings are kept.
#[derive(Debug, Clone)]
pub struct BleDecoder {
    wheel_circumference_m: f64,
    last_crank: Option<Revolutions>,
    last_wheel: Option<Revolutions>,
    distance_m: f64,
}

impl BleDecoder {
    const CC: &str = "BleDecoder";

    const TIME_RESOLUTION: f64 = 1024.0;

    pub fn new(wheel_circumference_m: f64) -> Self {
        Self {
            wheel_circumference_m,
            last_crank: None,
            last_wheel: None,
            distance_m: 0.0,
        }
    }

    /// Decodes one notification. Fields that are flagged but truncated are
    /// left out of the sample.
    pub fn decode(
        &mut self,
        uuid: u16,
        value: &[u8],
        captured_at_ms: i64,
    ) -> Result<SensorSample, DecodeError> {
        let mut sample = SensorSample::new(Protocol::Ble, captured_at_ms);
        if value.is_empty() {
            return Ok(sample);
        }

        match uuid {
            characteristic::BATTERY_LEVEL => {
                sample.battery = Some(value[0]);
            }
            characteristic::HEART_RATE_MEASUREMENT => {
                sample.heart_rate = BleDecoder::heart_rate(value);
            }
            characteristic::CYCLING_POWER_MEASUREMENT => self.cycling_power(value, &mut sample),
            characteristic::CSC_MEASUREMENT => self.cycling_speed_cadence(value, &mut sample),
            characteristic::RSC_MEASUREMENT => BleDecoder::running_speed_cadence(value, &mut sample),
            other => return Err(DecodeError::UnknownCharacteristic(other)),
        }

        Ok(sample)
    }

    /// For bridges that append a CRC-8 byte to each value. A frame failing
    /// the check yields `None`.
    pub fn decode_checksummed(
        &mut self,
        uuid: u16,
        frame: &[u8],
        captured_at_ms: i64,
    ) -> Result<Option<SensorSample>, DecodeError> {
        if !verify_trailing_crc8(frame) {
            logvbln!("CRC mismatch on 0x{:04X}", uuid);
            return Ok(None);
        }

        self.decode(uuid, &frame[..frame.len() - 1], captured_at_ms)
            .map(Some)
    }

    /// Wheel distance accumulated over this connection, in meters.
    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    fn heart_rate(value: &[u8]) -> Option<u16> {
        let uint16_format = value[0] & 0x01 == 0x01;
        if uint16_format {
            read_u16(value, 1)
        } else {
            value.get(1).map(|hr| *hr as u16)
        }
    }

    fn cycling_power(&mut self, value: &[u8], sample: &mut SensorSample) {
        let Some(flags) = value.first().copied() else {
            return;
        };
        let has_pedal_balance = flags & 0x01 != 0;
        let has_accumulated_torque = flags & 0x04 != 0;
        let has_wheel = flags & 0x10 != 0;
        let has_crank = flags & 0x20 != 0;

        // two flag bytes, then the instantaneous power
        let mut index = 2;
        sample.power = read_u16(value, index).map(|raw| raw as i16 as f64);
        index += 2;

        if has_pedal_balance {
            index += 1;
        }
        if has_accumulated_torque {
            index += 2;
        }
        if has_wheel {
            index += 4 + 2;
        }
        if has_crank {
            if let (Some(count), Some(time)) = (read_u16(value, index), read_u16(value, index + 2)) {
                sample.cadence = self.crank_cadence(count, time);
            }
        }
    }

    fn cycling_speed_cadence(&mut self, value: &[u8], sample: &mut SensorSample) {
        let flags = value[0];
        let has_wheel = flags & 0x01 != 0;
        let has_crank = flags & 0x02 != 0;

        let mut index = 1;
        if has_wheel {
            if let (Some(count), Some(time)) = (read_u32(value, index), read_u16(value, index + 4)) {
                if let Some(speed) = self.wheel_speed(count, time) {
                    sample.speed = Some(speed);
                    sample.distance = Some(self.distance_m);
                }
            }
            index += 6;
        }
        if has_crank {
            if let (Some(count), Some(time)) = (read_u16(value, index), read_u16(value, index + 2)) {
                sample.cadence = self.crank_cadence(count, time);
            }
        }
    }

    fn running_speed_cadence(value: &[u8], sample: &mut SensorSample) {
        let flags = value[0];
        let has_stride_length = flags & 0x01 != 0;
        let has_total_distance = flags & 0x02 != 0;

        sample.speed = read_u16(value, 1).map(|raw| raw as f64 / 256.0);
        sample.cadence = value.get(3).map(|spm| *spm as f64);

        let mut index = 4;
        if has_stride_length {
            index += 2;
        }
        if has_total_distance {
            // decimeters
            sample.distance = read_u32(value, index).map(|dm| dm as f64 / 10.0);
        }
    }

    /// Crank revolutions per minute since the previous reading. `None` on
    /// the first reading or a repeated event time.
    fn crank_cadence(&mut self, count: u16, time: u16) -> Option<f64> {
        let current = Revolutions {
            count: count as u32,
            time,
        };
        let previous = self.last_crank.replace(current)?;

        let elapsed_s = WrapAwareCounter::diff_u16(time, previous.time) as f64 / BleDecoder::TIME_RESOLUTION;
        if elapsed_s <= 0.0 {
            self.last_crank = Some(previous);
            return None;
        }

        let revolutions = WrapAwareCounter::diff_u16(count, previous.count as u16);
        Some(revolutions as f64 / elapsed_s * 60.0)
    }

    fn wheel_speed(&mut self, count: u32, time: u16) -> Option<f64> {
        let current = Revolutions { count, time };
        let previous = self.last_wheel.replace(current)?;

        let elapsed_s = WrapAwareCounter::diff_u16(time, previous.time) as f64 / BleDecoder::TIME_RESOLUTION;
        if elapsed_s <= 0.0 {
            self.last_wheel = Some(previous);
            return None;
        }

        let distance = WrapAwareCounter::diff_u32(count, previous.count) as f64 * self.wheel_circumference_m;
        self.distance_m += distance;
        Some(distance / elapsed_s)
    }
}

fn read_u16(value: &[u8], index: usize) -> Option<u16> {
    value
        .get(index..index + 2)
        .map(|bytes| u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(value: &[u8], index: usize) -> Option<u32> {
    value
        .get(index..index + 4)
        .map(|bytes| u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
