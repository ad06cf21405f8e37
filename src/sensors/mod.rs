//! Decoders turning raw sensor byte buffers into [`SensorSample`]s.
//!
//! Every framed protocol implements [`MessageParser`]. A decoder instance
//! holds per-connection state (decay, counter history) and must serve a
//! single physical device.

use crate::{
    data_types::{Protocol, SensorSample},
    error::DecodeError,
};

use self::{ant::AntParser, polar::PolarParser, zephyr::ZephyrParser};

pub mod ant;
pub mod ble;
pub mod cadence;
pub mod crc;
pub mod data_set;
pub mod event_counter;
pub mod polar;
pub mod zephyr;

pub trait MessageParser {
    fn protocol(&self) -> Protocol;

    /// Structural check of a frame starting at offset 0.
    fn is_valid(&self, buffer: &[u8]) -> bool;

    /// Offset of the first valid frame in `buffer`, if any.
    fn find_next_alignment(&self, buffer: &[u8]) -> Option<usize> {
        (0..buffer.len()).find(|offset| self.is_valid(&buffer[*offset..]))
    }

    fn parse_buffer(&mut self, buffer: &[u8], captured_at_ms: i64) -> Result<SensorSample, DecodeError>;

    /// Bytes needed to be sure a complete frame can be present.
    fn frame_size(&self) -> usize;
}

#[derive(Debug, Clone)]
pub enum SensorDecoder {
    Zephyr(ZephyrParser),
    Polar(PolarParser),
    Ant(AntParser),
}

impl SensorDecoder {
    /// A fresh decoder for a framed protocol; BLE values are not framed and
    /// go through [`ble::BleDecoder`] instead.
    pub fn for_protocol(protocol: Protocol, wheel_circumference_m: f64) -> Option<Self> {
        match protocol {
            Protocol::Zephyr => Some(SensorDecoder::Zephyr(ZephyrParser::new())),
            Protocol::Polar => Some(SensorDecoder::Polar(PolarParser::new())),
            Protocol::Ant => Some(SensorDecoder::Ant(AntParser::new(wheel_circumference_m))),
            Protocol::Ble => None,
        }
    }

    fn parser(&self) -> &dyn MessageParser {
        match self {
            SensorDecoder::Zephyr(parser) => parser,
            SensorDecoder::Polar(parser) => parser,
            SensorDecoder::Ant(parser) => parser,
        }
    }

    fn parser_mut(&mut self) -> &mut dyn MessageParser {
        match self {
            SensorDecoder::Zephyr(parser) => parser,
            SensorDecoder::Polar(parser) => parser,
            SensorDecoder::Ant(parser) => parser,
        }
    }

    /// Decodes the first frame found in `buffer`. `Ok(None)` means no frame
    /// this time, which callers are expected to see often.
    ///
    /// Polar never yields `None`: without a frame it reports its decayed
    /// estimate.
    pub fn decode(&mut self, buffer: &[u8], captured_at_ms: i64) -> Result<Option<SensorSample>, DecodeError> {
        if let SensorDecoder::Polar(parser) = self {
            return parser.parse_buffer(buffer, captured_at_ms).map(Some);
        }

        if buffer.len() < self.frame_size() {
            return Err(DecodeError::TooShort {
                protocol: self.protocol(),
                expected: self.frame_size(),
                actual: buffer.len(),
            });
        }

        match self.find_next_alignment(buffer) {
            Some(offset) => self.parse_buffer(&buffer[offset..], captured_at_ms).map(Some),
            None => Ok(None),
        }
    }
}

impl MessageParser for SensorDecoder {
    fn protocol(&self) -> Protocol {
        self.parser().protocol()
    }

    fn is_valid(&self, buffer: &[u8]) -> bool {
        self.parser().is_valid(buffer)
    }

    fn find_next_alignment(&self, buffer: &[u8]) -> Option<usize> {
        self.parser().find_next_alignment(buffer)
    }

    fn parse_buffer(&mut self, buffer: &[u8], captured_at_ms: i64) -> Result<SensorSample, DecodeError> {
        self.parser_mut().parse_buffer(buffer, captured_at_ms)
    }

    fn frame_size(&self) -> usize {
        self.parser().frame_size()
    }
}
