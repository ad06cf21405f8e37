use crate::{
    data_types::{Protocol, SensorSample},
    error::DecodeError,
    logvbln,
    sensors::{cadence::CadenceAverager, MessageParser},
};

/// Zephyr HxM heart-rate strap, fixed 60-byte frames.
#[derive(Debug, Clone, Default)]
pub struct ZephyrParser {
    strides: CadenceAverager,
}

impl ZephyrParser {
    const CC: &str = "ZephyrParser";

    pub const FRAME_SIZE: usize = 60;

    const START_MARKER: u8 = 0x02;
    const LENGTH_MARKER: u8 = 0x1E;
    const END_MARKER: u8 = 0x03;

    const LENGTH_OFFSET: usize = 58;
    const END_OFFSET: usize = 59;
    const BATTERY_OFFSET: usize = 11;
    const HEART_RATE_OFFSET: usize = 12;
    const STRIDES_OFFSET: usize = 54;
    const CADENCE_OFFSET: usize = 56;

    pub fn new() -> Self {
        Self::default()
    }

    /// Firmware cadence in strides per minute; the strap reports sixteenths.
    fn firmware_cadence(frame: &[u8]) -> u16 {
        u16::from_le_bytes([
            frame[ZephyrParser::CADENCE_OFFSET],
            frame[ZephyrParser::CADENCE_OFFSET + 1],
        ]) / 16
    }
}

impl MessageParser for ZephyrParser {
    fn protocol(&self) -> Protocol {
        Protocol::Zephyr
    }

    fn is_valid(&self, buffer: &[u8]) -> bool {
        buffer.len() >= ZephyrParser::FRAME_SIZE
            && buffer[0] == ZephyrParser::START_MARKER
            && buffer[ZephyrParser::LENGTH_OFFSET] == ZephyrParser::LENGTH_MARKER
            && buffer[ZephyrParser::END_OFFSET] == ZephyrParser::END_MARKER
    }

    fn parse_buffer(&mut self, buffer: &[u8], captured_at_ms: i64) -> Result<SensorSample, DecodeError> {
        if buffer.len() < ZephyrParser::FRAME_SIZE {
            return Err(DecodeError::TooShort {
                protocol: Protocol::Zephyr,
                expected: ZephyrParser::FRAME_SIZE,
                actual: buffer.len(),
            });
        }
        if !self.is_valid(buffer) {
            return Err(DecodeError::InvalidFrame {
                protocol: Protocol::Zephyr,
                offset: 0,
            });
        }

        self.strides
            .update(buffer[ZephyrParser::STRIDES_OFFSET] as u64, captured_at_ms);

        // Older firmware leaves the cadence field at 0; fall back to the
        // stride counter.
        let cadence = match ZephyrParser::firmware_cadence(buffer) {
            0 => self.strides.cadence().unwrap_or_default(),
            cadence => cadence as f64,
        };

        let mut sample = SensorSample::new(Protocol::Zephyr, captured_at_ms);
        sample.heart_rate = Some(buffer[ZephyrParser::HEART_RATE_OFFSET] as u16);
        sample.battery = Some(buffer[ZephyrParser::BATTERY_OFFSET]);
        sample.cadence = Some(cadence);

        logvbln!("HxM frame: hr {:?} cadence {:.1}", sample.heart_rate, cadence);

        Ok(sample)
    }

    fn frame_size(&self) -> usize {
        ZephyrParser::FRAME_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_frame() -> Vec<u8> {
        let mut frame = vec![0u8; ZephyrParser::FRAME_SIZE];
        frame[0] = 0x02;
        frame[58] = 0x1E;
        frame[59] = 0x03;
        frame
    }

    #[test]
    fn test_is_valid() {
        let parser = ZephyrParser::new();
        let mut frame = vec![0u8; 60];
        assert!(!parser.is_valid(&frame));

        frame[0] = 2;
        frame[58] = 30;
        frame[59] = 3;
        assert!(parser.is_valid(&frame));

        for index in [0, 58, 59] {
            let mut broken = frame.clone();
            broken[index] ^= 0xFF;
            assert!(!parser.is_valid(&broken), "byte {} flipped", index);
        }

        assert!(!parser.is_valid(&frame[..59]));
    }

    #[test]
    fn test_parse_buffer() {
        let mut parser = ZephyrParser::new();
        let mut frame = valid_frame();
        frame[12] = 255;
        frame[11] = 51;
        frame[56] = 255;
        frame[57] = 15;

        let sample = parser.parse_buffer(&frame, 1_000).unwrap();
        assert_eq!(sample.protocol, Protocol::Zephyr);
        assert_eq!(sample.heart_rate, Some(255));
        assert_eq!(sample.battery, Some(51));
        assert_eq!(sample.cadence, Some(255.0));
        assert_eq!(sample.captured_at_ms, 1_000);
        assert!(sample.is_live());
    }

    #[test]
    fn test_stride_fallback_without_firmware_cadence() {
        let mut parser = ZephyrParser::new();
        let mut last = None;

        // one stride every 500 ms, counter wrapping at 128
        for i in 0..20u64 {
            let mut frame = valid_frame();
            frame[54] = ((120 + i) % 128) as u8;
            last = Some(parser.parse_buffer(&frame, i as i64 * 500).unwrap());
        }

        let cadence = last.and_then(|s| s.cadence).unwrap();
        assert!((cadence - 120.0).abs() < 1e-9, "cadence {}", cadence);
    }

    #[test]
    fn test_find_next_alignment() {
        let parser = ZephyrParser::new();
        assert_eq!(parser.find_next_alignment(&[0u8; 120]), None);

        let mut buffer = vec![0u8; 17];
        buffer.extend(valid_frame());
        buffer.extend([0u8; 10]);
        assert_eq!(parser.find_next_alignment(&buffer), Some(17));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let mut parser = ZephyrParser::new();

        assert!(matches!(
            parser.parse_buffer(&[0u8; 10], 0),
            Err(DecodeError::TooShort { actual: 10, .. })
        ));
        assert!(matches!(
            parser.parse_buffer(&[0u8; 60], 0),
            Err(DecodeError::InvalidFrame { offset: 0, .. })
        ));
    }
}
