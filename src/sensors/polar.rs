use crate::{
    data_types::{Protocol, Provenance, SensorSample},
    error::DecodeError,
    logvbln,
    sensors::MessageParser,
};

/// Polar WearLink heart-rate strap.
///
/// Frames are 8 to 16 bytes long and the link is noisy. When a buffer holds
/// no valid frame the parser reports a decaying estimate of the last good
/// reading instead of failing; such samples carry [`Provenance::Decayed`].
#[derive(Debug, Clone, Default)]
pub struct PolarParser {
    last_heart_rate: u16,
}

impl PolarParser {
    const CC: &str = "PolarParser";

    pub const FRAME_SIZE: usize = 16;
    pub const MIN_FRAME_SIZE: usize = 8;

    const HEADER: u8 = 0xFE;
    const MAX_SEQUENCE: u8 = 16;
    const HEART_RATE_OFFSET: usize = 5;
    /// Decayed values below this are reported as 0.
    const DECAY_FLOOR: u16 = 50;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_heart_rate(&self) -> u16 {
        self.last_heart_rate
    }

    fn frame_valid_at(buffer: &[u8], offset: usize) -> bool {
        if offset + PolarParser::MIN_FRAME_SIZE > buffer.len() {
            return false;
        }

        buffer[offset] == PolarParser::HEADER
            && buffer[offset + 2] == 0xFF - buffer[offset + 1]
            && buffer[offset + 3] < PolarParser::MAX_SEQUENCE
    }

    /// 80 % of the last value, floored.
    fn decayed(last: u16) -> u16 {
        let decayed = (last as u32 * 4 / 5) as u16;
        if decayed < PolarParser::DECAY_FLOOR {
            0
        } else {
            decayed
        }
    }
}

impl MessageParser for PolarParser {
    fn protocol(&self) -> Protocol {
        Protocol::Polar
    }

    fn is_valid(&self, buffer: &[u8]) -> bool {
        PolarParser::frame_valid_at(buffer, 0)
    }

    fn find_next_alignment(&self, buffer: &[u8]) -> Option<usize> {
        (0..buffer.len()).find(|offset| PolarParser::frame_valid_at(buffer, *offset))
    }

    fn parse_buffer(&mut self, buffer: &[u8], captured_at_ms: i64) -> Result<SensorSample, DecodeError> {
        let mut sample = SensorSample::new(Protocol::Polar, captured_at_ms);

        let heart_rate = match self.find_next_alignment(buffer) {
            Some(offset) => buffer[offset + PolarParser::HEART_RATE_OFFSET] as u16,
            None => {
                let decayed = PolarParser::decayed(self.last_heart_rate);
                logvbln!(
                    "No valid frame in {} bytes, decaying {} -> {}",
                    buffer.len(),
                    self.last_heart_rate,
                    decayed
                );
                sample.provenance = Provenance::Decayed;
                decayed
            }
        };

        self.last_heart_rate = heart_rate;
        sample.heart_rate = Some(heart_rate);

        Ok(sample)
    }

    fn frame_size(&self) -> usize {
        PolarParser::FRAME_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(heart_rate: u8) -> Vec<u8> {
        vec![0xFE, 0x08, 0xF7, 0x01, 0x00, heart_rate, 0x00, 0x00]
    }

    #[test]
    fn test_is_valid() {
        let parser = PolarParser::new();
        let valid = frame(72);
        assert!(parser.is_valid(&valid));

        let mut bad_header = valid.clone();
        bad_header[0] = 0x03;
        assert!(!parser.is_valid(&bad_header));

        let mut bad_checksum = valid.clone();
        bad_checksum[2] = 0xF6;
        assert!(!parser.is_valid(&bad_checksum));

        let mut bad_sequence = valid.clone();
        bad_sequence[3] = 16;
        assert!(!parser.is_valid(&bad_sequence));
    }

    #[test]
    fn test_parse_valid_frame() {
        let mut parser = PolarParser::new();
        let sample = parser.parse_buffer(&frame(142), 5).unwrap();

        assert_eq!(sample.heart_rate, Some(142));
        assert_eq!(sample.provenance, Provenance::Live);
        assert_eq!(parser.last_heart_rate(), 142);
    }

    #[test]
    fn test_decay_without_valid_frame() {
        let mut parser = PolarParser::new();
        parser.parse_buffer(&frame(100), 0).unwrap();

        let noise = [0x13u8; 16];
        let first = parser.parse_buffer(&noise, 1_000).unwrap();
        assert_eq!(first.heart_rate, Some(80));
        assert_eq!(first.provenance, Provenance::Decayed);

        // Decay compounds: 80 -> 64 -> 51 -> 40, reported as 0
        assert_eq!(parser.parse_buffer(&noise, 2_000).unwrap().heart_rate, Some(64));
        assert_eq!(parser.parse_buffer(&noise, 3_000).unwrap().heart_rate, Some(51));
        assert_eq!(parser.parse_buffer(&noise, 4_000).unwrap().heart_rate, Some(0));
        assert_eq!(parser.parse_buffer(&noise, 5_000).unwrap().heart_rate, Some(0));

        let recovered = parser.parse_buffer(&frame(90), 6_000).unwrap();
        assert_eq!(recovered.heart_rate, Some(90));
        assert!(recovered.is_live());
    }

    #[test]
    fn test_find_next_alignment() {
        let parser = PolarParser::new();
        assert_eq!(parser.find_next_alignment(&[0u8; 32]), None);

        let mut buffer = vec![0x00, 0xFE, 0x11, 0x42];
        buffer.extend(frame(60));
        buffer.extend([0u8; 4]);
        assert_eq!(parser.find_next_alignment(&buffer), Some(4));

        // A header too close to the end cannot hold a frame
        assert_eq!(parser.find_next_alignment(&frame(60)[..7]), None);
    }
}
