//! CRC-8 with the reflected polynomial 0x8C (Dallas/Maxim 1-Wire), as used
//! by BLE-style bridges that append a checksum byte to each frame.

use crc::{Crc, CRC_8_MAXIM_DOW};

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_MAXIM_DOW);

pub const POLYNOMIAL_REFLECTED: u8 = 0x8C;

pub fn compute_crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

/// Bit-by-bit form of [`compute_crc8`]: XOR each byte in, then shift right
/// eight times, folding in the polynomial whenever a one drops out.
pub fn compute_crc8_bitwise(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |crc, byte| {
        (0..8).fold(crc ^ byte, |crc, _| {
            if crc & 0x01 != 0 {
                (crc >> 1) ^ POLYNOMIAL_REFLECTED
            } else {
                crc >> 1
            }
        })
    })
}

/// Checks a frame whose last byte is the CRC-8 of everything before it.
pub fn verify_trailing_crc8(frame: &[u8]) -> bool {
    match frame.split_last() {
        Some((checksum, payload)) => compute_crc8(payload) == *checksum,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(compute_crc8(b"123456789"), 0xA1);
        assert_eq!(compute_crc8_bitwise(b"123456789"), 0xA1);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(compute_crc8(&[]), 0x00);
        assert_eq!(compute_crc8_bitwise(&[]), 0x00);
    }

    #[test]
    fn test_table_matches_bitwise() {
        let data: Vec<u8> = (0..=255u8).collect();
        for len in [1, 2, 7, 60, 256] {
            assert_eq!(
                compute_crc8(&data[..len]),
                compute_crc8_bitwise(&data[..len]),
                "length {}",
                len
            );
        }
    }

    #[test]
    fn test_verify_trailing() {
        let mut frame = vec![0x16, 0x4B, 0x00, 0x10];
        frame.push(compute_crc8(&frame));
        assert!(verify_trailing_crc8(&frame));

        frame[1] ^= 0x01;
        assert!(!verify_trailing_crc8(&frame));
        assert!(!verify_trailing_crc8(&[]));
    }
}
