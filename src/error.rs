use thiserror::Error;

use crate::data_types::Protocol;

/// Caller mistakes when handing bytes to a decoder. A buffer that simply
/// holds no valid frame yet is not an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("{protocol:?} buffer too short: {actual} bytes, need {expected}")]
    TooShort {
        protocol: Protocol,
        expected: usize,
        actual: usize,
    },

    #[error("{protocol:?} frame at offset {offset} is not valid")]
    InvalidFrame { protocol: Protocol, offset: usize },

    #[error("unknown ANT message id 0x{0:02X}")]
    UnknownAntMessage(u8),

    #[error("unknown BLE characteristic 0x{0:04X}")]
    UnknownCharacteristic(u16),

    #[error("no decoder registered for {0:?}")]
    NoDecoder(Protocol),
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
