//! Ingestion core of a GPS activity recorder: location filtering, trip
//! statistics, fixed-distance intervals and decoding of heart-rate, cadence
//! and power sensors.

pub mod codec;
pub mod config;
pub mod data_types;
pub mod error;
pub mod processors;
pub mod sensors;
pub mod session;
pub mod stats;
pub mod util;

pub use util::logging;

pub use config::RecordingConfig;
pub use error::{DecodeError, Result, TelemetryError};
pub use session::RecordingSession;
pub use util::facilities::SessionBuilder;
