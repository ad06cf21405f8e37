pub mod fix;
pub mod interval;
pub mod sensor;
pub mod track_point;

pub use fix::Fix;
pub use interval::Interval;
pub use sensor::{Protocol, Provenance, SensorSample, SensorState};
pub use track_point::TrackPoint;
