//! Sensor module - Sense HAT interfaces and simulation

mod manager;
mod traits;
mod environmental;
mod simulator;

pub use manager::SensorManager;
pub use traits::{
    Sensor, SensorSample, SensorType, SensorStatus, CalibrationData, SensorHealth, Measurement,
    Reading,
};
pub use environmental::*;
pub use simulator::SensorSimulator;
