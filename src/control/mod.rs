//! Control module - setpoints and actuator decisions

use serde::{Deserialize, Serialize};

use crate::sensors::Reading;

/// Target temperature and humidity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Setpoints {
    /// Degrees Celsius
    pub temperature: f64,
    /// Percent relative humidity
    pub humidity: f64,
}

impl Default for Setpoints {
    fn default() -> Self {
        Self {
            temperature: 25.0,
            humidity: 55.0,
        }
    }
}

/// Heater and humidifier states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controls {
    pub heater: bool,
    pub humidifier: bool,
}

/// Heater runs below the temperature target, humidifier below the humidity target
pub fn set_controls(target: &Setpoints, reading: &Reading) -> Controls {
    Controls {
        heater: reading.temperature < target.temperature,
        humidifier: reading.humidity < target.humidity,
    }
}
