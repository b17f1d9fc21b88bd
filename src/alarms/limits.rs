//! Alarm limits and the fixed rule table

use serde::{Deserialize, Serialize};

use super::AlarmKind;
use crate::sensors::{Measurement, Reading};

/// Upper and lower alarm thresholds for each measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmLimits {
    /// Degrees Celsius
    pub high_temperature: f64,
    pub low_temperature: f64,

    /// Percent relative humidity
    pub high_humidity: f64,
    pub low_humidity: f64,

    /// Millibars
    pub high_pressure: f64,
    pub low_pressure: f64,
}

impl Default for AlarmLimits {
    fn default() -> Self {
        Self {
            high_temperature: 30.0,
            low_temperature: 10.0,
            high_humidity: 70.0,
            low_humidity: 25.0,
            high_pressure: 1016.0,
            low_pressure: 985.0,
        }
    }
}

/// Which side of a threshold trips an alarm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Trips at or above the threshold
    High,
    /// Trips at or below the threshold
    Low,
}

impl Direction {
    pub fn is_tripped(&self, value: f64, threshold: f64) -> bool {
        match self {
            Direction::High => value >= threshold,
            Direction::Low => value <= threshold,
        }
    }
}

/// Maps one alarm kind to the measurement and threshold it watches
#[derive(Clone, Copy)]
pub struct AlarmRule {
    pub kind: AlarmKind,
    pub measurement: Measurement,
    pub direction: Direction,
    threshold: fn(&AlarmLimits) -> f64,
}

impl AlarmRule {
    pub fn threshold(&self, limits: &AlarmLimits) -> f64 {
        (self.threshold)(limits)
    }

    /// Returns the triggering measurement when the rule trips
    pub fn check(&self, limits: &AlarmLimits, reading: &Reading) -> Option<f64> {
        let value = reading.value(self.measurement);
        self.direction
            .is_tripped(value, self.threshold(limits))
            .then_some(value)
    }
}

/// Evaluation order. Alarms raised in the same cycle are appended in this order.
pub const ALARM_RULES: [AlarmRule; 6] = [
    AlarmRule {
        kind: AlarmKind::HighTemperature,
        measurement: Measurement::Temperature,
        direction: Direction::High,
        threshold: |l: &AlarmLimits| l.high_temperature,
    },
    AlarmRule {
        kind: AlarmKind::LowTemperature,
        measurement: Measurement::Temperature,
        direction: Direction::Low,
        threshold: |l: &AlarmLimits| l.low_temperature,
    },
    AlarmRule {
        kind: AlarmKind::HighHumidity,
        measurement: Measurement::Humidity,
        direction: Direction::High,
        threshold: |l: &AlarmLimits| l.high_humidity,
    },
    AlarmRule {
        kind: AlarmKind::LowHumidity,
        measurement: Measurement::Humidity,
        direction: Direction::Low,
        threshold: |l: &AlarmLimits| l.low_humidity,
    },
    AlarmRule {
        kind: AlarmKind::HighPressure,
        measurement: Measurement::Pressure,
        direction: Direction::High,
        threshold: |l: &AlarmLimits| l.high_pressure,
    },
    AlarmRule {
        kind: AlarmKind::LowPressure,
        measurement: Measurement::Pressure,
        direction: Direction::Low,
        threshold: |l: &AlarmLimits| l.low_pressure,
    },
];
