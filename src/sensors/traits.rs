// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/greenhouse-rs

//! Sensor traits and common types

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use anyhow::Result;

/// Sensor types found on the Sense HAT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorType {
    Thermometer,        // HTS221 temperature channel
    Hygrometer,         // HTS221 humidity channel
    Barometer,          // LPS25H
}

impl SensorType {
    pub fn measurement(&self) -> Measurement {
        match self {
            SensorType::Thermometer => Measurement::Temperature,
            SensorType::Hygrometer => Measurement::Humidity,
            SensorType::Barometer => Measurement::Pressure,
        }
    }
}

/// The three quantities sampled each cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measurement {
    Temperature,
    Humidity,
    Pressure,
}

impl Measurement {
    pub const ALL: [Measurement; 3] = [
        Measurement::Temperature,
        Measurement::Humidity,
        Measurement::Pressure,
    ];

    pub fn unit(&self) -> &'static str {
        match self {
            Measurement::Temperature => "C",
            Measurement::Humidity => "%",
            Measurement::Pressure => "mb",
        }
    }

    pub fn sensor_type(&self) -> SensorType {
        match self {
            Measurement::Temperature => SensorType::Thermometer,
            Measurement::Humidity => SensorType::Hygrometer,
            Measurement::Pressure => SensorType::Barometer,
        }
    }
}

/// Sensor operational status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorStatus {
    Disconnected,
    Connected,
    Calibrating,
    Active,
    Error,
}

/// Calibration data for a sensor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationData {
    pub offset: f64,
    pub scale: f64,
    pub timestamp: DateTime<Utc>,
    pub notes: String,
}

/// A single value from one sensor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorSample {
    pub sensor_id: String,
    pub sensor_type: SensorType,
    pub timestamp: DateTime<Utc>,
    pub sequence: u64,
    pub value: f64,
}

/// One timestamped sample of all three measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius
    pub temperature: f64,
    /// Percent relative humidity
    pub humidity: f64,
    /// Millibars
    pub pressure: f64,
}

impl Reading {
    pub fn new(temperature: f64, humidity: f64, pressure: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            temperature,
            humidity,
            pressure,
        }
    }

    pub fn value(&self, measurement: Measurement) -> f64 {
        match measurement {
            Measurement::Temperature => self.temperature,
            Measurement::Humidity => self.humidity,
            Measurement::Pressure => self.pressure,
        }
    }
}

/// Trait for all sensors
#[async_trait]
pub trait Sensor: Send + Sync {
    /// Get sensor unique identifier
    fn id(&self) -> &str;

    /// Get sensor type
    fn sensor_type(&self) -> SensorType;

    /// Get current status
    fn status(&self) -> SensorStatus;

    /// Connect to sensor hardware
    async fn connect(&mut self) -> Result<()>;

    /// Disconnect from sensor
    async fn disconnect(&mut self) -> Result<()>;

    /// Perform calibration
    async fn calibrate(&mut self) -> Result<CalibrationData>;

    /// Read one value in the unit of the sensor's measurement
    async fn read(&mut self) -> Result<SensorSample>;
}

/// Sensor health metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorHealth {
    pub sensor_id: String,
    pub status: SensorStatus,
    pub readings_count: u64,
    pub error_count: u64,
    pub last_error: Option<String>,
}
