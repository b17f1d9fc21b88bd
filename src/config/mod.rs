// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/greenhouse-rs

//! Configuration module

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::alarms::AlarmLimits;
use crate::control::Setpoints;
use crate::sensors::Measurement;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Operator name shown in the console header
    pub operator: String,

    /// Data directory for the reading log and setpoint file
    pub data_dir: PathBuf,

    /// Milliseconds between control cycles
    pub update_interval_ms: u64,

    /// Sensor configuration
    pub sensors: SensorConfig,

    /// Alarm thresholds
    pub alarms: AlarmLimits,

    /// Setpoint defaults used when no saved setpoints exist
    pub control: ControlConfig,

    /// Storage configuration
    pub storage: StorageConfig,

    /// Display configuration
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            operator: "Greenhouse".to_string(),
            data_dir: PathBuf::from("./data"),
            update_interval_ms: 2000,
            sensors: SensorConfig::default(),
            alarms: AlarmLimits::default(),
            control: ControlConfig::default(),
            storage: StorageConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Load or create default configuration
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let config = Self::default();

            // Create parent directories
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            config.save(path)?;
            Ok(config)
        }
    }

    /// Get configuration directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("greenhouse"))
            .unwrap_or_else(|| PathBuf::from("./config"))
    }

    /// Get default configuration path
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.log_file)
    }

    pub fn setpoints_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.setpoints_file)
    }
}

/// Inclusive integer range a simulated sensor draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationRange {
    pub low: i32,
    pub high: i32,
}

impl SimulationRange {
    /// Bounds in ascending order
    pub fn ordered(&self) -> (i32, i32) {
        if self.low <= self.high {
            (self.low, self.high)
        } else {
            (self.high, self.low)
        }
    }
}

/// Sensor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Simulate each measurement instead of reading the Sense HAT
    pub simulate_temperature: bool,
    pub simulate_humidity: bool,
    pub simulate_pressure: bool,

    /// I2C bus number
    pub i2c_bus: u8,

    /// Simulated ranges, also the LED bar scale
    pub temperature_range: SimulationRange,
    pub humidity_range: SimulationRange,
    pub pressure_range: SimulationRange,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            simulate_temperature: true,
            simulate_humidity: true,
            simulate_pressure: true,
            i2c_bus: 1,
            temperature_range: SimulationRange { low: -10, high: 50 },
            humidity_range: SimulationRange { low: 0, high: 100 },
            pressure_range: SimulationRange { low: 975, high: 1016 },
        }
    }
}

impl SensorConfig {
    pub fn simulated(&self, measurement: Measurement) -> bool {
        match measurement {
            Measurement::Temperature => self.simulate_temperature,
            Measurement::Humidity => self.simulate_humidity,
            Measurement::Pressure => self.simulate_pressure,
        }
    }

    pub fn range(&self, measurement: Measurement) -> SimulationRange {
        match measurement {
            Measurement::Temperature => self.temperature_range,
            Measurement::Humidity => self.humidity_range,
            Measurement::Pressure => self.pressure_range,
        }
    }

    pub fn simulate_all(&mut self, simulate: bool) {
        self.simulate_temperature = simulate;
        self.simulate_humidity = simulate;
        self.simulate_pressure = simulate;
    }
}

/// Control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub default_setpoints: Setpoints,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            default_setpoints: Setpoints::default(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Append one CSV line per reading
    pub log_enabled: bool,

    /// Reading log file name, relative to the data directory
    pub log_file: String,

    /// Setpoint file name, relative to the data directory
    pub setpoints_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            log_enabled: true,
            log_file: "ghdata.txt".to_string(),
            setpoints_file: "setpoints.dat".to_string(),
        }
    }
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Print the status block each cycle
    pub console_enabled: bool,

    /// Drive the Sense HAT LED matrix
    pub matrix_enabled: bool,

    /// Clockwise rotation in degrees for how the HAT is mounted
    pub rotation: i32,

    /// Framebuffer device, auto-detected when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matrix_device: Option<PathBuf>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            matrix_enabled: true,
            rotation: 0,
            matrix_device: None,
        }
    }
}
