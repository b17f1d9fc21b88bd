// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/greenhouse-rs

//! Sensor manager - one sensor per measurement, assembled into readings

use std::collections::HashMap;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use tracing::{info, warn, error, debug};

use super::{Sensor, Reading, Measurement, SensorStatus, SensorHealth};
use super::environmental::{Hts221Sensor, Lps25hSensor};
use super::simulator::SensorSimulator;
use crate::config::SensorConfig;

/// Owns the temperature, humidity and pressure sources
pub struct SensorManager {
    sensors: HashMap<Measurement, Box<dyn Sensor>>,
    health: HashMap<String, SensorHealth>,
}

impl SensorManager {
    /// Build sources from configuration, simulated or Sense HAT per measurement
    pub fn from_config(config: &SensorConfig) -> Self {
        let mut manager = Self::empty();

        for measurement in Measurement::ALL {
            let sensor_type = measurement.sensor_type();
            let sensor: Box<dyn Sensor> = if config.simulated(measurement) {
                let id = format!("{:?}-sim", sensor_type).to_lowercase();
                Box::new(SensorSimulator::new(&id, sensor_type, config.range(measurement)))
            } else {
                match measurement {
                    Measurement::Temperature => {
                        Box::new(Hts221Sensor::new("hts221-temperature", sensor_type, config.i2c_bus))
                    }
                    Measurement::Humidity => {
                        Box::new(Hts221Sensor::new("hts221-humidity", sensor_type, config.i2c_bus))
                    }
                    Measurement::Pressure => Box::new(Lps25hSensor::new("lps25h", config.i2c_bus)),
                }
            };
            manager.add_sensor(sensor);
        }

        manager
    }

    pub fn empty() -> Self {
        Self {
            sensors: HashMap::new(),
            health: HashMap::new(),
        }
    }

    /// Install a sensor as the source for its measurement, replacing any previous one
    pub fn add_sensor(&mut self, sensor: Box<dyn Sensor>) {
        let id = sensor.id().to_string();
        let measurement = sensor.sensor_type().measurement();
        if let Some(old) = self.sensors.insert(measurement, sensor) {
            self.health.remove(old.id());
        }
        self.health.insert(id.clone(), SensorHealth {
            sensor_id: id.clone(),
            status: SensorStatus::Disconnected,
            readings_count: 0,
            error_count: 0,
            last_error: None,
        });
        info!("Added sensor: {} ({:?})", id, measurement);
    }

    /// Connect and calibrate every sensor. Failures are logged, not fatal.
    pub async fn start(&mut self) {
        for (measurement, sensor) in self.sensors.iter_mut() {
            let id = sensor.id().to_string();
            match sensor.connect().await {
                Ok(_) => {
                    info!("Connected sensor: {}", id);
                    match sensor.calibrate().await {
                        Ok(cal) => debug!("Calibrated {}: {}", id, cal.notes),
                        Err(e) => warn!("Calibration failed for {}: {}", id, e),
                    }
                }
                Err(e) => {
                    error!("Failed to connect {:?} sensor {}: {}", measurement, id, e);
                }
            }
            if let Some(h) = self.health.get_mut(&id) {
                h.status = sensor.status();
            }
        }
    }

    pub async fn stop(&mut self) {
        for sensor in self.sensors.values_mut() {
            if let Err(e) = sensor.disconnect().await {
                warn!("Error disconnecting {}: {}", sensor.id(), e);
            }
        }

        for h in self.get_all_health() {
            info!(
                "Sensor {}: {} readings, {} errors",
                h.sensor_id, h.readings_count, h.error_count
            );
        }
    }

    /// Sample all three measurements into one reading stamped now
    pub async fn acquire(&mut self) -> Result<Reading> {
        let timestamp = Utc::now();
        let mut values = [0.0f64; 3];

        for (slot, measurement) in Measurement::ALL.into_iter().enumerate() {
            let sensor = self
                .sensors
                .get_mut(&measurement)
                .ok_or_else(|| anyhow!("No sensor for {:?}", measurement))?;
            let id = sensor.id().to_string();

            let result = sensor.read().await;
            let health = self.health.get_mut(&id);
            match result {
                Ok(sample) => {
                    if let Some(h) = health {
                        h.readings_count += 1;
                        h.status = sensor.status();
                    }
                    values[slot] = sample.value;
                }
                Err(e) => {
                    if let Some(h) = health {
                        h.error_count += 1;
                        h.last_error = Some(e.to_string());
                    }
                    return Err(e).with_context(|| format!("reading {:?} from {}", measurement, id));
                }
            }
        }

        let [temperature, humidity, pressure] = values;
        Ok(Reading {
            timestamp,
            temperature,
            humidity,
            pressure,
        })
    }

    pub fn get_health(&self, id: &str) -> Option<&SensorHealth> {
        self.health.get(id)
    }

    pub fn get_all_health(&self) -> Vec<SensorHealth> {
        self.health.values().cloned().collect()
    }

    pub fn active_count(&self) -> usize {
        self.sensors.values().filter(|s| s.status() == SensorStatus::Active).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationRange;
    use crate::sensors::SensorType;

    fn fixed(measurement: Measurement, value: i32) -> Box<dyn Sensor> {
        let range = SimulationRange { low: value, high: value };
        Box::new(SensorSimulator::seeded(
            &format!("{:?}", measurement),
            measurement.sensor_type(),
            range,
            0,
        ))
    }

    #[tokio::test]
    async fn test_acquire_assembles_reading() {
        let mut manager = SensorManager::empty();
        manager.add_sensor(fixed(Measurement::Temperature, 21));
        manager.add_sensor(fixed(Measurement::Humidity, 48));
        manager.add_sensor(fixed(Measurement::Pressure, 1001));
        manager.start().await;

        assert_eq!(manager.active_count(), 3);
        let reading = manager.acquire().await.unwrap();
        assert_eq!(reading.temperature, 21.0);
        assert_eq!(reading.humidity, 48.0);
        assert_eq!(reading.pressure, 1001.0);
        assert_eq!(manager.get_health("Temperature").unwrap().readings_count, 1);
    }

    #[tokio::test]
    async fn test_acquire_fails_without_sensor() {
        let mut manager = SensorManager::empty();
        manager.add_sensor(fixed(Measurement::Temperature, 21));
        manager.start().await;
        assert!(manager.acquire().await.is_err());
    }

    #[tokio::test]
    async fn test_sensor_fills_its_own_slot() {
        let mut manager = SensorManager::empty();
        manager.add_sensor(fixed(Measurement::Temperature, 21));
        manager.add_sensor(fixed(Measurement::Humidity, 48));
        manager.add_sensor(fixed(Measurement::Pressure, 1001));

        let replacement = SensorSimulator::seeded(
            "spare-hygrometer",
            SensorType::Hygrometer,
            SimulationRange { low: 60, high: 60 },
            0,
        );
        manager.add_sensor(Box::new(replacement));
        manager.start().await;

        let reading = manager.acquire().await.unwrap();
        assert_eq!(reading.humidity, 60.0);
        assert_eq!(reading.temperature, 21.0);

        let mut ids: Vec<_> = manager.get_all_health().into_iter().map(|h| h.sensor_id).collect();
        ids.sort();
        assert_eq!(ids, vec!["Pressure", "Temperature", "spare-hygrometer"]);
    }

    #[tokio::test]
    async fn test_read_errors_are_counted() {
        let mut manager = SensorManager::empty();
        let sim = SensorSimulator::seeded(
            "cold",
            SensorType::Thermometer,
            SimulationRange { low: 0, high: 1 },
            0,
        );
        // Never started, so the simulator refuses to read
        manager.add_sensor(Box::new(sim));

        assert!(manager.acquire().await.is_err());
        let health = manager.get_health("cold").unwrap();
        assert_eq!(health.error_count, 1);
        assert!(health.last_error.is_some());
    }

    #[tokio::test]
    async fn test_from_config_all_simulated() {
        let config = SensorConfig::default();
        let mut manager = SensorManager::from_config(&config);
        manager.start().await;
        let reading = manager.acquire().await.unwrap();

        assert!((-10.0..=50.0).contains(&reading.temperature));
        assert!((0.0..=100.0).contains(&reading.humidity));
        assert!((975.0..=1016.0).contains(&reading.pressure));
    }
}
