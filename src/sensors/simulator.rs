// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/greenhouse-rs

//! Sensor simulator for demo/testing

use async_trait::async_trait;
use anyhow::{bail, Result};
use rand::prelude::*;
use chrono::Utc;

use super::{Sensor, SensorSample, SensorType, SensorStatus, CalibrationData};
use crate::config::SimulationRange;

/// Produces whole-number values drawn uniformly from a range
pub struct SensorSimulator {
    id: String,
    sensor_type: SensorType,
    status: SensorStatus,
    sequence: u64,
    rng: rand::rngs::StdRng,
    range: SimulationRange,
}

impl SensorSimulator {
    pub fn new(id: &str, sensor_type: SensorType, range: SimulationRange) -> Self {
        Self::with_rng(id, sensor_type, range, rand::rngs::StdRng::from_entropy())
    }

    /// Deterministic simulator for tests
    pub fn seeded(id: &str, sensor_type: SensorType, range: SimulationRange, seed: u64) -> Self {
        Self::with_rng(id, sensor_type, range, rand::rngs::StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        id: &str,
        sensor_type: SensorType,
        range: SimulationRange,
        rng: rand::rngs::StdRng,
    ) -> Self {
        Self {
            id: id.to_string(),
            sensor_type,
            status: SensorStatus::Disconnected,
            sequence: 0,
            rng,
            range,
        }
    }

    fn generate(&mut self) -> f64 {
        let (low, high) = self.range.ordered();
        self.rng.gen_range(low..=high) as f64
    }
}

#[async_trait]
impl Sensor for SensorSimulator {
    fn id(&self) -> &str {
        &self.id
    }

    fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    fn status(&self) -> SensorStatus {
        self.status
    }

    async fn connect(&mut self) -> Result<()> {
        self.status = SensorStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.status = SensorStatus::Disconnected;
        Ok(())
    }

    async fn calibrate(&mut self) -> Result<CalibrationData> {
        self.status = SensorStatus::Active;

        Ok(CalibrationData {
            offset: 0.0,
            scale: 1.0,
            timestamp: Utc::now(),
            notes: format!("Simulated range {}..={}", self.range.low, self.range.high),
        })
    }

    async fn read(&mut self) -> Result<SensorSample> {
        if self.status != SensorStatus::Active {
            bail!("Simulator {} not active", self.id);
        }

        let value = self.generate();
        self.sequence += 1;

        Ok(SensorSample {
            sensor_id: self.id.clone(),
            sensor_type: self.sensor_type,
            timestamp: Utc::now(),
            sequence: self.sequence,
            value,
        })
    }
}
