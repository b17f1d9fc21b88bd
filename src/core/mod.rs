//! Core module - control loop and snapshot distribution

mod engine;
mod event_bus;

pub use engine::Engine;
pub use event_bus::EventBus;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alarms::AlarmRecord;
use crate::control::{Controls, Setpoints};
use crate::sensors::Reading;

/// Immutable result of one control cycle, handed to renderers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub reading: Reading,
    pub setpoints: Setpoints,
    pub controls: Controls,
    /// Active alarms in the order they were raised
    pub alarms: Vec<AlarmRecord>,
}

/// System-wide state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemState {
    pub running: bool,
    pub sensors_active: usize,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub active_alarms: usize,
    pub uptime_seconds: u64,
    pub last_reading: Option<DateTime<Utc>>,
}
