// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/greenhouse-rs

//! Alarm module - threshold rules and the active alarm collection

mod active;
mod limits;

pub use active::ActiveAlarms;
pub use limits::{AlarmLimits, AlarmRule, Direction, ALARM_RULES};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Alarm taxonomy. `NoAlarm` marks the absence of an alarm and is never
/// stored in an [`ActiveAlarms`] collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlarmKind {
    NoAlarm,
    HighTemperature,
    LowTemperature,
    HighHumidity,
    LowHumidity,
    HighPressure,
    LowPressure,
}

impl AlarmKind {
    /// Display name used by the console and the log
    pub fn name(&self) -> &'static str {
        match self {
            AlarmKind::NoAlarm => "No Alarms",
            AlarmKind::HighTemperature => "High Temperature",
            AlarmKind::LowTemperature => "Low Temperature",
            AlarmKind::HighHumidity => "High Humidity",
            AlarmKind::LowHumidity => "Low Humidity",
            AlarmKind::HighPressure => "High Pressure",
            AlarmKind::LowPressure => "Low Pressure",
        }
    }

    pub fn is_alarm(&self) -> bool {
        *self != AlarmKind::NoAlarm
    }
}

impl std::fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One active alarm condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmRecord {
    pub kind: AlarmKind,
    /// Timestamp of the reading that crossed the threshold
    pub timestamp: DateTime<Utc>,
    /// Measurement that crossed the threshold
    pub value: f64,
}

/// Alarm engine errors
#[derive(Error, Debug)]
pub enum AlarmError {
    /// The collection could not grow to hold a new record
    #[error("cannot allocate alarm record for {kind}")]
    Allocation {
        kind: AlarmKind,
        #[source]
        source: std::collections::TryReserveError,
    },
}
