// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/greenhouse-rs

//! Greenhouse - Sense HAT Greenhouse Controller
//!
//! Periodic environmental control for a Raspberry Pi greenhouse:
//! - Temperature, humidity and pressure acquisition (Sense HAT or simulated)
//! - Heater and humidifier decisions against persisted setpoints
//! - Ordered active-alarm tracking against configurable limits
//! - Comma-separated reading log
//! - Console status block and 8x8 LED matrix bars
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     Greenhouse Engine                     │
//! ├───────────────────────────────────────────────────────────┤
//! │  ┌─────────┐  ┌──────────┐  ┌──────────┐  ┌───────────┐  │
//! │  │ Sensors │→ │ Control  │→ │  Alarms  │→ │ LED Matrix│  │
//! │  │ Manager │  │Setpoints │  │  Active  │  │           │  │
//! │  └─────────┘  └──────────┘  └──────────┘  └───────────┘  │
//! │       ↓            ↓             ↓                        │
//! │  ┌─────────────────────────────────────────────────────┐  │
//! │  │              Event Bus (CycleReport)                 │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! │       ↓                          ↓                        │
//! │  ┌─────────┐               ┌──────────┐                   │
//! │  │ Storage │               │ Console  │                   │
//! │  └─────────┘               └──────────┘                   │
//! └───────────────────────────────────────────────────────────┘
//! ```

pub mod alarms;
pub mod config;
pub mod control;
pub mod core;
pub mod display;
pub mod sensors;
pub mod storage;

// Re-exports for convenience
pub use alarms::{ActiveAlarms, AlarmError, AlarmKind, AlarmLimits, AlarmRecord};
pub use config::Config;
pub use control::{set_controls, Controls, Setpoints};
pub use core::{CycleReport, Engine, EventBus};
pub use sensors::{Reading, SensorManager, SensorType};
pub use storage::{ReadingLog, SetpointStore};

/// Greenhouse version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Greenhouse name
pub const NAME: &str = "Greenhouse";
