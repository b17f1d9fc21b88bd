//! Storage module - reading log and setpoint file

mod reading_log;
mod setpoints;

pub use reading_log::{format_log_line, ReadingLog};
pub use setpoints::{SetpointStore, SETPOINT_RECORD_SIZE};
