//! Append-only reading log

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::sensors::Reading;

/// ctime layout with the separators replaced by commas
const LOG_TIME_FORMAT: &str = "%a,%b,%e,%H:%M:%S,%Y";

/// Format one log line: `Www,Mmm,dd,hh:mm:ss,yyyy, tt.t, hh.h, pppp.p`
pub fn format_log_line<Tz: TimeZone>(reading: &Reading, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{},{:5.1},{:5.1},{:6.1}",
        reading.timestamp.with_timezone(tz).format(LOG_TIME_FORMAT),
        reading.temperature,
        reading.humidity,
        reading.pressure
    )
}

/// Appends one line per reading, local time
pub struct ReadingLog {
    path: PathBuf,
    lines_written: u64,
}

impl ReadingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lines_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    pub fn append(&mut self, reading: &Reading) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening reading log {:?}", self.path))?;

        let line = format_log_line(reading, &Local);
        writeln!(file, "{}", line)?;
        self.lines_written += 1;

        debug!("Logged reading: {}", line);
        Ok(())
    }
}
