//! Setpoint persistence as a fixed 8-byte record

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::control::Setpoints;

/// On-disk layout: two little-endian f32 values, temperature then humidity
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct SetpointRecord {
    temperature: f32,
    humidity: f32,
}

pub const SETPOINT_RECORD_SIZE: usize = 8;

/// Reads and writes the setpoint file
pub struct SetpointStore {
    path: PathBuf,
    defaults: Setpoints,
}

impl SetpointStore {
    pub fn new(path: impl Into<PathBuf>, defaults: Setpoints) -> Self {
        Self {
            path: path.into(),
            defaults,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the file with `setpoints`
    pub fn save(&self, setpoints: &Setpoints) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let record = SetpointRecord {
            temperature: setpoints.temperature as f32,
            humidity: setpoints.humidity as f32,
        };
        let bytes = bincode::serialize(&record)?;
        std::fs::write(&self.path, bytes)
            .with_context(|| format!("writing setpoints to {:?}", self.path))?;

        info!(
            "Saved setpoints T: {:.1}C H: {:.1}% to {:?}",
            setpoints.temperature, setpoints.humidity, self.path
        );
        Ok(())
    }

    /// Saved setpoints, or the defaults when the file is missing, unreadable,
    /// or holds a zero temperature
    pub fn retrieve(&self) -> Setpoints {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No setpoint file at {:?}, using defaults", self.path);
                return self.defaults;
            }
            Err(e) => {
                warn!("Cannot read setpoints from {:?}: {}", self.path, e);
                return self.defaults;
            }
        };

        match bincode::deserialize::<SetpointRecord>(&bytes) {
            Ok(record) if record.temperature != 0.0 => Setpoints {
                temperature: record.temperature as f64,
                humidity: record.humidity as f64,
            },
            Ok(_) => self.defaults,
            Err(e) => {
                warn!("Corrupt setpoint file {:?}: {}", self.path, e);
                self.defaults
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> SetpointStore {
        SetpointStore::new(dir.path().join("setpoints.dat"), Setpoints::default())
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store(&dir).retrieve(), Setpoints::default());
    }

    #[test]
    fn test_save_then_retrieve() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let target = Setpoints { temperature: 22.5, humidity: 60.0 };

        store.save(&target).unwrap();
        assert_eq!(std::fs::metadata(store.path()).unwrap().len(), SETPOINT_RECORD_SIZE as u64);
        assert_eq!(store.retrieve(), target);
    }

    #[test]
    fn test_record_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save(&Setpoints { temperature: 25.0, humidity: 55.0 }).unwrap();

        let bytes = std::fs::read(store.path()).unwrap();
        assert_eq!(&bytes[0..4], &25.0f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &55.0f32.to_le_bytes());
    }

    #[test]
    fn test_zero_temperature_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        store.save(&Setpoints { temperature: 0.0, humidity: 40.0 }).unwrap();
        assert_eq!(store.retrieve(), Setpoints::default());
    }

    #[test]
    fn test_truncated_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        std::fs::write(store.path(), [0x00u8, 0x00, 0xC8]).unwrap();
        assert_eq!(store.retrieve(), Setpoints::default());
    }
}
