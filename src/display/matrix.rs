// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/greenhouse-rs

//! Sense HAT 8x8 LED matrix
//!
//! The framebuffer is 64 RGB565 pixels, row-major, 128 bytes little-endian.
//! Each measurement is drawn as a vertical bar growing from row 0.

use anyhow::{ensure, Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{SensorConfig, SimulationRange};
use crate::control::Setpoints;
use crate::sensors::{Measurement, Reading};

pub const MATRIX_SIZE: usize = 8;
pub const FRAMEBUFFER_BYTES: usize = MATRIX_SIZE * MATRIX_SIZE * 2;

/// Framebuffer name reported by the Sense HAT driver
pub const SENSE_HAT_FB_NAME: &str = "RPi-Sense FB";

/// Column of each measurement bar
pub const TEMPERATURE_BAR: usize = 7;
pub const HUMIDITY_BAR: usize = 5;
pub const PRESSURE_BAR: usize = 3;

/// 16-bit RGB565 colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    pub const BLACK: Rgb565 = Rgb565(0x0000);
    pub const RED: Rgb565 = Rgb565(0xF800);
    pub const GREEN: Rgb565 = Rgb565(0x07E0);
    pub const BLUE: Rgb565 = Rgb565(0x001F);
    pub const MAGENTA: Rgb565 = Rgb565(0xF81F);
    pub const WHITE: Rgb565 = Rgb565(0xFFFF);
}

/// 8x8 image, row-major
pub type Pattern = [[Rgb565; MATRIX_SIZE]; MATRIX_SIZE];

/// In-memory copy of the LED matrix
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Framebuffer {
    pixels: Pattern,
}

impl Framebuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wipe(&mut self, colour: Rgb565) {
        for row in self.pixels.iter_mut() {
            row.fill(colour);
        }
    }

    pub fn pixel(&self, row: usize, col: usize) -> Option<Rgb565> {
        self.pixels.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn light_pixel(&mut self, row: usize, col: usize, colour: Rgb565) -> Result<()> {
        ensure!(row < MATRIX_SIZE && col < MATRIX_SIZE, "pixel ({}, {}) off the matrix", row, col);
        self.pixels[row][col] = colour;
        Ok(())
    }

    /// Light rows `0..=height` of `col` and blank the rest of the column
    pub fn set_vertical_bar(&mut self, col: usize, colour: Rgb565, height: u8) -> Result<()> {
        ensure!(col < MATRIX_SIZE, "bar column {} off the matrix", col);
        let height = (height as usize).min(MATRIX_SIZE - 1);

        for (row, pixels) in self.pixels.iter_mut().enumerate() {
            pixels[col] = if row <= height { colour } else { Rgb565::BLACK };
        }
        Ok(())
    }

    /// Replace the whole matrix with `pattern`
    pub fn view_pattern(&mut self, pattern: &Pattern) {
        self.pixels = *pattern;
    }

    /// Rotate the image clockwise by a multiple of 90 degrees.
    /// Negative angles rotate anticlockwise.
    pub fn rotate(&mut self, angle: i32) -> Result<()> {
        ensure!(angle % 90 == 0, "rotation {} is not a multiple of 90 degrees", angle);

        let last = MATRIX_SIZE - 1;
        let mut rotated = Pattern::default();
        for (row, pixels) in self.pixels.iter().enumerate() {
            for (col, px) in pixels.iter().enumerate() {
                let (r, c) = match angle.rem_euclid(360) {
                    90 => (last - col, row),
                    180 => (last - row, last - col),
                    270 => (col, last - row),
                    _ => (row, col),
                };
                rotated[r][c] = *px;
            }
        }

        self.view_pattern(&rotated);
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; FRAMEBUFFER_BYTES] {
        let mut out = [0u8; FRAMEBUFFER_BYTES];
        let words = self.pixels.iter().flat_map(|row| row.iter());
        for (chunk, px) in out.chunks_exact_mut(2).zip(words) {
            chunk.copy_from_slice(&px.0.to_le_bytes());
        }
        out
    }
}

/// Row index for `value` on a scale of `range`, clamped to the matrix
pub fn bar_height(value: f64, range: SimulationRange) -> u8 {
    let (low, high) = range.ordered();
    let span = high as f64 - low as f64;
    if span <= 0.0 || !value.is_finite() {
        return 0;
    }

    let row = (8.0 * ((value - low as f64) / span + 0.05)).trunc() - 1.0;
    row.clamp(0.0, (MATRIX_SIZE - 1) as f64) as u8
}

/// Draw the reading bars and setpoint markers
pub fn render_status(reading: &Reading, setpoints: &Setpoints, scale: &SensorConfig) -> Framebuffer {
    let mut fb = Framebuffer::new();
    let bars = [
        (Measurement::Temperature, TEMPERATURE_BAR),
        (Measurement::Humidity, HUMIDITY_BAR),
        (Measurement::Pressure, PRESSURE_BAR),
    ];

    // Columns are compile-time constants inside the matrix
    for (measurement, col) in bars {
        let height = bar_height(reading.value(measurement), scale.range(measurement));
        let _ = fb.set_vertical_bar(col, Rgb565::GREEN, height);
    }

    let markers = [
        (setpoints.temperature, scale.temperature_range, TEMPERATURE_BAR),
        (setpoints.humidity, scale.humidity_range, HUMIDITY_BAR),
    ];
    for (target, range, col) in markers {
        let _ = fb.light_pixel(bar_height(target, range) as usize, col, Rgb565::MAGENTA);
    }

    fb
}

/// Find the Sense HAT framebuffer under `/sys/class/graphics`
pub fn detect_device() -> Option<PathBuf> {
    detect_device_in(Path::new("/sys/class/graphics"), Path::new("/dev"))
}

fn detect_device_in(sysfs: &Path, dev: &Path) -> Option<PathBuf> {
    let mut entries: Vec<_> = std::fs::read_dir(sysfs)
        .ok()?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("fb"))
        .collect();
    entries.sort_by_key(|e| e.file_name());

    entries.into_iter().find_map(|entry| {
        let name = std::fs::read_to_string(entry.path().join("name")).ok()?;
        (name.trim() == SENSE_HAT_FB_NAME).then(|| dev.join(entry.file_name()))
    })
}

/// Open framebuffer device
pub struct LedMatrix {
    path: PathBuf,
    file: File,
}

impl LedMatrix {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .with_context(|| format!("opening LED framebuffer {:?}", path))?;
        info!("LED matrix framebuffer open at {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn show(&mut self, fb: &Framebuffer) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&fb.to_bytes())?;
        self.file.flush()?;
        debug!("Wrote {} bytes to {:?}", FRAMEBUFFER_BYTES, self.path);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.show(&Framebuffer::new())
    }
}
