// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/greenhouse-rs

//! Sense HAT environmental sensors - HTS221 humidity/temperature, LPS25H pressure
//!
//! Register decoding is pure and always compiled. Bus access needs the
//! `hardware` feature.

use async_trait::async_trait;
use anyhow::{bail, Result};
use chrono::Utc;
use tracing::debug;

use super::{Sensor, SensorSample, SensorType, SensorStatus, CalibrationData};

pub const HTS221_ADDRESS: u16 = 0x5F;
pub const LPS25H_ADDRESS: u16 = 0x5C;

const WHO_AM_I: u8 = 0x0F;
const CTRL_REG1: u8 = 0x20;

const HTS221_ID: u8 = 0xBC;
const HTS221_POWER_ON_BDU_1HZ: u8 = 0x85;
const HTS221_HUMIDITY_OUT_L: u8 = 0x28;
const HTS221_TEMP_OUT_L: u8 = 0x2A;
const HTS221_CALIB_START: u8 = 0x30;

const LPS25H_ID: u8 = 0xBD;
const LPS25H_POWER_ON_BDU_1HZ: u8 = 0x94;
const LPS25H_PRESS_OUT_XL: u8 = 0x28;

/// HTS221 factory calibration, registers 0x30..=0x3F
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hts221Calibration {
    h0_rh: f64,
    h1_rh: f64,
    t0_deg_c: f64,
    t1_deg_c: f64,
    h0_t0_out: i16,
    h1_t0_out: i16,
    t0_out: i16,
    t1_out: i16,
}

impl Hts221Calibration {
    pub fn from_registers(regs: &[u8; 16]) -> Self {
        let word = |lo: usize| i16::from_le_bytes([regs[lo], regs[lo + 1]]);
        let msb = regs[0x05] as u16;
        let t0_x8 = regs[0x02] as u16 | ((msb & 0x03) << 8);
        let t1_x8 = regs[0x03] as u16 | ((msb & 0x0C) << 6);

        Self {
            h0_rh: regs[0x00] as f64 / 2.0,
            h1_rh: regs[0x01] as f64 / 2.0,
            t0_deg_c: t0_x8 as f64 / 8.0,
            t1_deg_c: t1_x8 as f64 / 8.0,
            h0_t0_out: word(0x06),
            h1_t0_out: word(0x0A),
            t0_out: word(0x0C),
            t1_out: word(0x0E),
        }
    }

    /// Percent relative humidity, clamped to 0..=100
    pub fn humidity(&self, raw: i16) -> f64 {
        let span = (self.h1_t0_out as f64) - (self.h0_t0_out as f64);
        if span == 0.0 {
            return self.h0_rh;
        }
        let rh = self.h0_rh + (raw as f64 - self.h0_t0_out as f64) * (self.h1_rh - self.h0_rh) / span;
        rh.clamp(0.0, 100.0)
    }

    /// Degrees Celsius
    pub fn temperature(&self, raw: i16) -> f64 {
        let span = (self.t1_out as f64) - (self.t0_out as f64);
        if span == 0.0 {
            return self.t0_deg_c;
        }
        self.t0_deg_c + (raw as f64 - self.t0_out as f64) * (self.t1_deg_c - self.t0_deg_c) / span
    }
}

/// LPS25H pressure in millibars from the 24-bit two's complement output
pub fn lps25h_pressure(xl: u8, l: u8, h: u8) -> f64 {
    let raw = i32::from_le_bytes([xl, l, h, if h & 0x80 != 0 { 0xFF } else { 0x00 }]);
    raw as f64 / 4096.0
}

#[cfg(feature = "hardware")]
mod bus {
    use anyhow::{Context, Result};
    use i2cdev::core::I2CDevice;
    use i2cdev::linux::LinuxI2CDevice;

    pub struct I2cBus {
        dev: LinuxI2CDevice,
    }

    impl I2cBus {
        pub fn open(bus: u8, address: u16) -> Result<Self> {
            let path = format!("/dev/i2c-{}", bus);
            let dev = LinuxI2CDevice::new(&path, address)
                .with_context(|| format!("opening {} at 0x{:02X}", path, address))?;
            Ok(Self { dev })
        }

        pub fn read_u8(&mut self, register: u8) -> Result<u8> {
            Ok(self.dev.smbus_read_byte_data(register)?)
        }

        pub fn write_u8(&mut self, register: u8, value: u8) -> Result<()> {
            Ok(self.dev.smbus_write_byte_data(register, value)?)
        }

        pub fn read_block<const N: usize>(&mut self, start: u8) -> Result<[u8; N]> {
            let mut out = [0u8; N];
            for (i, byte) in out.iter_mut().enumerate() {
                *byte = self.read_u8(start + i as u8)?;
            }
            Ok(out)
        }
    }
}

#[cfg(not(feature = "hardware"))]
mod bus {
    use anyhow::{bail, Result};

    pub struct I2cBus;

    impl I2cBus {
        pub fn open(_bus: u8, _address: u16) -> Result<Self> {
            bail!("Hardware not connected (built without the `hardware` feature)")
        }

        pub fn read_u8(&mut self, _register: u8) -> Result<u8> {
            bail!("Hardware not connected")
        }

        pub fn write_u8(&mut self, _register: u8, _value: u8) -> Result<()> {
            bail!("Hardware not connected")
        }

        pub fn read_block<const N: usize>(&mut self, _start: u8) -> Result<[u8; N]> {
            bail!("Hardware not connected")
        }
    }
}

use bus::I2cBus;

fn open_checked(bus: u8, address: u16, expected_id: u8, ctrl: u8) -> Result<I2cBus> {
    let mut dev = I2cBus::open(bus, address)?;
    let id = dev.read_u8(WHO_AM_I)?;
    if id != expected_id {
        bail!("Unexpected WHO_AM_I 0x{:02X} at 0x{:02X}", id, address);
    }
    dev.write_u8(CTRL_REG1, ctrl)?;
    Ok(dev)
}

/// HTS221 humidity/temperature sensor. One instance serves one channel.
pub struct Hts221Sensor {
    id: String,
    channel: SensorType,
    status: SensorStatus,
    sequence: u64,
    i2c_bus: u8,
    device: Option<I2cBus>,
    calibration: Option<Hts221Calibration>,
}

impl Hts221Sensor {
    pub fn new(id: &str, channel: SensorType, i2c_bus: u8) -> Self {
        debug_assert!(matches!(channel, SensorType::Thermometer | SensorType::Hygrometer));
        Self {
            id: id.to_string(),
            channel,
            status: SensorStatus::Disconnected,
            sequence: 0,
            i2c_bus,
            device: None,
            calibration: None,
        }
    }
}

#[async_trait]
impl Sensor for Hts221Sensor {
    fn id(&self) -> &str { &self.id }
    fn sensor_type(&self) -> SensorType { self.channel }
    fn status(&self) -> SensorStatus { self.status }

    async fn connect(&mut self) -> Result<()> {
        match open_checked(self.i2c_bus, HTS221_ADDRESS, HTS221_ID, HTS221_POWER_ON_BDU_1HZ) {
            Ok(dev) => {
                self.device = Some(dev);
                self.status = SensorStatus::Connected;
                Ok(())
            }
            Err(e) => {
                self.status = SensorStatus::Error;
                Err(e)
            }
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.device = None;
        self.status = SensorStatus::Disconnected;
        Ok(())
    }

    async fn calibrate(&mut self) -> Result<CalibrationData> {
        let Some(dev) = self.device.as_mut() else { bail!("Hardware not connected") };
        self.status = SensorStatus::Calibrating;
        let regs: [u8; 16] = dev.read_block(HTS221_CALIB_START)?;
        let cal = Hts221Calibration::from_registers(&regs);
        debug!("HTS221 calibration: {:?}", cal);
        self.calibration = Some(cal);
        self.status = SensorStatus::Active;

        let (offset, scale) = match self.channel {
            SensorType::Hygrometer => (cal.h0_rh, cal.h1_rh - cal.h0_rh),
            _ => (cal.t0_deg_c, cal.t1_deg_c - cal.t0_deg_c),
        };
        Ok(CalibrationData {
            offset,
            scale,
            timestamp: Utc::now(),
            notes: "HTS221 factory calibration".to_string(),
        })
    }

    async fn read(&mut self) -> Result<SensorSample> {
        let (Some(dev), Some(cal)) = (self.device.as_mut(), self.calibration) else {
            bail!("Hardware not connected")
        };
        let value = match self.channel {
            SensorType::Hygrometer => {
                let [lo, hi]: [u8; 2] = dev.read_block(HTS221_HUMIDITY_OUT_L)?;
                cal.humidity(i16::from_le_bytes([lo, hi]))
            }
            _ => {
                let [lo, hi]: [u8; 2] = dev.read_block(HTS221_TEMP_OUT_L)?;
                cal.temperature(i16::from_le_bytes([lo, hi]))
            }
        };
        self.sequence += 1;

        Ok(SensorSample {
            sensor_id: self.id.clone(),
            sensor_type: self.channel,
            timestamp: Utc::now(),
            sequence: self.sequence,
            value,
        })
    }
}

/// LPS25H barometric pressure sensor
pub struct Lps25hSensor {
    id: String,
    status: SensorStatus,
    sequence: u64,
    i2c_bus: u8,
    device: Option<I2cBus>,
}

impl Lps25hSensor {
    pub fn new(id: &str, i2c_bus: u8) -> Self {
        Self {
            id: id.to_string(),
            status: SensorStatus::Disconnected,
            sequence: 0,
            i2c_bus,
            device: None,
        }
    }
}

#[async_trait]
impl Sensor for Lps25hSensor {
    fn id(&self) -> &str { &self.id }
    fn sensor_type(&self) -> SensorType { SensorType::Barometer }
    fn status(&self) -> SensorStatus { self.status }

    async fn connect(&mut self) -> Result<()> {
        match open_checked(self.i2c_bus, LPS25H_ADDRESS, LPS25H_ID, LPS25H_POWER_ON_BDU_1HZ) {
            Ok(dev) => {
                self.device = Some(dev);
                self.status = SensorStatus::Connected;
                Ok(())
            }
            Err(e) => {
                self.status = SensorStatus::Error;
                Err(e)
            }
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.device = None;
        self.status = SensorStatus::Disconnected;
        Ok(())
    }

    async fn calibrate(&mut self) -> Result<CalibrationData> {
        if self.device.is_none() {
            bail!("Hardware not connected");
        }
        self.status = SensorStatus::Active;
        Ok(CalibrationData {
            offset: 0.0,
            scale: 1.0 / 4096.0,
            timestamp: Utc::now(),
            notes: "LPS25H factory trimmed".to_string(),
        })
    }

    async fn read(&mut self) -> Result<SensorSample> {
        let Some(dev) = self.device.as_mut() else { bail!("Hardware not connected") };
        let [xl, l, h]: [u8; 3] = dev.read_block(LPS25H_PRESS_OUT_XL)?;
        self.sequence += 1;

        Ok(SensorSample {
            sensor_id: self.id.clone(),
            sensor_type: SensorType::Barometer,
            timestamp: Utc::now(),
            sequence: self.sequence,
            value: lps25h_pressure(xl, l, h),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // H0=30%, H1=70%, T0=10C, T1=30C, linear outputs 0..1000
    fn calibration_block() -> [u8; 16] {
        let mut regs = [0u8; 16];
        regs[0x00] = 60;
        regs[0x01] = 140;
        regs[0x02] = 80;
        regs[0x03] = 240;
        regs[0x05] = 0;
        regs[0x06..0x08].copy_from_slice(&0i16.to_le_bytes());
        regs[0x0A..0x0C].copy_from_slice(&1000i16.to_le_bytes());
        regs[0x0C..0x0E].copy_from_slice(&0i16.to_le_bytes());
        regs[0x0E..0x10].copy_from_slice(&1000i16.to_le_bytes());
        regs
    }

    #[test]
    fn test_hts221_interpolation() {
        let cal = Hts221Calibration::from_registers(&calibration_block());
        assert!((cal.humidity(500) - 50.0).abs() < 1e-9);
        assert!((cal.temperature(250) - 15.0).abs() < 1e-9);
        assert!((cal.temperature(-500) - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_hts221_humidity_is_clamped() {
        let cal = Hts221Calibration::from_registers(&calibration_block());
        assert_eq!(cal.humidity(5000), 100.0);
        assert_eq!(cal.humidity(-5000), 0.0);
    }

    #[test]
    fn test_hts221_temperature_msb_bits() {
        let mut regs = calibration_block();
        regs[0x02] = 0x10;
        regs[0x03] = 0x20;
        regs[0x05] = 0b0000_0101; // T0 msb = 1, T1 msb = 1
        let cal = Hts221Calibration::from_registers(&regs);
        assert_eq!(cal.t0_deg_c, (0x110 as f64) / 8.0);
        assert_eq!(cal.t1_deg_c, (0x120 as f64) / 8.0);
    }

    #[test]
    fn test_lps25h_pressure() {
        // 1013.25 mb * 4096 = 4150272 = 0x3F5400
        assert_eq!(lps25h_pressure(0x00, 0x54, 0x3F), 1013.25);
        // Negative raw values sign extend
        assert_eq!(lps25h_pressure(0x00, 0xF0, 0xFF), -1.0);
    }

    #[cfg(not(feature = "hardware"))]
    #[tokio::test]
    async fn test_hardware_sensor_without_feature() {
        let mut sensor = Lps25hSensor::new("baro-1", 1);
        assert!(sensor.connect().await.is_err());
        assert_eq!(sensor.status(), SensorStatus::Error);
        assert!(sensor.read().await.is_err());
    }
}
