//! Terminal status display

use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Write;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::alarms::AlarmRecord;
use crate::control::{Controls, Setpoints};
use crate::core::CycleReport;
use crate::sensors::{Measurement, Reading};

/// ctime layout
const CONSOLE_TIME_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

fn ctime<Tz: TimeZone>(timestamp: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    timestamp.with_timezone(tz).format(CONSOLE_TIME_FORMAT).to_string()
}

fn on_off(state: bool) -> &'static str {
    if state {
        "ON"
    } else {
        "OFF"
    }
}

pub fn header(operator: &str) -> String {
    format!("{}'s Greenhouse Controller", operator)
}

pub fn readings_line<Tz: TimeZone>(serial: u64, reading: &Reading, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "Unit: {:X} {} Readings\tT: {:5.1}{}\tH: {:5.1}{}\tP: {:6.1}{}",
        serial,
        ctime(&reading.timestamp, tz),
        reading.temperature,
        Measurement::Temperature.unit(),
        reading.humidity,
        Measurement::Humidity.unit(),
        reading.pressure,
        Measurement::Pressure.unit()
    )
}

pub fn setpoints_line(setpoints: &Setpoints) -> String {
    format!(
        " Setpoints\tT: {:5.1}{}\tH: {:5.1}{}",
        setpoints.temperature,
        Measurement::Temperature.unit(),
        setpoints.humidity,
        Measurement::Humidity.unit()
    )
}

pub fn controls_line(controls: &Controls) -> String {
    format!(
        " Controls\tHeater: {}\tHumidifier: {}",
        on_off(controls.heater),
        on_off(controls.humidifier)
    )
}

/// "Alarms" heading followed by one line per record, oldest first
pub fn alarm_lines<Tz: TimeZone>(alarms: &[AlarmRecord], tz: &Tz) -> Vec<String>
where
    Tz::Offset: std::fmt::Display,
{
    let mut lines = vec!["Alarms".to_string()];
    if alarms.is_empty() {
        lines.push("No Alarms".to_string());
    }
    lines.extend(
        alarms
            .iter()
            .map(|record| format!("{} Alarm: {}", record.kind, ctime(&record.timestamp, tz))),
    );
    lines
}

/// Full status block for one cycle
pub fn render<Tz: TimeZone>(report: &CycleReport, serial: u64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    let _ = writeln!(out, "{}", readings_line(serial, &report.reading, tz));
    let _ = writeln!(out, "{}", setpoints_line(&report.setpoints));
    let _ = writeln!(out, "{}", controls_line(&report.controls));
    let _ = writeln!(out);
    for line in alarm_lines(&report.alarms, tz) {
        let _ = writeln!(out, "{}", line);
    }
    out
}

/// Serial number from the `Serial` line of `/proc/cpuinfo` text
pub fn parse_cpuinfo_serial(cpuinfo: &str) -> Option<u64> {
    cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        if key.trim() != "Serial" {
            return None;
        }
        u64::from_str_radix(value.trim(), 16).ok()
    })
}

/// Board serial number, 0 when unavailable
pub fn unit_serial() -> u64 {
    std::fs::read_to_string("/proc/cpuinfo")
        .ok()
        .and_then(|text| parse_cpuinfo_serial(&text))
        .unwrap_or(0)
}

/// Print every published cycle until the bus closes
pub async fn run_console(mut reports: broadcast::Receiver<CycleReport>, operator: String, serial: u64) {
    println!("{}", header(&operator));

    loop {
        match reports.recv().await {
            Ok(report) => {
                println!();
                print!("{}", render(&report, serial, &Local));
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Console fell behind, skipped {} cycles", skipped);
            }
            Err(RecvError::Closed) => {
                debug!("Report channel closed, console exiting");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarms::AlarmKind;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 3, h, m, s).unwrap()
    }

    fn report(alarms: Vec<AlarmRecord>) -> CycleReport {
        CycleReport {
            cycle: 1,
            reading: Reading {
                timestamp: at(21, 49, 8),
                temperature: 31.0,
                humidity: 5.0,
                pressure: 1013.0,
            },
            setpoints: Setpoints::default(),
            controls: Controls {
                heater: false,
                humidifier: true,
            },
            alarms,
        }
    }

    #[test]
    fn test_header() {
        assert_eq!(header("Alice"), "Alice's Greenhouse Controller");
    }

    #[test]
    fn test_readings_line() {
        let line = readings_line(0xABC123, &report(vec![]).reading, &Utc);
        assert_eq!(
            line,
            "Unit: ABC123 Wed Apr  3 21:49:08 2024 Readings\tT:  31.0C\tH:   5.0%\tP: 1013.0mb"
        );
    }

    #[test]
    fn test_setpoint_and_control_lines() {
        assert_eq!(setpoints_line(&Setpoints::default()), " Setpoints\tT:  25.0C\tH:  55.0%");
        assert_eq!(
            controls_line(&Controls {
                heater: true,
                humidifier: false
            }),
            " Controls\tHeater: ON\tHumidifier: OFF"
        );
    }

    #[test]
    fn test_no_alarms() {
        assert_eq!(alarm_lines(&[], &Utc), vec!["Alarms", "No Alarms"]);
    }

    #[test]
    fn test_alarm_lines_in_order() {
        let alarms = vec![
            AlarmRecord {
                kind: AlarmKind::HighTemperature,
                timestamp: at(10, 0, 0),
                value: 31.0,
            },
            AlarmRecord {
                kind: AlarmKind::LowHumidity,
                timestamp: at(10, 0, 2),
                value: 5.0,
            },
        ];
        assert_eq!(
            alarm_lines(&alarms, &Utc),
            vec![
                "Alarms",
                "High Temperature Alarm: Wed Apr  3 10:00:00 2024",
                "Low Humidity Alarm: Wed Apr  3 10:00:02 2024",
            ]
        );
    }

    #[test]
    fn test_render_block() {
        let text = render(&report(vec![]), 1, &Utc);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("Unit: 1 "));
        assert_eq!(lines[3], "");
        assert_eq!(lines[5], "No Alarms");
    }

    #[test]
    fn test_parse_cpuinfo_serial() {
        let cpuinfo = "processor\t: 0\nHardware\t: BCM2835\nSerial\t\t: 00000000a1b2c3d4\nModel\t: Raspberry Pi\n";
        assert_eq!(parse_cpuinfo_serial(cpuinfo), Some(0xa1b2c3d4));
        assert_eq!(parse_cpuinfo_serial("processor\t: 0\n"), None);
        assert_eq!(parse_cpuinfo_serial("Serial\t: zz\n"), None);
    }

    #[tokio::test]
    async fn test_console_exits_when_bus_closes() {
        let (tx, rx) = broadcast::channel(4);
        tx.send(report(vec![])).unwrap();
        drop(tx);
        run_console(rx, "Test".to_string(), 0).await;
    }
}
