//! Control loop engine

use std::sync::Arc;
use std::time::{Duration, Instant};
use anyhow::Result;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::alarms::{ActiveAlarms, AlarmError, AlarmLimits};
use crate::config::Config;
use crate::control::set_controls;
use crate::display::{detect_device, render_status, LedMatrix};
use crate::sensors::SensorManager;
use crate::storage::{ReadingLog, SetpointStore};
use super::{CycleReport, EventBus, SystemState};

/// Main greenhouse engine. Sole owner of the active alarm collection.
pub struct Engine {
    pub config: Arc<Config>,
    sensors: SensorManager,
    setpoints: SetpointStore,
    log: Option<ReadingLog>,
    matrix: Option<LedMatrix>,
    alarms: ActiveAlarms,
    event_bus: Arc<EventBus>,
    state: SystemState,
    start_time: Option<Instant>,
}

impl Engine {
    /// Build the engine with sensors and outputs taken from configuration
    pub fn new(config: Config, event_bus: Arc<EventBus>) -> Self {
        let sensors = SensorManager::from_config(&config.sensors);
        let mut engine = Self::with_sensors(config, sensors, event_bus);

        if engine.config.display.matrix_enabled {
            let device = engine.config.display.matrix_device.clone().or_else(detect_device);
            engine.matrix = match device {
                Some(path) => match LedMatrix::open(&path) {
                    Ok(matrix) => Some(matrix),
                    Err(e) => {
                        warn!("LED matrix unavailable: {:#}", e);
                        None
                    }
                },
                None => {
                    warn!("No Sense HAT framebuffer found, LED matrix disabled");
                    None
                }
            };
        }

        engine
    }

    /// Build the engine around an existing sensor manager, without the LED matrix
    pub fn with_sensors(config: Config, sensors: SensorManager, event_bus: Arc<EventBus>) -> Self {
        let setpoints = SetpointStore::new(config.setpoints_path(), config.control.default_setpoints);
        let log = config
            .storage
            .log_enabled
            .then(|| ReadingLog::new(config.log_path()));

        Self {
            config: Arc::new(config),
            sensors,
            setpoints,
            log,
            matrix: None,
            alarms: ActiveAlarms::new(),
            event_bus,
            state: SystemState::default(),
            start_time: None,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        info!("Starting greenhouse engine...");
        self.start_time = Some(Instant::now());

        self.sensors.start().await;
        self.state.sensors_active = self.sensors.active_count();
        self.state.running = true;

        info!(
            "Greenhouse engine started with {} active sensors",
            self.state.sensors_active
        );
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        info!("Stopping greenhouse engine...");

        self.sensors.stop().await;
        if let Some(matrix) = self.matrix.as_mut() {
            if let Err(e) = matrix.clear() {
                warn!("Failed to clear LED matrix: {:#}", e);
            }
        }
        self.state.running = false;
        self.state.sensors_active = 0;

        info!("Greenhouse engine stopped");
        Ok(())
    }

    /// Limits applied on every cycle
    pub fn limits(&self) -> AlarmLimits {
        self.config.alarms
    }

    /// One full pass: acquire, log, control, evaluate alarms, render
    pub async fn cycle(&mut self) -> Result<CycleReport> {
        let reading = match self.sensors.acquire().await {
            Ok(reading) => reading,
            Err(e) => {
                self.state.cycles_failed += 1;
                return Err(e);
            }
        };
        self.state.last_reading = Some(reading.timestamp);

        if let Some(log) = self.log.as_mut() {
            if let Err(e) = log.append(&reading) {
                warn!("Failed to append reading log: {:#}", e);
            }
        }

        let setpoints = self.setpoints.retrieve();
        let controls = set_controls(&setpoints, &reading);

        let limits = self.limits();
        self.alarms.evaluate(&limits, &reading)?;

        if let Some(matrix) = self.matrix.as_mut() {
            let mut fb = render_status(&reading, &setpoints, &self.config.sensors);
            let shown = fb
                .rotate(self.config.display.rotation)
                .and_then(|_| matrix.show(&fb));
            if let Err(e) = shown {
                warn!("Failed to update LED matrix: {:#}", e);
            }
        }

        self.state.cycles_completed += 1;
        self.state.active_alarms = self.alarms.len();

        let report = CycleReport {
            cycle: self.state.cycles_completed,
            reading,
            setpoints,
            controls,
            alarms: self.alarms.iter().cloned().collect(),
        };
        self.event_bus.publish_report(report.clone());

        debug!(
            "Cycle {} complete: {} active alarms",
            report.cycle,
            report.alarms.len()
        );
        Ok(report)
    }

    /// Attempted cycles, failed acquisitions included
    fn cycles_attempted(&self) -> u64 {
        self.state.cycles_completed + self.state.cycles_failed
    }

    /// Run cycles until shutdown is signalled or `max_cycles` have been attempted
    pub async fn run(
        &mut self,
        mut shutdown: broadcast::Receiver<()>,
        max_cycles: Option<u64>,
    ) -> Result<()> {
        let period = Duration::from_millis(self.config.update_interval_ms.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Control loop running every {:?}", period);

        loop {
            if max_cycles.is_some_and(|max| self.cycles_attempted() >= max) {
                info!("Cycle limit reached");
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.cycle().await {
                        if is_fatal(&e) {
                            error!("Alarm evaluation failed: {:#}", e);
                            return Err(e.context("control loop aborted"));
                        }
                        warn!("Cycle skipped: {:#}", e);
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        Ok(())
    }

    pub fn alarms(&self) -> &ActiveAlarms {
        &self.alarms
    }

    pub fn state(&self) -> SystemState {
        let mut state = self.state.clone();
        state.uptime_seconds = self.uptime();
        state
    }

    pub fn uptime(&self) -> u64 {
        self.start_time.map(|t| t.elapsed().as_secs()).unwrap_or(0)
    }
}

/// Alarm bookkeeping failures end the loop, anything else skips one cycle
fn is_fatal(e: &anyhow::Error) -> bool {
    e.downcast_ref::<AlarmError>().is_some()
}
