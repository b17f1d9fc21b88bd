// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/greenhouse-rs

//! Greenhouse - Sense HAT Greenhouse Controller

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use greenhouse::{
    display::{run_console, unit_serial},
    Config, Engine, EventBus, SetpointStore, NAME, VERSION,
};

/// Greenhouse - Sense HAT Greenhouse Controller
#[derive(Parser, Debug)]
#[command(name = "greenhouse")]
#[command(author = "Greenhouse Project")]
#[command(version = VERSION)]
#[command(about = "Greenhouse environment controller with alarm tracking")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Use simulated sensors for every measurement
    #[arg(long)]
    simulate: bool,

    /// Stop after this many control cycles
    #[arg(long)]
    cycles: Option<u64>,

    /// Save a new temperature setpoint before starting
    #[arg(long)]
    target_temp: Option<f64>,

    /// Save a new humidity setpoint before starting
    #[arg(long)]
    target_humidity: Option<f64>,

    /// Do not drive the LED matrix
    #[arg(long)]
    no_matrix: bool,

    /// Data output directory
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("{} v{}", NAME, VERSION);

    // Load or create configuration
    let config_path = args.config.unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Override with command line args
    if args.simulate {
        config.sensors.simulate_all(true);
    }
    if args.no_matrix {
        config.display.matrix_enabled = false;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }

    info!("Configuration loaded from {:?}", config_path);
    info!("Data directory: {:?}", config.data_dir);

    if args.target_temp.is_some() || args.target_humidity.is_some() {
        let store = SetpointStore::new(config.setpoints_path(), config.control.default_setpoints);
        let mut setpoints = store.retrieve();
        if let Some(t) = args.target_temp {
            setpoints.temperature = t;
        }
        if let Some(h) = args.target_humidity {
            setpoints.humidity = h;
        }
        store.save(&setpoints)?;
        info!(
            "Setpoints saved: {:.1}C {:.1}%",
            setpoints.temperature, setpoints.humidity
        );
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, args.cycles))
}

/// Run the control loop until Ctrl+C or the cycle limit
async fn run(config: Config, max_cycles: Option<u64>) -> Result<()> {
    let event_bus = Arc::new(EventBus::default());

    let console = config.display.console_enabled.then(|| {
        tokio::spawn(run_console(
            event_bus.subscribe_reports(),
            config.operator.clone(),
            unit_serial(),
        ))
    });

    let mut engine = Engine::new(config, event_bus.clone());
    engine.start().await?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, cleaning up...");
                let _ = shutdown_tx.send(());
            }
            Err(e) => error!("Unable to listen for shutdown signal: {}", e),
        }
    });

    info!("Greenhouse running, press Ctrl+C to shutdown");
    let result = engine.run(shutdown_rx, max_cycles).await;
    engine.stop().await?;

    info!("{} cycle reports published", event_bus.published());

    // Closing the bus ends the console task
    drop(engine);
    drop(event_bus);
    if let Some(handle) = console {
        let _ = handle.await;
    }

    info!("Greenhouse shutdown complete");
    result
}
