//! # Rover Guard Binary
//!
//! Obstacle guard: polls the ultrasonic rangefinder and stops the drive
//! motor when an obstacle is too close or the sensor keeps failing.
//!
//! # Usage
//!
//! ```bash
//! # Run on the robot
//! rover_guard --config /etc/rover/guard.toml
//!
//! # Run without hardware
//! rover_guard -s -v
//!
//! # Validate configuration only
//! rover_guard --config config/guard.toml --check
//! ```
//!
//! # Exit status
//!
//! - `0` - stopped by the operator (Ctrl-C)
//! - `1` - setup failure (configuration, GPIO, unknown driver)
//! - `2` - sensor failure escalation

#![deny(warnings)]

use clap::Parser;
use rover_common::config::{ConfigError, ConfigLoader};
use rover_common::event::TracingSink;
use rover_common::hal::config::ControllerConfig;
use rover_guard::{AvoidanceLoop, CancelToken, ControllerContext};
use rover_hal::DriverRegistry;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Rover Guard - ultrasonic obstacle stop for a VESC-driven robot
#[derive(Parser, Debug)]
#[command(name = "rover_guard")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Closed-loop obstacle guard with motor stop and failure escalation")]
#[command(long_about = None)]
struct Args {
    /// Path to the guard configuration file.
    #[arg(short, long, default_value = rover_common::consts::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Use the simulation drivers for both sensor and actuator
    #[arg(short = 's', long)]
    simulate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    /// Validate configuration and exit without touching hardware
    #[arg(long)]
    check: bool,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Guard startup failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32, Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Config first: its log level feeds the subscriber.
    let loaded = load_config(&args.config);
    let level: Level = match &loaded {
        Ok(config) => config.shared.log_level.into(),
        Err(_) => Level::INFO,
    };
    setup_tracing(&args, level);

    info!("Rover Guard v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(config) => config,
        Err(ConfigError::FileNotFound) => {
            warn!(
                "Config file {:?} not found, using built-in defaults",
                args.config
            );
            ControllerConfig::default()
        }
        Err(e) => return Err(e.into()),
    };
    config.validate()?;

    if args.check {
        print_summary(&config, args.simulate);
        return Ok(0);
    }

    if args.simulate {
        info!("Simulation mode enabled");
    }

    let registry = DriverRegistry::with_builtin_drivers();
    let context =
        ControllerContext::from_config(&config, &registry, Box::new(TracingSink), args.simulate)?;
    let mut guard = AvoidanceLoop::from_config(context, &config);

    // Setup signal handler.
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handler_token.cancel();
    })?;

    let exit = guard.run(&cancel);

    info!("Rover Guard shutdown complete ({:?})", exit);
    Ok(exit.exit_code())
}

/// Load the configuration file.
fn load_config(path: &Path) -> Result<ControllerConfig, ConfigError> {
    ControllerConfig::load(path)
}

/// Print the effective configuration for `--check`.
fn print_summary(config: &ControllerConfig, simulate: bool) {
    let (sensor, actuator) = if simulate {
        ("simulation", "simulation")
    } else {
        (config.sensor.driver.as_str(), config.actuator.driver.as_str())
    };
    println!("Configuration OK");
    println!(
        "  sensor:    {} (trigger={}, echo={}, timeout={}ms)",
        sensor, config.sensor.trigger_pin, config.sensor.echo_pin, config.sensor.edge_timeout_ms
    );
    println!(
        "  actuator:  {} ({} @ {} baud)",
        actuator, config.actuator.port, config.actuator.baud_rate
    );
    println!(
        "  avoidance: every {}ms, stop at <= {}mm, escalate after {} failures",
        config.avoidance.poll_period_ms,
        config.avoidance.stop_distance_mm,
        config.avoidance.max_consecutive_failures
    );
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args, configured: Level) {
    let level = if args.verbose { Level::DEBUG } else { configured };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
