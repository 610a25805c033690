use std::env;
use std::error::Error;

use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

use crate::config::DriverConfig;
use crate::input::source::i2c::Gt911TouchScreen;
use crate::input::source::SourceCommand;

mod config;
mod drivers;
mod input;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a YAML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// I2C bus device node the controller is attached to
    #[arg(long)]
    bus: Option<String>,

    /// 7-bit I2C device address, hex (0x5d) or decimal
    #[arg(long, value_parser = config::parse_address)]
    address: Option<u8>,

    /// Coordinate scaling factor
    #[arg(long)]
    scaling: Option<u32>,

    /// Mirror the X axis
    #[arg(long)]
    flip_x: bool,

    /// Mirror the Y axis
    #[arg(long)]
    flip_y: bool,

    /// Report X as Y and Y as X
    #[arg(long)]
    swap_xy: bool,

    /// Default the log level to debug
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    /// Layers the command line on top of the file or built-in configuration.
    fn apply(&self, config: &mut DriverConfig) {
        if let Some(bus) = &self.bus {
            config.bus = bus.clone();
        }
        if let Some(address) = self.address {
            config.address = address;
        }
        if let Some(scaling) = self.scaling {
            config.scaling = scaling;
        }
        config.flip_x |= self.flip_x;
        config.flip_y |= self.flip_y;
        config.swap_xy |= self.swap_xy;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let args = Args::parse();
    let log_level = match env::var("LOG_LEVEL") {
        Ok(value) => value,
        Err(_) if args.debug => "debug".to_string(),
        Err(_) => "info".to_string(),
    };
    env::set_var("RUST_LOG", log_level);
    env_logger::init();
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    log::info!("Starting gt911d v{}", VERSION);

    let mut config = match &args.config {
        Some(path) => DriverConfig::from_yaml_file(path)?,
        None => DriverConfig::default(),
    };
    args.apply(&mut config);
    config.validate()?;
    log::debug!(
        "Axis transform: scaling {}, flip X {}, flip Y {}, swap X/Y {}",
        config.scaling,
        config.flip_x,
        config.flip_y,
        config.swap_xy
    );

    // Setup the shutdown handler. The polling loop releases the bus and the
    // virtual device when the stop command reaches it.
    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(async move {
        shutdown_signal().await;
        log::info!("Shutting down");
        if let Err(e) = tx.send(SourceCommand::Stop).await {
            log::error!("Unable to deliver stop command: {e}");
        }
    });

    let mut touchscreen = Gt911TouchScreen::new(config, rx);
    touchscreen.run().await?;

    log::info!("gt911d stopped");

    Ok(())
}

/// Completes when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let mut sigterm = signal(SignalKind::terminate()).ok();
    let sigterm = async {
        match sigterm.as_mut() {
            Some(sigterm) => {
                sigterm.recv().await;
            }
            // Handler install failed; only SIGINT will stop us.
            None => std::future::pending().await,
        }
    };
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                log::error!("Unable to listen for SIGINT: {e}");
            }
        }
        _ = sigterm => (),
    }
}
