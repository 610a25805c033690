//! GT911 source device: the polling loop that bridges the controller to the
//! virtual touchscreen.

use std::{error::Error, thread, time::Duration};

use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;
use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::config::DriverConfig;
use crate::drivers::gt911::{driver::Driver, registers::MAX_CONTACTS};
use crate::input::source::SourceCommand;
use crate::input::target::touchscreen::{TouchscreenConfig, VirtualTouchscreen};
use crate::input::target::TargetTouchDevice;
use crate::input::tracker::{TouchState, TouchTracker};

/// How long to sleep between polling cycles. Frame pacing comes from the
/// controller's own sampling rate; this only keeps the idle loop off the CPU.
const POLL_RATE: Duration = Duration::from_millis(1);

/// Consecutive failed cycles tolerated before the daemon gives up. Retries
/// inside the driver already absorb transient bus noise, so failures that
/// reach this counter are persistent ones.
const MAX_CYCLE_FAILURES: u32 = 5;

/// GT911 touchscreen source device.
#[derive(Debug)]
pub struct Gt911TouchScreen {
    config: DriverConfig,
    rx: Option<mpsc::Receiver<SourceCommand>>,
}

impl Gt911TouchScreen {
    pub fn new(config: DriverConfig, rx: mpsc::Receiver<SourceCommand>) -> Self {
        Self {
            config,
            rx: Some(rx),
        }
    }

    /// Opens the bus and the virtual device, then polls on a blocking task
    /// until a stop command arrives or a persistent failure ends the run.
    pub async fn run(&mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        log::debug!("Starting GT911 touchscreen driver");
        let mut rx = self.rx.take().ok_or("touchscreen driver already started")?;
        let config = self.config.clone();

        let task =
            tokio::task::spawn_blocking(move || -> Result<(), Box<dyn Error + Send + Sync>> {
                log::debug!(
                    "Opening {} for device address 0x{:02x}",
                    config.bus,
                    config.address
                );
                let i2c = I2cdev::new(&config.bus)?;
                let mut driver = Driver::new(i2c, config.address, config.axis());
                driver.initialize()?;
                log::info!(
                    "Touch boundary: {:?}, coordinate resolution: {:?}",
                    driver.boundary(),
                    driver.resolution()
                );

                let screen_config = TouchscreenConfig {
                    resolution: driver.resolution(),
                    ..TouchscreenConfig::default()
                };
                let mut screen = VirtualTouchscreen::new(&screen_config)?;
                let mut tracker = TouchTracker::new();

                // Dropping the driver and the screen on return closes the
                // bus handle and removes the virtual device node.
                poll_loop(&mut driver, &mut tracker, &mut screen, &mut rx)
            });

        if let Err(e) = task.await? {
            log::error!("Error running touchscreen driver: {e}");
            return Err(e);
        }
        log::debug!("GT911 touchscreen driver stopped");

        Ok(())
    }
}

/// Polls until a stop command arrives, the channel closes, or consecutive
/// cycle failures exhaust the tolerance. A lone failed cycle only logs;
/// the counter resets on the next good one.
pub fn poll_loop<I2C, T>(
    driver: &mut Driver<I2C>,
    tracker: &mut TouchTracker,
    screen: &mut T,
    rx: &mut mpsc::Receiver<SourceCommand>,
) -> Result<(), Box<dyn Error + Send + Sync>>
where
    I2C: I2c,
    I2C::Error: Send + Sync + 'static,
    T: TargetTouchDevice,
{
    let mut failures: u32 = 0;
    loop {
        // Stop checkpoint between cycles; the signal handler and a dropped
        // channel both land here.
        match rx.try_recv() {
            Ok(SourceCommand::Stop) => {
                log::debug!("Received stop command");
                return Ok(());
            }
            Err(TryRecvError::Empty) => (),
            Err(TryRecvError::Disconnected) => {
                log::debug!("Command channel closed, stopping");
                return Ok(());
            }
        }

        match poll_cycle(driver, tracker, screen) {
            Ok(()) => failures = 0,
            Err(e) => {
                failures += 1;
                if failures >= MAX_CYCLE_FAILURES {
                    log::error!("Giving up after {failures} consecutive failed cycles");
                    return Err(e);
                }
                log::warn!("Polling cycle failed ({failures}/{MAX_CYCLE_FAILURES}): {e}");
            }
        }

        thread::sleep(POLL_RATE);
    }
}

/// One pass of the polling state machine: read status, query the reported
/// contacts, diff against the previous cycle, emit, commit, acknowledge.
///
/// The frame is acknowledged only after its transitions reach the virtual
/// device; on failure the controller re-presents the same frame and the
/// tracker still holds the last emitted cycle. A ready frame with zero
/// contacts is the release frame that ends every remaining track.
pub fn poll_cycle<I2C, T>(
    driver: &mut Driver<I2C>,
    tracker: &mut TouchTracker,
    screen: &mut T,
) -> Result<(), Box<dyn Error + Send + Sync>>
where
    I2C: I2c,
    I2C::Error: Send + Sync + 'static,
    T: TargetTouchDevice,
{
    let status = driver.read_status()?;
    if !status.buffer_ready {
        return Ok(());
    }
    log::trace!("Status: {status:?}");

    let count = status.contact_count.min(MAX_CONTACTS);
    if status.contact_count > MAX_CONTACTS {
        log::warn!(
            "Controller reported {} contacts, clamping to {MAX_CONTACTS}",
            status.contact_count
        );
    }
    let mut current = TouchState::default();
    for slot in 0..count {
        current.insert(driver.query_contact(slot)?);
    }

    let cycle = tracker.diff(&current);
    screen.emit_cycle(&cycle)?;
    tracker.commit(current);

    driver.clear_buffer()?;
    Ok(())
}
