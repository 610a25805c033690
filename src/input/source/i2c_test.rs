use std::io;

use embedded_hal::i2c::ErrorKind;
use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
use tokio::sync::mpsc;

use super::i2c::{poll_cycle, poll_loop};
use super::SourceCommand;
use crate::drivers::gt911::driver::Driver;
use crate::drivers::gt911::event::Contact;
use crate::drivers::gt911::{AxisConfig, DEFAULT_ADDRESS};
use crate::input::target::{DeviceError, TargetTouchDevice};
use crate::input::tracker::{CycleDiff, TouchTracker};

const ADDRESS: u8 = DEFAULT_ADDRESS;

/// Captures emitted cycles instead of opening a uinput device.
#[derive(Default)]
struct RecordingScreen {
    cycles: Vec<CycleDiff>,
    broken: bool,
}

impl TargetTouchDevice for RecordingScreen {
    fn emit_cycle(&mut self, cycle: &CycleDiff) -> Result<(), DeviceError> {
        if self.broken {
            return Err(DeviceError::Emit(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "device node gone",
            )));
        }
        self.cycles.push(cycle.clone());
        Ok(())
    }
}

fn driver_with(expectations: &[I2cTransaction]) -> (Driver<I2cMock>, I2cMock) {
    let i2c = I2cMock::new(expectations);
    let driver = Driver::new(i2c.clone(), ADDRESS, AxisConfig::default());
    (driver, i2c)
}

/// Bus expectations for one ready frame holding a single slot-0 contact,
/// ending in the acknowledging status clear.
fn ready_frame_expectations(track_id: u8, x: u16, y: u16, size: u16) -> Vec<I2cTransaction> {
    let (x, y, size) = (x.to_le_bytes(), y.to_le_bytes(), size.to_le_bytes());
    vec![
        I2cTransaction::write_read(ADDRESS, vec![0x81, 0x4E], vec![0x81]),
        I2cTransaction::write_read(ADDRESS, vec![0x81, 0x50], vec![x[0]]),
        I2cTransaction::write_read(ADDRESS, vec![0x81, 0x51], vec![x[1]]),
        I2cTransaction::write_read(ADDRESS, vec![0x81, 0x52], vec![y[0]]),
        I2cTransaction::write_read(ADDRESS, vec![0x81, 0x53], vec![y[1]]),
        I2cTransaction::write_read(ADDRESS, vec![0x81, 0x54], vec![size[0]]),
        I2cTransaction::write_read(ADDRESS, vec![0x81, 0x55], vec![size[1]]),
        I2cTransaction::write_read(ADDRESS, vec![0x81, 0x4F], vec![track_id]),
        I2cTransaction::write(ADDRESS, vec![0x81, 0x4E, 0x00]),
    ]
}

#[test]
fn test_cycle_emits_then_commits_then_clears() {
    let expectations = ready_frame_expectations(2, 10, 20, 3);
    let (mut driver, mut i2c) = driver_with(&expectations);
    let mut tracker = TouchTracker::new();
    let mut screen = RecordingScreen::default();

    poll_cycle(&mut driver, &mut tracker, &mut screen).unwrap();

    assert_eq!(screen.cycles.len(), 1);
    assert_eq!(
        screen.cycles[0].new,
        vec![Contact {
            track_id: 2,
            x: 10,
            y: 20,
            size: 3,
        }]
    );
    assert!(screen.cycles[0].updated.is_empty());
    assert!(screen.cycles[0].ended.is_empty());
    assert!(tracker.previous().contains(2));
    i2c.done();
}

#[test]
fn test_not_ready_frame_is_skipped() {
    let expectations = [I2cTransaction::write_read(
        ADDRESS,
        vec![0x81, 0x4E],
        vec![0x00],
    )];
    let (mut driver, mut i2c) = driver_with(&expectations);
    let mut tracker = TouchTracker::new();
    let mut screen = RecordingScreen::default();

    poll_cycle(&mut driver, &mut tracker, &mut screen).unwrap();

    assert!(screen.cycles.is_empty());
    assert!(tracker.previous().is_empty());
    i2c.done();
}

#[test]
fn test_failed_cycle_leaves_frame_unacknowledged() {
    // The contact read fails through all its attempts. No status clear is
    // scripted: the frame must stay pending for the next cycle to re-read.
    let status = I2cTransaction::write_read(ADDRESS, vec![0x81, 0x4E], vec![0x81]);
    let failing_read = I2cTransaction::write_read(ADDRESS, vec![0x81, 0x50], vec![0x00])
        .with_error(ErrorKind::Other);
    let expectations = [
        status,
        failing_read.clone(),
        failing_read.clone(),
        failing_read,
    ];
    let (mut driver, mut i2c) = driver_with(&expectations);
    let mut tracker = TouchTracker::new();
    let mut screen = RecordingScreen::default();

    let result = poll_cycle(&mut driver, &mut tracker, &mut screen);

    assert!(result.is_err());
    assert!(screen.cycles.is_empty());
    assert!(tracker.previous().is_empty());
    i2c.done();
}

#[test]
fn test_failed_emit_skips_commit_and_clear() {
    let mut expectations = ready_frame_expectations(0, 15, 25, 2);
    expectations.pop(); // the status clear must not happen
    let (mut driver, mut i2c) = driver_with(&expectations);
    let mut tracker = TouchTracker::new();
    let mut screen = RecordingScreen {
        broken: true,
        ..RecordingScreen::default()
    };

    let result = poll_cycle(&mut driver, &mut tracker, &mut screen);

    assert!(result.is_err());
    assert!(tracker.previous().is_empty());
    i2c.done();
}

#[test]
fn test_consecutive_failures_stop_the_loop() {
    // Five cycles in a row fail their status read, each burning the three
    // per-transaction attempts. The loop gives up instead of spinning.
    let failing_status = I2cTransaction::write_read(ADDRESS, vec![0x81, 0x4E], vec![0x00])
        .with_error(ErrorKind::Other);
    let expectations = vec![failing_status; 15];
    let (mut driver, mut i2c) = driver_with(&expectations);
    let mut tracker = TouchTracker::new();
    let mut screen = RecordingScreen::default();
    let (_tx, mut rx) = mpsc::channel(1);

    let result = poll_loop(&mut driver, &mut tracker, &mut screen, &mut rx);

    assert!(result.is_err());
    assert!(screen.cycles.is_empty());
    i2c.done();
}

#[test]
fn test_good_cycle_resets_the_failure_counter() {
    let failing_status = I2cTransaction::write_read(ADDRESS, vec![0x81, 0x4E], vec![0x00])
        .with_error(ErrorKind::Other);
    let idle_status = I2cTransaction::write_read(ADDRESS, vec![0x81, 0x4E], vec![0x00]);

    // Four failed cycles, one good one, then five more failures: only the
    // last run may exhaust the tolerance. An unreset counter would stop
    // early and leave expectations unconsumed.
    let mut expectations = vec![failing_status.clone(); 12];
    expectations.push(idle_status);
    expectations.extend(vec![failing_status; 15]);
    let (mut driver, mut i2c) = driver_with(&expectations);
    let mut tracker = TouchTracker::new();
    let mut screen = RecordingScreen::default();
    let (_tx, mut rx) = mpsc::channel(1);

    let result = poll_loop(&mut driver, &mut tracker, &mut screen, &mut rx);

    assert!(result.is_err());
    i2c.done();
}

#[test]
fn test_stop_command_ends_the_loop() {
    // No bus expectations: the stop checkpoint runs before any polling.
    let (mut driver, mut i2c) = driver_with(&[]);
    let mut tracker = TouchTracker::new();
    let mut screen = RecordingScreen::default();
    let (tx, mut rx) = mpsc::channel(1);
    tx.try_send(SourceCommand::Stop).unwrap();

    poll_loop(&mut driver, &mut tracker, &mut screen, &mut rx).unwrap();

    assert!(screen.cycles.is_empty());
    i2c.done();
}
