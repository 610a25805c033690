pub mod touchscreen;


use std::io;

use thiserror::Error;

use crate::input::tracker::CycleDiff;

/// Errors from the virtual touchscreen device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The uinput device could not be created. Usually a missing
    /// /dev/uinput or insufficient permissions on it.
    #[error("virtual device unavailable: {0}")]
    Unavailable(#[source] io::Error),
    /// Writing an event batch to the device failed.
    #[error("failed to emit input events: {0}")]
    Emit(#[source] io::Error),
}

/// [TargetTouchDevice] is any device that contact transitions can be
/// written to. The polling loop drives its target through this seam only.
pub trait TargetTouchDevice {
    /// Emits one cycle's transitions to the host.
    fn emit_cycle(&mut self, cycle: &CycleDiff) -> Result<(), DeviceError>;
}
