//! Daemon configuration: built-in defaults, an optional YAML file, and
//! command line overrides, in that precedence order.

#[cfg(test)]
pub mod config_test;

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::drivers::gt911::{self, AxisConfig};

/// Default I2C bus device node. Installations usually provide this as a
/// udev-managed symlink to whichever bus the panel is wired to.
pub const DEFAULT_BUS: &str = "/dev/i2c-touchscreen";

/// Largest accepted scaling factor. The controller reports 16-bit
/// coordinates, so this bound keeps every scaled coordinate and axis range
/// inside the i32 value of an input event.
pub const MAX_SCALING: u32 = (i32::MAX / u16::MAX as i32) as u32;

/// Errors loading a [DriverConfig].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_yaml::Error),
    #[error("scaling factor must be between 1 and {max}", max = MAX_SCALING)]
    InvalidScaling,
}

/// Runtime configuration of the daemon.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "snake_case", deny_unknown_fields, default)]
pub struct DriverConfig {
    /// Path of the I2C bus device node the controller is attached to.
    pub bus: String,
    /// 7-bit I2C address of the controller.
    pub address: u8,
    /// Integer factor applied to coordinates, boundary, and resolution.
    pub scaling: u32,
    /// Mirror the X axis.
    pub flip_x: bool,
    /// Mirror the Y axis.
    pub flip_y: bool,
    /// Report X as Y and Y as X.
    pub swap_xy: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            bus: DEFAULT_BUS.to_string(),
            address: gt911::DEFAULT_ADDRESS,
            scaling: 1,
            flip_x: false,
            flip_y: false,
            swap_xy: false,
        }
    }
}

impl DriverConfig {
    /// Load a [DriverConfig] from the given YAML string.
    pub fn from_yaml(content: &str) -> Result<DriverConfig, LoadError> {
        let config: DriverConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a [DriverConfig] from the given YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<DriverConfig, LoadError> {
        let file = std::fs::File::open(path)?;
        let config: DriverConfig = serde_yaml::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the driver cannot honor. Run again after applying
    /// command line overrides.
    pub fn validate(&self) -> Result<(), LoadError> {
        if self.scaling == 0 || self.scaling > MAX_SCALING {
            return Err(LoadError::InvalidScaling);
        }
        Ok(())
    }

    /// The axis transform portion of the configuration.
    pub fn axis(&self) -> AxisConfig {
        AxisConfig {
            scaling: self.scaling,
            flip_x: self.flip_x,
            flip_y: self.flip_y,
            swap_xy: self.swap_xy,
        }
    }
}

/// Parses a 7-bit I2C address, accepting `0x`-prefixed hex or decimal.
pub fn parse_address(value: &str) -> Result<u8, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid i2c address {value:?}: {e}"))
}
