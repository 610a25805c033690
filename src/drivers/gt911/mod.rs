//! Driver for the Goodix GT911 capacitive touch controller.

pub mod driver;
pub mod event;
pub mod registers;


use event::Size;

/// Default 7-bit I2C address of the controller. Some panels strap it to
/// 0x14 instead.
pub const DEFAULT_ADDRESS: u8 = 0x5D;

/// Coordinate post-processing applied to everything the controller reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisConfig {
    /// Integer factor applied to coordinates, boundary, and resolution.
    pub scaling: u32,
    /// Mirror the X axis.
    pub flip_x: bool,
    /// Mirror the Y axis.
    pub flip_y: bool,
    /// Report X as Y and Y as X.
    pub swap_xy: bool,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            scaling: 1,
            flip_x: false,
            flip_y: false,
            swap_xy: false,
        }
    }
}

impl AxisConfig {
    /// Applies scaling, flips, and the axis swap to a coordinate pair, in
    /// that order. Flips mirror within the controller's own axes, so they
    /// reflect against the unswapped resolution before any swap.
    pub fn transform(&self, native_resolution: Size, x: u32, y: u32) -> (u32, u32) {
        let mut x = x.saturating_mul(self.scaling);
        let mut y = y.saturating_mul(self.scaling);
        if self.flip_x {
            x = native_resolution.width.saturating_sub(x);
        }
        if self.flip_y {
            y = native_resolution.height.saturating_sub(y);
        }
        if self.swap_xy {
            std::mem::swap(&mut x, &mut y);
        }
        (x, y)
    }

    /// Reorients a width/height pair for the axis swap.
    pub fn oriented(&self, size: Size) -> Size {
        if self.swap_xy {
            Size {
                width: size.height,
                height: size.width,
            }
        } else {
            size
        }
    }
}
