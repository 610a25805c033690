//! Register map of the GT911 coordinate interface.
//!
//! The controller addresses registers with a 16-bit value that is transmitted
//! high byte first. Multi-byte fields are stored low byte first, so each
//! field below lists its registers in little-endian combine order.

/// A 16-bit register address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Register(pub u16);

impl Register {
    /// The address as it appears on the wire, high byte first.
    pub const fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

/// Product id, four ASCII bytes ("911" and a NUL on this part).
pub const PRODUCT_ID: Register = Register(0x8140);

/// Firmware version.
pub const FIRMWARE_VERSION: [Register; 2] = [Register(0x8144), Register(0x8145)];

/// Maximum X coordinate the controller will report.
pub const X_OUTPUT_MAX: [Register; 2] = [Register(0x8048), Register(0x8049)];

/// Maximum Y coordinate the controller will report.
pub const Y_OUTPUT_MAX: [Register; 2] = [Register(0x804A), Register(0x804B)];

/// Native X resolution of the coordinate system.
pub const X_RESOLUTION: [Register; 2] = [Register(0x8146), Register(0x8147)];

/// Native Y resolution of the coordinate system.
pub const Y_RESOLUTION: [Register; 2] = [Register(0x8148), Register(0x8149)];

/// Coordinate status register. Write 0 here to acknowledge a consumed frame
/// so the controller will publish the next one.
pub const STATUS: Register = Register(0x814E);

/// Most concurrent contacts the controller can report.
pub const MAX_CONTACTS: u8 = 5;

/// First register of contact slot 0.
const CONTACT_BASE: u16 = 0x814F;

/// Address distance between consecutive contact slots.
const CONTACT_STRIDE: u16 = 0x08;

/// Register addresses of one contact slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactRegisters {
    pub track_id: Register,
    pub x: [Register; 2],
    pub y: [Register; 2],
    pub size: [Register; 2],
}

impl ContactRegisters {
    /// Addresses for the given slot, or `None` when the slot is outside the
    /// controller's `0..MAX_CONTACTS` range.
    pub fn for_slot(slot: u8) -> Option<Self> {
        if slot >= MAX_CONTACTS {
            return None;
        }
        let base = CONTACT_BASE + u16::from(slot) * CONTACT_STRIDE;
        Some(Self {
            track_id: Register(base),
            x: [Register(base + 1), Register(base + 2)],
            y: [Register(base + 3), Register(base + 4)],
            size: [Register(base + 5), Register(base + 6)],
        })
    }
}

const STATUS_BUFFER_READY: u8 = 1 << 7;
const STATUS_LARGE_DETECT: u8 = 1 << 6;
const STATUS_PROXIMITY_VALID: u8 = 1 << 5;
const STATUS_KEY_ACTIVE: u8 = 1 << 4;
const STATUS_CONTACT_COUNT: u8 = 0x0F;

/// Decoded coordinate status byte. Every byte value decodes to a valid
/// status; reserved combinations are simply carried through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFlags {
    /// The controller has a new frame ready for the host.
    pub buffer_ready: bool,
    /// A large-area contact, likely a palm, is on the panel.
    pub large_detect: bool,
    pub proximity_valid: bool,
    /// A touch key is active. Keys are not bridged by this driver.
    pub key_active: bool,
    /// Number of contacts in the frame, as reported (0..=15).
    pub contact_count: u8,
}

impl StatusFlags {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            buffer_ready: byte & STATUS_BUFFER_READY != 0,
            large_detect: byte & STATUS_LARGE_DETECT != 0,
            proximity_valid: byte & STATUS_PROXIMITY_VALID != 0,
            key_active: byte & STATUS_KEY_ACTIVE != 0,
            contact_count: byte & STATUS_CONTACT_COUNT,
        }
    }
}
