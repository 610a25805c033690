//! Virtual multi-touch screen backed by uinput.

use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AbsInfo, AbsoluteAxisCode, AttributeSet, BusType, EventType, InputEvent, InputId, KeyCode,
    PropType, UinputAbsSetup,
};

use crate::drivers::gt911::event::Size;
use crate::input::tracker::{CycleDiff, TrackTransition};

use super::{DeviceError, TargetTouchDevice};

/// Tracking id that releases a slot's contact.
const TRACKING_ID_NONE: i32 = -1;
/// Highest slot index the device advertises. The controller reports at most
/// five contacts; the extra slots are headroom for larger track ids.
const SLOT_MAX: i32 = 9;
/// Highest tracking id the device advertises.
const TRACKING_ID_MAX: i32 = u16::MAX as i32;
/// Highest contact size the device advertises.
const TOUCH_MAJOR_MAX: i32 = 255;

/// Identity and axis ranges of the virtual touchscreen.
#[derive(Debug, Clone)]
pub struct TouchscreenConfig {
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub version: u16,
    /// Coordinate ranges, already oriented: positions run 0..=width and
    /// 0..=height on X and Y.
    pub resolution: Size,
}

impl Default for TouchscreenConfig {
    fn default() -> Self {
        Self {
            name: "GT911 Capacitive TouchScreen".to_string(),
            vendor_id: 0x27C6,
            product_id: 0x0911,
            version: 0x0003,
            resolution: Size {
                width: 800,
                height: 480,
            },
        }
    }
}

/// A userspace touchscreen device node.
///
/// Contacts are multiplexed over slots with the kernel's type-B multi-touch
/// protocol. The hardware track id doubles as the slot index, which works
/// out because the controller assigns ids from the lowest free value.
pub struct VirtualTouchscreen {
    device: VirtualDevice,
}

impl VirtualTouchscreen {
    /// Creates the uinput device, advertised as a direct-input touchscreen.
    pub fn new(config: &TouchscreenConfig) -> Result<Self, DeviceError> {
        let device = Self::create_virtual_device(config).map_err(DeviceError::Unavailable)?;
        log::debug!("Created virtual touchscreen: {}", config.name);
        Ok(Self { device })
    }

    fn create_virtual_device(config: &TouchscreenConfig) -> std::io::Result<VirtualDevice> {
        // Setup key inputs. Declared but never driven; the emitter sends
        // multi-touch sequences only.
        let mut keys = AttributeSet::<KeyCode>::new();
        keys.insert(KeyCode::BTN_TOUCH);
        keys.insert(KeyCode::BTN_TOOL_FINGER);

        let width_setup = AbsInfo::new(0, 0, config.resolution.width as i32, 0, 0, 0);
        let height_setup = AbsInfo::new(0, 0, config.resolution.height as i32, 0, 0, 0);
        let abs_x = UinputAbsSetup::new(AbsoluteAxisCode::ABS_X, width_setup);
        let abs_y = UinputAbsSetup::new(AbsoluteAxisCode::ABS_Y, height_setup);
        let abs_mt_pos_x = UinputAbsSetup::new(AbsoluteAxisCode::ABS_MT_POSITION_X, width_setup);
        let abs_mt_pos_y = UinputAbsSetup::new(AbsoluteAxisCode::ABS_MT_POSITION_Y, height_setup);

        let slot_setup = AbsInfo::new(0, 0, SLOT_MAX, 0, 0, 0);
        let abs_mt_slot = UinputAbsSetup::new(AbsoluteAxisCode::ABS_MT_SLOT, slot_setup);

        let tracking_id_setup = AbsInfo::new(0, 0, TRACKING_ID_MAX, 0, 0, 0);
        let abs_mt_tracking_id =
            UinputAbsSetup::new(AbsoluteAxisCode::ABS_MT_TRACKING_ID, tracking_id_setup);

        let touch_major_setup = AbsInfo::new(0, 0, TOUCH_MAJOR_MAX, 0, 0, 0);
        let abs_mt_touch_major =
            UinputAbsSetup::new(AbsoluteAxisCode::ABS_MT_TOUCH_MAJOR, touch_major_setup);

        let mut properties = AttributeSet::<PropType>::new();
        properties.insert(PropType::DIRECT);

        let name = config.name.as_str();
        let id = InputId::new(
            BusType(0x18),
            config.vendor_id,
            config.product_id,
            config.version,
        );

        VirtualDeviceBuilder::new()?
            .name(name)
            .input_id(id)
            .with_properties(&properties)?
            .with_keys(&keys)?
            .with_absolute_axis(&abs_x)?
            .with_absolute_axis(&abs_y)?
            .with_absolute_axis(&abs_mt_slot)?
            .with_absolute_axis(&abs_mt_tracking_id)?
            .with_absolute_axis(&abs_mt_pos_x)?
            .with_absolute_axis(&abs_mt_pos_y)?
            .with_absolute_axis(&abs_mt_touch_major)?
            .build()
    }

    fn emit_group(
        &mut self,
        group: impl Iterator<Item = TrackTransition>,
    ) -> Result<(), DeviceError> {
        let mut events = Vec::new();
        for transition in group {
            match &transition {
                TrackTransition::New(c) => {
                    log::debug!("New track {} at ({}, {}) size {}", c.track_id, c.x, c.y, c.size)
                }
                TrackTransition::Updated(c) => {
                    log::trace!("Track {} at ({}, {}) size {}", c.track_id, c.x, c.y, c.size)
                }
                TrackTransition::Ended(track_id) => log::debug!("Track {track_id} ended"),
            }
            events.extend(transition_events(&transition));
        }
        if events.is_empty() {
            return Ok(());
        }
        // emit() appends the SYN_REPORT that closes the batch.
        self.device.emit(&events).map_err(DeviceError::Emit)
    }
}

impl TargetTouchDevice for VirtualTouchscreen {
    /// Emits one cycle's transitions as one batch per non-empty group, new
    /// then updated then ended. Each batch ends in its own synchronization
    /// point, so arrivals land before moves and moves before releases.
    fn emit_cycle(&mut self, cycle: &CycleDiff) -> Result<(), DeviceError> {
        self.emit_group(cycle.new.iter().copied().map(TrackTransition::New))?;
        self.emit_group(cycle.updated.iter().copied().map(TrackTransition::Updated))?;
        self.emit_group(cycle.ended.iter().copied().map(TrackTransition::Ended))?;
        Ok(())
    }
}

fn abs_event(code: AbsoluteAxisCode, value: i32) -> InputEvent {
    InputEvent::new(EventType::ABSOLUTE.0, code.0, value)
}

/// Builds the evdev sequence for one track transition. Every sequence
/// starts by selecting the track's slot; new tracks then bind the tracking
/// id and ended tracks clear it with the release sentinel.
pub fn transition_events(transition: &TrackTransition) -> Vec<InputEvent> {
    match transition {
        TrackTransition::New(contact) => vec![
            abs_event(AbsoluteAxisCode::ABS_MT_SLOT, contact.track_id as i32),
            abs_event(AbsoluteAxisCode::ABS_MT_TRACKING_ID, contact.track_id as i32),
            abs_event(AbsoluteAxisCode::ABS_MT_POSITION_X, contact.x as i32),
            abs_event(AbsoluteAxisCode::ABS_MT_POSITION_Y, contact.y as i32),
            abs_event(AbsoluteAxisCode::ABS_MT_TOUCH_MAJOR, contact.size as i32),
        ],
        TrackTransition::Updated(contact) => vec![
            abs_event(AbsoluteAxisCode::ABS_MT_SLOT, contact.track_id as i32),
            abs_event(AbsoluteAxisCode::ABS_MT_POSITION_X, contact.x as i32),
            abs_event(AbsoluteAxisCode::ABS_MT_POSITION_Y, contact.y as i32),
            abs_event(AbsoluteAxisCode::ABS_MT_TOUCH_MAJOR, contact.size as i32),
        ],
        TrackTransition::Ended(track_id) => vec![
            abs_event(AbsoluteAxisCode::ABS_MT_SLOT, *track_id as i32),
            abs_event(AbsoluteAxisCode::ABS_MT_TRACKING_ID, TRACKING_ID_NONE),
        ],
    }
}
