//! Unified facade for emulating virtual game controllers through three
//! mutually incompatible backend mechanisms: a legacy sixteen-slot virtual
//! joystick driver, a legacy four-slot virtual bus, and a generic
//! multi-target virtual gamepad bus with two controller shapes.
//!
//! A [`DeviceHub`] owns the device registry and one client per backend.
//! Devices are addressed by opaque [`DeviceHandle`]s, by `(Backend, index)`
//! pairs, or through the legacy flat numeric scheme resolved by
//! [`resolve_ranged`].

mod axis;
mod backend;
mod buttons;
mod clock;
mod device;
mod error;
mod hub;
mod ident;
mod pov;
mod registry;
mod status;

pub use crate::buttons::{DS4_BUTTON_COUNT, XPAD_BUTTON_COUNT};
pub use crate::clock::{Clock, PollSettings, SystemClock};
pub use crate::device::{DeviceInfo, Report};
pub use crate::error::{Error, Result};
pub use crate::hub::DeviceHub;
pub use crate::ident::{ranged_id, resolve_ranged, Backend};
pub use crate::pov::{
    direction_from_hundredths, hundredths_from_degrees, PovDirection, POV_CENTERED,
};
pub use crate::registry::DeviceHandle;
pub use crate::status::{DeviceStatus, PovKind};

// Driver-seam vocabulary the facade API speaks.
pub use padgen_driver::{
    AxisUsage, Ds4Report, JoystickReport, Vibration, XPadReport,
};
