//! Narrow client seams for the three virtual-controller backends the padgen
//! facade unifies, plus the native report layouts those clients consume.
//! Real driver bindings implement these traits; the [`loopback`] module
//! provides deterministic in-memory implementations for tests and demos.

mod axis;
mod joystick;
pub mod loopback;
mod padbus;
mod report;
mod slotbus;

pub use crate::axis::AxisUsage;
pub use crate::joystick::{JoyOwnership, JoystickDriver, JOYSTICK_SLOTS};
pub use crate::padbus::{
    PadBus, PadBusError, PadBusResult, TargetId, TargetInfo, TargetShape,
    PAD_SLOTS,
};
pub use crate::report::{
    ds4buttons, ds4special, xbuttons, Ds4Dpad, Ds4Report, JoystickReport,
    XPadReport, AXIS_MAX, HAT_CENTERED, JOY_AXIS_CENTER,
};
pub use crate::slotbus::{
    SlotBus, SlotBusError, SlotBusResult, Vibration, BUS_SLOTS,
};
