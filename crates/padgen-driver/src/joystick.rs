use crate::axis::AxisUsage;
use crate::report::JoystickReport;

/// Number of device slots the legacy joystick driver exposes.
pub const JOYSTICK_SLOTS: u8 = 16;

/// Ownership states the legacy joystick driver reports for a slot.
/// The driver is the single source of truth here; the facade maps these
/// one-to-one onto its unified status space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoyOwnership {
    /// The device is acquired by this process.
    Owned,
    /// The device exists and nobody has acquired it.
    Free,
    /// The device is acquired by another process.
    Busy,
    /// The device does not exist or the driver is down.
    Missing,
    /// The driver could not determine the state.
    Unknown,
}

/// Client of the legacy single-device virtual joystick driver.
///
/// Slots are addressed 1..=[`JOYSTICK_SLOTS`]. The driver keeps its own
/// device-state engine; per-control setters talk to that engine directly,
/// while [`push`](Self::push) replaces the whole position at once.
pub trait JoystickDriver {
    /// Whether the driver is installed and enabled.
    fn enabled(&self) -> bool;
    /// Driver version word, zero when unavailable.
    fn version(&self) -> u16;

    fn ownership(&self, id: u8) -> JoyOwnership;
    fn exists(&self, id: u8) -> bool;

    /// Acquires an already-configured slot. False if busy or missing.
    fn acquire(&mut self, id: u8) -> bool;
    fn relinquish(&mut self, id: u8);

    fn axis_exists(&self, id: u8, axis: AxisUsage) -> bool;
    fn axis_min(&self, id: u8, axis: AxisUsage) -> Option<i32>;
    fn axis_max(&self, id: u8, axis: AxisUsage) -> Option<i32>;
    fn button_count(&self, id: u8) -> u8;
    fn disc_pov_count(&self, id: u8) -> u8;
    fn cont_pov_count(&self, id: u8) -> u8;

    fn set_axis(&mut self, id: u8, axis: AxisUsage, value: i32) -> bool;
    /// Buttons are 1-based; false when the slot has fewer buttons.
    fn set_button(&mut self, id: u8, button: u8, pressed: bool) -> bool;
    /// Discrete hat: 0..=3 for the cardinal points, -1 for centered.
    fn set_disc_pov(&mut self, id: u8, pov: u8, value: i32) -> bool;
    /// Continuous hat: hundredths of a degree, -1 for centered.
    fn set_cont_pov(&mut self, id: u8, pov: u8, value: i32) -> bool;

    fn reset(&mut self, id: u8) -> bool;
    fn reset_buttons(&mut self, id: u8) -> bool;
    fn reset_povs(&mut self, id: u8) -> bool;

    /// Replaces the whole device position.
    fn push(&mut self, id: u8, report: &JoystickReport) -> bool;
    /// Reads the driver-side position back, if the slot is reachable.
    fn position(&self, id: u8) -> Option<JoystickReport>;
}
