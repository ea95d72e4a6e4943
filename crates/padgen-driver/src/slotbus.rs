use thiserror::Error;

use crate::report::XPadReport;

/// Number of device slots on the legacy virtual bus.
pub const BUS_SLOTS: u8 = 4;

/// Native result codes of the legacy four-slot bus driver.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SlotBusError {
    #[error("bus not connected")]
    BusNotConnected,
    #[error("invalid state info")]
    InvalidStateInfo,
    #[error("device not ready")]
    DeviceNotReady,
    #[error("ioctl request failed")]
    IoctlFailed,
    #[error("slot index out of range")]
    IndexOutOfRange,
    #[error("bus i/o error")]
    Io,
}

/// Result alias for legacy-bus driver calls.
pub type SlotBusResult<T> = Result<T, SlotBusError>;

/// Feedback motor state reported by a bus slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Vibration {
    pub large_motor: u16,
    pub small_motor: u16,
}

/// Client of the legacy four-slot virtual bus driver.
///
/// Slots are 0-based at this boundary; the facade's 1-based indices are
/// shifted before every call. Plug-in is asynchronous on the bus side:
/// [`led_number`](Self::led_number) keeps answering
/// [`SlotBusError::DeviceNotReady`] until the kernel machinery settles, so
/// callers poll it with a bounded budget.
pub trait SlotBus {
    fn bus_version(&self) -> SlotBusResult<u32>;
    fn empty_slots(&self) -> SlotBusResult<u8>;

    fn plugged_in(&self, slot: u8) -> SlotBusResult<bool>;
    /// Whether this process plugged the slot in.
    fn owned(&self, slot: u8) -> SlotBusResult<bool>;

    fn plug_in(&mut self, slot: u8) -> SlotBusResult<()>;
    fn unplug(&mut self, slot: u8) -> SlotBusResult<()>;
    /// Unplugs regardless of which process owns the slot.
    fn unplug_force(&mut self, slot: u8) -> SlotBusResult<()>;

    /// Player LED assigned by the bus once the device has started.
    fn led_number(&self, slot: u8) -> SlotBusResult<u8>;
    /// Bus-assigned serial of a started device.
    fn serial(&self, slot: u8) -> SlotBusResult<u32>;
    fn vibration(&self, slot: u8) -> SlotBusResult<Vibration>;

    fn push(&mut self, slot: u8, report: &XPadReport) -> SlotBusResult<()>;
}
