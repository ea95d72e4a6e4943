use thiserror::Error;

use crate::report::{Ds4Report, XPadReport};

/// Number of devices of each shape the facade will manage on the generic
/// bus. The bus itself has no such limit; this mirrors the legacy
/// addressing scheme's four-slot bands.
pub const PAD_SLOTS: u8 = 4;

/// Controller shapes supported by the generic bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetShape {
    Xbox,
    Ds4,
}

/// Opaque reference to a bus-allocated target object. Owned by the device
/// record that attached it; must be released exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub u32);

/// Identity read back from an attached target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial: u32,
}

/// Native error codes of the generic virtual-gamepad bus client.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PadBusError {
    #[error("bus not found")]
    BusNotFound,
    #[error("bus version mismatch")]
    VersionMismatch,
    #[error("invalid target")]
    InvalidTarget,
    #[error("target removal failed")]
    RemovalFailed,
    #[error("target uninitialized")]
    TargetUninitialized,
    #[error("target not plugged in")]
    TargetNotPluggedIn,
    #[error("bus already connected")]
    AlreadyConnected,
    #[error("bus access failed")]
    BusAccessFailed,
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("operation not supported")]
    Unsupported,
    #[error("bus request timed out")]
    TimedOut,
    #[error("bus is disposing")]
    Disposing,
    #[error("unclassified bus error")]
    Other,
}

/// Result alias for generic-bus client calls.
pub type PadBusResult<T> = Result<T, PadBusError>;

/// Client of the generic multi-target virtual gamepad bus.
///
/// One shared connection serves every target. Targets are allocated, then
/// attached to the bus; a target claimed by another process is not
/// observable through this interface, so "attached by us" is the only
/// ownership signal available.
pub trait PadBus {
    /// Establishes the shared connection. Idempotent at the facade level;
    /// implementations may answer [`PadBusError::AlreadyConnected`].
    fn connect(&mut self) -> PadBusResult<()>;
    fn connected(&self) -> bool;
    /// Tears the shared connection down, detaching nothing by itself.
    fn disconnect(&mut self);
    fn bus_version(&self) -> u32;

    fn create_target(&mut self, shape: TargetShape) -> PadBusResult<TargetId>;
    fn attach(&mut self, target: TargetId) -> PadBusResult<()>;
    fn detach(&mut self, target: TargetId) -> PadBusResult<()>;
    fn attached(&self, target: TargetId) -> bool;
    /// Frees a target object. Detach first if it is attached.
    fn release_target(&mut self, target: TargetId);

    fn target_info(&self, target: TargetId) -> Option<TargetInfo>;
    /// Player index assigned to an attached Xbox-shaped target (0-based).
    fn player_index(&self, target: TargetId) -> PadBusResult<u8>;

    fn push_xpad(&mut self, target: TargetId, report: &XPadReport) -> PadBusResult<()>;
    fn push_ds4(&mut self, target: TargetId, report: &Ds4Report) -> PadBusResult<()>;
}
