use thiserror::Error;

use padgen_driver::{PadBusError, SlotBusError};

/// Unified failure taxonomy returned by every facade operation.
/// Backend-native codes are translated at the adapter boundary and never
/// leak past it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The handle is stale or never belonged to this hub.
    #[error("invalid device handle")]
    InvalidHandle,
    /// An argument is outside the operation's accepted domain.
    #[error("invalid parameter")]
    InvalidParameter,
    /// The backend has no such device, or the backend itself is absent.
    #[error("device not found")]
    NotFound,
    /// The device existed but the backend no longer reports it as ours.
    #[error("device removed")]
    Removed,
    /// The slot or target is already plugged in / attached.
    #[error("device already attached")]
    AlreadyAttached,
    /// The backend accepted the device but it never became ready.
    #[error("device not ready")]
    NotReady,
    /// The device has no live backend attachment.
    #[error("device not connected")]
    NotConnected,
    /// The slot belongs to a different process and cannot be released here.
    #[error("device not owned")]
    NotOwned,
    /// The backend never confirmed an attach or detach within the budget.
    #[error("timed out waiting for the backend")]
    Timeout,
    /// Target or buffer allocation failed on the backend side.
    #[error("allocation failed")]
    AllocationFailed,
    /// The operation has no meaning for this device's backend.
    #[error("operation unsupported")]
    Unsupported,
    /// The backend transport failed.
    #[error("bus i/o failure")]
    Bus,
    /// An invariant that should be unbreakable broke.
    #[error("internal consistency error")]
    Internal,
}

/// Result alias for facade operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<SlotBusError> for Error {
    fn from(err: SlotBusError) -> Self {
        match err {
            SlotBusError::BusNotConnected => Error::NotFound,
            SlotBusError::InvalidStateInfo => Error::Internal,
            SlotBusError::DeviceNotReady => Error::NotReady,
            SlotBusError::IoctlFailed | SlotBusError::Io => Error::Bus,
            SlotBusError::IndexOutOfRange => Error::InvalidParameter,
        }
    }
}

impl From<PadBusError> for Error {
    fn from(err: PadBusError) -> Self {
        match err {
            PadBusError::BusNotFound
            | PadBusError::VersionMismatch
            | PadBusError::InvalidTarget => Error::NotFound,
            PadBusError::RemovalFailed | PadBusError::BusAccessFailed => Error::Bus,
            PadBusError::TargetUninitialized => Error::NotReady,
            PadBusError::TargetNotPluggedIn => Error::NotConnected,
            PadBusError::AlreadyConnected => Error::AlreadyAttached,
            PadBusError::InvalidParameter => Error::InvalidParameter,
            PadBusError::Unsupported => Error::Unsupported,
            PadBusError::TimedOut => Error::Timeout,
            PadBusError::Disposing | PadBusError::Other => Error::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_bus_codes_translate_into_the_unified_space() {
        assert_eq!(Error::from(SlotBusError::BusNotConnected), Error::NotFound);
        assert_eq!(Error::from(SlotBusError::DeviceNotReady), Error::NotReady);
        assert_eq!(
            Error::from(SlotBusError::IndexOutOfRange),
            Error::InvalidParameter
        );
        assert_eq!(Error::from(SlotBusError::IoctlFailed), Error::Bus);
    }

    #[test]
    fn pad_bus_codes_translate_into_the_unified_space() {
        assert_eq!(Error::from(PadBusError::BusNotFound), Error::NotFound);
        assert_eq!(
            Error::from(PadBusError::AlreadyConnected),
            Error::AlreadyAttached
        );
        assert_eq!(
            Error::from(PadBusError::TargetNotPluggedIn),
            Error::NotConnected
        );
        assert_eq!(Error::from(PadBusError::TimedOut), Error::Timeout);
        assert_eq!(Error::from(PadBusError::Unsupported), Error::Unsupported);
    }
}
