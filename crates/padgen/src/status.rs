use padgen_driver::JoyOwnership;

/// Unified ownership/status of a backend slot, reconciling the three
/// backends' different notions of "who owns this device".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Acquired / plugged in / attached by this hub.
    Own,
    /// Present and claimable. On the generic bus a device claimed by a
    /// different process also reads as free, since third-party ownership
    /// is not observable there.
    Free,
    /// Held by another process.
    Busy,
    /// The device or its backend is missing entirely.
    Miss,
    /// The backend could not classify the slot.
    Unknown,
}

impl From<JoyOwnership> for DeviceStatus {
    fn from(ownership: JoyOwnership) -> Self {
        match ownership {
            JoyOwnership::Owned => DeviceStatus::Own,
            JoyOwnership::Free => DeviceStatus::Free,
            JoyOwnership::Busy => DeviceStatus::Busy,
            JoyOwnership::Missing => DeviceStatus::Miss,
            JoyOwnership::Unknown => DeviceStatus::Unknown,
        }
    }
}

/// Hat flavors a device can expose; the legacy joystick driver counts the
/// discrete and continuous kinds separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PovKind {
    Discrete,
    Continuous,
    Any,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joystick_ownership_maps_one_to_one() {
        assert_eq!(DeviceStatus::from(JoyOwnership::Owned), DeviceStatus::Own);
        assert_eq!(DeviceStatus::from(JoyOwnership::Free), DeviceStatus::Free);
        assert_eq!(DeviceStatus::from(JoyOwnership::Busy), DeviceStatus::Busy);
        assert_eq!(DeviceStatus::from(JoyOwnership::Missing), DeviceStatus::Miss);
        assert_eq!(
            DeviceStatus::from(JoyOwnership::Unknown),
            DeviceStatus::Unknown
        );
    }
}
