use padgen_driver::{TargetShape, BUS_SLOTS, JOYSTICK_SLOTS, PAD_SLOTS};

/// The backend mechanism a virtual device lives on. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Legacy single-device virtual joystick driver, sixteen slots.
    LegacyJoystick,
    /// Legacy four-slot virtual bus.
    LegacyBus,
    /// Generic virtual gamepad bus, Xbox-shaped targets.
    GenericXbox,
    /// Generic virtual gamepad bus, DualShock-shaped targets.
    GenericDs4,
}

impl Backend {
    /// Highest backend-local index (indices are 1-based).
    pub fn max_index(self) -> u8 {
        match self {
            Backend::LegacyJoystick => JOYSTICK_SLOTS,
            Backend::LegacyBus => BUS_SLOTS,
            Backend::GenericXbox | Backend::GenericDs4 => PAD_SLOTS,
        }
    }

    /// Whether a backend-local index is addressable on this backend.
    pub fn holds_index(self, index: u8) -> bool {
        index >= 1 && index <= self.max_index()
    }

    /// The generic-bus target shape, for the two backends that have one.
    pub fn target_shape(self) -> Option<TargetShape> {
        match self {
            Backend::GenericXbox => Some(TargetShape::Xbox),
            Backend::GenericDs4 => Some(TargetShape::Ds4),
            _ => None,
        }
    }
}

const LEGACY_BUS_BASE: u32 = 1000;
const GENERIC_XBOX_BASE: u32 = 2000;
const GENERIC_DS4_BASE: u32 = 3000;

/// Resolves a legacy flat numeric identifier to its backend and index.
///
/// This is the single source of truth for the legacy addressing scheme:
/// 1-16 are joystick slots, 1001-1004 bus slots, 2001-2004 Xbox-shaped
/// targets, 3001-3004 DualShock-shaped targets. Everything else, zero
/// included, is unknown.
pub fn resolve_ranged(id: u32) -> Option<(Backend, u8)> {
    match id {
        1..=16 => Some((Backend::LegacyJoystick, id as u8)),
        1001..=1004 => Some((Backend::LegacyBus, (id - LEGACY_BUS_BASE) as u8)),
        2001..=2004 => Some((Backend::GenericXbox, (id - GENERIC_XBOX_BASE) as u8)),
        3001..=3004 => Some((Backend::GenericDs4, (id - GENERIC_DS4_BASE) as u8)),
        _ => None,
    }
}

/// Inverse of [`resolve_ranged`] for reporting and round-trips.
pub fn ranged_id(backend: Backend, index: u8) -> u32 {
    let base = match backend {
        Backend::LegacyJoystick => 0,
        Backend::LegacyBus => LEGACY_BUS_BASE,
        Backend::GenericXbox => GENERIC_XBOX_BASE,
        Backend::GenericDs4 => GENERIC_DS4_BASE,
    };
    base + u32::from(index)
}
