/// Axis usages shared by all driver seams, mirroring the HID usage IDs the
/// legacy joystick driver speaks natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum AxisUsage {
    X = 0x30,
    Y = 0x31,
    Z = 0x32,
    Rx = 0x33,
    Ry = 0x34,
    Rz = 0x35,
    Slider0 = 0x36,
    Slider1 = 0x37,
    Wheel = 0x38,
    Pov = 0x39,
}

impl AxisUsage {
    /// Gamepad aliases: the left stick maps onto X/Y, the right stick onto
    /// Rx/Ry, and the two triggers onto Z/Rz.
    pub const LEFT_X: Self = Self::X;
    pub const LEFT_Y: Self = Self::Y;
    pub const LEFT_TRIGGER: Self = Self::Z;
    pub const RIGHT_X: Self = Self::Rx;
    pub const RIGHT_Y: Self = Self::Ry;
    pub const RIGHT_TRIGGER: Self = Self::Rz;

    /// True for the two trigger usages (stored as unsigned bytes on
    /// gamepad-shaped reports).
    pub fn is_trigger(self) -> bool {
        matches!(self, Self::Z | Self::Rz)
    }

    /// True for the four stick usages (signed words on gamepad-shaped
    /// reports).
    pub fn is_stick(self) -> bool {
        matches!(self, Self::X | Self::Y | Self::Rx | Self::Ry)
    }

    /// True for a vertical gamepad axis (inverted on DualShock reports).
    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Y | Self::Ry)
    }
}
