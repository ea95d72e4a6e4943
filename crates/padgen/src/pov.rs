use padgen_driver::{xbuttons, Ds4Dpad};

/// Continuous pov value meaning "centered / released" at the facade level.
pub const POV_CENTERED: i32 = -1;

/// Eight-way directional-pad headings plus the centered rest position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PovDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    Center,
}

impl PovDirection {
    /// Xbox-shaped dpad bits for this heading.
    pub(crate) fn xpad_mask(self) -> u16 {
        match self {
            PovDirection::North => xbuttons::DPAD_UP,
            PovDirection::NorthEast => xbuttons::DPAD_UP_RIGHT,
            PovDirection::East => xbuttons::DPAD_RIGHT,
            PovDirection::SouthEast => xbuttons::DPAD_DOWN_RIGHT,
            PovDirection::South => xbuttons::DPAD_DOWN,
            PovDirection::SouthWest => xbuttons::DPAD_DOWN_LEFT,
            PovDirection::West => xbuttons::DPAD_LEFT,
            PovDirection::NorthWest => xbuttons::DPAD_UP_LEFT,
            PovDirection::Center => 0,
        }
    }

    /// DualShock-shaped dpad nibble value for this heading.
    pub(crate) fn ds4(self) -> Ds4Dpad {
        match self {
            PovDirection::North => Ds4Dpad::North,
            PovDirection::NorthEast => Ds4Dpad::NorthEast,
            PovDirection::East => Ds4Dpad::East,
            PovDirection::SouthEast => Ds4Dpad::SouthEast,
            PovDirection::South => Ds4Dpad::South,
            PovDirection::SouthWest => Ds4Dpad::SouthWest,
            PovDirection::West => Ds4Dpad::West,
            PovDirection::NorthWest => Ds4Dpad::NorthWest,
            PovDirection::Center => Ds4Dpad::None,
        }
    }

    /// Value handed to the legacy joystick driver's discrete hat: 0-3 for
    /// the cardinal points, 4-7 for the diagonals, -1 for centered.
    pub(crate) fn disc_value(self) -> i32 {
        match self {
            PovDirection::North => 0,
            PovDirection::East => 1,
            PovDirection::South => 2,
            PovDirection::West => 3,
            PovDirection::NorthEast => 4,
            PovDirection::SouthEast => 5,
            PovDirection::SouthWest => 6,
            PovDirection::NorthWest => 7,
            PovDirection::Center => -1,
        }
    }
}

const SECTORS: [(i32, PovDirection); 7] = [
    (4500, PovDirection::NorthEast),
    (9000, PovDirection::East),
    (13500, PovDirection::SouthEast),
    (18000, PovDirection::South),
    (22500, PovDirection::SouthWest),
    (27000, PovDirection::West),
    (31500, PovDirection::NorthWest),
];

/// Maps a continuous pov value (hundredths of a degree, -1 = centered) to
/// an eight-way heading. Each heading owns a ±100-unit sector around its
/// compass angle; values outside every sector release the pad.
///
/// Quirk kept from the reference behavior: anything below 100 or above
/// 35900 counts as north, so 0 and 36000 both mean north even though -1
/// means centered.
pub fn direction_from_hundredths(value: i32) -> PovDirection {
    if value == POV_CENTERED {
        return PovDirection::Center;
    }
    if value < 100 || value > 35900 {
        return PovDirection::North;
    }
    for (center, direction) in SECTORS {
        if (value - center).abs() < 100 {
            return direction;
        }
    }
    PovDirection::Center
}

/// Degrees variant of [`direction_from_hundredths`]; negative releases the
/// pad.
pub fn hundredths_from_degrees(degrees: f32) -> i32 {
    if degrees >= 0.0 {
        (degrees * 100.0) as i32
    } else {
        POV_CENTERED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_full_circle_both_mean_north() {
        assert_eq!(direction_from_hundredths(0), PovDirection::North);
        assert_eq!(direction_from_hundredths(36000), PovDirection::North);
        assert_eq!(direction_from_hundredths(99), PovDirection::North);
        assert_eq!(direction_from_hundredths(35901), PovDirection::North);
    }

    #[test]
    fn minus_one_releases_the_pad() {
        assert_eq!(direction_from_hundredths(-1), PovDirection::Center);
    }

    #[test]
    fn sector_centers_map_to_their_headings() {
        assert_eq!(direction_from_hundredths(4500), PovDirection::NorthEast);
        assert_eq!(direction_from_hundredths(9000), PovDirection::East);
        assert_eq!(direction_from_hundredths(13500), PovDirection::SouthEast);
        assert_eq!(direction_from_hundredths(18000), PovDirection::South);
        assert_eq!(direction_from_hundredths(22500), PovDirection::SouthWest);
        assert_eq!(direction_from_hundredths(27000), PovDirection::West);
        assert_eq!(direction_from_hundredths(31500), PovDirection::NorthWest);
    }

    #[test]
    fn sector_edges_are_exclusive() {
        assert_eq!(direction_from_hundredths(4401), PovDirection::NorthEast);
        assert_eq!(direction_from_hundredths(4599), PovDirection::NorthEast);
        assert_eq!(direction_from_hundredths(4600), PovDirection::Center);
        assert_eq!(direction_from_hundredths(6000), PovDirection::Center);
    }

    #[test]
    fn degrees_are_a_thin_unit_conversion() {
        assert_eq!(hundredths_from_degrees(45.0), 4500);
        assert_eq!(hundredths_from_degrees(0.0), 0);
        assert_eq!(hundredths_from_degrees(360.0), 36000);
        assert_eq!(hundredths_from_degrees(-1.0), POV_CENTERED);
    }

    #[test]
    fn diagonal_masks_combine_on_the_xbox_shape() {
        assert_eq!(
            PovDirection::SouthWest.xpad_mask(),
            xbuttons::DPAD_DOWN | xbuttons::DPAD_LEFT
        );
        assert_eq!(PovDirection::Center.xpad_mask(), 0);
        assert_eq!(PovDirection::Center.ds4(), Ds4Dpad::None);
    }
}
