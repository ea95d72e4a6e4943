use padgen_driver::{ds4buttons, ds4special, xbuttons, Ds4Dpad};

/// Number of addressable buttons on an Xbox-shaped report.
pub const XPAD_BUTTON_COUNT: u8 = 19;
/// Number of addressable buttons on a DualShock-shaped report.
pub const DS4_BUTTON_COUNT: u8 = 22;

/// 1-based button index to Xbox-shaped report-word mask. The directional
/// pad rides in the same word, so its four bits and diagonals are plain
/// table entries here.
pub(crate) const XPAD_BUTTONS: [u16; XPAD_BUTTON_COUNT as usize] = [
    xbuttons::A,
    xbuttons::B,
    xbuttons::X,
    xbuttons::Y,
    xbuttons::LEFT_SHOULDER,
    xbuttons::RIGHT_SHOULDER,
    xbuttons::BACK,
    xbuttons::START,
    xbuttons::GUIDE,
    xbuttons::LEFT_THUMB,
    xbuttons::RIGHT_THUMB,
    xbuttons::DPAD_UP,
    xbuttons::DPAD_RIGHT,
    xbuttons::DPAD_DOWN,
    xbuttons::DPAD_LEFT,
    xbuttons::DPAD_UP_RIGHT,
    xbuttons::DPAD_DOWN_RIGHT,
    xbuttons::DPAD_DOWN_LEFT,
    xbuttons::DPAD_UP_LEFT,
];

/// Where a DualShock button index lands in the report: the main button
/// word, the separate special byte, or the dpad nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ds4Button {
    Word(u16),
    Special(u8),
    Dpad(Ds4Dpad),
}

/// 1-based button index to DualShock-shaped report location. Entries 12-19
/// are the dpad headings, 20/21 the trigger buttons, and 9/22 the two
/// special buttons.
pub(crate) const DS4_BUTTONS: [Ds4Button; DS4_BUTTON_COUNT as usize] = [
    Ds4Button::Word(ds4buttons::CROSS),
    Ds4Button::Word(ds4buttons::CIRCLE),
    Ds4Button::Word(ds4buttons::SQUARE),
    Ds4Button::Word(ds4buttons::TRIANGLE),
    Ds4Button::Word(ds4buttons::SHOULDER_LEFT),
    Ds4Button::Word(ds4buttons::SHOULDER_RIGHT),
    Ds4Button::Word(ds4buttons::SHARE),
    Ds4Button::Word(ds4buttons::OPTIONS),
    Ds4Button::Special(ds4special::PS),
    Ds4Button::Word(ds4buttons::THUMB_LEFT),
    Ds4Button::Word(ds4buttons::THUMB_RIGHT),
    Ds4Button::Dpad(Ds4Dpad::North),
    Ds4Button::Dpad(Ds4Dpad::East),
    Ds4Button::Dpad(Ds4Dpad::South),
    Ds4Button::Dpad(Ds4Dpad::West),
    Ds4Button::Dpad(Ds4Dpad::NorthEast),
    Ds4Button::Dpad(Ds4Dpad::SouthEast),
    Ds4Button::Dpad(Ds4Dpad::SouthWest),
    Ds4Button::Dpad(Ds4Dpad::NorthWest),
    Ds4Button::Word(ds4buttons::TRIGGER_LEFT),
    Ds4Button::Word(ds4buttons::TRIGGER_RIGHT),
    Ds4Button::Special(ds4special::TOUCHPAD),
];

/// Mask for a 1-based Xbox-shaped button index.
pub(crate) fn xpad_mask(button: u8) -> Option<u16> {
    if button == 0 || button > XPAD_BUTTON_COUNT {
        return None;
    }
    Some(XPAD_BUTTONS[button as usize - 1])
}

/// ORs a mask in on press, clears it on release.
pub(crate) fn apply_mask(word: &mut u16, mask: u16, pressed: bool) {
    if pressed {
        *word |= mask;
    } else {
        *word &= !mask;
    }
}

/// Report location for a 1-based DualShock-shaped button index.
pub(crate) fn ds4_button(button: u8) -> Option<Ds4Button> {
    if button == 0 || button > DS4_BUTTON_COUNT {
        return None;
    }
    Some(DS4_BUTTONS[button as usize - 1])
}
