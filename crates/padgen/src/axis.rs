// Axis rescaling between the canonical 0..=32767 domain every set-axis call
// speaks and the native ranges of the gamepad-shaped reports. The legacy
// joystick driver consumes canonical values directly, so nothing here
// applies to it.

use padgen_driver::{AxisUsage, Ds4Report, XPadReport, AXIS_MAX};

/// Clamps a caller-supplied value into the canonical axis domain.
pub(crate) fn clamp_canonical(value: i32) -> i32 {
    value.clamp(0, AXIS_MAX)
}

/// Canonical value to trigger byte: 0..=32767 becomes 0..=255.
pub(crate) fn trigger_byte(value: i32) -> u8 {
    (((clamp_canonical(value) - 1) / 128) & 0xFF) as u8
}

/// Canonical value to signed stick word: 0..=32767 becomes -32768..=32766,
/// with 16384 landing exactly on center.
pub(crate) fn stick_word(value: i32) -> i16 {
    ((clamp_canonical(value) - 16384) * 2) as i16
}

/// Canonical value to DualShock axis byte. Vertical axes grow downward on
/// that report, so they are mirrored.
pub(crate) fn ds4_byte(value: i32, invert: bool) -> u8 {
    let byte = trigger_byte(value);
    if invert {
        0xFF - byte
    } else {
        byte
    }
}

/// Percentage (0-100) to trigger byte.
pub(crate) fn pct_trigger_byte(pct: f32) -> u8 {
    (255.0 * pct * 0.01) as u8
}

/// Percentage (0-100) to signed stick word.
pub(crate) fn pct_stick_word(pct: f32) -> i16 {
    (65535.0 * pct * 0.01 - 32768.0) as i16
}

/// Percentage (0-100) to DualShock axis byte, mirrored for vertical axes.
pub(crate) fn pct_ds4_byte(pct: f32, invert: bool) -> u8 {
    let byte = pct_trigger_byte(pct);
    if invert {
        0xFF - byte
    } else {
        byte
    }
}

/// Percentage (0-100) to the legacy joystick's native 0..=32768 range.
pub(crate) fn pct_joystick(pct: f32) -> i32 {
    (32768.0 * pct * 0.01) as i32
}

/// Writes a pre-scaled value into the matching Xbox-shaped report field.
/// The caller has already rejected non-gamepad usages.
pub(crate) fn write_xpad_axis(
    report: &mut XPadReport,
    usage: AxisUsage,
    trigger: u8,
    stick: i16,
) {
    match usage {
        AxisUsage::Z => report.left_trigger = trigger,
        AxisUsage::Rz => report.right_trigger = trigger,
        AxisUsage::X => report.thumb_lx = stick,
        AxisUsage::Y => report.thumb_ly = stick,
        AxisUsage::Rx => report.thumb_rx = stick,
        AxisUsage::Ry => report.thumb_ry = stick,
        _ => {}
    }
}

/// Writes a pre-scaled byte into the matching DualShock-shaped report
/// field. The caller has already rejected non-gamepad usages.
pub(crate) fn write_ds4_axis(report: &mut Ds4Report, usage: AxisUsage, value: u8) {
    match usage {
        AxisUsage::Z => report.trigger_l = value,
        AxisUsage::Rz => report.trigger_r = value,
        AxisUsage::X => report.thumb_lx = value,
        AxisUsage::Y => report.thumb_ly = value,
        AxisUsage::Rx => report.thumb_rx = value,
        AxisUsage::Ry => report.thumb_ry = value,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_byte_hits_both_extremes() {
        assert_eq!(trigger_byte(0), 0);
        assert_eq!(trigger_byte(AXIS_MAX), 255);
        assert_eq!(trigger_byte(-5), 0);
        assert_eq!(trigger_byte(40_000), 255);
    }

    #[test]
    fn stick_word_centers_on_sixteen_k() {
        assert_eq!(stick_word(16384), 0);
        assert_eq!(stick_word(0), -32768);
        assert_eq!(stick_word(AXIS_MAX), 32766);
    }

    #[test]
    fn ds4_vertical_axes_are_mirrored() {
        assert_eq!(ds4_byte(0, false), 0);
        assert_eq!(ds4_byte(0, true), 255);
        assert_eq!(ds4_byte(AXIS_MAX, true), 0);
        assert_eq!(ds4_byte(16384, false), 127);
        assert_eq!(ds4_byte(16384, true), 128);
    }

    #[test]
    fn percentage_setters_hit_the_native_extremes() {
        assert_eq!(pct_trigger_byte(0.0), 0);
        assert_eq!(pct_trigger_byte(100.0), 255);
        assert_eq!(pct_stick_word(0.0), -32768);
        assert_eq!(pct_stick_word(100.0), 32767);
        assert_eq!(pct_stick_word(50.0), 0);
        assert_eq!(pct_ds4_byte(100.0, true), 0);
        assert_eq!(pct_joystick(100.0), 32768);
        assert_eq!(pct_joystick(50.0), 16384);
    }
}
