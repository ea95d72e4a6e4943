use padgen_driver::{Ds4Report, JoystickReport, TargetId, XPadReport};

use crate::error::{Error, Result};
use crate::ident::Backend;

/// Identity read back from the backend after a successful attach. Fields
/// that a backend does not provide stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial: u32,
    /// Assigned player / LED number (1-based where meaningful).
    pub player: u8,
    /// Light-bar color, DualShock-shaped targets only (0x00RRGGBB).
    pub lightbar: u32,
}

/// Position state in the native layout of the owning record's backend.
/// Exactly one layout is valid per backend; the variant tag makes reading
/// the wrong one impossible.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Joystick(JoystickReport),
    XPad(XPadReport),
    Ds4(Ds4Report),
}

impl Report {
    /// Rest-state report for a backend: axes centered, pads released,
    /// buttons cleared.
    pub(crate) fn rest(backend: Backend) -> Self {
        match backend {
            Backend::LegacyJoystick => Report::Joystick(JoystickReport::centered()),
            Backend::LegacyBus | Backend::GenericXbox => {
                Report::XPad(XPadReport::default())
            }
            Backend::GenericDs4 => Report::Ds4(Ds4Report::centered()),
        }
    }

    pub(crate) fn as_xpad_mut(&mut self) -> Result<&mut XPadReport> {
        match self {
            Report::XPad(report) => Ok(report),
            _ => Err(Error::Internal),
        }
    }

    pub(crate) fn as_ds4_mut(&mut self) -> Result<&mut Ds4Report> {
        match self {
            Report::Ds4(report) => Ok(report),
            _ => Err(Error::Internal),
        }
    }
}

/// One live virtual device. Owned exclusively by the registry; the report
/// buffer and the optional bus target go away with it.
#[derive(Debug)]
pub(crate) struct DeviceRecord {
    pub(crate) backend: Backend,
    /// Backend-local index, 1-based.
    pub(crate) index: u8,
    /// Attached generic-bus target, present only for the generic backends.
    pub(crate) target: Option<TargetId>,
    pub(crate) report: Report,
    pub(crate) info: DeviceInfo,
}

impl DeviceRecord {
    pub(crate) fn new(backend: Backend, index: u8) -> Self {
        Self {
            backend,
            index,
            target: None,
            report: Report::rest(backend),
            info: DeviceInfo::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padgen_driver::Ds4Dpad;

    #[test]
    fn rest_report_matches_the_backend_layout() {
        assert!(matches!(
            Report::rest(Backend::LegacyJoystick),
            Report::Joystick(_)
        ));
        assert!(matches!(Report::rest(Backend::LegacyBus), Report::XPad(_)));
        assert!(matches!(Report::rest(Backend::GenericXbox), Report::XPad(_)));
        let Report::Ds4(ds4) = Report::rest(Backend::GenericDs4) else {
            panic!("ds4 backend must get a ds4 report");
        };
        assert_eq!(Ds4Dpad::read(ds4.buttons), Ds4Dpad::None as u16);
    }

    #[test]
    fn layout_accessors_reject_the_wrong_shape() {
        let mut report = Report::rest(Backend::LegacyJoystick);
        assert_eq!(report.as_xpad_mut().unwrap_err(), Error::Internal);
        assert_eq!(report.as_ds4_mut().unwrap_err(), Error::Internal);
    }
}
