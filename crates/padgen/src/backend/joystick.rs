// Adapter for the legacy single-device virtual joystick driver. The driver
// keeps its own device-state engine, so per-control setters go straight to
// it; the mirror report only backs whole-device reset and position reads.

use padgen_driver::{AxisUsage, JoyOwnership};

use crate::device::Report;
use crate::error::{Error, Result};
use crate::hub::DeviceHub;
use crate::ident::Backend;
use crate::registry::DeviceHandle;

impl DeviceHub {
    pub(crate) fn joy_acquire(&mut self, index: u8) -> Result<DeviceHandle> {
        if self.joystick.acquire(index) {
            let handle = self.registry.create(Backend::LegacyJoystick, index);
            log::debug!("acquired joystick slot {index}");
            return Ok(handle);
        }
        Err(match self.joystick.ownership(index) {
            JoyOwnership::Busy => Error::AlreadyAttached,
            JoyOwnership::Missing | JoyOwnership::Unknown => Error::NotFound,
            _ => Error::Bus,
        })
    }

    pub(crate) fn joy_relinquish(&mut self, handle: DeviceHandle) -> Result<()> {
        let record = self.registry.get(handle).ok_or(Error::InvalidHandle)?;
        let index = record.index;
        self.joystick.relinquish(index);
        self.registry.remove(handle);
        log::debug!("relinquished joystick slot {index}");
        Ok(())
    }

    pub(crate) fn joy_set_axis(&mut self, index: u8, usage: AxisUsage, value: i32) -> Result<()> {
        if !self.joystick.axis_exists(index, usage) {
            return Err(Error::InvalidParameter);
        }
        if self.joystick.set_axis(index, usage, value) {
            Ok(())
        } else {
            Err(Error::Bus)
        }
    }

    pub(crate) fn joy_set_button(&mut self, index: u8, button: u8, pressed: bool) -> Result<()> {
        if button == 0 || button > self.joystick.button_count(index) {
            return Err(Error::InvalidParameter);
        }
        if self.joystick.set_button(index, button, pressed) {
            Ok(())
        } else {
            Err(Error::Bus)
        }
    }

    pub(crate) fn joy_set_disc_pov(&mut self, index: u8, pov: u8, value: i32) -> Result<()> {
        if pov == 0 || pov > self.joystick.disc_pov_count(index) {
            return Err(Error::InvalidParameter);
        }
        if self.joystick.set_disc_pov(index, pov, value) {
            Ok(())
        } else {
            Err(Error::Bus)
        }
    }

    pub(crate) fn joy_set_cont_pov(&mut self, index: u8, pov: u8, value: i32) -> Result<()> {
        if pov == 0 || pov > self.joystick.cont_pov_count(index) {
            return Err(Error::InvalidParameter);
        }
        if self.joystick.set_cont_pov(index, pov, value) {
            Ok(())
        } else {
            Err(Error::Bus)
        }
    }

    /// Continuous hat first; hats that turn out to be discrete get the four
    /// cardinal points and a centered fallback.
    pub(crate) fn joy_set_pov(&mut self, index: u8, pov: u8, value: i32) -> Result<()> {
        if self.joystick.set_cont_pov(index, pov, value) {
            return Ok(());
        }
        let disc = match value {
            0 | 36000 => 0,
            9000 => 1,
            18000 => 2,
            27000 => 3,
            _ => -1,
        };
        if self.joystick.set_disc_pov(index, pov, disc) {
            Ok(())
        } else {
            Err(Error::Bus)
        }
    }

    /// Re-centers the mirror report and pushes it as one position update.
    pub(crate) fn joy_reset(&mut self, handle: DeviceHandle) -> Result<()> {
        let record = self.registry.get_mut(handle).ok_or(Error::InvalidHandle)?;
        let index = record.index;
        record.report = Report::rest(Backend::LegacyJoystick);
        let Report::Joystick(report) = &record.report else {
            return Err(Error::Internal);
        };
        let report = report.clone();
        if self.joystick.push(index, &report) {
            Ok(())
        } else {
            Err(Error::Bus)
        }
    }
}
