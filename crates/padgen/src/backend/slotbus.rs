// Adapter for the legacy four-slot virtual bus. Plug-in and unplug are
// asynchronous on the kernel side, so both are confirmed with bounded polls
// before the registry record is created or destroyed.

use padgen_driver::{SlotBusError, XPadReport, BUS_SLOTS};

use crate::error::{Error, Result};
use crate::hub::DeviceHub;
use crate::ident::Backend;
use crate::registry::DeviceHandle;
use crate::status::DeviceStatus;

impl DeviceHub {
    pub(crate) fn bus_plug_in(&mut self, index: u8) -> Result<DeviceHandle> {
        let slot = index - 1;
        if self.slot_bus.plugged_in(slot)? {
            return Err(Error::AlreadyAttached);
        }
        self.slot_bus.plug_in(slot)?;

        // The bus reports a LED number only once the device has started.
        let mut led = None;
        for _ in 0..self.poll.attach_retries {
            match self.slot_bus.led_number(slot) {
                Ok(number) => {
                    led = Some(number);
                    break;
                }
                Err(SlotBusError::DeviceNotReady) => {
                    self.clock.sleep(self.poll.attach_interval);
                }
                Err(err) => return Err(err.into()),
            }
        }
        let Some(led) = led else {
            log::warn!("bus slot {index} never became ready");
            return Err(Error::NotReady);
        };

        let handle = self.registry.create(Backend::LegacyBus, index);
        let serial = self.slot_bus.serial(slot).ok();
        if let Some(record) = self.registry.get_mut(handle) {
            record.info.player = led;
            if let Some(serial) = serial {
                record.info.serial = serial;
            }
        }
        log::debug!("plugged bus slot {index}, led {led}");
        Ok(handle)
    }

    /// Plugs the lowest free slot in and reports which one it was.
    pub(crate) fn bus_plug_in_next(&mut self) -> Result<(u8, DeviceHandle)> {
        for index in 1..=BUS_SLOTS {
            if !self.slot_bus.plugged_in(index - 1)? {
                let handle = self.bus_plug_in(index)?;
                return Ok((index, handle));
            }
        }
        Err(Error::AllocationFailed)
    }

    pub(crate) fn bus_unplug(&mut self, index: u8, force: bool) -> Result<()> {
        let slot = index - 1;
        if force {
            if !self.slot_bus.plugged_in(slot)? {
                return Ok(());
            }
            self.slot_bus.unplug_force(slot)?;
        } else {
            if !self.slot_bus.owned(slot)? {
                return Err(Error::NotOwned);
            }
            self.slot_bus.unplug(slot)?;
        }

        for _ in 0..self.poll.detach_retries {
            if !self.slot_bus.plugged_in(slot).unwrap_or(false) {
                break;
            }
            self.clock.sleep(self.poll.detach_interval);
        }
        if self.slot_bus.plugged_in(slot).unwrap_or(false) {
            log::warn!("bus slot {index} never confirmed removal");
            return Err(Error::Timeout);
        }

        if let Some(handle) = self.registry.find(Backend::LegacyBus, index) {
            self.registry.remove(handle);
        }
        log::debug!("unplugged bus slot {index}");
        Ok(())
    }

    pub(crate) fn bus_status(&self, index: u8) -> DeviceStatus {
        let slot = index - 1;
        match self.slot_bus.owned(slot) {
            Ok(true) => return DeviceStatus::Own,
            Ok(false) => {}
            Err(SlotBusError::BusNotConnected) => return DeviceStatus::Miss,
            Err(_) => return DeviceStatus::Unknown,
        }
        match self.slot_bus.plugged_in(slot) {
            Ok(true) => DeviceStatus::Busy,
            Ok(false) => DeviceStatus::Free,
            Err(SlotBusError::BusNotConnected) => DeviceStatus::Miss,
            Err(_) => DeviceStatus::Unknown,
        }
    }

    /// Mutates the mirror report and pushes the whole thing to the bus.
    pub(crate) fn bus_update(
        &mut self,
        handle: DeviceHandle,
        mutate: impl FnOnce(&mut XPadReport),
    ) -> Result<()> {
        let record = self.registry.get_mut(handle).ok_or(Error::InvalidHandle)?;
        let index = record.index;
        let report = record.report.as_xpad_mut()?;
        mutate(report);
        let report = *report;
        self.slot_bus.push(index - 1, &report)?;
        Ok(())
    }
}
