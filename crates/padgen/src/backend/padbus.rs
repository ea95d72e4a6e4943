// Adapter for the generic multi-target virtual gamepad bus. One lazily
// connected client is shared by every target; each record owns at most one
// allocated target object, released when the record is destroyed.

use padgen_driver::{Ds4Report, PadBusError, TargetShape, XPadReport};

use crate::error::{Error, Result};
use crate::hub::DeviceHub;
use crate::ident::Backend;
use crate::registry::DeviceHandle;
use crate::status::DeviceStatus;

impl DeviceHub {
    /// Connects the shared client on first use. An already-open connection
    /// reported by the bus counts as success.
    pub(crate) fn pad_ensure_client(&mut self) -> Result<()> {
        if self.pad_bus.connected() {
            return Ok(());
        }
        match self.pad_bus.connect() {
            Ok(()) | Err(PadBusError::AlreadyConnected) => {
                log::debug!("connected generic bus client");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub(crate) fn pad_attach(&mut self, backend: Backend, index: u8) -> Result<DeviceHandle> {
        let Some(shape) = backend.target_shape() else {
            return Err(Error::InvalidParameter);
        };
        let handle = self.registry.create(backend, index);

        // Stale identity from an earlier attach is rebuilt below.
        let target = {
            let record = self.registry.get_mut(handle).ok_or(Error::Internal)?;
            record.info.player = 0;
            record.info.serial = 0;
            record.target
        };

        let target = match target {
            Some(target) => {
                if self.pad_bus.attached(target) {
                    return Err(Error::AlreadyAttached);
                }
                target
            }
            None => {
                self.pad_ensure_client()?;
                let target = self.pad_bus.create_target(shape)?;
                if let Some(record) = self.registry.get_mut(handle) {
                    record.target = Some(target);
                }
                target
            }
        };

        self.pad_bus.attach(target)?;

        let info = self.pad_bus.target_info(target);
        let player = match shape {
            TargetShape::Xbox => self.pad_bus.player_index(target).ok(),
            TargetShape::Ds4 => None,
        };
        if let Some(record) = self.registry.get_mut(handle) {
            if let Some(info) = info {
                record.info.vendor_id = info.vendor_id;
                record.info.product_id = info.product_id;
                record.info.serial = info.serial;
            }
            if let Some(player) = player {
                record.info.player = player + 1;
            }
        }
        log::debug!("attached {shape:?} target at index {index}");
        Ok(handle)
    }

    /// Detaches the record's target. With `destroy` the record goes away
    /// regardless of the detach outcome, target released with it.
    pub(crate) fn pad_detach(&mut self, handle: DeviceHandle, destroy: bool) -> Result<()> {
        let record = self.registry.get(handle).ok_or(Error::InvalidHandle)?;
        let target = record.target;

        let result = match target {
            Some(target) if self.pad_bus.attached(target) => {
                self.pad_bus.detach(target).map_err(Error::from)
            }
            _ => Err(Error::NotConnected),
        };

        if destroy {
            self.destroy_record(handle);
        }
        result
    }

    pub(crate) fn pad_status(&mut self, backend: Backend, index: u8) -> DeviceStatus {
        if self.pad_ensure_client().is_err() {
            return DeviceStatus::Miss;
        }
        let attached = self
            .registry
            .find(backend, index)
            .and_then(|handle| self.registry.get(handle))
            .and_then(|record| record.target)
            .is_some_and(|target| self.pad_bus.attached(target));
        if attached {
            DeviceStatus::Own
        } else {
            DeviceStatus::Free
        }
    }

    /// Mutates an Xbox-shaped report and pushes it to the record's target.
    pub(crate) fn pad_update_xpad(
        &mut self,
        handle: DeviceHandle,
        mutate: impl FnOnce(&mut XPadReport),
    ) -> Result<()> {
        let record = self.registry.get_mut(handle).ok_or(Error::InvalidHandle)?;
        let target = record.target.ok_or(Error::NotConnected)?;
        let report = record.report.as_xpad_mut()?;
        mutate(report);
        let report = *report;
        self.pad_bus.push_xpad(target, &report)?;
        Ok(())
    }

    /// Mutates a DualShock-shaped report and pushes it to the record's
    /// target.
    pub(crate) fn pad_update_ds4(
        &mut self,
        handle: DeviceHandle,
        mutate: impl FnOnce(&mut Ds4Report),
    ) -> Result<()> {
        let record = self.registry.get_mut(handle).ok_or(Error::InvalidHandle)?;
        let target = record.target.ok_or(Error::NotConnected)?;
        let report = record.report.as_ds4_mut()?;
        mutate(report);
        let report = *report;
        self.pad_bus.push_ds4(target, &report)?;
        Ok(())
    }
}
