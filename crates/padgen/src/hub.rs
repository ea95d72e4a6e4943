use std::sync::atomic::{AtomicBool, Ordering};

use padgen_driver::{AxisUsage, Ds4Dpad, JoystickDriver, PadBus, SlotBus, Vibration};

use crate::axis;
use crate::buttons::{self, Ds4Button, DS4_BUTTON_COUNT, XPAD_BUTTON_COUNT};
use crate::clock::{Clock, PollSettings, SystemClock};
use crate::device::{DeviceInfo, Report};
use crate::error::{Error, Result};
use crate::ident::{resolve_ranged, Backend};
use crate::pov::{direction_from_hundredths, hundredths_from_degrees, PovDirection};
use crate::registry::{DeviceHandle, DeviceRegistry};
use crate::status::{DeviceStatus, PovKind};

/// The unified facade: one injectable context owning the device registry,
/// the three backend driver clients, and the shared generic-bus connection.
/// Every operation resolves its device reference here and dispatches to the
/// backend adapter for the record's tag.
///
/// Administration calls take `&mut self`; callers serialize them. There is
/// no internal locking.
pub struct DeviceHub {
    pub(crate) registry: DeviceRegistry,
    pub(crate) joystick: Box<dyn JoystickDriver>,
    pub(crate) slot_bus: Box<dyn SlotBus>,
    pub(crate) pad_bus: Box<dyn PadBus>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) poll: PollSettings,
    shutting_down: AtomicBool,
}

impl DeviceHub {
    pub fn new(
        joystick: Box<dyn JoystickDriver>,
        slot_bus: Box<dyn SlotBus>,
        pad_bus: Box<dyn PadBus>,
    ) -> Self {
        Self {
            registry: DeviceRegistry::new(),
            joystick,
            slot_bus,
            pad_bus,
            clock: Box::new(SystemClock),
            poll: PollSettings::default(),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Replaces the sleep source used by the confirmation polls.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the bounded-retry budgets of the confirmation polls.
    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Number of live device records.
    pub fn device_count(&self) -> usize {
        self.registry.len()
    }

    // ---- lifecycle ------------------------------------------------------

    /// Creates or attaches the device at a backend address and returns its
    /// handle. Acquiring a device this hub already holds returns the
    /// existing handle for the joystick backend and `AlreadyAttached` for
    /// the bus backends, mirroring what the drivers themselves allow.
    pub fn acquire(&mut self, backend: Backend, index: u8) -> Result<DeviceHandle> {
        if !backend.holds_index(index) {
            return Err(Error::InvalidParameter);
        }
        match backend {
            Backend::LegacyJoystick => self.joy_acquire(index),
            Backend::LegacyBus => self.bus_plug_in(index),
            Backend::GenericXbox | Backend::GenericDs4 => self.pad_attach(backend, index),
        }
    }

    /// Releases a device and destroys its record. Unconfirmed legacy-bus
    /// removals keep the record and report `Timeout`; the caller must
    /// re-query.
    pub fn relinquish(&mut self, handle: DeviceHandle) -> Result<()> {
        let (backend, index) = self.record_meta(handle)?;
        match backend {
            Backend::LegacyJoystick => self.joy_relinquish(handle),
            Backend::LegacyBus => self.bus_unplug(index, false),
            Backend::GenericXbox | Backend::GenericDs4 => self.pad_detach(handle, true),
        }
    }

    /// Unplugs a legacy-bus slot this hub owns, by slot index.
    pub fn unplug_slot(&mut self, index: u8) -> Result<()> {
        if !Backend::LegacyBus.holds_index(index) {
            return Err(Error::InvalidParameter);
        }
        self.bus_unplug(index, false)
    }

    /// Unplugs a legacy-bus slot regardless of which process owns it. An
    /// absent device counts as success.
    pub fn unplug_slot_force(&mut self, index: u8) -> Result<()> {
        if !Backend::LegacyBus.holds_index(index) {
            return Err(Error::InvalidParameter);
        }
        self.bus_unplug(index, true)
    }

    /// Plugs the lowest free legacy-bus slot in.
    pub fn plug_in_next(&mut self) -> Result<(u8, DeviceHandle)> {
        self.bus_plug_in_next()
    }

    /// Destroys a record without talking the polite path: detaches and
    /// frees a live target if one exists, then drops the record.
    pub(crate) fn destroy_record(&mut self, handle: DeviceHandle) {
        if let Some(record) = self.registry.remove(handle) {
            if let Some(target) = record.target {
                if self.pad_bus.attached(target) {
                    let _ = self.pad_bus.detach(target);
                }
                self.pad_bus.release_target(target);
            }
        }
    }

    /// Tears everything down: snapshots all live handles, relinquishes each
    /// (falling back to force-destruction), then drops the shared
    /// generic-bus connection. Idempotent; a call while one is already in
    /// progress is a no-op.
    pub fn shutdown(&mut self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            return;
        }
        log::debug!("shutting down, {} live devices", self.registry.len());
        for handle in self.registry.handles() {
            if let Err(err) = self.relinquish(handle) {
                log::warn!("relinquish failed during shutdown ({err}), forcing");
                self.destroy_record(handle);
            }
        }
        if self.pad_bus.connected() {
            self.pad_bus.disconnect();
        }
        self.shutting_down.store(false, Ordering::SeqCst);
    }

    // ---- status and identity --------------------------------------------

    /// Unified status of the device behind a handle. A stale handle reads
    /// as missing.
    pub fn status(&mut self, handle: DeviceHandle) -> DeviceStatus {
        let Some(record) = self.registry.get(handle) else {
            return DeviceStatus::Miss;
        };
        let (backend, index, target) = (record.backend, record.index, record.target);
        match backend {
            Backend::LegacyJoystick => self.joystick.ownership(index).into(),
            Backend::LegacyBus => self.bus_status(index),
            Backend::GenericXbox | Backend::GenericDs4 => {
                if self.pad_ensure_client().is_err() {
                    return DeviceStatus::Miss;
                }
                if target.is_some_and(|t| self.pad_bus.attached(t)) {
                    DeviceStatus::Own
                } else {
                    DeviceStatus::Free
                }
            }
        }
    }

    /// Unified status of a backend address, record or no record.
    pub fn status_of(&mut self, backend: Backend, index: u8) -> DeviceStatus {
        if !backend.holds_index(index) {
            return DeviceStatus::Miss;
        }
        match backend {
            Backend::LegacyJoystick => self.joystick.ownership(index).into(),
            Backend::LegacyBus => self.bus_status(index),
            Backend::GenericXbox | Backend::GenericDs4 => self.pad_status(backend, index),
        }
    }

    /// Whether this hub holds the device at an address.
    pub fn owned(&self, backend: Backend, index: u8) -> Result<bool> {
        if !backend.holds_index(index) {
            return Ok(false);
        }
        match backend {
            Backend::LegacyJoystick => Ok(matches!(
                self.joystick.ownership(index),
                padgen_driver::JoyOwnership::Owned
            )),
            Backend::LegacyBus => Ok(self.slot_bus.owned(index - 1)?),
            Backend::GenericXbox | Backend::GenericDs4 => Ok(self
                .registry
                .find(backend, index)
                .and_then(|handle| self.registry.get(handle))
                .and_then(|record| record.target)
                .is_some_and(|target| self.pad_bus.attached(target))),
        }
    }

    /// Whether any process has the device at an address. The generic bus
    /// cannot see third-party devices, so only our own attachment counts
    /// there.
    pub fn exists(&self, backend: Backend, index: u8) -> Result<bool> {
        if !backend.holds_index(index) {
            return Ok(false);
        }
        match backend {
            Backend::LegacyJoystick => Ok(self.joystick.exists(index)),
            Backend::LegacyBus => Ok(self.slot_bus.plugged_in(index - 1)?),
            Backend::GenericXbox | Backend::GenericDs4 => self.owned(backend, index),
        }
    }

    /// Whether the address is claimable by this hub.
    pub fn free(&self, backend: Backend, index: u8) -> Result<bool> {
        match backend {
            Backend::LegacyJoystick => Ok(matches!(
                self.joystick.ownership(index),
                padgen_driver::JoyOwnership::Free
            )),
            _ => Ok(!self.exists(backend, index)?),
        }
    }

    /// Recovers the live handle for an address. If the record exists but
    /// the backend no longer reports the device as ours, the stale record
    /// is destroyed and the device reported removed.
    pub fn handle_of(&mut self, backend: Backend, index: u8) -> Result<DeviceHandle> {
        let handle = self.registry.find(backend, index).ok_or(Error::NotFound)?;
        if self.owned(backend, index)? {
            Ok(handle)
        } else {
            self.destroy_record(handle);
            Err(Error::Removed)
        }
    }

    /// Identity read back from the backend at attach time.
    pub fn device_info(&self, handle: DeviceHandle) -> Result<DeviceInfo> {
        self.registry
            .get(handle)
            .map(|record| record.info)
            .ok_or(Error::InvalidHandle)
    }

    /// Snapshot of the device's position in its backend's native layout.
    /// Joystick positions are refreshed from the driver first, since that
    /// backend keeps its own state engine.
    pub fn report(&mut self, handle: DeviceHandle) -> Result<Report> {
        let record = self.registry.get(handle).ok_or(Error::InvalidHandle)?;
        if record.backend == Backend::LegacyJoystick {
            let index = record.index;
            if let Some(position) = self.joystick.position(index) {
                if let Some(record) = self.registry.get_mut(handle) {
                    record.report = Report::Joystick(position);
                }
            }
        }
        self.registry
            .get(handle)
            .map(|record| record.report.clone())
            .ok_or(Error::InvalidHandle)
    }

    /// Player-facing device number: the joystick slot id, the bus LED
    /// number, the Xbox player index, or the DualShock serial.
    pub fn player_number(&mut self, handle: DeviceHandle) -> Result<u32> {
        let (backend, index) = self.record_meta(handle)?;
        if !self.owned(backend, index)? {
            return Err(Error::Removed);
        }
        match backend {
            Backend::LegacyJoystick => Ok(u32::from(index)),
            Backend::LegacyBus => Ok(u32::from(self.slot_bus.led_number(index - 1)?)),
            Backend::GenericXbox => self
                .registry
                .get(handle)
                .map(|record| u32::from(record.info.player))
                .ok_or(Error::InvalidHandle),
            Backend::GenericDs4 => self
                .registry
                .get(handle)
                .map(|record| record.info.serial)
                .ok_or(Error::InvalidHandle),
        }
    }

    /// Feedback motor state of a legacy-bus device.
    pub fn vibration(&self, handle: DeviceHandle) -> Result<Vibration> {
        let record = self.registry.get(handle).ok_or(Error::InvalidHandle)?;
        if record.backend != Backend::LegacyBus {
            return Err(Error::Unsupported);
        }
        Ok(self.slot_bus.vibration(record.index - 1)?)
    }

    // ---- capability queries ---------------------------------------------

    /// Whether a device exposes an axis usage. The gamepad shapes have the
    /// four stick axes, the two triggers, and the pov as a pseudo-axis.
    pub fn axis_exists(&self, handle: DeviceHandle, usage: AxisUsage) -> Result<bool> {
        let record = self.registry.get(handle).ok_or(Error::InvalidHandle)?;
        match record.backend {
            Backend::LegacyJoystick => Ok(self.joystick.axis_exists(record.index, usage)),
            _ => Ok(usage.is_stick() || usage.is_trigger() || usage == AxisUsage::Pov),
        }
    }

    /// Logical range of an axis in the canonical domain used by
    /// [`set_axis`](Self::set_axis).
    pub fn axis_range(&self, handle: DeviceHandle, usage: AxisUsage) -> Result<(i32, i32)> {
        let record = self.registry.get(handle).ok_or(Error::InvalidHandle)?;
        match record.backend {
            Backend::LegacyJoystick => {
                let min = self.joystick.axis_min(record.index, usage);
                let max = self.joystick.axis_max(record.index, usage);
                match (min, max) {
                    (Some(min), Some(max)) => Ok((min, max)),
                    _ => Err(Error::InvalidParameter),
                }
            }
            _ => Ok(match usage {
                AxisUsage::Pov => (0, 35900),
                _ => (0, 32767),
            }),
        }
    }

    /// Number of addressable buttons on the device.
    pub fn button_count(&self, handle: DeviceHandle) -> Result<u8> {
        let record = self.registry.get(handle).ok_or(Error::InvalidHandle)?;
        Ok(match record.backend {
            Backend::LegacyJoystick => self.joystick.button_count(record.index),
            Backend::LegacyBus | Backend::GenericXbox => XPAD_BUTTON_COUNT,
            Backend::GenericDs4 => DS4_BUTTON_COUNT,
        })
    }

    /// Number of hats of a kind. Gamepad shapes always have exactly one.
    pub fn hat_count(&self, handle: DeviceHandle, kind: PovKind) -> Result<u8> {
        let record = self.registry.get(handle).ok_or(Error::InvalidHandle)?;
        Ok(match record.backend {
            Backend::LegacyJoystick => {
                let index = record.index;
                match kind {
                    PovKind::Discrete => self.joystick.disc_pov_count(index),
                    PovKind::Continuous => self.joystick.cont_pov_count(index),
                    PovKind::Any => {
                        self.joystick.disc_pov_count(index)
                            + self.joystick.cont_pov_count(index)
                    }
                }
            }
            _ => 1,
        })
    }

    /// Whether a backend mechanism is reachable at all.
    pub fn backend_supported(&mut self, backend: Backend) -> bool {
        match backend {
            Backend::LegacyJoystick => self.joystick.enabled(),
            Backend::LegacyBus => self.slot_bus.bus_version().is_ok(),
            Backend::GenericXbox | Backend::GenericDs4 => self.pad_ensure_client().is_ok(),
        }
    }

    /// Version word of a backend's driver, zero when unreachable.
    pub fn driver_version(&mut self, backend: Backend) -> u32 {
        match backend {
            Backend::LegacyJoystick => u32::from(self.joystick.version()),
            Backend::LegacyBus => self.slot_bus.bus_version().unwrap_or(0),
            Backend::GenericXbox | Backend::GenericDs4 => self.pad_bus.bus_version(),
        }
    }

    /// Free slots left on the legacy bus.
    pub fn empty_bus_slots(&self) -> Result<u8> {
        Ok(self.slot_bus.empty_slots()?)
    }

    // ---- position setters -----------------------------------------------

    /// Presses or releases a 1-based button. Gamepad shapes resolve the
    /// index through their fixed mask tables; the joystick driver checks it
    /// against the slot's configured button count.
    pub fn set_button(&mut self, handle: DeviceHandle, button: u8, pressed: bool) -> Result<()> {
        let (backend, index) = self.record_meta(handle)?;
        match backend {
            Backend::LegacyJoystick => self.joy_set_button(index, button, pressed),
            Backend::LegacyBus => {
                let mask = buttons::xpad_mask(button).ok_or(Error::InvalidParameter)?;
                self.bus_update(handle, |report| {
                    buttons::apply_mask(&mut report.buttons, mask, pressed);
                })
            }
            Backend::GenericXbox => {
                let mask = buttons::xpad_mask(button).ok_or(Error::InvalidParameter)?;
                self.pad_update_xpad(handle, |report| {
                    buttons::apply_mask(&mut report.buttons, mask, pressed);
                })
            }
            Backend::GenericDs4 => match buttons::ds4_button(button)
                .ok_or(Error::InvalidParameter)?
            {
                Ds4Button::Word(mask) => self.pad_update_ds4(handle, |report| {
                    buttons::apply_mask(&mut report.buttons, mask, pressed);
                }),
                Ds4Button::Special(bit) => self.pad_update_ds4(handle, |report| {
                    if pressed {
                        report.special |= bit;
                    } else {
                        report.special &= !bit;
                    }
                }),
                Ds4Button::Dpad(direction) => self.pad_update_ds4(handle, |report| {
                    let value = if pressed { direction } else { Ds4Dpad::None };
                    value.write(&mut report.buttons);
                }),
            },
        }
    }

    /// Writes an axis in the canonical 0..=32767 domain, rescaled to the
    /// backend's native range (triggers to bytes, sticks to signed words,
    /// DualShock to bytes with vertical axes mirrored). The joystick driver
    /// takes canonical values natively.
    pub fn set_axis(&mut self, handle: DeviceHandle, usage: AxisUsage, value: i32) -> Result<()> {
        let (backend, index) = self.record_meta(handle)?;
        match backend {
            Backend::LegacyJoystick => self.joy_set_axis(index, usage, value),
            Backend::LegacyBus | Backend::GenericXbox => {
                if !usage.is_stick() && !usage.is_trigger() {
                    return Err(Error::InvalidParameter);
                }
                let trigger = axis::trigger_byte(value);
                let stick = axis::stick_word(value);
                let write =
                    move |report: &mut _| axis::write_xpad_axis(report, usage, trigger, stick);
                if backend == Backend::LegacyBus {
                    self.bus_update(handle, write)
                } else {
                    self.pad_update_xpad(handle, write)
                }
            }
            Backend::GenericDs4 => {
                if !usage.is_stick() && !usage.is_trigger() {
                    return Err(Error::InvalidParameter);
                }
                let byte = axis::ds4_byte(value, usage.is_vertical());
                self.pad_update_ds4(handle, |report| axis::write_ds4_axis(report, usage, byte))
            }
        }
    }

    /// Writes an axis as a percentage (0-100) of its native range, without
    /// going through the canonical domain.
    pub fn set_axis_pct(&mut self, handle: DeviceHandle, usage: AxisUsage, pct: f32) -> Result<()> {
        let (backend, index) = self.record_meta(handle)?;
        match backend {
            Backend::LegacyJoystick => self.joy_set_axis(index, usage, axis::pct_joystick(pct)),
            Backend::LegacyBus | Backend::GenericXbox => {
                if !usage.is_stick() && !usage.is_trigger() {
                    return Err(Error::InvalidParameter);
                }
                let trigger = axis::pct_trigger_byte(pct);
                let stick = axis::pct_stick_word(pct);
                let write =
                    move |report: &mut _| axis::write_xpad_axis(report, usage, trigger, stick);
                if backend == Backend::LegacyBus {
                    self.bus_update(handle, write)
                } else {
                    self.pad_update_xpad(handle, write)
                }
            }
            Backend::GenericDs4 => {
                if !usage.is_stick() && !usage.is_trigger() {
                    return Err(Error::InvalidParameter);
                }
                let byte = axis::pct_ds4_byte(pct, usage.is_vertical());
                self.pad_update_ds4(handle, |report| axis::write_ds4_axis(report, usage, byte))
            }
        }
    }

    /// Sets a discrete eight-way heading. Gamepad shapes have exactly one
    /// hat; the joystick driver is handed its native discrete value.
    pub fn set_disc_pov(
        &mut self,
        handle: DeviceHandle,
        pov: u8,
        direction: PovDirection,
    ) -> Result<()> {
        let (backend, index) = self.record_meta(handle)?;
        match backend {
            Backend::LegacyJoystick => {
                self.joy_set_disc_pov(index, pov, direction.disc_value())
            }
            _ => self.set_pad_direction(handle, backend, pov, direction),
        }
    }

    /// Sets a continuous hat in hundredths of a degree (-1 = centered).
    /// Gamepad shapes quantize into the eight-sector mapping.
    pub fn set_cont_pov(&mut self, handle: DeviceHandle, pov: u8, value: i32) -> Result<()> {
        let (backend, index) = self.record_meta(handle)?;
        match backend {
            Backend::LegacyJoystick => self.joy_set_cont_pov(index, pov, value),
            _ => self.set_pad_direction(handle, backend, pov, direction_from_hundredths(value)),
        }
    }

    /// Continuous-or-discrete hat write: joystick hats try the continuous
    /// engine first and fall back to the four cardinal points.
    pub fn set_pov(&mut self, handle: DeviceHandle, pov: u8, value: i32) -> Result<()> {
        let (backend, index) = self.record_meta(handle)?;
        match backend {
            Backend::LegacyJoystick => self.joy_set_pov(index, pov, value),
            _ => self.set_pad_direction(handle, backend, pov, direction_from_hundredths(value)),
        }
    }

    /// Degrees variant of [`set_pov`](Self::set_pov); negative centers.
    pub fn set_pov_deg(&mut self, handle: DeviceHandle, pov: u8, degrees: f32) -> Result<()> {
        self.set_pov(handle, pov, hundredths_from_degrees(degrees))
    }

    fn set_pad_direction(
        &mut self,
        handle: DeviceHandle,
        backend: Backend,
        pov: u8,
        direction: PovDirection,
    ) -> Result<()> {
        if pov != 1 {
            return Err(Error::InvalidParameter);
        }
        match backend {
            Backend::LegacyBus => self.bus_update(handle, |report| {
                report.buttons = (report.buttons & !padgen_driver::xbuttons::DPAD_MASK)
                    | direction.xpad_mask();
            }),
            Backend::GenericXbox => self.pad_update_xpad(handle, |report| {
                report.buttons = (report.buttons & !padgen_driver::xbuttons::DPAD_MASK)
                    | direction.xpad_mask();
            }),
            Backend::GenericDs4 => self.pad_update_ds4(handle, |report| {
                direction.ds4().write(&mut report.buttons);
            }),
            Backend::LegacyJoystick => Err(Error::Internal),
        }
    }

    // ---- resets ---------------------------------------------------------

    /// Re-zeroes the whole device: axes centered, pads released, buttons
    /// cleared, and the rest state pushed to the backend.
    pub fn reset(&mut self, handle: DeviceHandle) -> Result<()> {
        let (backend, _) = self.record_meta(handle)?;
        match backend {
            Backend::LegacyJoystick => self.joy_reset(handle),
            Backend::LegacyBus => {
                self.bus_update(handle, |report| *report = Default::default())
            }
            Backend::GenericXbox => {
                self.pad_update_xpad(handle, |report| *report = Default::default())
            }
            Backend::GenericDs4 => {
                self.pad_update_ds4(handle, |report| *report = padgen_driver::Ds4Report::centered())
            }
        }
    }

    /// Clears the buttons while leaving the directional pad alone.
    pub fn reset_buttons(&mut self, handle: DeviceHandle) -> Result<()> {
        let (backend, index) = self.record_meta(handle)?;
        match backend {
            Backend::LegacyJoystick => {
                if self.joystick.reset_buttons(index) {
                    Ok(())
                } else {
                    Err(Error::Bus)
                }
            }
            Backend::LegacyBus => self.bus_update(handle, |report| {
                report.buttons &= padgen_driver::xbuttons::DPAD_MASK;
            }),
            Backend::GenericXbox => self.pad_update_xpad(handle, |report| {
                report.buttons &= padgen_driver::xbuttons::DPAD_MASK;
            }),
            Backend::GenericDs4 => self.pad_update_ds4(handle, |report| {
                report.buttons &= 0x000F;
                report.special = 0;
            }),
        }
    }

    /// Releases the directional pad / hats while leaving buttons alone.
    pub fn reset_povs(&mut self, handle: DeviceHandle) -> Result<()> {
        let (backend, index) = self.record_meta(handle)?;
        match backend {
            Backend::LegacyJoystick => {
                if self.joystick.reset_povs(index) {
                    Ok(())
                } else {
                    Err(Error::Bus)
                }
            }
            Backend::LegacyBus => self.bus_update(handle, |report| {
                report.buttons &= !padgen_driver::xbuttons::DPAD_MASK;
            }),
            Backend::GenericXbox => self.pad_update_xpad(handle, |report| {
                report.buttons &= !padgen_driver::xbuttons::DPAD_MASK;
            }),
            Backend::GenericDs4 => self.pad_update_ds4(handle, |report| {
                Ds4Dpad::None.write(&mut report.buttons);
            }),
        }
    }

    // ---- legacy ranged-ID compatibility layer ---------------------------

    /// Acquires a device by its legacy flat numeric identifier.
    pub fn acquire_ranged(&mut self, id: u32) -> Result<DeviceHandle> {
        let (backend, index) = resolve_ranged(id).ok_or(Error::InvalidParameter)?;
        self.acquire(backend, index)
    }

    /// Relinquishes a device by its legacy identifier.
    pub fn relinquish_ranged(&mut self, id: u32) -> Result<()> {
        let (backend, index) = resolve_ranged(id).ok_or(Error::InvalidParameter)?;
        let handle = self.registry.find(backend, index).ok_or(Error::InvalidHandle)?;
        self.relinquish(handle)
    }

    /// Status by legacy identifier; unknown identifiers read as missing.
    pub fn status_ranged(&mut self, id: u32) -> DeviceStatus {
        match resolve_ranged(id) {
            Some((backend, index)) => self.status_of(backend, index),
            None => DeviceStatus::Miss,
        }
    }

    /// Existence by legacy identifier; unknown identifiers do not exist.
    pub fn exists_ranged(&self, id: u32) -> bool {
        match resolve_ranged(id) {
            Some((backend, index)) => self.exists(backend, index).unwrap_or(false),
            None => false,
        }
    }

    /// Canonical-domain axis write by legacy identifier.
    pub fn set_axis_ranged(&mut self, id: u32, usage: AxisUsage, value: i32) -> Result<()> {
        let (backend, index) = resolve_ranged(id).ok_or(Error::InvalidParameter)?;
        match backend {
            Backend::LegacyJoystick => self.joy_set_axis(index, usage, value),
            _ => {
                let handle = self.registry.find(backend, index).ok_or(Error::InvalidHandle)?;
                self.set_axis(handle, usage, value)
            }
        }
    }

    /// Button write by legacy identifier.
    pub fn set_button_ranged(&mut self, id: u32, button: u8, pressed: bool) -> Result<()> {
        let (backend, index) = resolve_ranged(id).ok_or(Error::InvalidParameter)?;
        match backend {
            Backend::LegacyJoystick => self.joy_set_button(index, button, pressed),
            _ => {
                let handle = self.registry.find(backend, index).ok_or(Error::InvalidHandle)?;
                self.set_button(handle, button, pressed)
            }
        }
    }

    /// Discrete hat write by legacy identifier.
    pub fn set_disc_pov_ranged(
        &mut self,
        id: u32,
        pov: u8,
        direction: PovDirection,
    ) -> Result<()> {
        let (backend, index) = resolve_ranged(id).ok_or(Error::InvalidParameter)?;
        match backend {
            Backend::LegacyJoystick => self.joy_set_disc_pov(index, pov, direction.disc_value()),
            _ => {
                let handle = self.registry.find(backend, index).ok_or(Error::InvalidHandle)?;
                self.set_disc_pov(handle, pov, direction)
            }
        }
    }

    /// Continuous hat write by legacy identifier.
    pub fn set_cont_pov_ranged(&mut self, id: u32, pov: u8, value: i32) -> Result<()> {
        let (backend, index) = resolve_ranged(id).ok_or(Error::InvalidParameter)?;
        match backend {
            Backend::LegacyJoystick => self.joy_set_cont_pov(index, pov, value),
            _ => {
                let handle = self.registry.find(backend, index).ok_or(Error::InvalidHandle)?;
                self.set_cont_pov(handle, pov, value)
            }
        }
    }

    /// Whole-device reset by legacy identifier. The joystick backend is
    /// reset by its driver here rather than through the mirror report.
    pub fn reset_ranged(&mut self, id: u32) -> Result<()> {
        let (backend, index) = resolve_ranged(id).ok_or(Error::InvalidParameter)?;
        match backend {
            Backend::LegacyJoystick => {
                if self.joystick.reset(index) {
                    Ok(())
                } else {
                    Err(Error::Bus)
                }
            }
            _ => {
                let handle = self.registry.find(backend, index).ok_or(Error::InvalidHandle)?;
                self.reset(handle)
            }
        }
    }

    /// Button count by legacy identifier; unknown identifiers have none.
    pub fn button_count_ranged(&self, id: u32) -> u8 {
        match resolve_ranged(id) {
            Some((Backend::LegacyJoystick, index)) => self.joystick.button_count(index),
            Some((Backend::LegacyBus | Backend::GenericXbox, _)) => XPAD_BUTTON_COUNT,
            Some((Backend::GenericDs4, _)) => DS4_BUTTON_COUNT,
            None => 0,
        }
    }

    /// Axis range by legacy identifier, in the canonical domain.
    pub fn axis_range_ranged(&self, id: u32, usage: AxisUsage) -> Option<(i32, i32)> {
        match resolve_ranged(id)? {
            (Backend::LegacyJoystick, index) => {
                let min = self.joystick.axis_min(index, usage)?;
                let max = self.joystick.axis_max(index, usage)?;
                Some((min, max))
            }
            _ => Some(match usage {
                AxisUsage::Pov => (0, 35900),
                _ => (0, 32767),
            }),
        }
    }

    // ---- helpers --------------------------------------------------------

    pub(crate) fn record_meta(&self, handle: DeviceHandle) -> Result<(Backend, u8)> {
        self.registry
            .get(handle)
            .map(|record| (record.backend, record.index))
            .ok_or(Error::InvalidHandle)
    }
}

impl Drop for DeviceHub {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::sync::Arc;
    use std::time::Duration;

    use padgen_driver::loopback::{LoopbackJoystick, LoopbackPadBus, LoopbackSlotBus};
    use padgen_driver::{ds4special, xbuttons, Ds4Dpad, JoyOwnership, SlotBus, TargetId};

    use super::*;

    struct NullClock;

    impl Clock for NullClock {
        fn sleep(&self, _duration: Duration) {}
    }

    struct CountingClock(Arc<AtomicU32>);

    impl Clock for CountingClock {
        fn sleep(&self, _duration: Duration) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn test_poll() -> PollSettings {
        PollSettings {
            attach_retries: 16,
            attach_interval: Duration::ZERO,
            detach_retries: 16,
            detach_interval: Duration::ZERO,
        }
    }

    fn hub_with(
        joy: &LoopbackJoystick,
        bus: &LoopbackSlotBus,
        pad: &LoopbackPadBus,
    ) -> DeviceHub {
        DeviceHub::new(
            Box::new(joy.clone()),
            Box::new(bus.clone()),
            Box::new(pad.clone()),
        )
        .with_poll_settings(test_poll())
        .with_clock(Box::new(NullClock))
    }

    fn default_hub() -> (DeviceHub, LoopbackJoystick, LoopbackSlotBus, LoopbackPadBus) {
        let joy = LoopbackJoystick::new();
        let bus = LoopbackSlotBus::new();
        let pad = LoopbackPadBus::new();
        let hub = hub_with(&joy, &bus, &pad);
        (hub, joy, bus, pad)
    }

    #[test]
    fn xbox_lifecycle_end_to_end() {
        let (mut hub, _joy, _bus, pad) = default_hub();

        let handle = hub.acquire(Backend::GenericXbox, 1).unwrap();
        assert_eq!(hub.status(handle), DeviceStatus::Own);

        hub.set_button(handle, 1, true).unwrap();
        let Report::XPad(report) = hub.report(handle).unwrap() else {
            panic!("xbox device must carry an xpad report");
        };
        assert_ne!(report.buttons & xbuttons::A, 0);
        // The same report must have reached the bus target.
        assert_eq!(pad.xpad_report(TargetId(1)).unwrap().buttons, report.buttons);

        hub.relinquish(handle).unwrap();
        assert_eq!(hub.status(handle), DeviceStatus::Miss);
        assert_eq!(hub.status_of(Backend::GenericXbox, 1), DeviceStatus::Free);
        assert_eq!(hub.device_count(), 0);
        assert_eq!(pad.live_targets(), 0);
    }

    #[test]
    fn joystick_acquire_is_idempotent() {
        let (mut hub, _joy, _bus, _pad) = default_hub();
        let first = hub.acquire(Backend::LegacyJoystick, 3).unwrap();
        let second = hub.acquire(Backend::LegacyJoystick, 3).unwrap();
        assert_eq!(first, second);
        assert_eq!(hub.device_count(), 1);
    }

    #[test]
    fn reacquiring_an_attached_device_fails() {
        let (mut hub, _joy, _bus, _pad) = default_hub();
        hub.acquire(Backend::GenericDs4, 2).unwrap();
        assert_eq!(
            hub.acquire(Backend::GenericDs4, 2),
            Err(Error::AlreadyAttached)
        );
    }

    #[test]
    fn bus_plug_in_polls_until_ready_and_records_identity() {
        let joy = LoopbackJoystick::new();
        let bus = LoopbackSlotBus::new();
        let pad = LoopbackPadBus::new();
        bus.set_settle_polls(3);
        let sleeps = Arc::new(AtomicU32::new(0));
        let mut hub = DeviceHub::new(
            Box::new(joy),
            Box::new(bus.clone()),
            Box::new(pad),
        )
        .with_poll_settings(test_poll())
        .with_clock(Box::new(CountingClock(sleeps.clone())));

        let handle = hub.acquire(Backend::LegacyBus, 1).unwrap();
        let info = hub.device_info(handle).unwrap();
        assert_eq!(info.player, 1);
        assert_ne!(info.serial, 0);
        assert_eq!(sleeps.load(Ordering::Relaxed), 3);
        assert_eq!(hub.status(handle), DeviceStatus::Own);
    }

    #[test]
    fn bus_plug_in_gives_up_on_a_device_that_never_starts() {
        let (mut hub, _joy, bus, _pad) = default_hub();
        bus.set_settle_polls(u32::MAX);
        assert_eq!(hub.acquire(Backend::LegacyBus, 1), Err(Error::NotReady));
        assert_eq!(hub.device_count(), 0);
    }

    #[test]
    fn unplug_refuses_a_slot_owned_elsewhere() {
        let (mut hub, _joy, bus, _pad) = default_hub();
        bus.occupy(0);
        assert_eq!(hub.unplug_slot(1), Err(Error::NotOwned));
        assert_eq!(hub.status_of(Backend::LegacyBus, 1), DeviceStatus::Busy);
        // Force-unplug skips the ownership check.
        hub.unplug_slot_force(1).unwrap();
        assert_eq!(hub.status_of(Backend::LegacyBus, 1), DeviceStatus::Free);
    }

    #[test]
    fn unconfirmed_removal_times_out_and_keeps_the_record() {
        let (mut hub, _joy, bus, _pad) = default_hub();
        let handle = hub.acquire(Backend::LegacyBus, 2).unwrap();
        bus.set_stuck_unplug(true);
        assert_eq!(hub.relinquish(handle), Err(Error::Timeout));
        assert_eq!(hub.status(handle), DeviceStatus::Own);
        assert_eq!(hub.device_count(), 1);
        bus.set_stuck_unplug(false);
    }

    #[test]
    fn plug_in_next_picks_the_lowest_free_slot() {
        let (mut hub, _joy, bus, _pad) = default_hub();
        bus.occupy(0);
        let (index, handle) = hub.plug_in_next().unwrap();
        assert_eq!(index, 2);
        assert_eq!(hub.status(handle), DeviceStatus::Own);
    }

    #[test]
    fn ds4_buttons_route_to_word_special_and_dpad() {
        let (mut hub, _joy, _bus, pad) = default_hub();
        let handle = hub.acquire(Backend::GenericDs4, 1).unwrap();

        hub.set_button(handle, 1, true).unwrap();
        hub.set_button(handle, 22, true).unwrap();
        hub.set_button(handle, 12, true).unwrap();
        let report = pad.ds4_report(TargetId(1)).unwrap();
        assert_ne!(report.buttons & padgen_driver::ds4buttons::CROSS, 0);
        assert_ne!(report.special & ds4special::TOUCHPAD, 0);
        assert_eq!(Ds4Dpad::read(report.buttons), Ds4Dpad::North as u16);

        hub.set_button(handle, 12, false).unwrap();
        let report = pad.ds4_report(TargetId(1)).unwrap();
        assert_eq!(Ds4Dpad::read(report.buttons), Ds4Dpad::None as u16);
        assert_ne!(report.buttons & padgen_driver::ds4buttons::CROSS, 0);
    }

    #[test]
    fn ds4_vertical_axes_are_mirrored() {
        let (mut hub, _joy, _bus, pad) = default_hub();
        let handle = hub.acquire(Backend::GenericDs4, 1).unwrap();
        hub.set_axis(handle, AxisUsage::LEFT_X, 32767).unwrap();
        hub.set_axis(handle, AxisUsage::LEFT_Y, 32767).unwrap();
        let report = pad.ds4_report(TargetId(1)).unwrap();
        assert_eq!(report.thumb_lx, 255);
        assert_eq!(report.thumb_ly, 0);
    }

    #[test]
    fn canonical_axis_values_map_to_native_extremes() {
        let (mut hub, _joy, bus, _pad) = default_hub();
        let handle = hub.acquire(Backend::LegacyBus, 1).unwrap();

        hub.set_axis(handle, AxisUsage::LEFT_X, 16384).unwrap();
        assert_eq!(bus.report(0).unwrap().thumb_lx, 0);
        hub.set_axis(handle, AxisUsage::LEFT_X, 0).unwrap();
        assert_eq!(bus.report(0).unwrap().thumb_lx, -32768);
        hub.set_axis(handle, AxisUsage::LEFT_X, 32767).unwrap();
        assert_eq!(bus.report(0).unwrap().thumb_lx, 32766);
        hub.set_axis(handle, AxisUsage::LEFT_TRIGGER, 32767).unwrap();
        assert_eq!(bus.report(0).unwrap().left_trigger, 255);
        assert_eq!(
            hub.set_axis(handle, AxisUsage::Slider0, 1),
            Err(Error::InvalidParameter)
        );
    }

    #[test]
    fn percentage_axes_skip_the_canonical_domain() {
        let (mut hub, _joy, _bus, pad) = default_hub();
        let xbox = hub.acquire(Backend::GenericXbox, 1).unwrap();
        hub.set_axis_pct(xbox, AxisUsage::RIGHT_TRIGGER, 100.0).unwrap();
        hub.set_axis_pct(xbox, AxisUsage::LEFT_X, 0.0).unwrap();
        let report = pad.xpad_report(TargetId(1)).unwrap();
        assert_eq!(report.right_trigger, 255);
        assert_eq!(report.thumb_lx, -32768);
    }

    #[test]
    fn cont_pov_drives_the_dpad_with_the_north_quirk() {
        let (mut hub, _joy, _bus, pad) = default_hub();
        let handle = hub.acquire(Backend::GenericXbox, 1).unwrap();

        hub.set_cont_pov(handle, 1, 4500).unwrap();
        let report = pad.xpad_report(TargetId(1)).unwrap();
        assert_eq!(
            report.buttons & xbuttons::DPAD_MASK,
            xbuttons::DPAD_UP | xbuttons::DPAD_RIGHT
        );

        hub.set_cont_pov(handle, 1, 0).unwrap();
        let report = pad.xpad_report(TargetId(1)).unwrap();
        assert_eq!(report.buttons & xbuttons::DPAD_MASK, xbuttons::DPAD_UP);

        hub.set_cont_pov(handle, 1, -1).unwrap();
        let report = pad.xpad_report(TargetId(1)).unwrap();
        assert_eq!(report.buttons & xbuttons::DPAD_MASK, 0);

        assert_eq!(hub.set_cont_pov(handle, 2, 0), Err(Error::InvalidParameter));
    }

    #[test]
    fn reset_buttons_preserves_the_dpad_region() {
        let (mut hub, _joy, _bus, pad) = default_hub();
        let handle = hub.acquire(Backend::GenericXbox, 1).unwrap();
        hub.set_button(handle, 1, true).unwrap();
        hub.set_disc_pov(handle, 1, PovDirection::East).unwrap();

        hub.reset_buttons(handle).unwrap();
        let report = pad.xpad_report(TargetId(1)).unwrap();
        assert_eq!(report.buttons, xbuttons::DPAD_RIGHT);

        hub.reset_povs(handle).unwrap();
        let report = pad.xpad_report(TargetId(1)).unwrap();
        assert_eq!(report.buttons, 0);
    }

    #[test]
    fn joystick_set_pov_falls_back_to_the_discrete_hat() {
        let (mut hub, joy, _bus, _pad) = default_hub();
        joy.configure(3, 32, 1, 0);
        let handle = hub.acquire(Backend::LegacyJoystick, 3).unwrap();
        hub.set_pov(handle, 1, 9000).unwrap();
        assert_eq!(joy.report(3).unwrap().hats[0], 1);
        hub.set_pov(handle, 1, 12345).unwrap();
        assert_eq!(joy.report(3).unwrap().hats[0], (-1i32) as u32);
    }

    #[test]
    fn joystick_buttons_reach_the_driver_engine() {
        let (mut hub, joy, _bus, _pad) = default_hub();
        let handle = hub.acquire(Backend::LegacyJoystick, 1).unwrap();
        hub.set_button(handle, 5, true).unwrap();
        assert_eq!(joy.report(1).unwrap().buttons[0], 1 << 4);
        assert_eq!(
            hub.set_button(handle, 200, true),
            Err(Error::InvalidParameter)
        );
    }

    #[test]
    fn acquire_rejects_out_of_band_indices() {
        let (mut hub, _joy, _bus, _pad) = default_hub();
        assert_eq!(
            hub.acquire(Backend::LegacyJoystick, 17),
            Err(Error::InvalidParameter)
        );
        assert_eq!(hub.acquire(Backend::LegacyBus, 0), Err(Error::InvalidParameter));
        assert_eq!(
            hub.acquire(Backend::GenericXbox, 5),
            Err(Error::InvalidParameter)
        );
    }

    #[test]
    fn busy_joystick_slot_reports_already_attached() {
        let (mut hub, joy, _bus, _pad) = default_hub();
        joy.claim_by_other(4);
        assert_eq!(
            hub.acquire(Backend::LegacyJoystick, 4),
            Err(Error::AlreadyAttached)
        );
        joy.unconfigure(5);
        assert_eq!(
            hub.acquire(Backend::LegacyJoystick, 5),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn handle_of_destroys_records_the_backend_dropped() {
        let (mut hub, _joy, bus, _pad) = default_hub();
        let handle = hub.acquire(Backend::LegacyBus, 1).unwrap();
        assert_eq!(hub.handle_of(Backend::LegacyBus, 1), Ok(handle));

        // The device disappears behind our back.
        let mut external = bus.clone();
        SlotBus::unplug_force(&mut external, 0).unwrap();

        assert_eq!(hub.handle_of(Backend::LegacyBus, 1), Err(Error::Removed));
        assert_eq!(hub.device_count(), 0);
        assert_eq!(hub.handle_of(Backend::LegacyBus, 1), Err(Error::NotFound));
    }

    #[test]
    fn missing_generic_bus_reads_as_miss() {
        let (mut hub, _joy, _bus, pad) = default_hub();
        pad.set_missing(true);
        assert_eq!(hub.status_of(Backend::GenericXbox, 1), DeviceStatus::Miss);
        assert!(!hub.backend_supported(Backend::GenericDs4));
        assert_eq!(hub.acquire(Backend::GenericXbox, 1), Err(Error::NotFound));
    }

    #[test]
    fn missing_slot_bus_reads_as_miss() {
        let (mut hub, _joy, bus, _pad) = default_hub();
        bus.set_missing(true);
        assert_eq!(hub.status_of(Backend::LegacyBus, 1), DeviceStatus::Miss);
        assert!(!hub.backend_supported(Backend::LegacyBus));
    }

    #[test]
    fn xbox_identity_is_read_back_at_attach() {
        let (mut hub, _joy, _bus, _pad) = default_hub();
        let handle = hub.acquire(Backend::GenericXbox, 1).unwrap();
        let info = hub.device_info(handle).unwrap();
        assert_eq!(info.vendor_id, 0x045E);
        assert_eq!(info.product_id, 0x028E);
        assert_eq!(info.player, 1);
        assert_eq!(hub.player_number(handle), Ok(1));
    }

    #[test]
    fn vibration_passes_through_for_bus_devices_only() {
        let (mut hub, _joy, bus, _pad) = default_hub();
        let handle = hub.acquire(Backend::LegacyBus, 1).unwrap();
        bus.set_vibration(0, Vibration { large_motor: 40_000, small_motor: 80 });
        assert_eq!(
            hub.vibration(handle),
            Ok(Vibration { large_motor: 40_000, small_motor: 80 })
        );

        let xbox = hub.acquire(Backend::GenericXbox, 1).unwrap();
        assert_eq!(hub.vibration(xbox), Err(Error::Unsupported));
    }

    #[test]
    fn ranged_layer_resolves_through_the_single_resolver() {
        let (mut hub, joy, _bus, pad) = default_hub();

        let xbox = hub.acquire_ranged(2001).unwrap();
        hub.set_button_ranged(2001, 1, true).unwrap();
        let report = pad.xpad_report(TargetId(1)).unwrap();
        assert_ne!(report.buttons & xbuttons::A, 0);
        assert_eq!(hub.status_ranged(2001), DeviceStatus::Own);
        assert_eq!(hub.handle_of(Backend::GenericXbox, 1), Ok(xbox));

        hub.acquire_ranged(3).unwrap();
        hub.set_axis_ranged(3, AxisUsage::X, 123).unwrap();
        assert_eq!(joy.report(3).unwrap().axis_x, 123);

        assert_eq!(hub.acquire_ranged(0), Err(Error::InvalidParameter));
        assert_eq!(hub.acquire_ranged(1005), Err(Error::InvalidParameter));
        assert_eq!(hub.status_ranged(42_000), DeviceStatus::Miss);
        assert!(!hub.exists_ranged(17));

        hub.relinquish_ranged(2001).unwrap();
        assert_eq!(hub.status_ranged(2001), DeviceStatus::Free);
    }

    #[test]
    fn ranged_capability_queries_cover_every_band() {
        let (hub, _joy, _bus, _pad) = default_hub();
        assert_eq!(hub.button_count_ranged(1), 32);
        assert_eq!(hub.button_count_ranged(1001), XPAD_BUTTON_COUNT);
        assert_eq!(hub.button_count_ranged(2002), XPAD_BUTTON_COUNT);
        assert_eq!(hub.button_count_ranged(3001), DS4_BUTTON_COUNT);
        assert_eq!(hub.button_count_ranged(999), 0);
        assert_eq!(
            hub.axis_range_ranged(2001, AxisUsage::Pov),
            Some((0, 35900))
        );
        assert_eq!(hub.axis_range_ranged(2001, AxisUsage::X), Some((0, 32767)));
        assert_eq!(hub.axis_range_ranged(500, AxisUsage::X), None);
    }

    #[test]
    fn shutdown_is_idempotent_and_empties_the_registry() {
        let (mut hub, joy, bus, pad) = default_hub();
        hub.acquire(Backend::LegacyJoystick, 1).unwrap();
        hub.acquire(Backend::LegacyBus, 1).unwrap();
        hub.acquire(Backend::GenericXbox, 1).unwrap();
        hub.acquire(Backend::GenericDs4, 1).unwrap();
        assert_eq!(hub.device_count(), 4);

        hub.shutdown();
        assert_eq!(hub.device_count(), 0);
        assert_eq!(pad.disconnect_count(), 1);
        assert_eq!(pad.live_targets(), 0);
        assert_eq!(JoystickDriver::ownership(&joy, 1), JoyOwnership::Free);
        assert_eq!(SlotBus::plugged_in(&bus, 0), Ok(false));

        hub.shutdown();
        assert_eq!(pad.disconnect_count(), 1);
        assert_eq!(hub.device_count(), 0);
    }

    #[test]
    fn shutdown_forces_destruction_when_relinquish_fails() {
        let (mut hub, _joy, bus, pad) = default_hub();
        hub.acquire(Backend::LegacyBus, 1).unwrap();
        hub.acquire(Backend::GenericXbox, 1).unwrap();
        bus.set_stuck_unplug(true);

        hub.shutdown();
        assert_eq!(hub.device_count(), 0);
        assert_eq!(pad.live_targets(), 0);
    }

    #[test]
    fn capability_queries_follow_the_backend_shape() {
        let (mut hub, _joy, _bus, _pad) = default_hub();
        let ds4 = hub.acquire(Backend::GenericDs4, 1).unwrap();
        assert_eq!(hub.button_count(ds4), Ok(DS4_BUTTON_COUNT));
        assert_eq!(hub.hat_count(ds4, PovKind::Any), Ok(1));
        assert_eq!(hub.axis_exists(ds4, AxisUsage::Pov), Ok(true));
        assert_eq!(hub.axis_exists(ds4, AxisUsage::Wheel), Ok(false));
        assert_eq!(hub.axis_range(ds4, AxisUsage::LEFT_Y), Ok((0, 32767)));

        let joy_handle = hub.acquire(Backend::LegacyJoystick, 2).unwrap();
        assert_eq!(hub.button_count(joy_handle), Ok(32));
        assert_eq!(hub.hat_count(joy_handle, PovKind::Continuous), Ok(1));
        assert_eq!(hub.hat_count(joy_handle, PovKind::Discrete), Ok(0));
    }
}
