use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::axis::AxisUsage;
use crate::joystick::{JoyOwnership, JoystickDriver, JOYSTICK_SLOTS};
use crate::report::JoystickReport;

const LOOPBACK_JOY_VERSION: u16 = 0x0219;

/// 1-based slot id to vector index; id 0 lands out of bounds on purpose.
fn idx(id: u8) -> usize {
    usize::from(id).wrapping_sub(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    NoOne,
    Us,
    Other,
}

#[derive(Debug, Clone)]
struct JoySlot {
    configured: bool,
    owner: Owner,
    button_count: u8,
    disc_povs: u8,
    cont_povs: u8,
    report: JoystickReport,
}

impl Default for JoySlot {
    fn default() -> Self {
        Self {
            configured: true,
            owner: Owner::NoOne,
            button_count: 32,
            disc_povs: 0,
            cont_povs: 1,
            report: JoystickReport::centered(),
        }
    }
}

#[derive(Debug)]
struct JoyState {
    enabled: bool,
    slots: Vec<JoySlot>,
}

/// In-memory stand-in for the legacy joystick driver: sixteen configured
/// slots, each with its own driver-side position engine.
#[derive(Debug, Clone)]
pub struct LoopbackJoystick {
    state: Arc<Mutex<JoyState>>,
}

impl LoopbackJoystick {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(JoyState {
                enabled: true,
                slots: vec![JoySlot::default(); JOYSTICK_SLOTS as usize],
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JoyState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks the whole driver as disabled (every slot reports missing).
    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    /// Removes a slot from the driver's configuration.
    pub fn unconfigure(&self, id: u8) {
        if let Some(slot) = self.lock().slots.get_mut(idx(id)) {
            slot.configured = false;
        }
    }

    /// Simulates another process holding a slot.
    pub fn claim_by_other(&self, id: u8) {
        if let Some(slot) = self.lock().slots.get_mut(idx(id)) {
            slot.owner = Owner::Other;
        }
    }

    /// Reconfigures a slot's control counts.
    pub fn configure(&self, id: u8, buttons: u8, disc_povs: u8, cont_povs: u8) {
        if let Some(slot) = self.lock().slots.get_mut(idx(id)) {
            slot.button_count = buttons;
            slot.disc_povs = disc_povs;
            slot.cont_povs = cont_povs;
        }
    }

    /// Driver-side position of a slot, for assertions.
    pub fn report(&self, id: u8) -> Option<JoystickReport> {
        self.lock().slots.get(idx(id)).map(|s| s.report.clone())
    }

    fn with_owned_slot<R>(
        &self,
        id: u8,
        f: impl FnOnce(&mut JoySlot) -> R,
    ) -> Option<R> {
        let mut state = self.lock();
        if !state.enabled {
            return None;
        }
        let slot = state.slots.get_mut(idx(id))?;
        if !slot.configured || slot.owner != Owner::Us {
            return None;
        }
        Some(f(slot))
    }
}

impl Default for LoopbackJoystick {
    fn default() -> Self {
        Self::new()
    }
}

impl JoystickDriver for LoopbackJoystick {
    fn enabled(&self) -> bool {
        self.lock().enabled
    }

    fn version(&self) -> u16 {
        LOOPBACK_JOY_VERSION
    }

    fn ownership(&self, id: u8) -> JoyOwnership {
        let state = self.lock();
        if !state.enabled {
            return JoyOwnership::Missing;
        }
        match state.slots.get(idx(id)) {
            None => JoyOwnership::Missing,
            Some(slot) if !slot.configured => JoyOwnership::Missing,
            Some(slot) => match slot.owner {
                Owner::Us => JoyOwnership::Owned,
                Owner::Other => JoyOwnership::Busy,
                Owner::NoOne => JoyOwnership::Free,
            },
        }
    }

    fn exists(&self, id: u8) -> bool {
        !matches!(
            self.ownership(id),
            JoyOwnership::Missing | JoyOwnership::Unknown
        )
    }

    fn acquire(&mut self, id: u8) -> bool {
        match self.ownership(id) {
            JoyOwnership::Free | JoyOwnership::Owned => {
                if let Some(slot) = self.lock().slots.get_mut(idx(id)) {
                    slot.owner = Owner::Us;
                    true
                } else {
                    false
                }
            }
            _ => false,
        }
    }

    fn relinquish(&mut self, id: u8) {
        let mut state = self.lock();
        if let Some(slot) = state.slots.get_mut(idx(id)) {
            if slot.owner == Owner::Us {
                slot.owner = Owner::NoOne;
            }
        }
    }

    fn axis_exists(&self, id: u8, axis: AxisUsage) -> bool {
        let state = self.lock();
        match state.slots.get(idx(id)) {
            Some(slot) if slot.configured => match axis {
                AxisUsage::Pov => slot.cont_povs > 0,
                _ => true,
            },
            _ => false,
        }
    }

    fn axis_min(&self, id: u8, axis: AxisUsage) -> Option<i32> {
        self.axis_exists(id, axis).then_some(0)
    }

    fn axis_max(&self, id: u8, axis: AxisUsage) -> Option<i32> {
        self.axis_exists(id, axis).then_some(match axis {
            AxisUsage::Pov => 35900,
            _ => 32767,
        })
    }

    fn button_count(&self, id: u8) -> u8 {
        self.lock()
            .slots
            .get(idx(id))
            .filter(|s| s.configured)
            .map_or(0, |s| s.button_count)
    }

    fn disc_pov_count(&self, id: u8) -> u8 {
        self.lock()
            .slots
            .get(idx(id))
            .filter(|s| s.configured)
            .map_or(0, |s| s.disc_povs)
    }

    fn cont_pov_count(&self, id: u8) -> u8 {
        self.lock()
            .slots
            .get(idx(id))
            .filter(|s| s.configured)
            .map_or(0, |s| s.cont_povs)
    }

    fn set_axis(&mut self, id: u8, axis: AxisUsage, value: i32) -> bool {
        self.with_owned_slot(id, |slot| {
            match axis {
                AxisUsage::X => slot.report.axis_x = value,
                AxisUsage::Y => slot.report.axis_y = value,
                AxisUsage::Z => slot.report.axis_z = value,
                AxisUsage::Rx => slot.report.axis_rx = value,
                AxisUsage::Ry => slot.report.axis_ry = value,
                AxisUsage::Rz => slot.report.axis_rz = value,
                AxisUsage::Slider0 => slot.report.slider0 = value,
                AxisUsage::Slider1 => slot.report.slider1 = value,
                AxisUsage::Wheel => return false,
                AxisUsage::Pov => slot.report.hats[0] = value as u32,
            }
            true
        })
        .unwrap_or(false)
    }

    fn set_button(&mut self, id: u8, button: u8, pressed: bool) -> bool {
        self.with_owned_slot(id, |slot| {
            if button == 0 || button > slot.button_count {
                return false;
            }
            let bit = u32::from(button) - 1;
            let word = &mut slot.report.buttons[(bit / 32) as usize];
            if pressed {
                *word |= 1 << (bit % 32);
            } else {
                *word &= !(1 << (bit % 32));
            }
            true
        })
        .unwrap_or(false)
    }

    fn set_disc_pov(&mut self, id: u8, pov: u8, value: i32) -> bool {
        self.with_owned_slot(id, |slot| {
            if pov == 0 || pov > slot.disc_povs || usize::from(pov) > slot.report.hats.len() {
                return false;
            }
            slot.report.hats[usize::from(pov) - 1] = value as u32;
            true
        })
        .unwrap_or(false)
    }

    fn set_cont_pov(&mut self, id: u8, pov: u8, value: i32) -> bool {
        self.with_owned_slot(id, |slot| {
            if pov == 0 || pov > slot.cont_povs || usize::from(pov) > slot.report.hats.len() {
                return false;
            }
            slot.report.hats[usize::from(pov) - 1] = value as u32;
            true
        })
        .unwrap_or(false)
    }

    fn reset(&mut self, id: u8) -> bool {
        self.with_owned_slot(id, |slot| {
            slot.report = JoystickReport::centered();
            true
        })
        .unwrap_or(false)
    }

    fn reset_buttons(&mut self, id: u8) -> bool {
        self.with_owned_slot(id, |slot| {
            slot.report.buttons = [0; 4];
            true
        })
        .unwrap_or(false)
    }

    fn reset_povs(&mut self, id: u8) -> bool {
        self.with_owned_slot(id, |slot| {
            slot.report.hats = [crate::report::HAT_CENTERED; 4];
            true
        })
        .unwrap_or(false)
    }

    fn push(&mut self, id: u8, report: &JoystickReport) -> bool {
        self.with_owned_slot(id, |slot| {
            slot.report = report.clone();
            true
        })
        .unwrap_or(false)
    }

    fn position(&self, id: u8) -> Option<JoystickReport> {
        let state = self.lock();
        let slot = state.slots.get(idx(id))?;
        slot.configured.then(|| slot.report.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_claims_a_free_slot() {
        let mut joy = LoopbackJoystick::new();
        assert_eq!(joy.ownership(3), JoyOwnership::Free);
        assert!(joy.acquire(3));
        assert_eq!(joy.ownership(3), JoyOwnership::Owned);
    }

    #[test]
    fn acquire_refuses_busy_and_missing_slots() {
        let mut joy = LoopbackJoystick::new();
        joy.claim_by_other(2);
        joy.unconfigure(5);
        assert!(!joy.acquire(2));
        assert!(!joy.acquire(5));
        assert_eq!(joy.ownership(5), JoyOwnership::Missing);
    }

    #[test]
    fn setters_require_ownership() {
        let mut joy = LoopbackJoystick::new();
        assert!(!joy.set_axis(1, AxisUsage::X, 1000));
        assert!(joy.acquire(1));
        assert!(joy.set_axis(1, AxisUsage::X, 1000));
        assert_eq!(joy.report(1).unwrap().axis_x, 1000);
    }
}
