use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::report::XPadReport;
use crate::slotbus::{SlotBus, SlotBusError, SlotBusResult, Vibration, BUS_SLOTS};

const LOOPBACK_BUS_VERSION: u32 = 0x0001_0002;

#[derive(Debug, Clone, Copy, Default)]
struct BusSlot {
    plugged: bool,
    owned: bool,
    /// Remaining polls that answer DeviceNotReady; `u32::MAX` never settles.
    pending: u32,
    led: u8,
    serial: u32,
    report: XPadReport,
    vibration: Vibration,
}

#[derive(Debug)]
struct BusState {
    missing: bool,
    settle_polls: u32,
    stuck_unplug: bool,
    next_serial: u32,
    slots: [BusSlot; BUS_SLOTS as usize],
}

/// In-memory stand-in for the legacy four-slot bus driver. Plug-in settles
/// after a configurable number of readiness polls; unplug confirmation can
/// be wedged to exercise the timeout path.
#[derive(Debug, Clone)]
pub struct LoopbackSlotBus {
    state: Arc<Mutex<BusState>>,
}

impl LoopbackSlotBus {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState {
                missing: false,
                settle_polls: 0,
                stuck_unplug: false,
                next_serial: 1,
                slots: [BusSlot::default(); BUS_SLOTS as usize],
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every call fail as if the bus driver were not installed.
    pub fn set_missing(&self, missing: bool) {
        self.lock().missing = missing;
    }

    /// Number of readiness polls a freshly plugged slot swallows before it
    /// reports a LED number. `u32::MAX` means the device never starts.
    pub fn set_settle_polls(&self, polls: u32) {
        self.lock().settle_polls = polls;
    }

    /// Makes unplug report success while the slot stays plugged in.
    pub fn set_stuck_unplug(&self, stuck: bool) {
        self.lock().stuck_unplug = stuck;
    }

    /// Plugs a slot in on behalf of another process.
    pub fn occupy(&self, slot: u8) {
        let mut state = self.lock();
        let serial = state.next_serial;
        state.next_serial += 1;
        if let Some(s) = state.slots.get_mut(slot as usize) {
            s.plugged = true;
            s.owned = false;
            s.pending = 0;
            s.led = slot + 1;
            s.serial = serial;
        }
    }

    /// Sets the feedback motors a later `vibration` call reports.
    pub fn set_vibration(&self, slot: u8, vibration: Vibration) {
        if let Some(s) = self.lock().slots.get_mut(slot as usize) {
            s.vibration = vibration;
        }
    }

    /// Last report pushed to a slot, for assertions.
    pub fn report(&self, slot: u8) -> Option<XPadReport> {
        self.lock().slots.get(slot as usize).map(|s| s.report)
    }

    fn check(state: &BusState, slot: u8) -> SlotBusResult<()> {
        if state.missing {
            return Err(SlotBusError::BusNotConnected);
        }
        if slot >= BUS_SLOTS {
            return Err(SlotBusError::IndexOutOfRange);
        }
        Ok(())
    }
}

impl Default for LoopbackSlotBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotBus for LoopbackSlotBus {
    fn bus_version(&self) -> SlotBusResult<u32> {
        if self.lock().missing {
            return Err(SlotBusError::BusNotConnected);
        }
        Ok(LOOPBACK_BUS_VERSION)
    }

    fn empty_slots(&self) -> SlotBusResult<u8> {
        let state = self.lock();
        if state.missing {
            return Err(SlotBusError::BusNotConnected);
        }
        Ok(state.slots.iter().filter(|s| !s.plugged).count() as u8)
    }

    fn plugged_in(&self, slot: u8) -> SlotBusResult<bool> {
        let state = self.lock();
        Self::check(&state, slot)?;
        Ok(state.slots[slot as usize].plugged)
    }

    fn owned(&self, slot: u8) -> SlotBusResult<bool> {
        let state = self.lock();
        Self::check(&state, slot)?;
        let s = &state.slots[slot as usize];
        Ok(s.plugged && s.owned)
    }

    fn plug_in(&mut self, slot: u8) -> SlotBusResult<()> {
        let mut state = self.lock();
        Self::check(&state, slot)?;
        if state.slots[slot as usize].plugged {
            return Err(SlotBusError::InvalidStateInfo);
        }
        let pending = state.settle_polls;
        let serial = state.next_serial;
        state.next_serial += 1;
        let s = &mut state.slots[slot as usize];
        s.plugged = true;
        s.owned = true;
        s.pending = pending;
        s.led = slot + 1;
        s.serial = serial;
        s.report = XPadReport::default();
        Ok(())
    }

    fn unplug(&mut self, slot: u8) -> SlotBusResult<()> {
        let mut state = self.lock();
        Self::check(&state, slot)?;
        if state.stuck_unplug {
            return Ok(());
        }
        let s = &mut state.slots[slot as usize];
        s.plugged = false;
        s.owned = false;
        Ok(())
    }

    fn unplug_force(&mut self, slot: u8) -> SlotBusResult<()> {
        let mut state = self.lock();
        Self::check(&state, slot)?;
        if state.stuck_unplug {
            return Ok(());
        }
        let s = &mut state.slots[slot as usize];
        s.plugged = false;
        s.owned = false;
        Ok(())
    }

    fn led_number(&self, slot: u8) -> SlotBusResult<u8> {
        let mut state = self.lock();
        Self::check(&state, slot)?;
        let s = &mut state.slots[slot as usize];
        if !s.plugged {
            return Err(SlotBusError::InvalidStateInfo);
        }
        if s.pending > 0 {
            if s.pending != u32::MAX {
                s.pending -= 1;
            }
            return Err(SlotBusError::DeviceNotReady);
        }
        Ok(s.led)
    }

    fn serial(&self, slot: u8) -> SlotBusResult<u32> {
        let state = self.lock();
        Self::check(&state, slot)?;
        let s = &state.slots[slot as usize];
        if !s.plugged || s.pending > 0 {
            return Err(SlotBusError::DeviceNotReady);
        }
        Ok(s.serial)
    }

    fn vibration(&self, slot: u8) -> SlotBusResult<Vibration> {
        let state = self.lock();
        Self::check(&state, slot)?;
        let s = &state.slots[slot as usize];
        if !s.plugged {
            return Err(SlotBusError::InvalidStateInfo);
        }
        Ok(s.vibration)
    }

    fn push(&mut self, slot: u8, report: &XPadReport) -> SlotBusResult<()> {
        let mut state = self.lock();
        Self::check(&state, slot)?;
        let s = &mut state.slots[slot as usize];
        if !s.plugged || !s.owned {
            return Err(SlotBusError::InvalidStateInfo);
        }
        s.report = *report;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plug_in_settles_after_configured_polls() {
        let mut bus = LoopbackSlotBus::new();
        bus.set_settle_polls(2);
        bus.plug_in(0).unwrap();
        assert_eq!(bus.led_number(0), Err(SlotBusError::DeviceNotReady));
        assert_eq!(bus.led_number(0), Err(SlotBusError::DeviceNotReady));
        assert_eq!(bus.led_number(0), Ok(1));
    }

    #[test]
    fn occupied_slot_is_plugged_but_not_owned() {
        let bus = LoopbackSlotBus::new();
        bus.occupy(1);
        assert_eq!(bus.plugged_in(1), Ok(true));
        assert_eq!(bus.owned(1), Ok(false));
    }

    #[test]
    fn missing_bus_fails_every_call() {
        let bus = LoopbackSlotBus::new();
        bus.set_missing(true);
        assert_eq!(bus.bus_version(), Err(SlotBusError::BusNotConnected));
        assert_eq!(bus.plugged_in(0), Err(SlotBusError::BusNotConnected));
    }
}
