use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::padbus::{
    PadBus, PadBusError, PadBusResult, TargetId, TargetInfo, TargetShape,
};
use crate::report::{Ds4Report, XPadReport};

const LOOPBACK_PAD_VERSION: u32 = 0x0001_0011;

const XBOX_VENDOR: u16 = 0x045E;
const XBOX_PRODUCT: u16 = 0x028E;
const DS4_VENDOR: u16 = 0x054C;
const DS4_PRODUCT: u16 = 0x05C4;

#[derive(Debug, Clone, Copy)]
struct Target {
    id: u32,
    shape: TargetShape,
    attached: bool,
    released: bool,
    serial: u32,
    player: u8,
    xpad: XPadReport,
    ds4: Ds4Report,
}

#[derive(Debug)]
struct PadState {
    missing: bool,
    connected: bool,
    connects: u32,
    disconnects: u32,
    next_target: u32,
    next_serial: u32,
    targets: Vec<Target>,
}

/// In-memory stand-in for the generic multi-target bus client: one shared
/// connection, target objects allocated per device, serials and player
/// indices handed out at attach time.
#[derive(Debug, Clone)]
pub struct LoopbackPadBus {
    state: Arc<Mutex<PadState>>,
}

impl LoopbackPadBus {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PadState {
                missing: false,
                connected: false,
                connects: 0,
                disconnects: 0,
                next_target: 1,
                next_serial: 1,
                targets: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PadState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes connection attempts fail as if the bus were not installed.
    pub fn set_missing(&self, missing: bool) {
        self.lock().missing = missing;
    }

    /// How many times `connect` succeeded.
    pub fn connect_count(&self) -> u32 {
        self.lock().connects
    }

    /// How many times `disconnect` tore an open connection down.
    pub fn disconnect_count(&self) -> u32 {
        self.lock().disconnects
    }

    /// Targets allocated and not yet released.
    pub fn live_targets(&self) -> usize {
        self.lock().targets.iter().filter(|t| !t.released).count()
    }

    /// Last Xbox-shaped report pushed to a target, for assertions.
    pub fn xpad_report(&self, target: TargetId) -> Option<XPadReport> {
        self.lock()
            .targets
            .iter()
            .find(|t| t.id == target.0)
            .map(|t| t.xpad)
    }

    /// Last DualShock-shaped report pushed to a target, for assertions.
    pub fn ds4_report(&self, target: TargetId) -> Option<Ds4Report> {
        self.lock()
            .targets
            .iter()
            .find(|t| t.id == target.0)
            .map(|t| t.ds4)
    }

    fn find(state: &PadState, target: TargetId) -> PadBusResult<usize> {
        state
            .targets
            .iter()
            .position(|t| t.id == target.0 && !t.released)
            .ok_or(PadBusError::InvalidTarget)
    }
}

impl Default for LoopbackPadBus {
    fn default() -> Self {
        Self::new()
    }
}

impl PadBus for LoopbackPadBus {
    fn connect(&mut self) -> PadBusResult<()> {
        let mut state = self.lock();
        if state.missing {
            return Err(PadBusError::BusNotFound);
        }
        if state.connected {
            return Err(PadBusError::AlreadyConnected);
        }
        state.connected = true;
        state.connects += 1;
        Ok(())
    }

    fn connected(&self) -> bool {
        self.lock().connected
    }

    fn disconnect(&mut self) {
        let mut state = self.lock();
        if state.connected {
            state.connected = false;
            state.disconnects += 1;
            for target in &mut state.targets {
                target.attached = false;
            }
        }
    }

    fn bus_version(&self) -> u32 {
        LOOPBACK_PAD_VERSION
    }

    fn create_target(&mut self, shape: TargetShape) -> PadBusResult<TargetId> {
        let mut state = self.lock();
        let id = state.next_target;
        state.next_target += 1;
        state.targets.push(Target {
            id,
            shape,
            attached: false,
            released: false,
            serial: 0,
            player: 0,
            xpad: XPadReport::default(),
            ds4: Ds4Report::centered(),
        });
        Ok(TargetId(id))
    }

    fn attach(&mut self, target: TargetId) -> PadBusResult<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(PadBusError::TargetUninitialized);
        }
        let index = Self::find(&state, target)?;
        if state.targets[index].attached {
            return Err(PadBusError::AlreadyConnected);
        }
        let serial = state.next_serial;
        state.next_serial += 1;
        let player = state
            .targets
            .iter()
            .filter(|t| t.attached && t.shape == TargetShape::Xbox)
            .count() as u8;
        let t = &mut state.targets[index];
        t.attached = true;
        t.serial = serial;
        t.player = player;
        Ok(())
    }

    fn detach(&mut self, target: TargetId) -> PadBusResult<()> {
        let mut state = self.lock();
        let index = Self::find(&state, target)?;
        if !state.targets[index].attached {
            return Err(PadBusError::TargetNotPluggedIn);
        }
        state.targets[index].attached = false;
        Ok(())
    }

    fn attached(&self, target: TargetId) -> bool {
        let state = self.lock();
        state
            .targets
            .iter()
            .any(|t| t.id == target.0 && !t.released && t.attached)
    }

    fn release_target(&mut self, target: TargetId) {
        let mut state = self.lock();
        if let Some(t) = state.targets.iter_mut().find(|t| t.id == target.0) {
            t.attached = false;
            t.released = true;
        }
    }

    fn target_info(&self, target: TargetId) -> Option<TargetInfo> {
        let state = self.lock();
        let t = state
            .targets
            .iter()
            .find(|t| t.id == target.0 && !t.released)?;
        let (vendor_id, product_id) = match t.shape {
            TargetShape::Xbox => (XBOX_VENDOR, XBOX_PRODUCT),
            TargetShape::Ds4 => (DS4_VENDOR, DS4_PRODUCT),
        };
        Some(TargetInfo { vendor_id, product_id, serial: t.serial })
    }

    fn player_index(&self, target: TargetId) -> PadBusResult<u8> {
        let state = self.lock();
        let index = Self::find(&state, target)?;
        let t = &state.targets[index];
        if t.shape != TargetShape::Xbox {
            return Err(PadBusError::Unsupported);
        }
        if !t.attached {
            return Err(PadBusError::TargetNotPluggedIn);
        }
        Ok(t.player)
    }

    fn push_xpad(&mut self, target: TargetId, report: &XPadReport) -> PadBusResult<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(PadBusError::BusAccessFailed);
        }
        let index = Self::find(&state, target)?;
        let t = &mut state.targets[index];
        if t.shape != TargetShape::Xbox {
            return Err(PadBusError::InvalidParameter);
        }
        if !t.attached {
            return Err(PadBusError::TargetNotPluggedIn);
        }
        t.xpad = *report;
        Ok(())
    }

    fn push_ds4(&mut self, target: TargetId, report: &Ds4Report) -> PadBusResult<()> {
        let mut state = self.lock();
        if !state.connected {
            return Err(PadBusError::BusAccessFailed);
        }
        let index = Self::find(&state, target)?;
        let t = &mut state.targets[index];
        if t.shape != TargetShape::Ds4 {
            return Err(PadBusError::InvalidParameter);
        }
        if !t.attached {
            return Err(PadBusError::TargetNotPluggedIn);
        }
        t.ds4 = *report;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attach_assigns_serial_and_player() {
        let mut bus = LoopbackPadBus::new();
        bus.connect().unwrap();
        let first = bus.create_target(TargetShape::Xbox).unwrap();
        let second = bus.create_target(TargetShape::Xbox).unwrap();
        bus.attach(first).unwrap();
        bus.attach(second).unwrap();
        assert_eq!(bus.player_index(first), Ok(0));
        assert_eq!(bus.player_index(second), Ok(1));
        assert_ne!(
            bus.target_info(first).unwrap().serial,
            bus.target_info(second).unwrap().serial
        );
    }

    #[test]
    fn attach_requires_a_connection() {
        let mut bus = LoopbackPadBus::new();
        let target = bus.create_target(TargetShape::Ds4).unwrap();
        assert_eq!(bus.attach(target), Err(PadBusError::TargetUninitialized));
    }

    #[test]
    fn released_target_stops_resolving() {
        let mut bus = LoopbackPadBus::new();
        bus.connect().unwrap();
        let target = bus.create_target(TargetShape::Xbox).unwrap();
        bus.attach(target).unwrap();
        bus.release_target(target);
        assert!(!bus.attached(target));
        assert_eq!(bus.detach(target), Err(PadBusError::InvalidTarget));
        assert_eq!(bus.live_targets(), 0);
    }

    #[test]
    fn missing_bus_refuses_to_connect() {
        let mut bus = LoopbackPadBus::new();
        bus.set_missing(true);
        assert_eq!(bus.connect(), Err(PadBusError::BusNotFound));
        assert!(!bus.connected());
    }
}
