// Deterministic in-memory driver implementations. They emulate the observable
// behavior of the real backends (slot occupancy, plug-in settling delays,
// foreign ownership, missing buses) without touching any hardware, and expose
// their internal state for inspection. Handles are cheap clones over shared
// state, so a caller can keep one for assertions after moving another into a
// hub.

mod joystick;
mod padbus;
mod slotbus;

pub use joystick::LoopbackJoystick;
pub use padbus::LoopbackPadBus;
pub use slotbus::LoopbackSlotBus;
