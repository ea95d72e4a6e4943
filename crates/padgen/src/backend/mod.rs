// One adapter per backend mechanism. Each file extends `DeviceHub` with the
// backend-specific halves of the common capability set; the dispatch on the
// record's backend tag lives in `hub`.

mod joystick;
mod padbus;
mod slotbus;
