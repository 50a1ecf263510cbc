//! Control core: decoding and dispatch wired to the outside world
//! through **port traits** defined in [`ports`], so every piece runs
//! against fakes on the host.

pub mod control_loop;
pub mod dispatcher;
pub mod events;
pub mod lifecycle;
pub mod ports;
