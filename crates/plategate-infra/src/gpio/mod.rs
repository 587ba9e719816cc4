//! Digital I/O adapters: Linux sysfs GPIO and bench simulators

mod simulated;
mod sysfs;

pub use simulated::{SimulatedMotionSensor, SimulatedRelay};
pub use sysfs::{SysfsInput, SysfsOutput};
