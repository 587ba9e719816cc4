//! Digital I/O ports driven by the gate controller

use plategate_types::HardwareError;

/// Barrier relay output; asserted means the barrier is open
pub trait Relay {
    fn set(&mut self, asserted: bool) -> Result<(), HardwareError>;

    /// Force the output to the safe (de-asserted) state and free the line
    fn release(&mut self) -> Result<(), HardwareError> {
        self.set(false)
    }
}

/// Presence detector input
pub trait MotionSensor {
    fn is_triggered(&mut self) -> Result<bool, HardwareError>;

    fn release(&mut self) -> Result<(), HardwareError> {
        Ok(())
    }
}
