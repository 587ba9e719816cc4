//! GPIO through the legacy sysfs interface (`/sys/class/gpio`)

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use plategate_domain::hardware::{MotionSensor, Relay};
use plategate_types::HardwareError;

// udev may need a moment to expose the exported pin directory
const EXPORT_RETRIES: u32 = 10;
const EXPORT_RETRY_DELAY: Duration = Duration::from_millis(50);

struct SysfsPin {
    root: PathBuf,
    pin: u32,
}

impl SysfsPin {
    fn export(root: &Path, pin: u32, direction: &str) -> Result<Self, HardwareError> {
        let gpio = Self {
            root: root.to_path_buf(),
            pin,
        };

        if !gpio.pin_dir().is_dir() {
            fs::write(root.join("export"), pin.to_string()).map_err(|e| HardwareError::Fault {
                pin,
                reason: format!("export failed: {}", e),
            })?;

            let mut retries = 0;
            while !gpio.pin_dir().is_dir() {
                if retries == EXPORT_RETRIES {
                    return Err(HardwareError::Fault {
                        pin,
                        reason: format!("{} did not appear after export", gpio.pin_dir().display()),
                    });
                }
                retries += 1;
                thread::sleep(EXPORT_RETRY_DELAY);
            }
        }

        fs::write(gpio.pin_dir().join("direction"), direction).map_err(|e| HardwareError::Fault {
            pin,
            reason: format!("cannot set direction '{}': {}", direction, e),
        })?;

        Ok(gpio)
    }

    fn pin_dir(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin))
    }

    fn write_value(&self, high: bool) -> Result<(), HardwareError> {
        fs::write(self.pin_dir().join("value"), if high { "1" } else { "0" })
            .map_err(|source| HardwareError::Io { pin: self.pin, source })
    }

    fn read_value(&self) -> Result<bool, HardwareError> {
        let raw = fs::read_to_string(self.pin_dir().join("value"))
            .map_err(|source| HardwareError::Io { pin: self.pin, source })?;
        Ok(raw.trim() == "1")
    }

    fn unexport(&self) -> Result<(), HardwareError> {
        fs::write(self.root.join("unexport"), self.pin.to_string())
            .map_err(|source| HardwareError::Io { pin: self.pin, source })
    }
}

/// Active-high output driving the barrier relay
pub struct SysfsOutput {
    pin: SysfsPin,
    released: bool,
}

impl SysfsOutput {
    /// Export the pin as an output and drive it low
    pub fn open(root: impl AsRef<Path>, pin: u32) -> Result<Self, HardwareError> {
        let pin = SysfsPin::export(root.as_ref(), pin, "out")?;
        pin.write_value(false).map_err(|e| HardwareError::Fault {
            pin: pin.pin,
            reason: format!("initial low write failed: {}", e),
        })?;
        tracing::info!(pin = pin.pin, "Relay output ready");
        Ok(Self { pin, released: false })
    }
}

impl Relay for SysfsOutput {
    fn set(&mut self, asserted: bool) -> Result<(), HardwareError> {
        self.pin.write_value(asserted)
    }

    fn release(&mut self) -> Result<(), HardwareError> {
        if self.released {
            return Ok(());
        }
        self.pin.write_value(false)?;
        self.released = true;
        self.pin.unexport()?;
        tracing::info!(pin = self.pin.pin, "Relay output released");
        Ok(())
    }
}

impl Drop for SysfsOutput {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.pin.write_value(false) {
                tracing::error!(error = %e, "Failed to force relay low on drop");
            }
        }
    }
}

/// Active-high presence input
pub struct SysfsInput {
    pin: SysfsPin,
    released: bool,
}

impl SysfsInput {
    pub fn open(root: impl AsRef<Path>, pin: u32) -> Result<Self, HardwareError> {
        let pin = SysfsPin::export(root.as_ref(), pin, "in")?;
        pin.read_value().map_err(|e| HardwareError::Fault {
            pin: pin.pin,
            reason: format!("initial read failed: {}", e),
        })?;
        tracing::info!(pin = pin.pin, "Motion input ready");
        Ok(Self { pin, released: false })
    }
}

impl MotionSensor for SysfsInput {
    fn is_triggered(&mut self) -> Result<bool, HardwareError> {
        self.pin.read_value()
    }

    fn release(&mut self) -> Result<(), HardwareError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.pin.unexport()
    }
}
