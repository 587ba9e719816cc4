//! Application context: every collaborator the controller needs, built once at startup

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use plategate_domain::hardware::{MotionSensor, Relay};
use plategate_domain::model::AllowList;
use plategate_domain::repository::{AuditRepository, PhotoRepository};
use plategate_infra::gpio::{SimulatedMotionSensor, SimulatedRelay, SysfsInput, SysfsOutput};
use plategate_infra::{load_allow_list, sweep_photo_dirs, FileAuditLog, PhotoArchive, SweepReport};
use plategate_types::Result;
use plategate_vision::{Camera, PlateLocator, RecognitionPipeline};

use crate::config::{Config, HardwareBackend, PhotoPolicy};

/// Fixed delays of the gate cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Relay asserted for this long on a grant
    pub relay_open: Duration,
    /// Pause after every attempt before sensing again
    pub cooldown: Duration,
    /// Sensor polling period while idle
    pub poll_interval: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            relay_open: Duration::from_millis(5000),
            cooldown: Duration::from_millis(1000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionSettings {
    pub photos_dir: PathBuf,
    pub retention_days: u32,
}

impl RetentionSettings {
    pub fn sweep(&self, today: NaiveDate) -> io::Result<SweepReport> {
        sweep_photo_dirs(&self.photos_dir, self.retention_days, today)
    }
}

pub struct AppContext {
    pub camera: Box<dyn Camera>,
    pub pipeline: RecognitionPipeline,
    pub registry: AllowList,
    pub audit: Box<dyn AuditRepository>,
    pub photos: Box<dyn PhotoRepository>,
    pub photo_policy: PhotoPolicy,
    pub relay: Box<dyn Relay>,
    pub sensor: Box<dyn MotionSensor>,
    pub timings: Timings,
    /// `None` disables the photo retention sweep
    pub retention: Option<RetentionSettings>,
}

impl AppContext {
    /// Wire up the production collaborators.
    ///
    /// A broken allow-list degrades to an empty one (every plate denied);
    /// a GPIO failure is fatal.
    pub fn from_config(config: &Config, simulate: bool) -> Result<Self> {
        config.validate()?;

        let registry = load_registry(config);
        let audit = FileAuditLog::open(&config.logs_dir)?;
        let photos = PhotoArchive::new(&config.photos_dir, config.jpeg_quality);

        let backend = if simulate {
            HardwareBackend::Simulated
        } else {
            config.hardware
        };
        let (relay, sensor) = open_hardware(config, backend)?;

        tracing::info!(
            hardware = %backend,
            plates = registry.len(),
            logs = %config.logs_dir.display(),
            photos = %config.photos_dir.display(),
            "Gate context ready"
        );

        Ok(Self {
            camera: Box::new(config.camera()),
            pipeline: build_pipeline(config),
            registry,
            audit: Box::new(audit),
            photos: Box::new(photos),
            photo_policy: config.photo_policy,
            relay,
            sensor,
            timings: config.timings(),
            retention: Some(config.retention()),
        })
    }
}

/// Recognition pipeline with the configured detector and OCR backends
pub fn build_pipeline(config: &Config) -> RecognitionPipeline {
    let locator = PlateLocator::new(Box::new(config.detector()), config.locator_config());
    RecognitionPipeline::new(locator, Box::new(config.recognizer()))
}

/// Load the allow-list, falling back to an empty one on any error
pub fn load_registry(config: &Config) -> AllowList {
    match load_allow_list(&config.allow_list_path) {
        Ok(list) => {
            if list.is_empty() {
                tracing::warn!("Allow-list is empty, every plate will be denied");
            }
            list
        }
        Err(e) => {
            tracing::error!(error = %e, "Allow-list unavailable, every plate will be denied");
            AllowList::default()
        }
    }
}

fn open_hardware(
    config: &Config,
    backend: HardwareBackend,
) -> Result<(Box<dyn Relay>, Box<dyn MotionSensor>)> {
    match backend {
        HardwareBackend::Sysfs => {
            let relay = SysfsOutput::open(&config.gpio_root, config.relay_pin)?;
            let sensor = SysfsInput::open(&config.gpio_root, config.motion_pin)?;
            Ok((Box::new(relay), Box::new(sensor)))
        }
        HardwareBackend::Simulated => Ok((
            Box::new(SimulatedRelay::new()),
            Box::new(SimulatedMotionSensor::from_stdin()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plategate_types::{Error, HardwareError};
    use std::fs;

    fn config_in(dir: &std::path::Path) -> Config {
        Config {
            allow_list_path: dir.join("plates.csv"),
            logs_dir: dir.join("logs"),
            photos_dir: dir.join("photos"),
            gpio_root: dir.join("gpio"),
            ..Config::default()
        }
    }

    #[test]
    fn test_missing_allow_list_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let registry = load_registry(&config_in(dir.path()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_malformed_allow_list_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plates.csv"), "plate,model\nA123BC77,Sedan\n").unwrap();
        let registry = load_registry(&config_in(dir.path()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_gpio_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // gpio root does not exist, export cannot be written
        let err = AppContext::from_config(&config_in(dir.path()), false).err().unwrap();
        assert!(matches!(err, Error::Hardware(HardwareError::Fault { pin: 17, .. })));
    }

    #[test]
    fn test_sysfs_context_on_fake_tree() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        for pin in [config.relay_pin, config.motion_pin] {
            let pin_dir = config.gpio_root.join(format!("gpio{}", pin));
            fs::create_dir_all(&pin_dir).unwrap();
            fs::write(pin_dir.join("value"), "0").unwrap();
        }
        fs::write(&config.allow_list_path, "plate,model,owner\nA123BC77,Sedan,Ivanov\n").unwrap();

        let ctx = AppContext::from_config(&config, false).unwrap();
        assert_eq!(ctx.registry.len(), 1);
        assert_eq!(ctx.timings, Timings::default());
        assert!(config.logs_dir.is_dir());
    }

    #[test]
    fn test_retention_settings_sweep() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("2020-01-01")).unwrap();
        let settings = RetentionSettings {
            photos_dir: dir.path().to_path_buf(),
            retention_days: 14,
        };
        let report = settings.sweep(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()).unwrap();
        assert_eq!(report.removed, 1);
    }
}
