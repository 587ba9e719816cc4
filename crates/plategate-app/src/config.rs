//! Configuration management for plategate
//!
//! Config stored at: ~/.config/plategate/config.json

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use plategate_types::{ConfigError, OutputFormat, Result};
use plategate_vision::{
    CandidatePolicy, CommandCamera, CommandPlateDetector, CropMargins, DetectorParams, LocatorConfig,
    TesseractRecognizer,
};
use serde::{Deserialize, Serialize};

use crate::context::{RetentionSettings, Timings};

/// Which GPIO implementation drives the relay and sensor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareBackend {
    #[default]
    Sysfs,
    Simulated,
}

impl std::fmt::Display for HardwareBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HardwareBackend::Sysfs => write!(f, "sysfs"),
            HardwareBackend::Simulated => write!(f, "simulated"),
        }
    }
}

impl FromStr for HardwareBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sysfs" => Ok(HardwareBackend::Sysfs),
            "simulated" | "sim" => Ok(HardwareBackend::Simulated),
            other => Err(ConfigError::Invalid {
                field: "hardware",
                reason: format!("unknown backend '{}' (expected sysfs or simulated)", other),
            }),
        }
    }
}

/// When to keep a JPEG of the captured frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoPolicy {
    /// Only frames that produced a plate string
    #[default]
    Recognized,
    Always,
    Never,
}

impl PhotoPolicy {
    pub fn should_store(&self, recognized: bool) -> bool {
        match self {
            PhotoPolicy::Recognized => recognized,
            PhotoPolicy::Always => true,
            PhotoPolicy::Never => false,
        }
    }
}

impl std::fmt::Display for PhotoPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhotoPolicy::Recognized => write!(f, "recognized"),
            PhotoPolicy::Always => write!(f, "always"),
            PhotoPolicy::Never => write!(f, "never"),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// GPIO backend (sysfs, simulated)
    #[serde(default)]
    pub hardware: HardwareBackend,

    #[serde(default = "default_gpio_root")]
    pub gpio_root: PathBuf,

    /// Relay output pin (BCM numbering)
    #[serde(default = "default_relay_pin")]
    pub relay_pin: u32,

    /// Motion sensor input pin (BCM numbering)
    #[serde(default = "default_motion_pin")]
    pub motion_pin: u32,

    #[serde(default = "default_allow_list_path")]
    pub allow_list_path: PathBuf,

    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    #[serde(default = "default_photos_dir")]
    pub photos_dir: PathBuf,

    #[serde(default = "default_photo_retention_days")]
    pub photo_retention_days: u32,

    #[serde(default)]
    pub photo_policy: PhotoPolicy,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// How long the barrier relay stays asserted on a grant
    #[serde(default = "default_relay_open_ms")]
    pub relay_open_ms: u64,

    /// Delay after every attempt before sensing again
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Still-capture command; the output JPEG path is appended
    #[serde(default = "default_camera_command")]
    pub camera_command: String,

    #[serde(default = "default_camera_timeout_ms")]
    pub camera_timeout_ms: u64,

    #[serde(default = "default_detector_command")]
    pub detector_command: String,

    #[serde(default = "default_detector_scale_factor")]
    pub detector_scale_factor: f32,

    #[serde(default = "default_detector_min_neighbors")]
    pub detector_min_neighbors: u32,

    #[serde(default)]
    pub candidate_policy: CandidatePolicy,

    #[serde(default = "default_detector_timeout_ms")]
    pub detector_timeout_ms: u64,

    #[serde(default)]
    pub crop_margins: CropMargins,

    #[serde(default = "default_upscale_factor")]
    pub upscale_factor: f32,

    #[serde(default = "default_ocr_command")]
    pub ocr_command: String,

    #[serde(default = "default_ocr_page_seg_mode")]
    pub ocr_page_seg_mode: u8,

    #[serde(default = "default_ocr_engine_mode")]
    pub ocr_engine_mode: u8,

    #[serde(default = "default_ocr_timeout_ms")]
    pub ocr_timeout_ms: u64,

    /// Default output format (json, table)
    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_gpio_root() -> PathBuf {
    PathBuf::from("/sys/class/gpio")
}

fn default_relay_pin() -> u32 {
    17
}

fn default_motion_pin() -> u32 {
    4
}

fn default_allow_list_path() -> PathBuf {
    PathBuf::from("plates.csv")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_photos_dir() -> PathBuf {
    PathBuf::from("photos")
}

fn default_photo_retention_days() -> u32 {
    14
}

fn default_jpeg_quality() -> u8 {
    85
}

fn default_relay_open_ms() -> u64 {
    5000
}

fn default_cooldown_ms() -> u64 {
    1000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_camera_command() -> String {
    "fswebcam --no-banner -q -r 1280x720".to_string()
}

fn default_camera_timeout_ms() -> u64 {
    5000
}

fn default_detector_command() -> String {
    "plate-cascade --cascade haarcascade_russian_plate_number.xml".to_string()
}

fn default_detector_scale_factor() -> f32 {
    1.1
}

fn default_detector_min_neighbors() -> u32 {
    6
}

fn default_detector_timeout_ms() -> u64 {
    3000
}

fn default_upscale_factor() -> f32 {
    2.5
}

fn default_ocr_command() -> String {
    "tesseract".to_string()
}

fn default_ocr_page_seg_mode() -> u8 {
    7
}

fn default_ocr_engine_mode() -> u8 {
    3
}

fn default_ocr_timeout_ms() -> u64 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hardware: HardwareBackend::default(),
            gpio_root: default_gpio_root(),
            relay_pin: default_relay_pin(),
            motion_pin: default_motion_pin(),
            allow_list_path: default_allow_list_path(),
            logs_dir: default_logs_dir(),
            photos_dir: default_photos_dir(),
            photo_retention_days: default_photo_retention_days(),
            photo_policy: PhotoPolicy::default(),
            jpeg_quality: default_jpeg_quality(),
            relay_open_ms: default_relay_open_ms(),
            cooldown_ms: default_cooldown_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            camera_command: default_camera_command(),
            camera_timeout_ms: default_camera_timeout_ms(),
            detector_command: default_detector_command(),
            detector_scale_factor: default_detector_scale_factor(),
            detector_min_neighbors: default_detector_min_neighbors(),
            candidate_policy: CandidatePolicy::default(),
            detector_timeout_ms: default_detector_timeout_ms(),
            crop_margins: CropMargins::default(),
            upscale_factor: default_upscale_factor(),
            ocr_command: default_ocr_command(),
            ocr_page_seg_mode: default_ocr_page_seg_mode(),
            ocr_engine_mode: default_ocr_engine_mode(),
            ocr_timeout_ms: default_ocr_timeout_ms(),
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("plategate");
        Ok(config_dir)
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Config file actually in use: the override if given, else the default location
    pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::config_path(),
        }
    }

    /// Load config from `path` (or the default location), or fall back to defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(path)?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Config::default())
        }
    }

    /// Save config to `path` (or the default location)
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        self.validate()?;
        let path = Self::resolve_path(path)?;

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Reject values the controller cannot run with
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.relay_pin == self.motion_pin {
            return Err(ConfigError::Invalid {
                field: "motion_pin",
                reason: format!("same pin as relay_pin ({})", self.relay_pin),
            });
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Invalid {
                field: "jpeg_quality",
                reason: format!("{} is outside 1..=100", self.jpeg_quality),
            });
        }
        if self.detector_scale_factor <= 1.0 {
            return Err(ConfigError::Invalid {
                field: "detector_scale_factor",
                reason: "must be greater than 1.0".to_string(),
            });
        }
        if self.upscale_factor <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "upscale_factor",
                reason: "must be positive".to_string(),
            });
        }
        if self.photo_retention_days == 0 {
            return Err(ConfigError::Invalid {
                field: "photo_retention_days",
                reason: "must keep at least the current day".to_string(),
            });
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "poll_interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        for (field, command) in [
            ("camera_command", &self.camera_command),
            ("detector_command", &self.detector_command),
            ("ocr_command", &self.ocr_command),
        ] {
            if command.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "command is empty".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn timings(&self) -> Timings {
        Timings {
            relay_open: Duration::from_millis(self.relay_open_ms),
            cooldown: Duration::from_millis(self.cooldown_ms),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        }
    }

    pub fn retention(&self) -> RetentionSettings {
        RetentionSettings {
            photos_dir: self.photos_dir.clone(),
            retention_days: self.photo_retention_days,
        }
    }

    pub fn locator_config(&self) -> LocatorConfig {
        LocatorConfig {
            policy: self.candidate_policy,
            margins: self.crop_margins,
            upscale_factor: self.upscale_factor,
        }
    }

    pub fn camera(&self) -> CommandCamera {
        CommandCamera::new(
            self.camera_command.clone(),
            Duration::from_millis(self.camera_timeout_ms),
        )
    }

    pub fn detector(&self) -> CommandPlateDetector {
        CommandPlateDetector::new(
            self.detector_command.clone(),
            DetectorParams {
                scale_factor: self.detector_scale_factor,
                min_neighbors: self.detector_min_neighbors,
            },
            Duration::from_millis(self.detector_timeout_ms),
        )
    }

    pub fn recognizer(&self) -> TesseractRecognizer {
        TesseractRecognizer::new(
            self.ocr_command.clone(),
            self.ocr_page_seg_mode,
            self.ocr_engine_mode,
            Duration::from_millis(self.ocr_timeout_ms),
        )
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Plategate Configuration")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(f, "Hardware:         {}", self.hardware)?;
        writeln!(f, "GPIO root:        {}", self.gpio_root.display())?;
        writeln!(f, "Relay pin:        {}", self.relay_pin)?;
        writeln!(f, "Motion pin:       {}", self.motion_pin)?;
        writeln!(f, "Allow-list:       {}", self.allow_list_path.display())?;
        writeln!(f, "Logs dir:         {}", self.logs_dir.display())?;
        writeln!(f, "Photos dir:       {}", self.photos_dir.display())?;
        writeln!(f, "Photo retention:  {} days", self.photo_retention_days)?;
        writeln!(f, "Photo policy:     {}", self.photo_policy)?;
        writeln!(f, "JPEG quality:     {}", self.jpeg_quality)?;
        writeln!(f)?;
        writeln!(f, "Relay open:       {} ms", self.relay_open_ms)?;
        writeln!(f, "Cooldown:         {} ms", self.cooldown_ms)?;
        writeln!(f, "Poll interval:    {} ms", self.poll_interval_ms)?;
        writeln!(f)?;
        writeln!(
            f,
            "Camera:           {} (timeout {} ms)",
            self.camera_command, self.camera_timeout_ms
        )?;
        writeln!(
            f,
            "Detector:         {} (timeout {} ms)",
            self.detector_command, self.detector_timeout_ms
        )?;
        writeln!(
            f,
            "  scale/neighbors: {} / {}",
            self.detector_scale_factor, self.detector_min_neighbors
        )?;
        writeln!(f, "  candidate:      {:?}", self.candidate_policy)?;
        writeln!(
            f,
            "  crop margins:   top {} bottom {} left {} right {}",
            self.crop_margins.top, self.crop_margins.bottom, self.crop_margins.left, self.crop_margins.right
        )?;
        writeln!(f, "  upscale:        {}x", self.upscale_factor)?;
        writeln!(
            f,
            "OCR:              {} --psm {} --oem {} (timeout {} ms)",
            self.ocr_command, self.ocr_page_seg_mode, self.ocr_engine_mode, self.ocr_timeout_ms
        )?;
        writeln!(f, "Output format:    {}", self.output_format)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plategate_types::Error;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.relay_pin, 17);
        assert_eq!(config.motion_pin, 4);
        assert_eq!(config.photo_retention_days, 14);
        assert_eq!(config.candidate_policy, CandidatePolicy::Last);
        let timings = config.timings();
        assert_eq!(timings.relay_open, Duration::from_secs(5));
        assert_eq!(timings.cooldown, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"relay_pin": 22, "candidate_policy": "highest_confidence"}"#).unwrap();
        assert_eq!(config.relay_pin, 22);
        assert_eq!(config.motion_pin, 4);
        assert_eq!(config.candidate_policy, CandidatePolicy::HighestConfidence);
        assert_eq!(config.crop_margins, CropMargins::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.hardware = HardwareBackend::Simulated;
        config.photo_policy = PhotoPolicy::Always;
        config.save(Some(&path)).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_load_garbage_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validate_rejects_shared_pin() {
        let config = Config {
            motion_pin: 17,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "motion_pin", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_command() {
        let config = Config {
            ocr_command: "  ".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "ocr_command", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_zero_retention() {
        let config = Config {
            photo_retention_days: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "photo_retention_days", .. })
        ));
    }

    #[test]
    fn test_resolve_path_prefers_override() {
        let custom = Path::new("/etc/plategate.json");
        assert_eq!(Config::resolve_path(Some(custom)).unwrap(), custom);
        if let Ok(default) = Config::config_path() {
            assert_eq!(Config::resolve_path(None).unwrap(), default);
        }
    }

    #[test]
    fn test_display_has_no_file_location() {
        let shown = Config::default().to_string();
        assert!(!shown.contains("Config file"));
        assert!(shown.contains("Relay pin:        17"));
    }

    #[test]
    fn test_hardware_from_str() {
        assert_eq!("SYSFS".parse::<HardwareBackend>().unwrap(), HardwareBackend::Sysfs);
        assert_eq!("simulated".parse::<HardwareBackend>().unwrap(), HardwareBackend::Simulated);
        assert!("gpiod".parse::<HardwareBackend>().is_err());
    }

    #[test]
    fn test_photo_policy() {
        assert!(PhotoPolicy::Recognized.should_store(true));
        assert!(!PhotoPolicy::Recognized.should_store(false));
        assert!(PhotoPolicy::Always.should_store(false));
        assert!(!PhotoPolicy::Never.should_store(true));
    }
}
