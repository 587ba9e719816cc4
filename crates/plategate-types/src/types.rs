//! Shared data model for the gate controller

use chrono::{DateTime, Local};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CameraError, RecognitionFailure};

/// Plate sentinel written to the audit log when no plate was read
pub const UNRECOGNIZED_PLATE: &str = "not recognized";

/// Model/owner sentinel for events without a matching allow-list record
pub const NO_DATA: &str = "no data";

/// Allowed vehicle, keyed by its normalized plate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlateRecord {
    /// Normalized plate string (e.g. "A123BC77")
    pub plate: String,
    /// Vehicle model (e.g. "Sedan")
    pub model: String,
    /// Registered owner
    pub owner: String,
}

impl PlateRecord {
    pub fn new(
        plate: impl Into<String>,
        model: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            plate: plate.into(),
            model: model.into(),
            owner: owner.into(),
        }
    }
}

/// A still frame from the gate camera
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub image: RgbImage,
    pub captured_at: DateTime<Local>,
}

impl CapturedFrame {
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            captured_at: Local::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Outcome of one run of the recognition pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecognitionResult {
    Recognized(String),
    NotRecognized(RecognitionFailure),
}

impl RecognitionResult {
    pub fn plate(&self) -> Option<&str> {
        match self {
            RecognitionResult::Recognized(plate) => Some(plate),
            RecognitionResult::NotRecognized(_) => None,
        }
    }
}

/// Plate reported on a denial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeniedPlate {
    /// A plate was read but is not on the allow-list
    Unlisted(String),
    /// Nothing usable was read
    Unrecognized,
}

impl std::fmt::Display for DeniedPlate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeniedPlate::Unlisted(plate) => write!(f, "{}", plate),
            DeniedPlate::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Grant or deny, derived from a recognition result and the allow-list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessDecision {
    Granted(PlateRecord),
    Denied(DeniedPlate),
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted(_))
    }
}

/// Status tag of an audit event; also selects the log partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditStatus {
    #[serde(rename = "access granted")]
    AccessGranted,
    #[serde(rename = "access denied")]
    AccessDenied,
    #[serde(rename = "camera error")]
    CameraError,
    #[serde(rename = "capture error")]
    CaptureError,
}

impl AuditStatus {
    pub const ALL: [AuditStatus; 4] = [
        AuditStatus::AccessGranted,
        AuditStatus::AccessDenied,
        AuditStatus::CameraError,
        AuditStatus::CaptureError,
    ];

    /// Human-readable tag
    pub fn label(&self) -> &'static str {
        match self {
            AuditStatus::AccessGranted => "access granted",
            AuditStatus::AccessDenied => "access denied",
            AuditStatus::CameraError => "camera error",
            AuditStatus::CaptureError => "capture error",
        }
    }

    /// File-name prefix of the per-day log partition
    pub fn slug(&self) -> &'static str {
        match self {
            AuditStatus::AccessGranted => "access_granted",
            AuditStatus::AccessDenied => "access_denied",
            AuditStatus::CameraError => "camera_error",
            AuditStatus::CaptureError => "capture_error",
        }
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One immutable record of a capture attempt's outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    #[serde(with = "local_timestamp")]
    pub timestamp: DateTime<Local>,
    pub plate: String,
    pub model: String,
    pub owner: String,
    pub status: AuditStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AuditEvent {
    fn build(status: AuditStatus, plate: &str, model: &str, owner: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Local::now(),
            plate: plate.to_string(),
            model: model.to_string(),
            owner: owner.to_string(),
            status,
            detail: None,
        }
    }

    pub fn granted(record: &PlateRecord) -> Self {
        Self::build(
            AuditStatus::AccessGranted,
            &record.plate,
            &record.model,
            &record.owner,
        )
    }

    pub fn denied(plate: &DeniedPlate) -> Self {
        let plate = match plate {
            DeniedPlate::Unlisted(plate) => plate.as_str(),
            DeniedPlate::Unrecognized => UNRECOGNIZED_PLATE,
        };
        Self::build(AuditStatus::AccessDenied, plate, NO_DATA, NO_DATA)
    }

    pub fn camera_failure(error: &CameraError) -> Self {
        let status = match error {
            CameraError::Unavailable(_) => AuditStatus::CameraError,
            CameraError::CaptureFailed(_) => AuditStatus::CaptureError,
        };
        Self::build(status, UNRECOGNIZED_PLATE, NO_DATA, NO_DATA).with_detail(error.to_string())
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// `YYYY-MM-DD HH:MM:SS` in local time
mod local_timestamp {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let naive = NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| serde::de::Error::custom(format!("nonexistent local time: {}", raw)))
    }
}
