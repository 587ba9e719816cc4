//! Cascade-style plate region detection

use std::time::Duration;

use image::{ImageFormat, RgbImage};
use plategate_types::RecognitionFailure;
use serde::Deserialize;

use crate::command::run_command;
use crate::extract_json_from_response;

/// Axis-aligned detector box in frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PlateRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PlateRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One detector hit, in scan order
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub rect: PlateRect,
    /// Detector score, when the detector ranks its results
    pub confidence: Option<f32>,
}

/// Multi-scale detection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorParams {
    pub scale_factor: f32,
    pub min_neighbors: u32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 6,
        }
    }
}

/// Pretrained plate-region detector
pub trait PlateDetector {
    /// Candidate rectangles in scan order; empty when nothing matched
    fn detect(&self, frame: &RgbImage) -> Result<Vec<Candidate>, RecognitionFailure>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectionResponse {
    Candidates { candidates: Vec<CandidateDto> },
    Rects(Vec<[i32; 4]>),
}

#[derive(Debug, Deserialize)]
struct CandidateDto {
    bbox: [i32; 4],
    #[serde(default)]
    confidence: Option<f32>,
}

fn parse_detection(stdout: &str) -> Result<Vec<Candidate>, RecognitionFailure> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }

    let json_str = extract_json_from_response(stdout);
    let parsed: DetectionResponse = serde_json::from_str(&json_str).map_err(|e| {
        RecognitionFailure::RecognizerError(format!("detector output is not valid JSON: {}", e))
    })?;

    let candidates = match parsed {
        DetectionResponse::Candidates { candidates } => candidates
            .into_iter()
            .map(|c| Candidate {
                rect: PlateRect::new(c.bbox[0], c.bbox[1], c.bbox[2], c.bbox[3]),
                confidence: c.confidence,
            })
            .collect(),
        DetectionResponse::Rects(rects) => rects
            .into_iter()
            .map(|[x, y, w, h]| Candidate {
                rect: PlateRect::new(x, y, w, h),
                confidence: None,
            })
            .collect(),
    };

    Ok(candidates)
}

/// Runs an external cascade tool.
///
/// Invoked as `<command> --image <png> --scale-factor <f> --min-neighbors <n>`;
/// stdout is either `{"candidates":[{"bbox":[x,y,w,h],"confidence":0.9}]}`
/// or a bare `[[x,y,w,h], ...]` list.
pub struct CommandPlateDetector {
    command: String,
    params: DetectorParams,
    timeout: Duration,
}

impl CommandPlateDetector {
    pub fn new(command: impl Into<String>, params: DetectorParams, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            params,
            timeout,
        }
    }
}

impl PlateDetector for CommandPlateDetector {
    fn detect(&self, frame: &RgbImage) -> Result<Vec<Candidate>, RecognitionFailure> {
        let input = tempfile::Builder::new()
            .prefix("plategate_detect_")
            .suffix(".png")
            .tempfile()
            .map_err(|e| RecognitionFailure::RecognizerError(e.to_string()))?;
        frame
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| RecognitionFailure::RecognizerError(e.to_string()))?;

        let args = [
            "--image".to_string(),
            input.path().display().to_string(),
            "--scale-factor".to_string(),
            format!("{}", self.params.scale_factor),
            "--min-neighbors".to_string(),
            format!("{}", self.params.min_neighbors),
        ];

        let output = run_command(&self.command, &args, self.timeout)
            .map_err(|e| RecognitionFailure::RecognizerError(format!("plate detector: {}", e)))?;

        let candidates = parse_detection(&output.stdout)?;
        tracing::debug!(
            count = candidates.len(),
            elapsed_ms = output.elapsed.as_millis() as u64,
            "Plate detector finished"
        );
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_candidates_object() {
        let out = r#"{"candidates":[{"bbox":[10,20,120,40],"confidence":0.8},{"bbox":[5,5,50,20]}]}"#;
        let candidates = parse_detection(out).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].rect, PlateRect::new(10, 20, 120, 40));
        assert_eq!(candidates[0].confidence, Some(0.8));
        assert_eq!(candidates[1].confidence, None);
    }

    #[test]
    fn test_parse_bare_rects() {
        let candidates = parse_detection("[[1,2,3,4],[5,6,7,8]]").unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[1].rect, PlateRect::new(5, 6, 7, 8));
    }

    #[test]
    fn test_parse_empty_output() {
        assert!(parse_detection("").unwrap().is_empty());
        assert!(parse_detection("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_garbage_is_recognizer_error() {
        let err = parse_detection("{not json}").unwrap_err();
        assert!(matches!(err, RecognitionFailure::RecognizerError(_)));
    }
}
