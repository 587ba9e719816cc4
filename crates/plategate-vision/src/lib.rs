//! Vision module - still capture, plate localization and OCR

pub mod camera;
pub mod command;
pub mod detector;
pub mod locator;
pub mod ocr;
pub mod pipeline;

// Re-export main types for convenience
pub use camera::{Camera, CommandCamera, StillImageCamera};
pub use detector::{Candidate, CommandPlateDetector, DetectorParams, PlateDetector, PlateRect};
pub use locator::{CandidatePolicy, CropMargins, LocatorConfig, PlateLocator};
pub use ocr::{TesseractRecognizer, TextRecognizer};
pub use pipeline::RecognitionPipeline;

/// Extract the JSON payload from tool output that may carry log noise
pub fn extract_json_from_response(response: &str) -> String {
    let trimmed = response.trim();
    let start = trimmed.find(|c| c == '{' || c == '[');
    let end = trimmed.rfind(|c| c == '}' || c == ']');
    match (start, end) {
        (Some(start), Some(end)) if end >= start => trimmed[start..=end].to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_with_noise() {
        let raw = "loading cascade...\n{\"candidates\": []}\ndone";
        assert_eq!(extract_json_from_response(raw), "{\"candidates\": []}");
    }

    #[test]
    fn test_extract_json_array() {
        assert_eq!(extract_json_from_response("  [[1,2,3,4]] "), "[[1,2,3,4]]");
    }

    #[test]
    fn test_extract_json_passthrough() {
        assert_eq!(extract_json_from_response("no json"), "no json");
    }
}
