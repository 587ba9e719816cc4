//! Character recognition over a grayscale plate crop

use std::time::Duration;

use image::{GrayImage, ImageFormat};
use plategate_types::RecognitionFailure;

use crate::command::{run_command, CommandError};

/// Single-line text recognizer restricted to a character whitelist
pub trait TextRecognizer {
    fn recognize(&self, plate: &GrayImage, whitelist: &str) -> Result<String, RecognitionFailure>;
}

/// Tesseract CLI backend.
///
/// Runs `tesseract <png> <outbase> --psm N --oem M -c tessedit_char_whitelist=...`
/// and reads `<outbase>.txt`.
pub struct TesseractRecognizer {
    command: String,
    page_seg_mode: u8,
    engine_mode: u8,
    timeout: Duration,
}

impl TesseractRecognizer {
    pub fn new(command: impl Into<String>, page_seg_mode: u8, engine_mode: u8, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            page_seg_mode,
            engine_mode,
            timeout,
        }
    }

    fn args(&self, input: &str, outbase: &str, whitelist: &str) -> Vec<String> {
        vec![
            input.to_string(),
            outbase.to_string(),
            "--psm".to_string(),
            self.page_seg_mode.to_string(),
            "--oem".to_string(),
            self.engine_mode.to_string(),
            "-c".to_string(),
            format!("tessedit_char_whitelist={}", whitelist),
        ]
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, plate: &GrayImage, whitelist: &str) -> Result<String, RecognitionFailure> {
        let workdir = tempfile::Builder::new()
            .prefix("plategate_ocr_")
            .tempdir()
            .map_err(|e| RecognitionFailure::RecognizerError(e.to_string()))?;
        let input = workdir.path().join("plate.png");
        let outbase = workdir.path().join("plate");

        plate
            .save_with_format(&input, ImageFormat::Png)
            .map_err(|e| RecognitionFailure::RecognizerError(e.to_string()))?;

        let args = self.args(
            &input.display().to_string(),
            &outbase.display().to_string(),
            whitelist,
        );

        match run_command(&self.command, &args, self.timeout) {
            Ok(output) => {
                tracing::debug!(elapsed_ms = output.elapsed.as_millis() as u64, "OCR finished");
            }
            Err(err @ CommandError::Timeout { .. }) => {
                tracing::warn!(error = %err, "OCR timed out");
                return Err(RecognitionFailure::RecognizerError(err.to_string()));
            }
            Err(err) => return Err(RecognitionFailure::RecognizerError(err.to_string())),
        }

        std::fs::read_to_string(outbase.with_extension("txt"))
            .map_err(|e| RecognitionFailure::RecognizerError(format!("OCR output missing: {}", e)))
    }
}
