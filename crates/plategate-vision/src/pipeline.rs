//! Recognition pipeline: frame -> plate crop -> grayscale -> OCR -> normalized plate

use std::panic::{self, AssertUnwindSafe};

use image::imageops;
use plategate_domain::service::{normalize_plate, PLATE_ALPHABET};
use plategate_types::{CapturedFrame, RecognitionFailure, RecognitionResult};

use crate::locator::PlateLocator;
use crate::ocr::TextRecognizer;

pub struct RecognitionPipeline {
    locator: PlateLocator,
    recognizer: Box<dyn TextRecognizer>,
}

impl RecognitionPipeline {
    pub fn new(locator: PlateLocator, recognizer: Box<dyn TextRecognizer>) -> Self {
        Self {
            locator,
            recognizer,
        }
    }

    /// Turn a frame into a normalized plate or a definite "not recognized".
    ///
    /// Never fails: every error from the detector or recognizer, including a
    /// panic inside a backend, is folded into `NotRecognized`.
    pub fn recognize(&self, frame: &CapturedFrame) -> RecognitionResult {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| self.run(frame)));

        let result = match attempt {
            Ok(Ok(plate)) => RecognitionResult::Recognized(plate),
            Ok(Err(reason)) => RecognitionResult::NotRecognized(reason),
            Err(_) => RecognitionResult::NotRecognized(RecognitionFailure::RecognizerError(
                "recognizer panicked".to_string(),
            )),
        };

        match &result {
            RecognitionResult::Recognized(plate) => tracing::info!(plate = %plate, "Plate recognized"),
            RecognitionResult::NotRecognized(reason) => tracing::info!(reason = %reason, "Plate not recognized"),
        }

        result
    }

    fn run(&self, frame: &CapturedFrame) -> Result<String, RecognitionFailure> {
        let plate_crop = self.locator.locate(&frame.image)?;
        let gray = imageops::grayscale(&plate_crop);

        let raw = self.recognizer.recognize(&gray, PLATE_ALPHABET)?;
        tracing::debug!(raw = %raw.escape_debug(), "OCR raw text");

        normalize_plate(&raw).ok_or(RecognitionFailure::EmptyText)
    }
}
