//! Plate localization: pick a detector candidate, trim its border, upscale

use image::imageops::{self, FilterType};
use image::RgbImage;
use plategate_types::RecognitionFailure;
use serde::{Deserialize, Serialize};

use crate::detector::{Candidate, PlateDetector, PlateRect};

/// Which candidate to use when the detector reports several
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePolicy {
    /// Last candidate in scan order
    #[default]
    Last,
    /// Highest detector score; falls back to scan order without scores
    HighestConfidence,
}

/// Pixels trimmed inward from each side of the detected box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropMargins {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Default for CropMargins {
    fn default() -> Self {
        Self {
            top: 15,
            bottom: 10,
            left: 15,
            right: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatorConfig {
    pub policy: CandidatePolicy,
    pub margins: CropMargins,
    pub upscale_factor: f32,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            policy: CandidatePolicy::Last,
            margins: CropMargins::default(),
            upscale_factor: 2.5,
        }
    }
}

pub struct PlateLocator {
    detector: Box<dyn PlateDetector>,
    config: LocatorConfig,
}

impl PlateLocator {
    pub fn new(detector: Box<dyn PlateDetector>, config: LocatorConfig) -> Self {
        Self { detector, config }
    }

    /// Find the plate in a color frame and return the trimmed, upscaled crop
    pub fn locate(&self, frame: &RgbImage) -> Result<RgbImage, RecognitionFailure> {
        let candidates = self.detector.detect(frame)?;
        let candidate =
            select_candidate(&candidates, self.config.policy).ok_or(RecognitionFailure::NoPlateDetected)?;

        let (x, y, width, height) = crop_bounds(
            &candidate.rect,
            &self.config.margins,
            frame.width(),
            frame.height(),
        )
        .ok_or(RecognitionFailure::NoPlateDetected)?;

        tracing::debug!(
            candidates = candidates.len(),
            x, y, width, height,
            "Plate region selected"
        );

        let crop = imageops::crop_imm(frame, x, y, width, height).to_image();
        Ok(upscale(&crop, self.config.upscale_factor))
    }
}

pub fn select_candidate(candidates: &[Candidate], policy: CandidatePolicy) -> Option<&Candidate> {
    match policy {
        CandidatePolicy::Last => candidates.last(),
        CandidatePolicy::HighestConfidence => {
            if candidates.iter().all(|c| c.confidence.is_none()) {
                return candidates.last();
            }
            // max_by keeps the later element on ties, matching scan-order preference
            candidates.iter().max_by(|a, b| {
                let a = a.confidence.unwrap_or(f32::MIN);
                let b = b.confidence.unwrap_or(f32::MIN);
                a.total_cmp(&b)
            })
        }
    }
}

/// Margin-trimmed crop rectangle clamped to the frame, or `None` when empty
pub fn crop_bounds(
    rect: &PlateRect,
    margins: &CropMargins,
    frame_width: u32,
    frame_height: u32,
) -> Option<(u32, u32, u32, u32)> {
    let clamp = |value: i64, max: u32| value.clamp(0, i64::from(max));

    let left = clamp(i64::from(rect.x) + i64::from(margins.left), frame_width);
    let top = clamp(i64::from(rect.y) + i64::from(margins.top), frame_height);
    let right = clamp(
        i64::from(rect.x) + i64::from(rect.width) - i64::from(margins.right),
        frame_width,
    );
    let bottom = clamp(
        i64::from(rect.y) + i64::from(rect.height) - i64::from(margins.bottom),
        frame_height,
    );

    if right <= left || bottom <= top {
        return None;
    }

    Some((
        left as u32,
        top as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}

pub fn upscale(image: &RgbImage, factor: f32) -> RgbImage {
    if (factor - 1.0).abs() < f32::EPSILON {
        return image.clone();
    }
    let width = ((image.width() as f32) * factor).round().max(1.0) as u32;
    let height = ((image.height() as f32) * factor).round().max(1.0) as u32;
    imageops::resize(image, width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    struct FixedDetector(Vec<Candidate>);

    impl PlateDetector for FixedDetector {
        fn detect(&self, _frame: &RgbImage) -> Result<Vec<Candidate>, RecognitionFailure> {
            Ok(self.0.clone())
        }
    }

    fn candidate(x: i32, y: i32, w: i32, h: i32, confidence: Option<f32>) -> Candidate {
        Candidate {
            rect: PlateRect::new(x, y, w, h),
            confidence,
        }
    }

    #[test]
    fn test_crop_bounds_applies_margins() {
        let bounds = crop_bounds(&PlateRect::new(100, 50, 200, 60), &CropMargins::default(), 640, 480);
        // x: 100+15 .. 100+200-20, y: 50+15 .. 50+60-10
        assert_eq!(bounds, Some((115, 65, 165, 35)));
    }

    #[test]
    fn test_crop_bounds_clamped_to_frame() {
        let bounds = crop_bounds(&PlateRect::new(-30, -30, 100, 100), &CropMargins::default(), 50, 40);
        assert_eq!(bounds, Some((0, 0, 50, 40)));
    }

    #[test]
    fn test_crop_bounds_empty_after_margins() {
        // 30px wide box minus 15 left and 20 right margins
        assert_eq!(
            crop_bounds(&PlateRect::new(10, 10, 30, 100), &CropMargins::default(), 640, 480),
            None
        );
        // box entirely outside the frame
        assert_eq!(
            crop_bounds(&PlateRect::new(700, 10, 100, 100), &CropMargins::default(), 640, 480),
            None
        );
    }

    #[test]
    fn test_select_last_in_scan_order() {
        let candidates = vec![
            candidate(0, 0, 10, 10, Some(0.9)),
            candidate(5, 5, 10, 10, Some(0.1)),
        ];
        let chosen = select_candidate(&candidates, CandidatePolicy::Last).unwrap();
        assert_eq!(chosen.rect.x, 5);
    }

    #[test]
    fn test_select_highest_confidence() {
        let candidates = vec![
            candidate(0, 0, 10, 10, Some(0.9)),
            candidate(5, 5, 10, 10, Some(0.1)),
            candidate(9, 9, 10, 10, None),
        ];
        let chosen = select_candidate(&candidates, CandidatePolicy::HighestConfidence).unwrap();
        assert_eq!(chosen.rect.x, 0);
    }

    #[test]
    fn test_select_highest_confidence_without_scores() {
        let candidates = vec![candidate(0, 0, 10, 10, None), candidate(7, 7, 10, 10, None)];
        let chosen = select_candidate(&candidates, CandidatePolicy::HighestConfidence).unwrap();
        assert_eq!(chosen.rect.x, 7);
    }

    #[test]
    fn test_select_from_empty() {
        assert!(select_candidate(&[], CandidatePolicy::Last).is_none());
        assert!(select_candidate(&[], CandidatePolicy::HighestConfidence).is_none());
    }

    #[test]
    fn test_upscale_factor() {
        let img = RgbImage::from_pixel(40, 12, Rgb([200, 200, 200]));
        let big = upscale(&img, 2.5);
        assert_eq!((big.width(), big.height()), (100, 30));
    }

    #[test]
    fn test_locate_crops_and_upscales() {
        let frame = RgbImage::from_pixel(640, 480, Rgb([0, 0, 0]));
        let locator = PlateLocator::new(
            Box::new(FixedDetector(vec![candidate(100, 50, 200, 60, None)])),
            LocatorConfig::default(),
        );
        let plate = locator.locate(&frame).unwrap();
        assert_eq!((plate.width(), plate.height()), (413, 88));
    }

    #[test]
    fn test_locate_no_candidates() {
        let frame = RgbImage::new(64, 48);
        let locator = PlateLocator::new(Box::new(FixedDetector(Vec::new())), LocatorConfig::default());
        assert!(matches!(locator.locate(&frame), Err(RecognitionFailure::NoPlateDetected)));
    }

    #[test]
    fn test_locate_degenerate_candidate() {
        let frame = RgbImage::new(64, 48);
        let locator = PlateLocator::new(
            Box::new(FixedDetector(vec![candidate(0, 0, 20, 20, Some(1.0))])),
            LocatorConfig::default(),
        );
        assert!(matches!(locator.locate(&frame), Err(RecognitionFailure::NoPlateDetected)));
    }
}
