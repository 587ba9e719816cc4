//! JPEG archive of captured frames, one directory per day

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use plategate_domain::repository::PhotoRepository;
use plategate_types::{CapturedFrame, Result};

pub const DAY_DIR_FORMAT: &str = "%Y-%m-%d";

pub struct PhotoArchive {
    root: PathBuf,
    jpeg_quality: u8,
}

impl PhotoArchive {
    pub fn new(root: impl Into<PathBuf>, jpeg_quality: u8) -> Self {
        Self {
            root: root.into(),
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// `<root>/<YYYY-MM-DD>/<PLATE>_<HHMMSS>.jpg`, or
    /// `<root>/<YYYY-MM-DD>/<YYYY-MM-DD-HH-MM-SS>.jpg` without a plate
    pub fn photo_path(&self, frame: &CapturedFrame, plate: Option<&str>) -> PathBuf {
        let day_dir = self.root.join(frame.captured_at.format(DAY_DIR_FORMAT).to_string());
        let stem = match plate {
            Some(plate) => format!("{}_{}", plate, frame.captured_at.format("%H%M%S")),
            None => frame.captured_at.format("%Y-%m-%d-%H-%M-%S").to_string(),
        };
        unique_path(&day_dir, &stem)
    }
}

// Two captures within one second must not overwrite each other
fn unique_path(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(format!("{}.jpg", stem));
    if !first.exists() {
        return first;
    }
    (1..)
        .map(|n| dir.join(format!("{}_{}.jpg", stem, n)))
        .find(|p| !p.exists())
        .unwrap_or(first)
}

impl PhotoRepository for PhotoArchive {
    fn store(&self, frame: &CapturedFrame, plate: Option<&str>) -> Result<PathBuf> {
        let path = self.photo_path(frame, plate);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let writer = BufWriter::new(File::create(&path)?);
        let encoder = JpegEncoder::new_with_quality(writer, self.jpeg_quality);
        frame.image.write_with_encoder(encoder)?;

        tracing::debug!(path = %path.display(), "Photo stored");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use image::RgbImage;

    fn frame_at(h: u32, m: u32, s: u32) -> CapturedFrame {
        let mut frame = CapturedFrame::new(RgbImage::new(32, 24));
        frame.captured_at = Local.with_ymd_and_hms(2026, 10, 16, h, m, s).unwrap();
        frame
    }

    #[test]
    fn test_named_after_plate() {
        let dir = tempfile::tempdir().unwrap();
        let archive = PhotoArchive::new(dir.path(), 85);
        let path = archive.store(&frame_at(9, 5, 7), Some("A123BC77")).unwrap();
        assert_eq!(path, dir.path().join("2026-10-16").join("A123BC77_090507.jpg"));
        assert!(path.exists());

        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn test_named_after_timestamp_without_plate() {
        let dir = tempfile::tempdir().unwrap();
        let archive = PhotoArchive::new(dir.path(), 85);
        let path = archive.store(&frame_at(23, 59, 1), None).unwrap();
        assert_eq!(
            path,
            dir.path().join("2026-10-16").join("2026-10-16-23-59-01.jpg")
        );
    }

    #[test]
    fn test_same_second_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let archive = PhotoArchive::new(dir.path(), 85);
        let first = archive.store(&frame_at(12, 0, 0), Some("A123BC77")).unwrap();
        let second = archive.store(&frame_at(12, 0, 0), Some("A123BC77")).unwrap();
        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
    }

    #[test]
    fn test_quality_clamped() {
        let archive = PhotoArchive::new("/tmp", 0);
        assert_eq!(archive.jpeg_quality, 1);
        let archive = PhotoArchive::new("/tmp", 255);
        assert_eq!(archive.jpeg_quality, 100);
    }
}
