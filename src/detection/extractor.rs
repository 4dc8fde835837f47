//! Frame extraction boundary of the phase detector.
//!
//! The detector only needs grayscale stills at requested timestamps. Anything
//! able to produce them (a platform thumbnailer, a directory of decoded frames,
//! a synthetic renderer in tests) implements [`FrameExtractor`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, ensure, Context, Result};
use async_trait::async_trait;
use image::imageops::FilterType;

use crate::error::DetectionError;
use crate::timebase::{clamp_frame, ms_to_frame};

/// 8-bit grayscale still, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct LumaFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl LumaFrame {
    /// Wrap raw luma pixels, checking that the buffer matches the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        ensure!(
            pixels.len() == width as usize * height as usize,
            "luma buffer has {} bytes, expected {}x{}",
            pixels.len(),
            width,
            height
        );
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Mean absolute per-pixel difference to `other`.
    ///
    /// Returns `None` when the frames do not share dimensions or are empty.
    pub fn mean_abs_diff(&self, other: &LumaFrame) -> Option<f64> {
        if self.width != other.width || self.height != other.height || self.pixels.is_empty() {
            return None;
        }

        let total: u64 = self
            .pixels
            .iter()
            .zip(&other.pixels)
            .map(|(a, b)| a.abs_diff(*b) as u64)
            .sum();
        Some(total as f64 / self.pixels.len() as f64)
    }
}

/// Source of still frames for phase detection.
///
/// Each call is independent; the detector tolerates individual failures.
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Length of the clip at `uri`, in milliseconds.
    async fn probe_duration_ms(&self, uri: &str) -> Result<u64>;

    /// Grayscale still of `uri` at `time_ms`.
    async fn extract_frame(&self, uri: &str, time_ms: f64) -> Result<LumaFrame>;
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Extractor reading a directory of still frames recorded at a known rate.
///
/// The URI is the directory path. Frames are ordered by file name and frame
/// `n` covers `[n / fps, (n + 1) / fps)` seconds. Decoding runs on Tokio's
/// blocking pool and each still is reduced to a luma thumbnail.
pub struct ImageSequenceExtractor {
    fps: f64,
    thumbnail_width: u32,
    listings: Mutex<HashMap<String, Arc<Vec<PathBuf>>>>,
}

impl ImageSequenceExtractor {
    /// # Arguments
    /// * `fps` - Rate the frames were recorded at
    /// * `thumbnail_width` - Width stills are reduced to before motion analysis
    ///
    /// # Errors
    /// `InvalidInput` if `fps` is not positive and finite or the width is 0.
    pub fn new(fps: f64, thumbnail_width: u32) -> Result<Self, DetectionError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(DetectionError::InvalidInput {
                reason: format!("image sequence fps must be positive (got {})", fps),
            });
        }
        if thumbnail_width == 0 {
            return Err(DetectionError::InvalidInput {
                reason: "thumbnail width must be at least 1 pixel".to_string(),
            });
        }

        Ok(Self {
            fps,
            thumbnail_width,
            listings: Mutex::new(HashMap::new()),
        })
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    async fn frames(&self, uri: &str) -> Result<Arc<Vec<PathBuf>>> {
        let cached = self
            .listings
            .lock()
            .map_err(|_| anyhow!("frame listing cache poisoned"))?
            .get(uri)
            .cloned();
        if let Some(listing) = cached {
            return Ok(listing);
        }

        let dir = PathBuf::from(uri);
        let listing = tokio::task::spawn_blocking(move || list_frames(&dir))
            .await
            .context("frame listing task failed")??;
        let listing = Arc::new(listing);

        self.listings
            .lock()
            .map_err(|_| anyhow!("frame listing cache poisoned"))?
            .insert(uri.to_string(), Arc::clone(&listing));
        Ok(listing)
    }
}

#[async_trait]
impl FrameExtractor for ImageSequenceExtractor {
    async fn probe_duration_ms(&self, uri: &str) -> Result<u64> {
        let frames = self.frames(uri).await?;
        Ok((frames.len() as f64 / self.fps * 1000.0).round() as u64)
    }

    async fn extract_frame(&self, uri: &str, time_ms: f64) -> Result<LumaFrame> {
        let frames = self.frames(uri).await?;
        let index = clamp_frame(ms_to_frame(time_ms, self.fps), frames.len() as u32) as usize;
        let path = frames
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow!("no frames in {}", uri))?;

        let width = self.thumbnail_width;
        tokio::task::spawn_blocking(move || decode_luma(&path, width))
            .await
            .context("frame decode task failed")?
    }
}

fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("cannot read {}", dir.display()))?;

    let mut frames = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_image {
            frames.push(path);
        }
    }

    if frames.is_empty() {
        bail!("{} contains no image frames", dir.display());
    }
    frames.sort();
    Ok(frames)
}

fn decode_luma(path: &Path, thumbnail_width: u32) -> Result<LumaFrame> {
    let mut img =
        image::open(path).with_context(|| format!("failed to decode {}", path.display()))?;

    if img.width() > thumbnail_width {
        let height = ((img.height() as u64 * thumbnail_width as u64) / img.width() as u64).max(1);
        img = img.resize_exact(thumbnail_width, height as u32, FilterType::Triangle);
    }

    let luma = img.to_luma8();
    let (width, height) = luma.dimensions();
    LumaFrame::new(width, height, luma.into_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("swing-tempo-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_luma_frame_rejects_bad_buffer() {
        assert!(LumaFrame::new(2, 2, vec![0; 3]).is_err());
        assert!(LumaFrame::new(2, 2, vec![0; 4]).is_ok());
    }

    #[test]
    fn test_mean_abs_diff() {
        let a = LumaFrame::new(2, 1, vec![10, 200]).unwrap();
        let b = LumaFrame::new(2, 1, vec![20, 100]).unwrap();
        assert_eq!(a.mean_abs_diff(&b), Some(55.0));
        assert_eq!(a.mean_abs_diff(&a), Some(0.0));

        let c = LumaFrame::new(1, 2, vec![10, 200]).unwrap();
        assert_eq!(a.mean_abs_diff(&c), None);
    }

    #[test]
    fn test_new_validates_arguments() {
        assert!(ImageSequenceExtractor::new(0.0, 32).is_err());
        assert!(ImageSequenceExtractor::new(30.0, 0).is_err());
    }

    #[tokio::test]
    async fn test_reads_frames_in_name_order() {
        let dir = temp_dir("sequence");
        for (i, shade) in [0u8, 100, 200].iter().enumerate() {
            let img = GrayImage::from_pixel(8, 4, Luma([*shade]));
            img.save(dir.join(format!("frame_{:03}.png", i))).unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();

        let extractor = ImageSequenceExtractor::new(10.0, 4).unwrap();
        let uri = dir.to_str().unwrap();

        assert_eq!(extractor.probe_duration_ms(uri).await.unwrap(), 300);

        let frame = extractor.extract_frame(uri, 150.0).await.unwrap();
        assert_eq!((frame.width, frame.height), (4, 2));
        assert!(frame.pixels.iter().all(|p| p.abs_diff(100) <= 1));

        // Past the end clamps to the last frame
        let frame = extractor.extract_frame(uri, 10_000.0).await.unwrap();
        assert!(frame.pixels.iter().all(|p| p.abs_diff(200) <= 1));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_missing_directory_fails() {
        let extractor = ImageSequenceExtractor::new(30.0, 32).unwrap();
        assert!(extractor
            .probe_duration_ms("/definitely/not/a/frame/dir")
            .await
            .is_err());
    }
}
