//! Swing phase detection.
//!
//! [`PhaseDetector`] is the capability every detector variant implements.
//! [`MotionPhaseDetector`] is the motion-magnitude variant: it samples stills
//! through a [`FrameExtractor`] and runs the heuristic in [`motion`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::analysis::SwingAnalysis;
use crate::error::DetectionError;

pub mod extractor;
pub mod motion;
pub mod motion_detector;
pub mod sampling;

pub use extractor::{FrameExtractor, ImageSequenceExtractor, LumaFrame};
pub use motion::{MotionSample, PhaseEstimate};
pub use motion_detector::MotionPhaseDetector;

/// Result of one automatic detection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseDetectionResult {
    pub takeaway_frame: u32,
    pub top_frame: u32,
    pub impact_frame: u32,
    /// In [0, 1]
    pub confidence: f64,
    pub processing_time_ms: u64,
    /// Stills requested from the extractor
    pub samples_planned: usize,
    /// Stills the extractor failed to deliver
    pub samples_failed: usize,
    /// Estimate came from the proportional template, not from motion
    pub template_fallback: bool,
}

impl PhaseDetectionResult {
    /// Untouched detector output as a swing analysis.
    pub fn to_analysis(&self) -> SwingAnalysis {
        SwingAnalysis::from_frames(
            self.takeaway_frame,
            self.top_frame,
            self.impact_frame,
            self.confidence,
            false,
        )
    }
}

/// Capability shared by swing phase detectors.
///
/// Lifecycle: `Uninitialized -> Ready -> Disposed`, with `initialize` allowed
/// again after `dispose`.
#[async_trait]
pub trait PhaseDetector: Send + Sync {
    /// Acquire detector resources. Succeeds immediately when already ready.
    async fn initialize(&self) -> Result<(), DetectionError>;

    fn is_ready(&self) -> bool;

    /// Estimate the three event frames of the swing recorded at `uri`.
    ///
    /// # Errors
    /// * `NotInitialized` unless the detector is ready
    /// * `InvalidInput` for a non-positive or non-finite `fps`
    /// * `DetectionFailed` when no usable signal could be extracted
    async fn detect_swing_phases(
        &self,
        uri: &str,
        fps: f64,
    ) -> Result<PhaseDetectionResult, DetectionError>;

    /// Release retained resources. Safe from any state and repeatable.
    fn dispose(&self);

    /// Human-readable name for logging.
    fn name(&self) -> &'static str;
}
