// DetectionManager: Focused manager for automatic phase detection
//
// Single Responsibility: detector lifecycle and conversion of detector output
// into a SwingAnalysis

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::SwingAnalysis;
use crate::detection::{PhaseDetectionResult, PhaseDetector};
use crate::error::{log_detection_error, DetectionError};

/// Detector output together with the analysis derived from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionOutcome {
    pub detection: PhaseDetectionResult,
    pub analysis: SwingAnalysis,
}

/// Manages a phase detector on behalf of the engine
///
/// This manager handles:
/// - Lazy initialization before the first detection
/// - Converting detector output into an untouched `SwingAnalysis`
/// - Logging detector errors with their codes
/// - Releasing detector resources
///
/// # Example
/// ```ignore
/// let manager = DetectionManager::new(Arc::new(detector));
/// let outcome = manager.detect("/videos/swing-01", 30.0).await?;
/// println!("ratio {:.2}", outcome.analysis.ratio);
/// manager.dispose();
/// ```
pub struct DetectionManager {
    detector: Arc<dyn PhaseDetector>,
    completed_runs: AtomicU64,
}

impl DetectionManager {
    /// Create a manager around `detector`. The detector is not initialized yet.
    pub fn new(detector: Arc<dyn PhaseDetector>) -> Self {
        Self {
            detector,
            completed_runs: AtomicU64::new(0),
        }
    }

    /// Initialize the detector unless it is already ready.
    ///
    /// # Errors
    /// Whatever the detector reports from `initialize`.
    pub async fn ensure_ready(&self) -> Result<(), DetectionError> {
        if self.detector.is_ready() {
            return Ok(());
        }

        self.detector
            .initialize()
            .await
            .inspect_err(|err| log_detection_error(err, "ensure_ready"))
    }

    /// Run detection on `uri`, initializing the detector on first use.
    ///
    /// # Arguments
    /// * `uri` - Locator understood by the detector's frame extractor
    /// * `fps` - Frame rate of the recording
    ///
    /// # Returns
    /// * `Ok(DetectionOutcome)` - Raw detector output and its analysis
    /// * `Err(DetectionError)` - Detection failed; the caller may retry
    pub async fn detect(&self, uri: &str, fps: f64) -> Result<DetectionOutcome, DetectionError> {
        self.ensure_ready().await?;

        let detection = self.detector.detect_swing_phases(uri, fps).await?;
        let analysis = detection.to_analysis();
        self.completed_runs.fetch_add(1, Ordering::Relaxed);

        Ok(DetectionOutcome {
            detection,
            analysis,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.detector.is_ready()
    }

    /// Detections that produced a result since the manager was created
    pub fn completed_runs(&self) -> u64 {
        self.completed_runs.load(Ordering::Relaxed)
    }

    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }

    /// Release detector resources. The next `detect` re-initializes.
    pub fn dispose(&self) {
        self.detector.dispose();
    }
}
