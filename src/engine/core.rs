//! TempoEngine: orchestration layer for swing tempo analysis.
//!
//! Holds the application configuration (user preferences are passed to the
//! analysis functions from here, never read from globals), a detection
//! manager, and a telemetry broadcast channel.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::analysis::{
    compare_to_target_tempo, find_closest_preset, get_tempo_feedback, SwingAnalysis,
    TempoComparison, TempoMode, TempoPreset, TempoVerdict,
};
use crate::config::AppConfig;
use crate::detection::{FrameExtractor, MotionPhaseDetector, PhaseDetector};
use crate::error::{DetectionError, ErrorCode, PlaybackError};
use crate::managers::{DetectionManager, DetectionOutcome};
use crate::playback::{DecodingSurface, PlaybackController, PlaybackSession, VideoHandle};

/// Telemetry event emitted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub timestamp_ms: u64,
    pub kind: TelemetryEventKind,
    pub detail: Option<String>,
}

/// Types of telemetry events supported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEventKind {
    SessionOpened { total_frames: u32 },
    DetectionCompleted { confidence: f64, template_fallback: bool },
    DetectionFailed { code: i32 },
    ComparisonComputed { verdict: TempoVerdict, percent_difference: f64 },
    Warning,
}

/// Comparison of one analysis against the configured target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoReport {
    pub mode: TempoMode,
    pub target_preset_id: String,
    pub target_label: String,
    pub comparison: TempoComparison,
    pub feedback: String,
}

impl TempoReport {
    /// Compare `analysis` with `target` and render the feedback text.
    pub fn build(analysis: &SwingAnalysis, target: &TempoPreset) -> Self {
        let comparison = compare_to_target_tempo(analysis, target);
        Self {
            mode: target.mode(),
            target_preset_id: target.id.clone(),
            target_label: target.label.clone(),
            comparison,
            feedback: get_tempo_feedback(&comparison),
        }
    }
}

/// TempoEngine orchestrates playback, detection and comparison.
pub struct TempoEngine {
    config: Arc<RwLock<AppConfig>>,
    detection: DetectionManager,
    telemetry_tx: broadcast::Sender<TelemetryEvent>,
    start_instant: Instant,
}

impl TempoEngine {
    /// Create an engine whose motion detector reads stills from `extractor`.
    pub fn new(config: AppConfig, extractor: Arc<dyn FrameExtractor>) -> Self {
        let detector = MotionPhaseDetector::new(extractor, config.detection.clone());
        Self::with_detector(config, Arc::new(detector))
    }

    /// Create an engine around any detector variant.
    pub fn with_detector(config: AppConfig, detector: Arc<dyn PhaseDetector>) -> Self {
        let (telemetry_tx, _) = broadcast::channel(128);
        Self {
            config: Arc::new(RwLock::new(config)),
            detection: DetectionManager::new(detector),
            telemetry_tx,
            start_instant: Instant::now(),
        }
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> AppConfig {
        match self.config.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the configuration used by later calls.
    ///
    /// Detector thresholds are fixed when the engine is built; only playback
    /// and analysis preferences take effect here.
    pub fn update_config(&self, config: AppConfig) {
        match self.config.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }

    pub fn subscribe_telemetry(&self) -> broadcast::Receiver<TelemetryEvent> {
        self.telemetry_tx.subscribe()
    }

    pub fn detection(&self) -> &DetectionManager {
        &self.detection
    }

    fn emit_event(&self, kind: TelemetryEventKind, detail: Option<String>) {
        let timestamp_ms = self.start_instant.elapsed().as_millis() as u64;
        let _ = self.telemetry_tx.send(TelemetryEvent {
            timestamp_ms,
            kind,
            detail,
        });
    }

    // ========================================================================
    // PLAYBACK
    // ========================================================================

    /// Open a playback session on `surface`, applying the configured default speed.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn open_session(
        &self,
        video: VideoHandle,
        surface: Arc<dyn DecodingSurface>,
        initial_frame: i64,
    ) -> Result<PlaybackSession, PlaybackError> {
        let playback = self.config().playback;
        let total_frames = video.total_frames();
        let uri = video.uri().to_string();

        let mut controller = PlaybackController::open(video, surface, initial_frame)?;
        if controller.state().playback_speed != playback.default_speed {
            controller.set_playback_speed(playback.default_speed)?;
        }

        self.emit_event(TelemetryEventKind::SessionOpened { total_frames }, Some(uri));
        Ok(PlaybackSession::spawn(controller, &playback))
    }

    // ========================================================================
    // ANALYSIS
    // ========================================================================

    /// Target preset for `mode` from the configuration.
    ///
    /// An unknown configured id falls back to the mode's representative preset.
    pub fn target_preset(&self, mode: TempoMode) -> &'static TempoPreset {
        let config = self.config();
        match config.analysis.target_preset(mode) {
            Some(preset) => preset,
            None => {
                let id = config.analysis.target_preset_id(mode);
                let fallback = find_closest_preset(mode.target_ratio(), mode);
                log::warn!(
                    "[TempoEngine] Configured preset '{}' is not a {} preset, using {}",
                    id,
                    mode.display_name(),
                    fallback.id
                );
                self.emit_event(
                    TelemetryEventKind::Warning,
                    Some(format!("unknown target preset '{}'", id)),
                );
                fallback
            }
        }
    }

    /// Run automatic detection on `uri`.
    ///
    /// # Errors
    /// `DetectionError` from the detector; a `DetectionFailed` telemetry event
    /// is published with its code.
    pub async fn analyze(&self, uri: &str, fps: f64) -> Result<DetectionOutcome, DetectionError> {
        match self.detection.detect(uri, fps).await {
            Ok(outcome) => {
                self.emit_event(
                    TelemetryEventKind::DetectionCompleted {
                        confidence: outcome.detection.confidence,
                        template_fallback: outcome.detection.template_fallback,
                    },
                    Some(uri.to_string()),
                );
                Ok(outcome)
            }
            Err(err) => {
                self.emit_event(
                    TelemetryEventKind::DetectionFailed { code: err.code() },
                    Some(err.message()),
                );
                Err(err)
            }
        }
    }

    /// Compare `analysis` against the configured target for `mode`
    /// (the configured default mode when `None`).
    pub fn compare(&self, analysis: &SwingAnalysis, mode: Option<TempoMode>) -> TempoReport {
        let mode = mode.unwrap_or_else(|| self.config().analysis.default_mode);
        let target = self.target_preset(mode);
        self.compare_with(analysis, target)
    }

    /// Compare `analysis` against an explicit preset.
    pub fn compare_with(&self, analysis: &SwingAnalysis, target: &TempoPreset) -> TempoReport {
        let report = TempoReport::build(analysis, target);
        self.emit_event(
            TelemetryEventKind::ComparisonComputed {
                verdict: report.comparison.comparison,
                percent_difference: report.comparison.percent_difference,
            },
            None,
        );
        report
    }

    /// Release detector resources.
    pub fn dispose(&self) {
        self.detection.dispose();
    }
}
