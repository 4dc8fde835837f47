// MotionPhaseDetector: motion-magnitude variant of PhaseDetector
//
// Lifecycle lives behind an RwLock. A detection clones the Arc of the ready
// model before its first await, so dispose() during a run only affects later
// calls while the in-flight run completes with the model it started with.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use anyhow::anyhow;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::config::DetectionConfig;
use crate::detection::extractor::FrameExtractor;
use crate::detection::motion::{estimate_phases, MotionSample};
use crate::detection::sampling::plan_sample_times;
use crate::detection::{PhaseDetectionResult, PhaseDetector};
use crate::error::{log_detection_error, DetectionError};
use crate::timebase::total_frames;

/// Resources retained between `initialize` and `dispose`
struct MotionModel {
    extractor: Arc<dyn FrameExtractor>,
    config: DetectionConfig,
}

enum Lifecycle {
    Uninitialized,
    Ready(Arc<MotionModel>),
    Disposed,
}

/// Phase detector driven by frame-to-frame luma motion
///
/// # Example
/// ```ignore
/// let detector = MotionPhaseDetector::new(extractor, DetectionConfig::default());
/// detector.initialize().await?;
/// let result = detector.detect_swing_phases("/videos/swing-01", 30.0).await?;
/// detector.dispose();
/// ```
pub struct MotionPhaseDetector {
    extractor: Arc<dyn FrameExtractor>,
    config: DetectionConfig,
    state: RwLock<Lifecycle>,
}

impl MotionPhaseDetector {
    pub fn new(extractor: Arc<dyn FrameExtractor>, config: DetectionConfig) -> Self {
        Self {
            extractor,
            config,
            state: RwLock::new(Lifecycle::Uninitialized),
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    // ========================================================================
    // LOCK HELPERS
    // ========================================================================

    fn read_state(&self) -> Result<RwLockReadGuard<'_, Lifecycle>, DetectionError> {
        self.state.read().map_err(|_| DetectionError::StatePoisoned)
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, Lifecycle>, DetectionError> {
        self.state.write().map_err(|_| DetectionError::StatePoisoned)
    }

    /// Move to `Ready`; returns false when already ready.
    fn transition_to_ready(&self) -> Result<bool, DetectionError> {
        let mut state = self.write_state()?;
        if matches!(*state, Lifecycle::Ready(_)) {
            return Ok(false);
        }

        *state = Lifecycle::Ready(Arc::new(MotionModel {
            extractor: Arc::clone(&self.extractor),
            config: self.config.clone(),
        }));
        Ok(true)
    }

    fn ready_model(&self) -> Result<Arc<MotionModel>, DetectionError> {
        match &*self.read_state()? {
            Lifecycle::Ready(model) => Ok(Arc::clone(model)),
            Lifecycle::Uninitialized | Lifecycle::Disposed => Err(DetectionError::NotInitialized),
        }
    }

    async fn run_detection(
        model: &MotionModel,
        uri: &str,
        fps: f64,
    ) -> Result<PhaseDetectionResult, DetectionError> {
        let started = Instant::now();

        let duration_ms = match model.extractor.probe_duration_ms(uri).await {
            Ok(duration_ms) => duration_ms,
            Err(err) => {
                log::warn!(
                    "[MotionPhaseDetector] Could not probe duration of {} ({:#}), assuming {} ms",
                    uri,
                    err,
                    model.config.fallback_duration_ms
                );
                model.config.fallback_duration_ms
            }
        };

        let total = total_frames(duration_ms, fps);
        if total < 3 {
            return Err(DetectionError::DetectionFailed {
                reason: format!(
                    "{} has {} frames at {} fps; at least 3 are needed",
                    uri, total, fps
                ),
            });
        }

        let plan = plan_sample_times(duration_ms, &model.config);
        let extractor = &model.extractor;
        let outcomes: Vec<_> = stream::iter(plan.iter().copied().enumerate())
            .map(|(index, time_ms)| async move {
                (index, time_ms, extractor.extract_frame(uri, time_ms).await)
            })
            .buffered(model.config.max_concurrent_extractions.max(1))
            .collect()
            .await;

        let mut samples = Vec::with_capacity(plan.len());
        let mut last_error = None;
        for (index, time_ms, outcome) in outcomes {
            match outcome {
                Ok(frame) => samples.push(MotionSample {
                    index,
                    time_ms,
                    frame,
                }),
                Err(err) => {
                    log::debug!(
                        "[MotionPhaseDetector] Sample {} at {:.0} ms failed: {:#}",
                        index,
                        time_ms,
                        err
                    );
                    last_error = Some(err);
                }
            }
        }

        if let Some((width, height)) = dominant_dimensions(&samples) {
            samples.retain(|sample| {
                let matches = sample.frame.width == width && sample.frame.height == height;
                if !matches {
                    log::debug!(
                        "[MotionPhaseDetector] Sample {} at {:.0} ms is {}x{}, expected {}x{}; dropped",
                        sample.index,
                        sample.time_ms,
                        sample.frame.width,
                        sample.frame.height,
                        width,
                        height
                    );
                }
                matches
            });
        }

        let samples_failed = plan.len() - samples.len();
        if samples.is_empty() {
            let cause = last_error.unwrap_or_else(|| anyhow!("nothing to sample"));
            return Err(DetectionError::failed(
                cause.context(format!("no frame of {} could be extracted", uri)),
            ));
        }

        let estimate = estimate_phases(&samples, plan.len(), fps, total, &model.config)?;

        Ok(PhaseDetectionResult {
            takeaway_frame: estimate.takeaway_frame,
            top_frame: estimate.top_frame,
            impact_frame: estimate.impact_frame,
            confidence: estimate.confidence,
            processing_time_ms: started.elapsed().as_millis() as u64,
            samples_planned: plan.len(),
            samples_failed,
            template_fallback: estimate.template_fallback,
        })
    }
}

/// Most frequent frame size among `samples`, the earliest one on a tie.
fn dominant_dimensions(samples: &[MotionSample]) -> Option<(u32, u32)> {
    let mut counts: Vec<((u32, u32), usize)> = Vec::new();
    for sample in samples {
        let dims = (sample.frame.width, sample.frame.height);
        match counts.iter_mut().find(|(seen, _)| *seen == dims) {
            Some((_, count)) => *count += 1,
            None => counts.push((dims, 1)),
        }
    }

    counts
        .into_iter()
        .fold(None, |best: Option<((u32, u32), usize)>, candidate| match best {
            Some(current) if current.1 >= candidate.1 => Some(current),
            _ => Some(candidate),
        })
        .map(|(dims, _)| dims)
}

#[async_trait]
impl PhaseDetector for MotionPhaseDetector {
    async fn initialize(&self) -> Result<(), DetectionError> {
        if self.transition_to_ready()? {
            log::info!("[MotionPhaseDetector] Ready");
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.read_state()
            .map(|state| matches!(*state, Lifecycle::Ready(_)))
            .unwrap_or(false)
    }

    async fn detect_swing_phases(
        &self,
        uri: &str,
        fps: f64,
    ) -> Result<PhaseDetectionResult, DetectionError> {
        let model = self
            .ready_model()
            .inspect_err(|err| log_detection_error(err, "detect_swing_phases"))?;

        if !fps.is_finite() || fps <= 0.0 {
            let err = DetectionError::InvalidInput {
                reason: format!("fps must be positive (got {})", fps),
            };
            log_detection_error(&err, "detect_swing_phases");
            return Err(err);
        }

        let result = Self::run_detection(&model, uri, fps)
            .await
            .inspect_err(|err| log_detection_error(err, "detect_swing_phases"))?;

        log::info!(
            "[MotionPhaseDetector] {}: takeaway={} top={} impact={} confidence={:.2} ({} of {} samples failed, {} ms)",
            uri,
            result.takeaway_frame,
            result.top_frame,
            result.impact_frame,
            result.confidence,
            result.samples_failed,
            result.samples_planned,
            result.processing_time_ms
        );
        Ok(result)
    }

    fn dispose(&self) {
        let previous = match self.state.write() {
            Ok(mut state) => std::mem::replace(&mut *state, Lifecycle::Disposed),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), Lifecycle::Disposed),
        };
        if matches!(previous, Lifecycle::Ready(_)) {
            log::info!("[MotionPhaseDetector] Disposed");
        }
    }

    fn name(&self) -> &'static str {
        "motion"
    }
}
