//! Motion-magnitude heuristic for swing phase estimation.
//!
//! Works on successfully extracted samples only. Motion between two
//! consecutive samples is their mean absolute luma difference divided by the
//! gap in sample indices, so a failed sample in between does not inflate the
//! profile.
//!
//! - impact: later sample of the peak-motion pair (club speed peaks there)
//! - takeaway: earlier sample of the first pair whose motion rises above
//!   `baseline + onset_fraction * (peak - baseline)`
//! - top: midpoint of the quietest pair between takeaway and impact, where the
//!   club changes direction

use crate::config::DetectionConfig;
use crate::detection::extractor::LumaFrame;
use crate::error::DetectionError;
use crate::timebase::ms_to_frame;

/// Template positions (fractions of the clip) used when motion carries no signal
const TEMPLATE_FRACTIONS: (f64, f64, f64) = (0.20, 0.65, 0.80);

/// Upper bound on template confidence, scaled by sample coverage
const TEMPLATE_CONFIDENCE: f64 = 0.1;

/// One successfully extracted sample
#[derive(Debug, Clone)]
pub struct MotionSample {
    /// Position in the sampling plan
    pub index: usize,
    pub time_ms: f64,
    pub frame: LumaFrame,
}

/// Ordered event frames plus confidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseEstimate {
    pub takeaway_frame: u32,
    pub top_frame: u32,
    pub impact_frame: u32,
    pub confidence: f64,
    /// True when the proportional template replaced the motion estimate
    pub template_fallback: bool,
}

/// Motion magnitude of each consecutive sample pair.
///
/// # Errors
/// `InvalidInput` if two samples have different dimensions.
pub fn motion_profile(samples: &[MotionSample]) -> Result<Vec<f64>, DetectionError> {
    samples
        .windows(2)
        .map(|pair| {
            let diff = pair[0]
                .frame
                .mean_abs_diff(&pair[1].frame)
                .ok_or_else(|| DetectionError::InvalidInput {
                    reason: format!(
                        "samples {} and {} differ in size ({}x{} vs {}x{})",
                        pair[0].index,
                        pair[1].index,
                        pair[0].frame.width,
                        pair[0].frame.height,
                        pair[1].frame.width,
                        pair[1].frame.height
                    ),
                })?;
            let gap = pair[1].index.saturating_sub(pair[0].index).max(1);
            Ok(diff / gap as f64)
        })
        .collect()
}

/// Estimate takeaway, top and impact frames from sampled stills.
///
/// # Arguments
/// * `samples` - Successful samples in plan order
/// * `planned` - Number of samples requested, used for coverage
/// * `fps` - Frame rate used to map sample times to frames
/// * `total_frames` - Frames in the clip; results stay inside `[0, total_frames - 1]`
/// * `config` - Heuristic thresholds
///
/// # Returns
/// A strictly ordered estimate. With fewer than `min_viable_samples` samples,
/// or a flat motion profile, the proportional template is returned with a
/// confidence of at most `0.1 * coverage`.
///
/// # Errors
/// `DetectionFailed` when no sample is available or the clip has fewer than
/// three frames; `InvalidInput` for mismatched sample sizes.
pub fn estimate_phases(
    samples: &[MotionSample],
    planned: usize,
    fps: f64,
    total_frames: u32,
    config: &DetectionConfig,
) -> Result<PhaseEstimate, DetectionError> {
    if total_frames < 3 {
        return Err(DetectionError::DetectionFailed {
            reason: format!(
                "clip has {} frames; three ordered events need at least 3",
                total_frames
            ),
        });
    }
    if samples.is_empty() {
        return Err(DetectionError::DetectionFailed {
            reason: "no usable samples".to_string(),
        });
    }

    let coverage = samples.len() as f64 / planned.max(samples.len()) as f64;
    if samples.len() < config.min_viable_samples.max(2) {
        log::debug!(
            "[MotionHeuristic] Only {} of {} samples usable; using template",
            samples.len(),
            planned
        );
        return Ok(template_estimate(total_frames, coverage));
    }

    let motions = motion_profile(samples)?;
    let (peak_idx, peak) = motions
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::MIN), |best, (k, m)| if m > best.1 { (k, m) } else { best });
    let baseline = motions[..=peak_idx]
        .iter()
        .copied()
        .fold(f64::INFINITY, f64::min);

    if peak <= 0.0 || (peak - baseline) / peak < 1e-6 {
        log::debug!("[MotionHeuristic] Flat motion profile (peak {:.3}); using template", peak);
        return Ok(template_estimate(total_frames, coverage));
    }
    let contrast = (peak - baseline) / peak;

    let threshold = baseline + config.onset_fraction * (peak - baseline);
    let onset_idx = motions[..=peak_idx]
        .iter()
        .position(|m| *m > threshold)
        .unwrap_or(peak_idx);

    let takeaway_ms = samples[onset_idx].time_ms;
    let impact_ms = samples[peak_idx + 1].time_ms;
    let top_ms = match quietest_pair(&motions, onset_idx + 1, peak_idx) {
        Some(j) => (samples[j].time_ms + samples[j + 1].time_ms) / 2.0,
        None => (takeaway_ms + impact_ms) / 2.0,
    };

    let raw = (
        ms_to_frame(takeaway_ms, fps),
        ms_to_frame(top_ms, fps),
        ms_to_frame(impact_ms, fps),
    );
    let (frames, adjusted) = enforce_order(raw, total_frames);

    let mut confidence = coverage * (0.4 + 0.6 * contrast);
    if adjusted {
        confidence *= 0.5;
    }

    log::trace!(
        "[MotionHeuristic] peak={:.2} baseline={:.2} onset={} raw={:?} ordered={:?}",
        peak,
        baseline,
        onset_idx,
        raw,
        frames
    );

    Ok(PhaseEstimate {
        takeaway_frame: frames.0,
        top_frame: frames.1,
        impact_frame: frames.2,
        confidence: confidence.clamp(0.0, 1.0),
        template_fallback: false,
    })
}

/// Force `takeaway < top < impact` inside `[0, total_frames - 1]`.
///
/// Requires `total_frames >= 3`. Returns the ordered triple and whether any
/// value had to move.
pub fn enforce_order(raw: (i64, i64, i64), total_frames: u32) -> ((u32, u32, u32), bool) {
    let last = total_frames as i64 - 1;
    let takeaway = raw.0.clamp(0, last - 2);
    let top = raw.1.clamp(takeaway + 1, last - 1);
    let impact = raw.2.clamp(top + 1, last);

    let adjusted = (takeaway, top, impact) != raw;
    ((takeaway as u32, top as u32, impact as u32), adjusted)
}

/// Proportional estimate used when motion cannot be trusted.
pub fn template_estimate(total_frames: u32, coverage: f64) -> PhaseEstimate {
    let at = |fraction: f64| (total_frames as f64 * fraction).floor() as i64;
    let (frames, _) = enforce_order(
        (
            at(TEMPLATE_FRACTIONS.0),
            at(TEMPLATE_FRACTIONS.1),
            at(TEMPLATE_FRACTIONS.2),
        ),
        total_frames,
    );

    PhaseEstimate {
        takeaway_frame: frames.0,
        top_frame: frames.1,
        impact_frame: frames.2,
        confidence: (TEMPLATE_CONFIDENCE * coverage).clamp(0.0, 1.0),
        template_fallback: true,
    }
}

fn quietest_pair(motions: &[f64], start: usize, end: usize) -> Option<usize> {
    (start..end).fold(None, |best: Option<usize>, k| match best {
        Some(b) if motions[b] <= motions[k] => Some(b),
        _ => Some(k),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Samples of uniform 2x2 frames, 100 ms apart
    fn samples_from_levels(levels: &[u8]) -> Vec<MotionSample> {
        levels
            .iter()
            .enumerate()
            .map(|(index, level)| MotionSample {
                index,
                time_ms: index as f64 * 100.0,
                frame: LumaFrame::new(2, 2, vec![*level; 4]).unwrap(),
            })
            .collect()
    }

    const SWING: [u8; 14] = [0, 0, 0, 10, 20, 30, 35, 37, 38, 60, 100, 140, 140, 140];

    #[test]
    fn test_motion_profile_divides_by_gap() {
        let mut samples = samples_from_levels(&[0, 10, 50]);
        samples[2].index = 4;
        assert_eq!(motion_profile(&samples).unwrap(), vec![10.0, 40.0 / 3.0]);
    }

    #[test]
    fn test_motion_profile_rejects_mixed_sizes() {
        let mut samples = samples_from_levels(&[0, 10]);
        samples[1].frame = LumaFrame::new(1, 4, vec![10; 4]).unwrap();
        assert!(matches!(
            motion_profile(&samples),
            Err(DetectionError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_estimate_from_clear_profile() {
        let samples = samples_from_levels(&SWING);
        let estimate =
            estimate_phases(&samples, samples.len(), 10.0, 14, &DetectionConfig::default())
                .unwrap();

        assert_eq!(
            (estimate.takeaway_frame, estimate.top_frame, estimate.impact_frame),
            (2, 7, 10)
        );
        assert_eq!(estimate.confidence, 1.0);
        assert!(!estimate.template_fallback);
    }

    #[test]
    fn test_missing_samples_reduce_confidence() {
        let samples = samples_from_levels(&SWING);
        let estimate =
            estimate_phases(&samples, 28, 10.0, 14, &DetectionConfig::default()).unwrap();
        assert!((estimate.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_flat_profile_uses_template() {
        let samples = samples_from_levels(&[50; 10]);
        let estimate =
            estimate_phases(&samples, 10, 30.0, 100, &DetectionConfig::default()).unwrap();
        assert!(estimate.template_fallback);
        assert_eq!(
            (estimate.takeaway_frame, estimate.top_frame, estimate.impact_frame),
            (20, 65, 80)
        );
        assert!(estimate.confidence <= 0.1);
    }

    #[test]
    fn test_too_few_samples_uses_template() {
        let samples = samples_from_levels(&[0, 100]);
        let estimate =
            estimate_phases(&samples, 32, 30.0, 90, &DetectionConfig::default()).unwrap();
        assert!(estimate.template_fallback);
        assert!(estimate.takeaway_frame < estimate.top_frame);
        assert!(estimate.top_frame < estimate.impact_frame);
        assert!((estimate.confidence - 0.1 * 2.0 / 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_samples_or_short_clip_fails() {
        let config = DetectionConfig::default();
        assert!(matches!(
            estimate_phases(&[], 8, 30.0, 90, &config),
            Err(DetectionError::DetectionFailed { .. })
        ));

        let samples = samples_from_levels(&SWING);
        assert!(matches!(
            estimate_phases(&samples, 14, 30.0, 2, &config),
            Err(DetectionError::DetectionFailed { .. })
        ));
    }

    #[test]
    fn test_enforce_order() {
        assert_eq!(enforce_order((10, 20, 30), 100), ((10, 20, 30), false));
        assert_eq!(enforce_order((10, 10, 10), 100), ((10, 11, 12), true));
        assert_eq!(enforce_order((99, 99, 99), 100), ((97, 98, 99), true));
        assert_eq!(enforce_order((-5, 40, 20), 100), ((0, 40, 41), true));
        assert_eq!(enforce_order((0, 0, 0), 3), ((0, 1, 2), true));
    }

    #[test]
    fn test_template_on_minimal_clip() {
        let estimate = template_estimate(3, 1.0);
        assert_eq!(
            (estimate.takeaway_frame, estimate.top_frame, estimate.impact_frame),
            (0, 1, 2)
        );
    }
}
