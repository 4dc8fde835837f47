// Sampling plan for phase detection
//
// The number of sampled stills depends only on clip duration and is bounded
// on both sides, so long clips or high frame rates never increase the
// extraction cost beyond `max_samples` requests.

use crate::config::DetectionConfig;

/// Evenly spaced sample timestamps covering `[0, duration_ms)`.
///
/// Uses `clamp(duration_ms / min_sample_interval_ms, min_samples, max_samples)`
/// points; sample `i` sits at `i * duration_ms / n`. A zero-length clip yields
/// no samples.
///
/// # Examples
/// ```
/// use swing_tempo::config::DetectionConfig;
/// use swing_tempo::detection::sampling::plan_sample_times;
///
/// let config = DetectionConfig::default();
/// assert_eq!(plan_sample_times(3000, &config).len(), 32);
/// assert_eq!(plan_sample_times(200, &config).len(), 8);
/// ```
pub fn plan_sample_times(duration_ms: u64, config: &DetectionConfig) -> Vec<f64> {
    if duration_ms == 0 {
        return Vec::new();
    }

    let max_samples = config.max_samples.max(1);
    let min_samples = config.min_samples.clamp(1, max_samples);
    let by_interval = (duration_ms / config.min_sample_interval_ms.max(1)) as usize;
    let count = by_interval.clamp(min_samples, max_samples);

    let step = duration_ms as f64 / count as f64;
    (0..count).map(|i| i as f64 * step).collect()
}
