//! Tempo analysis - ratio math, target comparison and feedback
//!
//! Pure functions turning a (takeaway, top, impact) frame triple into a tempo
//! ratio, classifying that ratio against a target preset within a ±5% band,
//! producing feedback text, and picking a representative preset per mode.
//!
//! Nothing here reads global state: the target preset is always passed in by
//! the caller (see `AnalysisConfig` for where the user's choice is stored).

pub mod adjuster;
pub mod presets;
pub mod swing;

pub use adjuster::{EventFrame, FrameAdjuster};
pub use presets::{preset_by_id, presets_for_mode, TempoMode, TempoPreset};
pub use swing::{SwingAnalysis, TempoComparison, TempoVerdict};

/// Ratios within this percentage of the target count as `Similar` (inclusive).
pub const SIMILAR_TOLERANCE_PERCENT: f64 = 5.0;

/// Compute the tempo ratio `(top - takeaway) / (impact - top)`.
///
/// Returns `f64::INFINITY` when `impact == top`. Valid analyses never reach
/// that branch because the frame adjuster and the detector both enforce
/// `takeaway < top < impact`, so it is logged as a warning when it happens.
///
/// # Examples
/// ```
/// use swing_tempo::analysis::calculate_ratio_from_frames;
///
/// assert_eq!(calculate_ratio_from_frames(10, 40, 50), 3.0);
/// assert!(calculate_ratio_from_frames(10, 20, 20).is_infinite());
/// ```
pub fn calculate_ratio_from_frames(takeaway: u32, top: u32, impact: u32) -> f64 {
    let backswing = top as i64 - takeaway as i64;
    let downswing = impact as i64 - top as i64;

    if downswing == 0 {
        tracing::warn!(
            "[Analysis] Degenerate swing: impact == top (takeaway={}, top={}, impact={}); ratio is infinite",
            takeaway,
            top,
            impact
        );
        return f64::INFINITY;
    }

    backswing as f64 / downswing as f64
}

/// Compare an analysis against a target preset.
///
/// `percent_difference` is rounded to two decimals and the `Similar` band is
/// inclusive at exactly ±5%. Infinite ratios still produce a comparison
/// (an infinite percentage classified as `Faster`).
pub fn compare_to_target_tempo(analysis: &SwingAnalysis, target: &TempoPreset) -> TempoComparison {
    let detected_ratio = analysis.ratio;
    let target_ratio = target.ratio();
    let percent_difference = round_to_hundredths((detected_ratio - target_ratio) / target_ratio * 100.0);

    let comparison = if percent_difference.abs() <= SIMILAR_TOLERANCE_PERCENT {
        TempoVerdict::Similar
    } else if percent_difference > 0.0 {
        TempoVerdict::Faster
    } else {
        TempoVerdict::Slower
    };

    TempoComparison {
        detected_ratio,
        target_ratio,
        percent_difference,
        comparison,
    }
}

/// Human feedback for a comparison.
///
/// `Similar` never mentions a direction; `Faster`/`Slower` include the
/// absolute percentage rounded to a whole number and only their own
/// directional word.
pub fn get_tempo_feedback(comparison: &TempoComparison) -> String {
    let percent = comparison.percent_difference.abs().round();
    match comparison.comparison {
        TempoVerdict::Similar => format!(
            "Great tempo! Your {:.1}:1 ratio matches the {:.1}:1 target.",
            comparison.detected_ratio, comparison.target_ratio
        ),
        TempoVerdict::Faster => format!(
            "Your tempo is {:.0}% faster than the target. Let the backswing breathe and start down smoothly.",
            percent
        ),
        TempoVerdict::Slower => format!(
            "Your tempo is {:.0}% slower than the target. Shorten the pause at the top and accelerate through impact.",
            percent
        ),
    }
}

/// Pick the representative preset of `mode` for a ratio.
///
/// Every preset inside a mode shares the same ratio, so this returns the
/// middle entry of the mode's list whatever the input ratio is. This is not a
/// nearest-ratio search and must be revisited if a family ever mixes ratios.
pub fn find_closest_preset(ratio: f64, mode: TempoMode) -> &'static TempoPreset {
    let presets = presets_for_mode(mode);
    let preset = &presets[presets.len() / 2];
    tracing::trace!(
        "[Analysis] Representative preset for ratio {:.3} in {:?}: {}",
        ratio,
        mode,
        preset.id
    );
    preset
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
