// SwingAnalysis and TempoComparison records
//
// SwingAnalysis is the unit that the external video-record store persists per
// video. Field names are camelCase on the wire and floats are written at full
// precision, so a reloaded record reproduces the same comparison output.

use serde::{Deserialize, Serialize};

use super::calculate_ratio_from_frames;

/// One detected or manually adjusted interpretation of a swing
///
/// Invariant for valid state: `takeaway_frame < top_frame < impact_frame`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwingAnalysis {
    pub takeaway_frame: u32,
    pub top_frame: u32,
    pub impact_frame: u32,
    /// `top_frame - takeaway_frame`
    pub backswing_frames: i64,
    /// `impact_frame - top_frame`
    pub downswing_frames: i64,
    /// `backswing_frames / downswing_frames`, stored as `null` when infinite
    #[serde(with = "unbounded_ratio")]
    pub ratio: f64,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
    /// True once a human edited any frame
    pub manually_adjusted: bool,
}

impl SwingAnalysis {
    /// Build an analysis from an event frame triple, deriving counts and ratio.
    pub fn from_frames(
        takeaway_frame: u32,
        top_frame: u32,
        impact_frame: u32,
        confidence: f64,
        manually_adjusted: bool,
    ) -> Self {
        let mut analysis = Self {
            takeaway_frame,
            top_frame,
            impact_frame,
            backswing_frames: 0,
            downswing_frames: 0,
            ratio: 0.0,
            confidence: confidence.clamp(0.0, 1.0),
            manually_adjusted,
        };
        analysis.recompute_ratio();
        analysis
    }

    /// Recompute `backswing_frames`, `downswing_frames` and `ratio` from the
    /// current event frames.
    pub fn recompute_ratio(&mut self) {
        self.backswing_frames = self.top_frame as i64 - self.takeaway_frame as i64;
        self.downswing_frames = self.impact_frame as i64 - self.top_frame as i64;
        self.ratio =
            calculate_ratio_from_frames(self.takeaway_frame, self.top_frame, self.impact_frame);
    }

    /// Whether the event frames are strictly ordered
    pub fn is_ordered(&self) -> bool {
        self.takeaway_frame < self.top_frame && self.top_frame < self.impact_frame
    }
}

/// Direction of a detected ratio relative to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TempoVerdict {
    /// Ratio above target by more than the tolerance
    Faster,
    /// Ratio below target by more than the tolerance
    Slower,
    /// Within the tolerance band (inclusive)
    Similar,
}

impl TempoVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            TempoVerdict::Faster => "faster",
            TempoVerdict::Slower => "slower",
            TempoVerdict::Similar => "similar",
        }
    }
}

/// Result of comparing a swing ratio with a target preset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoComparison {
    #[serde(with = "unbounded_ratio")]
    pub detected_ratio: f64,
    pub target_ratio: f64,
    /// `(detected - target) / target * 100`, rounded to 2 decimals
    #[serde(with = "unbounded_ratio")]
    pub percent_difference: f64,
    pub comparison: TempoVerdict,
}

/// JSON has no infinity: a non-finite value is written as `null` and read
/// back as `f64::INFINITY`, the only non-finite value a ratio can take.
mod unbounded_ratio {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
