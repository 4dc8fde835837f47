// FrameAdjuster - manual editing of the three event frames
//
// Each event frame can be nudged one frame at a time or set to the frame the
// player is currently showing. Edits that would break
// `0 <= takeaway < top < impact <= total_frames - 1` are refused up front
// (the corresponding control is reported as disabled), so a manual edit never
// produces an error and never leaves an illegal state behind.

use serde::{Deserialize, Serialize};

use super::swing::SwingAnalysis;

/// One of the three swing events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFrame {
    Takeaway,
    Top,
    Impact,
}

/// Bounded editor over a [`SwingAnalysis`]
#[derive(Debug, Clone)]
pub struct FrameAdjuster {
    analysis: SwingAnalysis,
    total_frames: u32,
}

impl FrameAdjuster {
    /// Wrap an analysis for editing within a clip of `total_frames` frames.
    pub fn new(analysis: SwingAnalysis, total_frames: u32) -> Self {
        Self {
            analysis,
            total_frames,
        }
    }

    pub fn analysis(&self) -> &SwingAnalysis {
        &self.analysis
    }

    pub fn into_analysis(self) -> SwingAnalysis {
        self.analysis
    }

    pub fn total_frames(&self) -> u32 {
        self.total_frames
    }

    /// Current frame of `event`
    pub fn frame(&self, event: EventFrame) -> u32 {
        match event {
            EventFrame::Takeaway => self.analysis.takeaway_frame,
            EventFrame::Top => self.analysis.top_frame,
            EventFrame::Impact => self.analysis.impact_frame,
        }
    }

    /// Exclusive lower bound for `event` (-1 for takeaway).
    fn lower_bound(&self, event: EventFrame) -> i64 {
        match event {
            EventFrame::Takeaway => -1,
            EventFrame::Top => self.analysis.takeaway_frame as i64,
            EventFrame::Impact => self.analysis.top_frame as i64,
        }
    }

    /// Exclusive upper bound for `event` (`total_frames` for impact).
    fn upper_bound(&self, event: EventFrame) -> i64 {
        match event {
            EventFrame::Takeaway => self.analysis.top_frame as i64,
            EventFrame::Top => self.analysis.impact_frame as i64,
            EventFrame::Impact => self.total_frames as i64,
        }
    }

    fn accepts(&self, event: EventFrame, frame: i64) -> bool {
        frame > self.lower_bound(event) && frame < self.upper_bound(event)
    }

    /// Whether stepping `event` back one frame keeps the invariants
    pub fn can_decrement(&self, event: EventFrame) -> bool {
        self.accepts(event, self.frame(event) as i64 - 1)
    }

    /// Whether stepping `event` forward one frame keeps the invariants
    pub fn can_increment(&self, event: EventFrame) -> bool {
        self.accepts(event, self.frame(event) as i64 + 1)
    }

    /// Step `event` back one frame.
    ///
    /// # Returns
    /// `true` if the edit was applied, `false` if the control is disabled
    pub fn decrement(&mut self, event: EventFrame) -> bool {
        if !self.can_decrement(event) {
            return false;
        }
        self.apply(event, self.frame(event) - 1);
        true
    }

    /// Step `event` forward one frame.
    ///
    /// # Returns
    /// `true` if the edit was applied, `false` if the control is disabled
    pub fn increment(&mut self, event: EventFrame) -> bool {
        if !self.can_increment(event) {
            return false;
        }
        self.apply(event, self.frame(event) + 1);
        true
    }

    /// Set `event` to `frame` (typically the frame currently on screen).
    ///
    /// Refused (returns `false`) when the frame would break ordering or range,
    /// or when it equals the current value.
    pub fn mark(&mut self, event: EventFrame, frame: u32) -> bool {
        if frame == self.frame(event) || !self.accepts(event, frame as i64) {
            return false;
        }
        self.apply(event, frame);
        true
    }

    fn apply(&mut self, event: EventFrame, frame: u32) {
        match event {
            EventFrame::Takeaway => self.analysis.takeaway_frame = frame,
            EventFrame::Top => self.analysis.top_frame = frame,
            EventFrame::Impact => self.analysis.impact_frame = frame,
        }
        self.analysis.manually_adjusted = true;
        self.analysis.recompute_ratio();
        tracing::debug!(
            "[FrameAdjuster] {:?} -> {} (ratio {:.3})",
            event,
            frame,
            self.analysis.ratio
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adjuster(takeaway: u32, top: u32, impact: u32, total: u32) -> FrameAdjuster {
        FrameAdjuster::new(
            SwingAnalysis::from_frames(takeaway, top, impact, 0.9, false),
            total,
        )
    }

    #[test]
    fn test_increment_recomputes_and_flags_manual() {
        let mut adj = adjuster(10, 40, 50, 150);
        assert!(adj.increment(EventFrame::Impact));

        let analysis = adj.analysis();
        assert_eq!(analysis.impact_frame, 51);
        assert_eq!(analysis.backswing_frames, 30);
        assert_eq!(analysis.downswing_frames, 11);
        assert!((analysis.ratio - 30.0 / 11.0).abs() < 1e-12);
        assert!(analysis.manually_adjusted);
    }

    #[test]
    fn test_takeaway_cannot_go_below_zero() {
        let mut adj = adjuster(0, 5, 9, 10);
        assert!(!adj.can_decrement(EventFrame::Takeaway));
        assert!(!adj.decrement(EventFrame::Takeaway));
        assert!(!adj.analysis().manually_adjusted);
    }

    #[test]
    fn test_impact_cannot_pass_last_frame() {
        let mut adj = adjuster(0, 5, 9, 10);
        assert!(!adj.can_increment(EventFrame::Impact));
        assert!(!adj.increment(EventFrame::Impact));
        assert_eq!(adj.frame(EventFrame::Impact), 9);
    }

    #[test]
    fn test_neighbours_block_each_other() {
        let mut adj = adjuster(4, 5, 6, 10);
        assert!(!adj.can_increment(EventFrame::Takeaway));
        assert!(!adj.can_decrement(EventFrame::Top));
        assert!(!adj.can_increment(EventFrame::Top));
        assert!(!adj.can_decrement(EventFrame::Impact));

        assert!(adj.can_decrement(EventFrame::Takeaway));
        assert!(adj.can_increment(EventFrame::Impact));
    }

    #[test]
    fn test_mark_respects_invariants() {
        let mut adj = adjuster(10, 40, 50, 150);
        assert!(!adj.mark(EventFrame::Top, 10));
        assert!(!adj.mark(EventFrame::Top, 50));
        assert!(!adj.mark(EventFrame::Impact, 150));
        assert!(!adj.mark(EventFrame::Top, 40));
        assert!(!adj.analysis().manually_adjusted);

        assert!(adj.mark(EventFrame::Top, 35));
        assert_eq!(adj.analysis().backswing_frames, 25);
        assert_eq!(adj.analysis().downswing_frames, 15);
        assert!(adj.analysis().manually_adjusted);
    }

    #[test]
    fn test_random_walk_never_breaks_ordering() {
        let mut adj = adjuster(3, 6, 9, 12);
        let events = [EventFrame::Takeaway, EventFrame::Top, EventFrame::Impact];
        for step in 0..500usize {
            let event = events[step % 3];
            if (step / 3) % 2 == 0 {
                adj.increment(event);
            } else {
                adj.decrement(event);
            }
            let a = adj.analysis();
            assert!(a.is_ordered(), "step {}: {:?}", step, a);
            assert!(a.impact_frame < 12);
            assert!(a.ratio.is_finite());
        }
    }
}
