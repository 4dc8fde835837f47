//! Synthetic swing clip renderer.

use std::f64::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::detection::{FrameExtractor, LumaFrame};
use crate::timebase::{clamp_frame, ms_to_frame, total_frames};

/// Rendered frame width in pixels
pub const FRAME_WIDTH: u32 = 64;

/// Rendered frame height in pixels
pub const FRAME_HEIGHT: u32 = 48;

const BACKGROUND_LEVEL: u8 = 24;
const CLUB_LEVEL: u8 = 230;
const CLUB_RADIUS: f64 = 22.0;
const CLUB_HALF_WIDTH: f64 = PI / 4.0;
/// Follow-through lasts this fraction of the downswing
const FOLLOW_THROUGH_RATIO: f64 = 0.8;
const FINISH_ANGLE: f64 = -0.8 * PI;

/// Ground truth and timing of a synthetic swing clip
///
/// The club is a bright circular sector around the frame center. It rests
/// pointing down until takeaway, eases up to the top (angle π), accelerates
/// down to impact, then decelerates into the finish.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSwing {
    pub takeaway_frame: u32,
    pub top_frame: u32,
    pub impact_frame: u32,
    pub fps: f64,
    pub duration_ms: u64,
    /// Seed of the per-frame background noise
    pub seed: u64,
}

impl SyntheticSwing {
    /// # Arguments
    /// * `takeaway_frame`, `top_frame`, `impact_frame` - Ground truth, expected
    ///   to be strictly increasing
    /// * `fps` - Clip frame rate
    /// * `duration_ms` - Clip length
    pub fn new(takeaway_frame: u32, top_frame: u32, impact_frame: u32, fps: f64, duration_ms: u64) -> Self {
        Self {
            takeaway_frame,
            top_frame,
            impact_frame,
            fps,
            duration_ms,
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn total_frames(&self) -> u32 {
        total_frames(self.duration_ms, self.fps)
    }

    /// Club angle in radians at `frame`, 0 pointing straight down.
    pub fn club_angle(&self, frame: u32) -> f64 {
        let f = frame as f64;
        let takeaway = self.takeaway_frame as f64;
        let top = self.top_frame as f64;
        let impact = self.impact_frame as f64;

        if f < takeaway {
            return 0.0;
        }
        if f < top {
            let u = (f - takeaway) / (top - takeaway);
            return PI * (1.0 - (PI * u).cos()) / 2.0;
        }
        if f < impact {
            let u = (f - top) / (impact - top);
            return PI * (1.0 - u * u);
        }

        let follow = FOLLOW_THROUGH_RATIO * (impact - top);
        if follow > 0.0 && f < impact + follow {
            let v = (f - impact) / follow;
            return FINISH_ANGLE * (1.0 - (1.0 - v) * (1.0 - v));
        }
        FINISH_ANGLE
    }

    /// Render `frame` as a noisy luma image.
    pub fn render_frame(&self, frame: u32) -> LumaFrame {
        let theta = self.club_angle(frame);
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_mul(7919).wrapping_add(frame as u64));
        let cx = FRAME_WIDTH as f64 / 2.0;
        let cy = FRAME_HEIGHT as f64 / 2.0;

        let mut pixels = Vec::with_capacity((FRAME_WIDTH * FRAME_HEIGHT) as usize);
        for y in 0..FRAME_HEIGHT {
            for x in 0..FRAME_WIDTH {
                let noise: u8 = rng.gen_range(0..=3);
                let rx = x as f64 + 0.5 - cx;
                let ry = y as f64 + 0.5 - cy;

                let on_club = rx.hypot(ry) <= CLUB_RADIUS && {
                    let angle = (-rx).atan2(ry);
                    let diff = (angle - theta + PI).rem_euclid(2.0 * PI) - PI;
                    diff.abs() <= CLUB_HALF_WIDTH
                };
                pixels.push(if on_club { CLUB_LEVEL } else { BACKGROUND_LEVEL + noise });
            }
        }

        LumaFrame {
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            pixels,
        }
    }
}

/// [`FrameExtractor`] serving a [`SyntheticSwing`] for any URI
pub struct SyntheticSwingExtractor {
    swing: SyntheticSwing,
    requests: AtomicUsize,
}

impl SyntheticSwingExtractor {
    pub fn new(swing: SyntheticSwing) -> Self {
        Self {
            swing,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn swing(&self) -> &SyntheticSwing {
        &self.swing
    }

    /// Frames served so far
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameExtractor for SyntheticSwingExtractor {
    async fn probe_duration_ms(&self, _uri: &str) -> Result<u64> {
        Ok(self.swing.duration_ms)
    }

    async fn extract_frame(&self, _uri: &str, time_ms: f64) -> Result<LumaFrame> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let frame = clamp_frame(ms_to_frame(time_ms, self.swing.fps), self.swing.total_frames());
        Ok(self.swing.render_frame(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swing() -> SyntheticSwing {
        SyntheticSwing::new(20, 50, 60, 30.0, 3000)
    }

    #[test]
    fn test_club_angle_key_positions() {
        let swing = swing();
        assert_eq!(swing.club_angle(0), 0.0);
        assert_eq!(swing.club_angle(20), 0.0);
        assert!((swing.club_angle(50) - PI).abs() < 1e-12);
        assert!(swing.club_angle(35) > 0.0 && swing.club_angle(35) < PI);
        assert_eq!(swing.club_angle(60), 0.0);
        assert!((swing.club_angle(89) - FINISH_ANGLE).abs() < 1e-12);
    }

    #[test]
    fn test_render_is_deterministic() {
        let swing = swing();
        assert_eq!(swing.render_frame(10), swing.render_frame(10));
        assert_ne!(
            swing.render_frame(10),
            swing.with_seed(7).render_frame(10)
        );
    }

    #[test]
    fn test_motion_peaks_in_downswing() {
        let swing = swing();
        let still = swing.render_frame(5).mean_abs_diff(&swing.render_frame(8)).unwrap();
        let backswing = swing.render_frame(30).mean_abs_diff(&swing.render_frame(33)).unwrap();
        let downswing = swing.render_frame(55).mean_abs_diff(&swing.render_frame(58)).unwrap();

        assert!(still < 2.0, "still motion {}", still);
        assert!(backswing > still);
        assert!(downswing > backswing);
    }

    #[tokio::test]
    async fn test_extractor_counts_requests() {
        let extractor = SyntheticSwingExtractor::new(swing());
        assert_eq!(extractor.probe_duration_ms("any").await.unwrap(), 3000);
        let frame = extractor.extract_frame("any", 1000.0).await.unwrap();
        assert_eq!(frame, swing().render_frame(30));
        assert_eq!(extractor.requests(), 1);
    }
}
