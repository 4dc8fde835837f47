//! Timebase - conversion between playback time and frame indices
//!
//! Pure functions shared by the playback controller and the phase detector.
//! Key properties:
//! - Frame indices are derived with `floor`, never rounded
//! - No clamping in the raw converters; callers clamp with [`clamp_frame`]
//! - `total_frames` is the only place the frame count of a clip is computed

/// Converts a time offset in milliseconds to a frame index.
///
/// Formula: `floor(ms / 1000 * fps)`. Negative offsets produce negative
/// indices; the result is intentionally unclamped.
///
/// # Examples
/// ```
/// use swing_tempo::timebase::ms_to_frame;
///
/// assert_eq!(ms_to_frame(1000.0, 30.0), 30);
/// assert_eq!(ms_to_frame(99.0, 30.0), 2);
/// ```
pub fn ms_to_frame(ms: f64, fps: f64) -> i64 {
    (ms / 1000.0 * fps).floor() as i64
}

/// Converts a frame index to its presentation time in milliseconds.
///
/// Formula: `frame / fps * 1000`.
pub fn frame_to_ms(frame: i64, fps: f64) -> f64 {
    frame as f64 / fps * 1000.0
}

/// Number of whole frames in a clip: `floor(duration_ms / 1000 * fps)`.
///
/// Returns 0 for a non-positive or non-finite frame rate.
///
/// # Examples
/// ```
/// use swing_tempo::timebase::total_frames;
///
/// assert_eq!(total_frames(5000, 30.0), 150);
/// assert_eq!(total_frames(100, 30.0), 3);
/// assert_eq!(total_frames(0, 30.0), 0);
/// ```
pub fn total_frames(duration_ms: u64, fps: f64) -> u32 {
    if !fps.is_finite() || fps <= 0.0 {
        return 0;
    }
    ms_to_frame(duration_ms as f64, fps).clamp(0, u32::MAX as i64) as u32
}

/// Clamps a (possibly out of range) frame index into `[0, total_frames - 1]`.
///
/// An empty clip (`total_frames == 0`) clamps everything to 0.
pub fn clamp_frame(frame: i64, total_frames: u32) -> u32 {
    if total_frames == 0 {
        return 0;
    }
    frame.clamp(0, total_frames as i64 - 1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ms_to_frame_floors() {
        assert_eq!(ms_to_frame(0.0, 30.0), 0);
        assert_eq!(ms_to_frame(33.0, 30.0), 0);
        assert_eq!(ms_to_frame(34.0, 30.0), 1);
        assert_eq!(ms_to_frame(1999.9, 60.0), 119);
        assert_eq!(ms_to_frame(-40.0, 30.0), -2);
    }

    #[test]
    fn test_frame_to_ms() {
        assert_eq!(frame_to_ms(0, 30.0), 0.0);
        assert_eq!(frame_to_ms(30, 30.0), 1000.0);
        assert!((frame_to_ms(1, 30.0) - 33.333).abs() < 0.001);
    }

    #[test]
    fn test_frame_round_trip_lands_on_same_frame() {
        for fps in [24.0, 29.97, 30.0, 60.0, 120.0] {
            for frame in 0..200 {
                // Start of frame N maps back to N (allowing for float error at the edge)
                let ms = frame_to_ms(frame, fps) + 0.001;
                assert_eq!(ms_to_frame(ms, fps), frame, "fps={} frame={}", fps, frame);
            }
        }
    }

    #[test]
    fn test_total_frames() {
        assert_eq!(total_frames(5000, 30.0), 150);
        assert_eq!(total_frames(0, 30.0), 0);
        assert_eq!(total_frames(100, 30.0), 3);
        assert_eq!(total_frames(1000, 0.0), 0);
        assert_eq!(total_frames(1000, f64::NAN), 0);
    }

    #[test]
    fn test_clamp_frame() {
        assert_eq!(clamp_frame(-10, 150), 0);
        assert_eq!(clamp_frame(200, 150), 149);
        assert_eq!(clamp_frame(75, 150), 75);
        assert_eq!(clamp_frame(5, 0), 0);
    }
}
