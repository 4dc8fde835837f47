// PlaybackController: frame-accurate playback state for one video
//
// Owns PlaybackState for a single VideoHandle and drives a DecodingSurface.
// State is mutated only after the surface accepted the matching command, so
// a failed command leaves the controller exactly as it was.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{log_playback_error, PlaybackError};
use crate::playback::surface::{DecodingSurface, SurfaceEvent};
use crate::timebase::{clamp_frame, frame_to_ms, ms_to_frame, total_frames};

/// Slowest supported playback speed
pub const MIN_PLAYBACK_SPEED: f32 = 0.25;

/// Fastest supported playback speed
pub const MAX_PLAYBACK_SPEED: f32 = 2.0;

/// Callback invoked with the new frame whenever `current_frame` changes.
pub type FrameListener = Box<dyn FnMut(u32) + Send>;

/// Identifies a playable asset. Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoHandle {
    uri: String,
    fps: f64,
    duration_ms: u64,
}

impl VideoHandle {
    /// Create a handle, rejecting frame rates that are not positive and finite.
    pub fn new(uri: impl Into<String>, fps: f64, duration_ms: u64) -> Result<Self, PlaybackError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(PlaybackError::InvalidFps { fps });
        }

        Ok(Self {
            uri: uri.into(),
            fps,
            duration_ms,
        })
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// `floor(duration_ms / 1000 * fps)`
    pub fn total_frames(&self) -> u32 {
        total_frames(self.duration_ms, self.fps)
    }
}

/// Snapshot of the controller's playback state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    pub current_frame: u32,
    pub total_frames: u32,
    pub is_playing: bool,
    pub playback_speed: f32,
}

/// Frame-accurate playback controller
///
/// Every caller operation and every surface notification goes through
/// `&mut self`, so one owner serializes all updates of `current_frame`.
/// [`PlaybackSession`](crate::playback::PlaybackSession) provides that owner
/// as a Tokio task when the controller is shared across tasks.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use swing_tempo::playback::{PlaybackController, StubSurface, VideoHandle};
///
/// let video = VideoHandle::new("swing.mp4", 30.0, 5000).unwrap();
/// let mut controller =
///     PlaybackController::open(video, Arc::new(StubSurface::new()), 0).unwrap();
///
/// controller.seek_to_frame(200).unwrap();
/// assert_eq!(controller.position_label(), "149/150");
/// ```
pub struct PlaybackController {
    video: VideoHandle,
    state: PlaybackState,
    surface: Arc<dyn DecodingSurface>,
    on_frame_change: Option<FrameListener>,
    reached_end: bool,
    released: bool,
}

impl PlaybackController {
    /// Open a video on a decoding surface, positioned at `initial_frame`.
    ///
    /// # Arguments
    /// * `video` - Handle of the asset to play
    /// * `surface` - Decoding surface that renders the asset
    /// * `initial_frame` - Starting frame, clamped into the valid range
    ///
    /// # Errors
    /// Propagates the surface error if it refuses the initial reposition.
    pub fn open(
        video: VideoHandle,
        surface: Arc<dyn DecodingSurface>,
        initial_frame: i64,
    ) -> Result<Self, PlaybackError> {
        let total = video.total_frames();
        let current_frame = clamp_frame(initial_frame, total);

        surface.set_current_time(frame_to_ms(current_frame as i64, video.fps()) / 1000.0)?;

        log::debug!(
            "[Playback] Opened {} ({} frames at {} fps), starting at frame {}",
            video.uri(),
            total,
            video.fps(),
            current_frame
        );

        Ok(Self {
            video,
            state: PlaybackState {
                current_frame,
                total_frames: total,
                is_playing: false,
                playback_speed: 1.0,
            },
            surface,
            on_frame_change: None,
            reached_end: false,
            released: false,
        })
    }

    /// Register the frame-change callback, replacing any previous one.
    pub fn set_frame_listener(&mut self, listener: FrameListener) {
        self.on_frame_change = Some(listener);
    }

    pub fn video(&self) -> &VideoHandle {
        &self.video
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_frame(&self) -> u32 {
        self.state.current_frame
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Displayed position, `"{current}/{total}"` (`"0/0"` for empty media).
    pub fn position_label(&self) -> String {
        format!("{}/{}", self.state.current_frame, self.state.total_frames)
    }

    pub fn can_go_previous(&self) -> bool {
        self.state.current_frame > 0
    }

    pub fn can_go_next(&self) -> bool {
        self.state.current_frame + 1 < self.state.total_frames
    }

    /// Start playback. No-op while already playing.
    ///
    /// When playback previously ran to the end, the surface is rewound to
    /// frame 0 first.
    pub fn play(&mut self) -> Result<(), PlaybackError> {
        self.ensure_active()?;
        if self.state.is_playing {
            return Ok(());
        }

        if self.reached_end {
            self.surface.set_current_time(0.0)?;
        }

        self.surface.play().inspect_err(|err| log_playback_error(err, "play"))?;
        self.state.is_playing = true;
        if self.reached_end {
            self.reached_end = false;
            self.set_current_frame(0);
        }
        Ok(())
    }

    /// Pause playback. No-op while already paused.
    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        self.ensure_active()?;
        if !self.state.is_playing {
            return Ok(());
        }

        self.surface.pause().inspect_err(|err| log_playback_error(err, "pause"))?;
        self.state.is_playing = false;
        Ok(())
    }

    pub fn toggle_play_pause(&mut self) -> Result<(), PlaybackError> {
        if self.state.is_playing {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Seek to a frame, clamped to `[0, total_frames - 1]` (or 0).
    ///
    /// Seeking to the current frame changes nothing and fires no callback.
    /// Any other seek pauses playback, repositions the surface and reports
    /// the new frame to the listener.
    ///
    /// # Returns
    /// The frame the controller ends up on.
    pub fn seek_to_frame(&mut self, frame: i64) -> Result<u32, PlaybackError> {
        self.ensure_active()?;
        let target = clamp_frame(frame, self.state.total_frames);
        if target == self.state.current_frame {
            return Ok(target);
        }

        self.pause()?;
        let seconds = frame_to_ms(target as i64, self.video.fps()) / 1000.0;
        self.surface
            .set_current_time(seconds)
            .inspect_err(|err| log_playback_error(err, "seek_to_frame"))?;

        self.reached_end = false;
        self.set_current_frame(target);
        Ok(target)
    }

    /// Seek to a media time in milliseconds.
    pub fn seek_to_time_ms(&mut self, ms: f64) -> Result<u32, PlaybackError> {
        self.seek_to_frame(ms_to_frame(ms, self.video.fps()))
    }

    /// Step one frame forward. No-op on the last frame.
    pub fn next_frame(&mut self) -> Result<u32, PlaybackError> {
        self.seek_to_frame(self.state.current_frame as i64 + 1)
    }

    /// Step one frame back. No-op on frame 0.
    pub fn previous_frame(&mut self) -> Result<u32, PlaybackError> {
        self.seek_to_frame(self.state.current_frame as i64 - 1)
    }

    /// Set the playback rate, clamped to `[0.25, 2.0]`.
    ///
    /// # Returns
    /// The speed actually applied to the surface.
    ///
    /// # Errors
    /// `InvalidSpeed` for NaN or infinite input; surface errors propagate.
    pub fn set_playback_speed(&mut self, speed: f32) -> Result<f32, PlaybackError> {
        self.ensure_active()?;
        if !speed.is_finite() {
            let err = PlaybackError::InvalidSpeed { speed };
            log_playback_error(&err, "set_playback_speed");
            return Err(err);
        }

        let clamped = speed.clamp(MIN_PLAYBACK_SPEED, MAX_PLAYBACK_SPEED);
        self.surface.set_playback_rate(clamped)?;
        self.state.playback_speed = clamped;
        Ok(clamped)
    }

    /// Reconcile a notification from the decoding surface.
    ///
    /// Time updates only move `current_frame` while playing, and only when the
    /// derived frame differs from the current one.
    ///
    /// # Returns
    /// The new frame if `current_frame` changed.
    pub fn handle_surface_event(&mut self, event: SurfaceEvent) -> Option<u32> {
        if self.released {
            return None;
        }

        match event {
            SurfaceEvent::TimeUpdate { current_time } => {
                if !self.state.is_playing {
                    log::trace!(
                        "[Playback] Ignoring time update at {:.3}s while paused",
                        current_time
                    );
                    return None;
                }
                let frame = clamp_frame(
                    ms_to_frame(current_time * 1000.0, self.video.fps()),
                    self.state.total_frames,
                );
                if frame == self.state.current_frame {
                    return None;
                }
                self.set_current_frame(frame);
                Some(frame)
            }
            SurfaceEvent::PlayingChange { is_playing } => {
                self.state.is_playing = is_playing;
                None
            }
            SurfaceEvent::PlayToEnd => {
                let was_playing = self.state.is_playing;
                self.state.is_playing = false;
                self.reached_end = true;
                if !was_playing {
                    log::trace!("[Playback] End of media while paused; frame kept");
                    return None;
                }
                let last = self.state.total_frames.saturating_sub(1);
                if last == self.state.current_frame {
                    return None;
                }
                self.set_current_frame(last);
                Some(last)
            }
        }
    }

    /// Release the decoding surface. Safe to call repeatedly.
    pub fn release(&mut self) -> Result<(), PlaybackError> {
        if self.released {
            return Ok(());
        }

        self.released = true;
        self.state.is_playing = false;
        log::debug!("[Playback] Releasing surface for {}", self.video.uri());
        self.surface
            .release()
            .inspect_err(|err| log_playback_error(err, "release"))
    }

    fn ensure_active(&self) -> Result<(), PlaybackError> {
        if self.released {
            return Err(PlaybackError::Released);
        }
        Ok(())
    }

    fn set_current_frame(&mut self, frame: u32) {
        self.state.current_frame = frame;
        if let Some(listener) = self.on_frame_change.as_mut() {
            listener(frame);
        }
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
