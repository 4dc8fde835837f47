//! Decoding surface abstraction consumed by the playback controller.
//!
//! A decoding surface is whatever actually renders the video (a platform
//! player, a test double). The controller only issues commands through
//! [`DecodingSurface`] and reacts to [`SurfaceEvent`] notifications.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::PlaybackError;

/// Trait implemented by video decoding surfaces.
///
/// Implementations must accept calls from any thread; the controller wraps
/// them in an `Arc` so the owner of the surface can keep its own handle.
pub trait DecodingSurface: Send + Sync {
    fn play(&self) -> Result<(), PlaybackError>;
    fn pause(&self) -> Result<(), PlaybackError>;
    /// Reposition the surface, in seconds from the start of the media.
    fn set_current_time(&self, seconds: f64) -> Result<(), PlaybackError>;
    fn set_playback_rate(&self, rate: f32) -> Result<(), PlaybackError>;
    /// Release decoder resources. Called exactly once by the controller.
    fn release(&self) -> Result<(), PlaybackError>;
}

/// Notifications emitted by a decoding surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    /// Continuous playback position, in seconds
    TimeUpdate { current_time: f64 },
    /// The surface started or stopped playing on its own
    PlayingChange { is_playing: bool },
    /// End of media reached
    PlayToEnd,
}

/// Command observed by [`StubSurface`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceCommand {
    Play,
    Pause,
    SetCurrentTime(f64),
    SetPlaybackRate(f32),
    Release,
}

/// In-memory surface that records every command it accepts.
///
/// Used by tests and the CLI. `fail_next()` makes the next command fail with
/// `PlaybackError::SurfaceFailure` without recording it.
#[derive(Default)]
pub struct StubSurface {
    commands: Mutex<Vec<SurfaceCommand>>,
    fail_next: AtomicBool,
    fail_next_play: AtomicBool,
    released: AtomicBool,
    release_calls: AtomicUsize,
}

impl StubSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next command fail.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Make the next `play` fail while other commands keep succeeding.
    pub fn fail_next_play(&self) {
        self.fail_next_play.store(true, Ordering::SeqCst);
    }

    /// Commands accepted so far, oldest first.
    pub fn commands(&self) -> Vec<SurfaceCommand> {
        match self.commands.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Forget recorded commands.
    pub fn clear(&self) {
        match self.commands.lock() {
            Ok(mut guard) => guard.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Number of times `release` reached the surface.
    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    fn record(&self, command: SurfaceCommand) -> Result<(), PlaybackError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PlaybackError::SurfaceFailure {
                details: format!("stub rejected {:?}", command),
            });
        }
        if self.released.load(Ordering::SeqCst) {
            return Err(PlaybackError::Released);
        }

        let mut guard = self
            .commands
            .lock()
            .map_err(|_| PlaybackError::SurfaceFailure {
                details: "stub command log poisoned".to_string(),
            })?;
        guard.push(command);
        Ok(())
    }
}

impl DecodingSurface for StubSurface {
    fn play(&self) -> Result<(), PlaybackError> {
        if self.fail_next_play.swap(false, Ordering::SeqCst) {
            return Err(PlaybackError::SurfaceFailure {
                details: "stub rejected Play".to_string(),
            });
        }
        self.record(SurfaceCommand::Play)
    }

    fn pause(&self) -> Result<(), PlaybackError> {
        self.record(SurfaceCommand::Pause)
    }

    fn set_current_time(&self, seconds: f64) -> Result<(), PlaybackError> {
        self.record(SurfaceCommand::SetCurrentTime(seconds))
    }

    fn set_playback_rate(&self, rate: f32) -> Result<(), PlaybackError> {
        self.record(SurfaceCommand::SetPlaybackRate(rate))
    }

    fn release(&self) -> Result<(), PlaybackError> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.record(SurfaceCommand::Release)?;
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}
