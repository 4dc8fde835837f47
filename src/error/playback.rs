// Playback error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Playback error code constants
///
/// Single source of truth for the numeric codes surfaced to the screen layer.
///
/// Error code range: 3001-3006
pub struct PlaybackErrorCodes {}

impl PlaybackErrorCodes {
    /// Frame rate is not a positive finite number
    pub const INVALID_FPS: i32 = 3001;

    /// Requested playback speed is not a finite number
    pub const INVALID_SPEED: i32 = 3002;

    /// The decoding surface rejected a command
    pub const SURFACE_FAILURE: i32 = 3003;

    /// The decoding surface was already released
    pub const RELEASED: i32 = 3004;

    /// The playback session task is no longer running
    pub const SESSION_CLOSED: i32 = 3005;

    /// The session queue is full; the notification was not delivered
    pub const BACKPRESSURE: i32 = 3006;
}

/// Log a playback error with structured context
///
/// Emits the numeric code, the owning component and the message so the
/// failure can be correlated with the user action that triggered it.
pub fn log_playback_error(err: &PlaybackError, context: &str) {
    error!(
        "Playback error in {}: code={}, component=PlaybackController, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Playback-related errors
///
/// These errors cover video handle validation, decoding surface commands
/// and the session actor lifecycle.
///
/// Error code range: 3001-3006
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// Frame rate must be positive and finite
    InvalidFps { fps: f64 },

    /// Playback speed must be finite
    InvalidSpeed { speed: f32 },

    /// Decoding surface command failed
    SurfaceFailure { details: String },

    /// Surface already released; the controller can no longer drive it
    Released,

    /// Session actor stopped before the command could be processed
    SessionClosed,

    /// Session queue full; retry or drop the notification
    Backpressure,
}

impl ErrorCode for PlaybackError {
    fn code(&self) -> i32 {
        match self {
            PlaybackError::InvalidFps { .. } => PlaybackErrorCodes::INVALID_FPS,
            PlaybackError::InvalidSpeed { .. } => PlaybackErrorCodes::INVALID_SPEED,
            PlaybackError::SurfaceFailure { .. } => PlaybackErrorCodes::SURFACE_FAILURE,
            PlaybackError::Released => PlaybackErrorCodes::RELEASED,
            PlaybackError::SessionClosed => PlaybackErrorCodes::SESSION_CLOSED,
            PlaybackError::Backpressure => PlaybackErrorCodes::BACKPRESSURE,
        }
    }

    fn message(&self) -> String {
        match self {
            PlaybackError::InvalidFps { fps } => {
                format!("Frame rate must be a positive number (got {})", fps)
            }
            PlaybackError::InvalidSpeed { speed } => {
                format!("Playback speed must be a finite number (got {})", speed)
            }
            PlaybackError::SurfaceFailure { details } => {
                format!("Decoding surface error: {}", details)
            }
            PlaybackError::Released => {
                "Decoding surface already released. Open the video again.".to_string()
            }
            PlaybackError::SessionClosed => "Playback session closed".to_string(),
            PlaybackError::Backpressure => "Playback session queue is full".to_string(),
        }
    }
}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PlaybackError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for PlaybackError {}
