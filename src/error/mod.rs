// Error types for the swing tempo core
//
// This module defines custom error types for playback and phase detection,
// providing structured error handling with numeric codes that the screen layer
// can map to recoverable prompts.

mod detection;
mod playback;

pub use detection::{log_detection_error, DetectionError, DetectionErrorCodes};
pub use playback::{log_playback_error, PlaybackError, PlaybackErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the UI boundary.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_trait_objects() {
        let playback_err: &dyn ErrorCode = &PlaybackError::Released;
        assert_eq!(playback_err.code(), PlaybackErrorCodes::RELEASED);

        let detection_err: &dyn ErrorCode = &DetectionError::NotInitialized;
        assert_eq!(detection_err.code(), DetectionErrorCodes::NOT_INITIALIZED);
    }

    #[test]
    fn test_error_propagation() {
        fn may_fail() -> Result<(), DetectionError> {
            Err(DetectionError::NotInitialized)
        }

        fn caller() -> Result<(), DetectionError> {
            may_fail()?;
            Ok(())
        }

        assert_eq!(caller(), Err(DetectionError::NotInitialized));
    }
}
