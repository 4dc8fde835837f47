// Phase detection error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Detection error code constants
///
/// Error code range: 4001-4004
pub struct DetectionErrorCodes {}

impl DetectionErrorCodes {
    /// Detection requested before `initialize()` (or after `dispose()`)
    pub const NOT_INITIALIZED: i32 = 4001;

    /// No usable estimate could be produced from the video
    pub const DETECTION_FAILED: i32 = 4002;

    /// Caller passed an unusable argument (e.g. non-positive fps)
    pub const INVALID_INPUT: i32 = 4003;

    /// Detector lifecycle lock was poisoned
    pub const STATE_POISONED: i32 = 4004;
}

/// Log a detection error with structured context
pub fn log_detection_error(err: &DetectionError, context: &str) {
    error!(
        "Detection error in {}: code={}, component=PhaseDetector, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Phase detection errors
///
/// These errors cover the detector lifecycle and the sampling pipeline.
/// Per-sample extraction failures never surface here on their own; they only
/// escalate to `DetectionFailed` when no usable sample is left.
///
/// Error code range: 4001-4004
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// Detector is not in the Ready state
    NotInitialized,

    /// Total failure to estimate phases; `reason` carries the underlying cause
    DetectionFailed { reason: String },

    /// Invalid argument
    InvalidInput { reason: String },

    /// Lifecycle RwLock was poisoned
    StatePoisoned,
}

impl DetectionError {
    /// Build a `DetectionFailed` from any error, keeping its full cause chain.
    pub fn failed(cause: impl fmt::Display) -> Self {
        DetectionError::DetectionFailed {
            reason: format!("{:#}", cause),
        }
    }
}

impl ErrorCode for DetectionError {
    fn code(&self) -> i32 {
        match self {
            DetectionError::NotInitialized => DetectionErrorCodes::NOT_INITIALIZED,
            DetectionError::DetectionFailed { .. } => DetectionErrorCodes::DETECTION_FAILED,
            DetectionError::InvalidInput { .. } => DetectionErrorCodes::INVALID_INPUT,
            DetectionError::StatePoisoned => DetectionErrorCodes::STATE_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            DetectionError::NotInitialized => {
                "Phase detector not initialized. Call initialize() first.".to_string()
            }
            DetectionError::DetectionFailed { reason } => {
                format!("Swing phase detection failed: {}", reason)
            }
            DetectionError::InvalidInput { reason } => {
                format!("Invalid detection input: {}", reason)
            }
            DetectionError::StatePoisoned => "Phase detector state lock poisoned".to_string(),
        }
    }
}

impl fmt::Display for DetectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DetectionError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for DetectionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_error_codes() {
        assert_eq!(DetectionError::NotInitialized.code(), 4001);
        assert_eq!(
            DetectionError::DetectionFailed {
                reason: "test".to_string()
            }
            .code(),
            4002
        );
        assert_eq!(
            DetectionError::InvalidInput {
                reason: "test".to_string()
            }
            .code(),
            4003
        );
        assert_eq!(DetectionError::StatePoisoned.code(), 4004);
    }

    #[test]
    fn test_failed_keeps_cause_chain() {
        let cause = anyhow::anyhow!("decoder exploded").context("extracting frame at 120ms");
        let err = DetectionError::failed(cause);
        match &err {
            DetectionError::DetectionFailed { reason } => {
                assert!(reason.contains("decoder exploded"));
                assert!(reason.contains("120ms"));
            }
            other => panic!("Expected DetectionFailed, got {:?}", other),
        }
        assert_ne!(err.code(), DetectionError::NotInitialized.code());
    }

    #[test]
    fn test_detection_error_messages() {
        assert!(DetectionError::NotInitialized
            .message()
            .contains("not initialized"));
        let err = DetectionError::InvalidInput {
            reason: "fps must be positive".to_string(),
        };
        assert_eq!(
            err.message(),
            "Invalid detection input: fps must be positive"
        );
    }
}
