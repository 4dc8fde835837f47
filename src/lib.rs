// Swing Tempo Core - golf swing tempo analysis
// Frame-accurate playback, motion-based phase detection and tempo ratio math

// Module declarations
pub mod analysis;
pub mod config;
pub mod detection;
pub mod engine;
pub mod error;
pub mod managers;
pub mod playback;
pub mod testing;
pub mod timebase;

// Re-exports for convenience
pub use analysis::{SwingAnalysis, TempoComparison, TempoMode, TempoPreset, TempoVerdict};
pub use config::AppConfig;
pub use detection::{MotionPhaseDetector, PhaseDetectionResult, PhaseDetector};
pub use engine::TempoEngine;
pub use error::{DetectionError, ErrorCode, PlaybackError};
pub use playback::{PlaybackController, PlaybackSession, PlaybackState, VideoHandle};
