// Managers Module
//
// Focused manager classes used by TempoEngine.
//
// - DetectionManager: phase detector lifecycle and detector -> SwingAnalysis flow

pub mod detection_manager;

pub use detection_manager::{DetectionManager, DetectionOutcome};
