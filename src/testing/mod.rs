//! Deterministic frame sources for detector tests and CLI simulations.
//!
//! `SyntheticSwing` renders a clip of a club sweeping around a pivot with a
//! known takeaway, top and impact, so detector output can be checked against
//! ground truth without real video. `FlakyExtractor` injects extraction
//! failures into any other extractor.

pub mod flaky;
pub mod synthetic;

pub use flaky::FlakyExtractor;
pub use synthetic::{SyntheticSwing, SyntheticSwingExtractor};
