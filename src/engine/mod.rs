//! Engine module housing the tempo analysis orchestrator.
//!
//! `TempoEngine` (in `core`) ties playback sessions, phase detection and tempo
//! comparison together behind one handle shared by the CLI and embedders.

pub mod core;

pub use core::{TelemetryEvent, TelemetryEventKind, TempoEngine, TempoReport};
