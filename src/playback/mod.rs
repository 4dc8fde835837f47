//! Frame-accurate video playback.
//!
//! - `surface`: the decoding surface interface and an in-memory stub
//! - `controller`: `PlaybackController`, the owner of `PlaybackState`
//! - `session`: Tokio task that serializes commands and surface notifications

pub mod controller;
pub mod session;
pub mod surface;

pub use controller::{
    FrameListener, PlaybackController, PlaybackState, VideoHandle, MAX_PLAYBACK_SPEED,
    MIN_PLAYBACK_SPEED,
};
pub use session::{PlaybackCommand, PlaybackSession, SurfaceNotifier};
pub use surface::{DecodingSurface, StubSurface, SurfaceCommand, SurfaceEvent};
