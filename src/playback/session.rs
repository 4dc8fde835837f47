//! Single-writer playback session.
//!
//! A Tokio task owns the [`PlaybackController`]. Caller commands and decoding
//! surface notifications travel through one FIFO queue, so a notification can
//! never interleave with a seek halfway through its read-modify-write of
//! `current_frame`. Frame changes are published on a broadcast channel.

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::PlaybackConfig;
use crate::error::PlaybackError;
use crate::playback::controller::{PlaybackController, PlaybackState};
use crate::playback::surface::SurfaceEvent;

/// Operation requested from the session task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    TogglePlayPause,
    SeekToFrame(i64),
    SeekToTimeMs(f64),
    NextFrame,
    PreviousFrame,
    SetPlaybackSpeed(f32),
    Snapshot,
    Release,
}

type Reply = oneshot::Sender<Result<PlaybackState, PlaybackError>>;

enum SessionMessage {
    Command { command: PlaybackCommand, reply: Reply },
    Surface(SurfaceEvent),
}

/// Handle a decoding surface uses to deliver its notifications.
#[derive(Clone)]
pub struct SurfaceNotifier {
    tx: mpsc::Sender<SessionMessage>,
}

impl SurfaceNotifier {
    /// Queue a notification behind any command already submitted.
    pub async fn notify(&self, event: SurfaceEvent) -> Result<(), PlaybackError> {
        self.tx
            .send(SessionMessage::Surface(event))
            .await
            .map_err(|_| PlaybackError::SessionClosed)
    }

    /// Non-blocking variant for surfaces that call back from their own thread.
    ///
    /// # Errors
    /// `Backpressure` when the queue is full, `SessionClosed` once the session
    /// task has stopped.
    pub fn try_notify(&self, event: SurfaceEvent) -> Result<(), PlaybackError> {
        self.tx
            .try_send(SessionMessage::Surface(event))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => PlaybackError::Backpressure,
                mpsc::error::TrySendError::Closed(_) => PlaybackError::SessionClosed,
            })
    }
}

/// Async handle to a playback controller running on its own task.
///
/// Must be created inside a Tokio runtime. Dropping the session aborts the
/// task, which drops the controller and releases the surface.
pub struct PlaybackSession {
    tx: mpsc::Sender<SessionMessage>,
    frames_tx: broadcast::Sender<u32>,
    task: Option<JoinHandle<()>>,
}

impl PlaybackSession {
    /// Move `controller` onto a new session task.
    ///
    /// The controller's frame listener is replaced by the session's broadcast
    /// publisher; use [`subscribe_frames`](Self::subscribe_frames) instead.
    pub fn spawn(mut controller: PlaybackController, config: &PlaybackConfig) -> Self {
        let (tx, mut rx) = mpsc::channel::<SessionMessage>(config.command_channel_capacity.max(1));
        let (frames_tx, _) = broadcast::channel(config.frame_channel_capacity.max(1));

        let publisher = frames_tx.clone();
        controller.set_frame_listener(Box::new(move |frame| {
            let _ = publisher.send(frame);
        }));

        let uri = controller.video().uri().to_string();
        let task = tokio::spawn(async move {
            log::debug!("[PlaybackSession] Started for {}", uri);
            while let Some(message) = rx.recv().await {
                match message {
                    SessionMessage::Command { command, reply } => {
                        let result = apply(&mut controller, command);
                        let _ = reply.send(result);
                        if command == PlaybackCommand::Release {
                            break;
                        }
                    }
                    SessionMessage::Surface(event) => {
                        controller.handle_surface_event(event);
                    }
                }
            }
            log::debug!("[PlaybackSession] Stopped for {}", uri);
        });

        Self {
            tx,
            frames_tx,
            task: Some(task),
        }
    }

    /// Notifier to hand to the decoding surface.
    pub fn notifier(&self) -> SurfaceNotifier {
        SurfaceNotifier {
            tx: self.tx.clone(),
        }
    }

    /// Receive every new `current_frame` value.
    pub fn subscribe_frames(&self) -> broadcast::Receiver<u32> {
        self.frames_tx.subscribe()
    }

    /// Submit a command and wait for the resulting state.
    pub async fn send(&self, command: PlaybackCommand) -> Result<PlaybackState, PlaybackError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(SessionMessage::Command { command, reply })
            .await
            .map_err(|_| PlaybackError::SessionClosed)?;
        response.await.map_err(|_| PlaybackError::SessionClosed)?
    }

    pub async fn play(&self) -> Result<PlaybackState, PlaybackError> {
        self.send(PlaybackCommand::Play).await
    }

    pub async fn pause(&self) -> Result<PlaybackState, PlaybackError> {
        self.send(PlaybackCommand::Pause).await
    }

    pub async fn toggle_play_pause(&self) -> Result<PlaybackState, PlaybackError> {
        self.send(PlaybackCommand::TogglePlayPause).await
    }

    pub async fn seek_to_frame(&self, frame: i64) -> Result<PlaybackState, PlaybackError> {
        self.send(PlaybackCommand::SeekToFrame(frame)).await
    }

    pub async fn seek_to_time_ms(&self, ms: f64) -> Result<PlaybackState, PlaybackError> {
        self.send(PlaybackCommand::SeekToTimeMs(ms)).await
    }

    pub async fn next_frame(&self) -> Result<PlaybackState, PlaybackError> {
        self.send(PlaybackCommand::NextFrame).await
    }

    pub async fn previous_frame(&self) -> Result<PlaybackState, PlaybackError> {
        self.send(PlaybackCommand::PreviousFrame).await
    }

    pub async fn set_playback_speed(&self, speed: f32) -> Result<PlaybackState, PlaybackError> {
        self.send(PlaybackCommand::SetPlaybackSpeed(speed)).await
    }

    pub async fn snapshot(&self) -> Result<PlaybackState, PlaybackError> {
        self.send(PlaybackCommand::Snapshot).await
    }

    /// Release the surface and wait for the session task to finish.
    pub async fn shutdown(mut self) -> Result<(), PlaybackError> {
        let result = self.send(PlaybackCommand::Release).await.map(|_| ());
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        result
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn apply(
    controller: &mut PlaybackController,
    command: PlaybackCommand,
) -> Result<PlaybackState, PlaybackError> {
    match command {
        PlaybackCommand::Play => controller.play()?,
        PlaybackCommand::Pause => controller.pause()?,
        PlaybackCommand::TogglePlayPause => controller.toggle_play_pause()?,
        PlaybackCommand::SeekToFrame(frame) => {
            controller.seek_to_frame(frame)?;
        }
        PlaybackCommand::SeekToTimeMs(ms) => {
            controller.seek_to_time_ms(ms)?;
        }
        PlaybackCommand::NextFrame => {
            controller.next_frame()?;
        }
        PlaybackCommand::PreviousFrame => {
            controller.previous_frame()?;
        }
        PlaybackCommand::SetPlaybackSpeed(speed) => {
            controller.set_playback_speed(speed)?;
        }
        PlaybackCommand::Snapshot => {}
        PlaybackCommand::Release => controller.release()?,
    }
    Ok(controller.state())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::controller::VideoHandle;
    use crate::playback::surface::StubSurface;
    use std::sync::Arc;

    fn spawn_session(duration_ms: u64) -> (PlaybackSession, Arc<StubSurface>) {
        let surface = Arc::new(StubSurface::new());
        let video = VideoHandle::new("swing.mp4", 30.0, duration_ms).unwrap();
        let controller = PlaybackController::open(video, surface.clone(), 0).unwrap();
        (
            PlaybackSession::spawn(controller, &PlaybackConfig::default()),
            surface,
        )
    }

    #[tokio::test]
    async fn test_commands_reply_with_state() {
        let (session, _) = spawn_session(5000);

        let state = session.seek_to_frame(200).await.unwrap();
        assert_eq!(state.current_frame, 149);
        assert_eq!(state.total_frames, 150);

        let state = session.previous_frame().await.unwrap();
        assert_eq!(state.current_frame, 148);

        let state = session.set_playback_speed(9.0).await.unwrap();
        assert_eq!(state.playback_speed, 2.0);
    }

    #[tokio::test]
    async fn test_notifications_are_ordered_with_commands() {
        let (session, _) = spawn_session(5000);
        let notifier = session.notifier();

        session.play().await.unwrap();
        notifier
            .notify(SurfaceEvent::TimeUpdate { current_time: 1.0 })
            .await
            .unwrap();
        assert_eq!(session.snapshot().await.unwrap().current_frame, 30);

        session.seek_to_frame(5).await.unwrap();
        // Stale update from before the seek arrives while paused
        notifier
            .notify(SurfaceEvent::TimeUpdate { current_time: 1.2 })
            .await
            .unwrap();
        let state = session.snapshot().await.unwrap();
        assert_eq!(state.current_frame, 5);
        assert!(!state.is_playing);
    }

    #[tokio::test]
    async fn test_frame_changes_are_broadcast() {
        let (session, _) = spawn_session(5000);
        let mut frames = session.subscribe_frames();

        session.seek_to_frame(10).await.unwrap();
        session.seek_to_frame(10).await.unwrap();
        session.next_frame().await.unwrap();

        assert_eq!(frames.recv().await.unwrap(), 10);
        assert_eq!(frames.recv().await.unwrap(), 11);
        assert!(frames.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_errors_are_returned_to_caller() {
        let (session, surface) = spawn_session(5000);
        surface.fail_next();
        assert!(matches!(
            session.play().await,
            Err(PlaybackError::SurfaceFailure { .. })
        ));
        assert!(!session.snapshot().await.unwrap().is_playing);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_try_notify_reports_full_queue() {
        let surface = Arc::new(StubSurface::new());
        let video = VideoHandle::new("swing.mp4", 30.0, 5000).unwrap();
        let controller = PlaybackController::open(video, surface, 0).unwrap();
        let config = PlaybackConfig {
            command_channel_capacity: 1,
            ..PlaybackConfig::default()
        };
        let session = PlaybackSession::spawn(controller, &config);
        let notifier = session.notifier();

        // The session task cannot drain the queue until this task yields
        let event = SurfaceEvent::TimeUpdate { current_time: 0.5 };
        assert_eq!(notifier.try_notify(event), Ok(()));
        assert_eq!(notifier.try_notify(event), Err(PlaybackError::Backpressure));

        session.shutdown().await.unwrap();
        assert_eq!(notifier.try_notify(event), Err(PlaybackError::SessionClosed));
    }

    #[tokio::test]
    async fn test_shutdown_releases_surface() {
        let (session, surface) = spawn_session(5000);
        let notifier = session.notifier();

        session.shutdown().await.unwrap();
        assert!(surface.is_released());
        assert_eq!(surface.release_calls(), 1);
        assert_eq!(
            notifier.notify(SurfaceEvent::PlayToEnd).await,
            Err(PlaybackError::SessionClosed)
        );
    }
}
