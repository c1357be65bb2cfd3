use crate::{CameraBackend, CameraStream, Error, FacingMode, Frame, Result, StreamId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What to do when acquiring a new stream fails after the old one was released.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReacquirePolicy {
    /// Release the old stream, request the new one, and stay camera-less on failure.
    #[default]
    ReleaseFirst,
    /// Release the old stream, request the new one, and on failure try to
    /// reopen the previous facing mode.
    RestorePrevious,
}

/// Owns the camera backend and at most one live stream.
pub struct CameraSource {
    backend: Box<dyn CameraBackend>,
    facing: FacingMode,
    policy: ReacquirePolicy,
    active: Option<Box<dyn CameraStream>>,
}

impl CameraSource {
    pub fn new(backend: Box<dyn CameraBackend>, facing: FacingMode) -> Self {
        Self {
            backend,
            facing,
            policy: ReacquirePolicy::default(),
            active: None,
        }
    }

    pub fn with_policy(mut self, policy: ReacquirePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn active_stream_id(&self) -> Option<StreamId> {
        self.active.as_ref().map(|s| s.id())
    }

    /// Acquire the camera for the current facing mode.
    pub async fn start(&mut self) -> Result<StreamId> {
        self.configure(self.facing).await
    }

    /// Switch to `facing`. The previous stream is stopped before the new
    /// request is made, so no two handles are ever held at once.
    pub async fn configure(&mut self, facing: FacingMode) -> Result<StreamId> {
        let previous = self.release_active();
        self.facing = facing;
        info!(facing = %facing, backend = self.backend.name(), "requesting camera");

        match self.backend.open(facing).await {
            Ok(stream) => {
                let id = stream.id();
                info!(stream = %id, facing = %facing, "camera stream bound");
                self.active = Some(stream);
                Ok(id)
            }
            Err(err) => {
                warn!(facing = %facing, error = %err, "camera acquisition failed");
                if let (ReacquirePolicy::RestorePrevious, Some(prev)) = (self.policy, previous) {
                    self.restore(prev).await;
                }
                Err(err)
            }
        }
    }

    /// Flip the facing mode and reacquire. The flag flips even if acquisition fails.
    pub async fn toggle(&mut self) -> Result<StreamId> {
        self.configure(self.facing.toggled()).await
    }

    /// The "stream has data" signal.
    pub fn has_data(&self) -> bool {
        self.active.as_ref().is_some_and(|s| s.has_data())
    }

    /// Latest decoded frame, or `Error::NotReady` before the stream has data.
    pub fn current_frame(&mut self) -> Result<Frame> {
        let stream = self.active.as_mut().ok_or(Error::NotReady)?;
        if !stream.has_data() {
            return Err(Error::NotReady);
        }
        stream.read()
    }

    /// Stop the active stream, if any.
    pub fn shutdown(&mut self) {
        if self.release_active().is_some() {
            info!("camera released");
        }
    }

    fn release_active(&mut self) -> Option<FacingMode> {
        let mut stream = self.active.take()?;
        debug!(stream = %stream.id(), "stopping camera tracks");
        stream.stop();
        Some(stream.facing())
    }

    async fn restore(&mut self, facing: FacingMode) {
        match self.backend.open(facing).await {
            Ok(stream) => {
                info!(stream = %stream.id(), facing = %facing, "previous camera restored");
                self.facing = facing;
                self.active = Some(stream);
            }
            Err(err) => {
                warn!(facing = %facing, error = %err, "could not restore previous camera");
            }
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.release_active();
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::MockCamera;

    #[tokio::test]
    async fn double_toggle_returns_to_origin_with_one_handle() -> Result<()> {
        let cam = MockCamera::new(64, 48);
        let ledger = cam.ledger();
        let mut source = CameraSource::new(Box::new(cam), FacingMode::Front);

        source.start().await?;
        source.toggle().await?;
        let last = source.toggle().await?;

        assert_eq!(source.facing(), FacingMode::Front);
        assert_eq!(ledger.live_count(), 1);
        assert_eq!(ledger.live_ids(), vec![last]);
        assert_eq!(ledger.total_opened(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn frame_not_ready_before_stream_has_data() -> Result<()> {
        let cam = MockCamera::new(8, 8).with_warmup(2);
        let mut source = CameraSource::new(Box::new(cam), FacingMode::Front);

        assert!(matches!(source.current_frame(), Err(Error::NotReady)));
        source.start().await?;
        assert!(!source.has_data());
        assert!(!source.has_data());
        assert!(source.has_data());
        let frame = source.current_frame()?;
        assert_eq!((frame.width, frame.height), (8, 8));
        Ok(())
    }

    #[tokio::test]
    async fn release_first_leaves_no_camera_on_failure() -> Result<()> {
        let cam = MockCamera::new(8, 8).deny(FacingMode::Rear);
        let ledger = cam.ledger();
        let mut source = CameraSource::new(Box::new(cam), FacingMode::Front);

        source.start().await?;
        let err = source.toggle().await;
        assert!(matches!(err, Err(Error::DeviceAccess { .. })));
        assert_eq!(source.facing(), FacingMode::Rear);
        assert!(source.active_stream_id().is_none());
        assert_eq!(ledger.live_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn restore_previous_reopens_old_facing_on_failure() -> Result<()> {
        let cam = MockCamera::new(8, 8).deny(FacingMode::Rear);
        let ledger = cam.ledger();
        let mut source = CameraSource::new(Box::new(cam), FacingMode::Front)
            .with_policy(ReacquirePolicy::RestorePrevious);

        let first = source.start().await?;
        assert!(source.toggle().await.is_err());
        assert_eq!(source.facing(), FacingMode::Front);
        let restored = source.active_stream_id();
        assert!(restored.is_some());
        assert_ne!(restored, Some(first));
        assert_eq!(ledger.live_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn restore_previous_ends_camera_less_when_both_fail() -> Result<()> {
        let cam = MockCamera::new(8, 8).deny(FacingMode::Rear);
        let ledger = cam.ledger();
        let access = cam.access();
        let mut source = CameraSource::new(Box::new(cam), FacingMode::Front)
            .with_policy(ReacquirePolicy::RestorePrevious);

        source.start().await?;
        access.deny(FacingMode::Front);
        assert!(matches!(source.toggle().await, Err(Error::DeviceAccess { .. })));
        assert!(source.active_stream_id().is_none());
        assert!(!source.has_data());
        assert_eq!(ledger.live_count(), 0);
        assert_eq!(ledger.total_opened(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn shutdown_and_drop_release_handles() -> Result<()> {
        let cam = MockCamera::new(8, 8);
        let ledger = cam.ledger();
        {
            let mut source = CameraSource::new(Box::new(cam), FacingMode::Rear);
            source.start().await?;
            assert_eq!(ledger.live_count(), 1);
        }
        assert_eq!(ledger.live_count(), 0);
        Ok(())
    }
}
