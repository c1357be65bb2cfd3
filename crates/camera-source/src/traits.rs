use crate::{FacingMode, Frame, Result, StreamId};
use async_trait::async_trait;

/// Device-I/O boundary: requests a live video stream for a facing mode.
#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Acquire a new stream. Fails with `Error::DeviceAccess` on permission
    /// or availability problems.
    async fn open(&self, facing: FacingMode) -> Result<Box<dyn CameraStream>>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// One acquired device handle.
pub trait CameraStream: Send {
    fn id(&self) -> StreamId;

    fn facing(&self) -> FacingMode;

    /// True once the stream has produced decodable data.
    fn has_data(&self) -> bool;

    /// Read the most recent decoded frame.
    fn read(&mut self) -> Result<Frame>;

    /// Release every track held by this handle. Idempotent.
    fn stop(&mut self);
}
