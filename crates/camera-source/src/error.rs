use crate::FacingMode;
use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("camera not found: {0}")]
    NotFound(String),
    #[error("cannot access {facing} camera: {reason}")]
    DeviceAccess { facing: FacingMode, reason: String },
    #[error("camera stream has no data yet")]
    NotReady,
    #[error("camera stream already stopped")]
    Stopped,
    #[error("I/O error: {0}")]
    Io(String),
    #[error("backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Errors a user should be alerted about (permission, missing or busy device).
    pub fn is_device_access(&self) -> bool {
        matches!(self, Error::DeviceAccess { .. } | Error::NotFound(_))
    }
}
