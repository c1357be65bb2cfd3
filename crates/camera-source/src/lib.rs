//! camera-source: facing-mode aware camera acquisition
//!
//! A [`CameraSource`] owns at most one live device handle at a time. Backends
//! implement [`CameraBackend`] and hand out [`CameraStream`]s; the default
//! build enables a `mock` backend so binaries and tests run without hardware.

mod types;
pub use types::{FacingMode, Frame, PixelFormat, StreamId};

mod error;
pub use error::{Error, Result};

mod traits;
pub use traits::{CameraBackend, CameraStream};

mod source;
pub use source::{CameraSource, ReacquirePolicy};

#[cfg(feature = "mock")]
mod mock;
#[cfg(feature = "mock")]
pub use mock::{AccessSwitch, HandleLedger, MockCamera};

#[cfg(feature = "image-dir")]
mod image_dir;
#[cfg(feature = "image-dir")]
pub use image_dir::ImageDirCamera;
