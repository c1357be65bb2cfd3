//! inference-loop: real-time frame classification
//!
//! [`InferenceLoop`] owns the camera, the model slot and the result sink and
//! drives them from a single cooperative task: wait for the first frame, then
//! capture, preprocess, predict and publish one frame at a time.

mod error;
pub use error::{CycleError, LoopError};

mod config;
pub use config::{LoopConfig, NotReadyPolicy};

mod state;
pub use state::{LoopState, LoopStats};

pub mod sink;
pub use sink::{ConsoleSink, LatestLabel, RecordingSink, ResultSink};

mod controller;
pub use controller::{Command, InferenceLoop, LoopHandle};
