//! flower-model: classifier loading and label decoding
//!
//! The model lives in a directory holding a `model.json` descriptor and the
//! weight bytes it points to. [`load`] is a one-shot async operation;
//! [`ModelSlot`] tracks its outcome so the inference loop can check
//! readiness without blocking.

mod error;
pub use error::{LoadError, PredictError};

mod labels;
pub use labels::{LabelSet, PredictionResult, FLOWER_LABELS};

mod descriptor;
pub use descriptor::{InputShape, ModelDescriptor, ModelFormat, DESCRIPTOR_FILE, FLOWER_INPUT_SHAPE};

mod traits;
pub use traits::{Classifier, ClassifierMetadata};

mod provider;
pub use provider::{load, ModelSlot, ModelStatus};

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "onnx")]
pub mod onnx;
