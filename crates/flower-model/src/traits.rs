use crate::{InputShape, LabelSet, PredictError, PredictionResult};
use async_trait::async_trait;
use frame_preprocess::Tensor;

/// A loaded, immutable classifier.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Run inference on one `(1, h, w, c)` tensor.
    async fn predict(&self, input: &Tensor) -> Result<PredictionResult, PredictError>;

    fn metadata(&self) -> ClassifierMetadata;
}

/// Metadata about a classifier
#[derive(Debug, Clone)]
pub struct ClassifierMetadata {
    pub name: String,
    pub model_type: String,
    pub input_shape: InputShape,
    pub labels: LabelSet,
}

impl ClassifierMetadata {
    /// Reject tensors that do not match this classifier's input.
    pub fn check_input(&self, input: &Tensor) -> Result<(), PredictError> {
        let expected = self.input_shape.batched();
        if input.shape() != expected {
            return Err(PredictError::InputShape {
                expected,
                actual: input.shape(),
            });
        }
        Ok(())
    }
}
